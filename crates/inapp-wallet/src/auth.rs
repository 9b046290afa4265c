//! Login strategies and their mapping onto signer procedures

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

use crate::bridge::Procedure;
use crate::WalletError;

/// Login strategy tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Email one-time code
    Email,
    /// Sign in with Apple
    Apple,
    /// Facebook login
    Facebook,
    /// Google login
    Google,
    /// Developer issued JWT
    Jwt,
    /// Developer hosted auth endpoint
    AuthEndpoint,
    /// Email one-time code flow rendered by the signer
    IframeEmailVerification,
    /// Full login modal rendered by the signer
    Iframe,
}

impl Strategy {
    /// Every strategy, in declaration order
    pub const ALL: [Strategy; 8] = [
        Strategy::Email,
        Strategy::Apple,
        Strategy::Facebook,
        Strategy::Google,
        Strategy::Jwt,
        Strategy::AuthEndpoint,
        Strategy::IframeEmailVerification,
        Strategy::Iframe,
    ];

    /// Wire tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Email => "email",
            Strategy::Apple => "apple",
            Strategy::Facebook => "facebook",
            Strategy::Google => "google",
            Strategy::Jwt => "jwt",
            Strategy::AuthEndpoint => "auth_endpoint",
            Strategy::IframeEmailVerification => "iframe_email_verification",
            Strategy::Iframe => "iframe",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| WalletError::UnknownStrategy(s.to_string()))
    }
}

/// OAuth provider understood by the signer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OauthProvider {
    /// Google
    Google,
    /// Facebook
    Facebook,
    /// Apple
    Apple,
}

/// Popup handling for OAuth logins, passed through to the signer untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OauthOptions {
    /// Handle of a popup window the caller already opened
    pub opened_window: Option<String>,
    /// Close the popup once the flow completes
    pub close_opened_window: bool,
}

/// Login request, one variant per [`Strategy`]
#[derive(Clone, PartialEq)]
pub enum AuthArgs {
    /// Verify an emailed one-time code
    Email {
        /// Email address the code was sent to
        email: String,
        /// Code received by the user
        verification_code: String,
    },
    /// Sign in with Apple
    Apple(OauthOptions),
    /// Facebook login
    Facebook(OauthOptions),
    /// Google login
    Google(OauthOptions),
    /// Developer issued JWT
    Jwt {
        /// The token
        jwt: String,
        /// Key protecting the user's recovery share
        encryption_key: String,
    },
    /// Developer hosted auth endpoint
    AuthEndpoint {
        /// Payload forwarded to the endpoint
        payload: String,
        /// Key protecting the user's recovery share
        encryption_key: String,
    },
    /// Email flow rendered by the signer
    IframeEmailVerification {
        /// Email address to verify
        email: String,
    },
    /// Full login modal rendered by the signer
    Iframe,
}

impl AuthArgs {
    /// Strategy tag of this request
    pub fn strategy(&self) -> Strategy {
        match self {
            AuthArgs::Email { .. } => Strategy::Email,
            AuthArgs::Apple(_) => Strategy::Apple,
            AuthArgs::Facebook(_) => Strategy::Facebook,
            AuthArgs::Google(_) => Strategy::Google,
            AuthArgs::Jwt { .. } => Strategy::Jwt,
            AuthArgs::AuthEndpoint { .. } => Strategy::AuthEndpoint,
            AuthArgs::IframeEmailVerification { .. } => Strategy::IframeEmailVerification,
            AuthArgs::Iframe => Strategy::Iframe,
        }
    }

    /// Procedure and parameters this login is dispatched to
    pub fn to_request(&self) -> (Procedure, Value) {
        match self {
            AuthArgs::Email { email, verification_code } => (
                Procedure::VerifyEmailLoginOtp,
                json!({ "email": email, "otp": verification_code }),
            ),
            AuthArgs::Apple(options) => oauth_request(OauthProvider::Apple, options),
            AuthArgs::Facebook(options) => oauth_request(OauthProvider::Facebook, options),
            AuthArgs::Google(options) => oauth_request(OauthProvider::Google, options),
            AuthArgs::Jwt { jwt, encryption_key } => (
                Procedure::LoginWithCustomJwt,
                json!({ "jwt": jwt, "encryptionKey": encryption_key }),
            ),
            AuthArgs::AuthEndpoint { payload, encryption_key } => (
                Procedure::LoginWithCustomAuthEndpoint,
                json!({ "payload": payload, "encryptionKey": encryption_key }),
            ),
            AuthArgs::IframeEmailVerification { email } => {
                (Procedure::LoginWithEmailOtp, json!({ "email": email }))
            }
            AuthArgs::Iframe => (Procedure::LoginWithModal, Value::Null),
        }
    }
}

// Credentials stay out of logs.
impl fmt::Debug for AuthArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthArgs")
            .field("strategy", &self.strategy())
            .finish_non_exhaustive()
    }
}

fn oauth_request(provider: OauthProvider, options: &OauthOptions) -> (Procedure, Value) {
    (
        Procedure::LoginWithOauth,
        json!({
            "oauthProvider": provider,
            "closeOpenedWindow": options.close_opened_window,
            "openedWindow": options.opened_window,
        }),
    )
}

/// Pre-authentication request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreAuthArgs {
    /// Strategy to pre-authenticate
    pub strategy: Strategy,
    /// Email address, for [`Strategy::Email`]
    pub email: Option<String>,
}

impl PreAuthArgs {
    /// Request a one-time code for `email`
    pub fn email(email: impl Into<String>) -> Self {
        Self {
            strategy: Strategy::Email,
            email: Some(email.into()),
        }
    }

    /// Procedure and parameters of the pre-authentication step
    pub fn to_request(&self) -> Result<(Procedure, Value), WalletError> {
        match self.strategy {
            Strategy::Email => {
                let email = self
                    .email
                    .as_deref()
                    .ok_or_else(|| WalletError::MissingField("email".to_string()))?;
                Ok((Procedure::SendEmailLoginOtp, json!({ "email": email })))
            }
            other => Err(WalletError::NoPreAuthentication(other.to_string())),
        }
    }
}

/// Result of a successful login, passed through from the signer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthLoginResult(pub Value);

impl AuthLoginResult {
    /// Unwrap the raw response
    pub fn into_inner(self) -> Value {
        self.0
    }
}
