//! Wallet lifecycle status

use inapp_primitives::Address;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

use crate::wallet::InAppWallet;
use crate::WalletError;

/// Status tag reported by the signer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserWalletStatus {
    /// No session
    #[serde(rename = "Logged Out")]
    LoggedOut,
    /// Authenticated, no wallet provisioned
    #[serde(rename = "Logged In, Wallet Uninitialized")]
    LoggedInWalletUninitialized,
    /// Authenticated, wallet exists but this device has no key share
    #[serde(rename = "Logged In, New Device")]
    LoggedInNewDevice,
    /// Authenticated, wallet usable
    #[serde(rename = "Logged In, Wallet Initialized")]
    LoggedInWalletInitialized,
}

/// Authentication details of a logged in user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthDetails {
    /// Email, for email based logins
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Wallet user id, keys the local device share
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_wallet_id: Option<String>,
    /// Remaining fields, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// User payload of a status response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetails {
    /// Authentication details
    #[serde(default)]
    pub auth_details: AuthDetails,
    /// Wallet address, once a wallet exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<Address>,
}

/// Raw `getUserStatus` response
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UserStatusResponse {
    pub(crate) status: UserWalletStatus,
    #[serde(default)]
    pub(crate) user: Option<UserDetails>,
}

/// Logged in user with a usable wallet
#[derive(Clone)]
pub struct AuthenticatedUser {
    /// Authentication details
    pub auth_details: AuthDetails,
    /// Wallet address
    pub wallet_address: Address,
    /// Session able to sign for this user
    pub wallet: Arc<InAppWallet>,
}

impl fmt::Debug for AuthenticatedUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticatedUser")
            .field("auth_details", &self.auth_details)
            .field("wallet_address", &self.wallet_address)
            .finish_non_exhaustive()
    }
}

/// Lifecycle state of the user's wallet
#[derive(Debug, Clone)]
pub enum WalletStatus {
    /// No session
    LoggedOut,
    /// Authenticated, no wallet key material on this device
    LoggedInWalletUninitialized {
        /// User details
        user: UserDetails,
    },
    /// Authenticated, wallet exists, device share missing
    LoggedInNewDevice {
        /// User details
        user: UserDetails,
    },
    /// Authenticated, wallet usable
    LoggedInWalletInitialized(AuthenticatedUser),
}

impl WalletStatus {
    /// Status tag of this state
    pub fn tag(&self) -> UserWalletStatus {
        match self {
            WalletStatus::LoggedOut => UserWalletStatus::LoggedOut,
            WalletStatus::LoggedInWalletUninitialized { .. } => {
                UserWalletStatus::LoggedInWalletUninitialized
            }
            WalletStatus::LoggedInNewDevice { .. } => UserWalletStatus::LoggedInNewDevice,
            WalletStatus::LoggedInWalletInitialized(_) => UserWalletStatus::LoggedInWalletInitialized,
        }
    }

    /// The signer-capable user, only in the initialized state
    pub fn authenticated_user(&self) -> Option<&AuthenticatedUser> {
        match self {
            WalletStatus::LoggedInWalletInitialized(user) => Some(user),
            _ => None,
        }
    }

    /// Consume into the signer-capable user
    pub fn into_authenticated_user(self) -> Option<AuthenticatedUser> {
        match self {
            WalletStatus::LoggedInWalletInitialized(user) => Some(user),
            _ => None,
        }
    }

    /// Map a raw response. A new device is reported as uninitialized: the
    /// device must be set up again before it can sign.
    pub(crate) fn from_response(
        response: UserStatusResponse,
        wallet: &Arc<InAppWallet>,
    ) -> Result<Self, WalletError> {
        let UserStatusResponse { status, user } = response;
        let require_user = || {
            WalletError::Serialization(format!("getUserStatus response for {:?} has no user", status))
        };

        Ok(match status {
            UserWalletStatus::LoggedOut => WalletStatus::LoggedOut,
            UserWalletStatus::LoggedInWalletUninitialized | UserWalletStatus::LoggedInNewDevice => {
                WalletStatus::LoggedInWalletUninitialized {
                    user: user.ok_or_else(require_user)?,
                }
            }
            UserWalletStatus::LoggedInWalletInitialized => {
                let user = user.ok_or_else(require_user)?;
                let wallet_address = user.wallet_address.ok_or_else(|| {
                    WalletError::Serialization(
                        "getUserStatus response has no walletAddress".to_string(),
                    )
                })?;
                WalletStatus::LoggedInWalletInitialized(AuthenticatedUser {
                    auth_details: user.auth_details,
                    wallet_address,
                    wallet: Arc::clone(wallet),
                })
            }
        })
    }
}
