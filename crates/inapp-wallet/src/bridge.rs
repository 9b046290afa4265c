//! Remote procedure bridge to the isolated signer context

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::client::Client;
use crate::WalletError;

/// Named procedures exposed by the signer context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Procedure {
    /// Query the session's wallet status
    GetUserStatus,
    /// Wallet address of the logged in user
    GetAddress,
    /// Personal message signature
    SignMessage,
    /// Transaction signature
    SignTransaction,
    /// EIP-712 typed data signature
    SignTypedDataV4,
    /// Provision a new wallet
    CreateWallet,
    /// Recover the device share on a new device
    SetUpNewDevice,
    /// `CreateWallet` with the signer's own UI
    CreateWalletUi,
    /// `SetUpNewDevice` with the signer's own UI
    SetUpNewDeviceUi,
    /// Send a one-time code by email
    SendEmailLoginOtp,
    /// Verify an emailed one-time code
    VerifyEmailLoginOtp,
    /// Popup based OAuth login
    LoginWithOauth,
    /// Login with a developer issued JWT
    LoginWithCustomJwt,
    /// Login with a developer hosted auth endpoint
    LoginWithCustomAuthEndpoint,
    /// Email one-time code flow rendered by the signer
    LoginWithEmailOtp,
    /// Full login modal rendered by the signer
    LoginWithModal,
}

impl Procedure {
    /// Wire name of the procedure
    pub fn as_str(&self) -> &'static str {
        match self {
            Procedure::GetUserStatus => "getUserStatus",
            Procedure::GetAddress => "getAddress",
            Procedure::SignMessage => "signMessage",
            Procedure::SignTransaction => "signTransaction",
            Procedure::SignTypedDataV4 => "signTypedDataV4",
            Procedure::CreateWallet => "createWallet",
            Procedure::SetUpNewDevice => "setUpNewDevice",
            Procedure::CreateWalletUi => "createWalletUi",
            Procedure::SetUpNewDeviceUi => "setUpNewDeviceUi",
            Procedure::SendEmailLoginOtp => "sendEmailLoginOtp",
            Procedure::VerifyEmailLoginOtp => "verifyEmailLoginOtp",
            Procedure::LoginWithOauth => "loginWithOauth",
            Procedure::LoginWithCustomJwt => "loginWithCustomJwt",
            Procedure::LoginWithCustomAuthEndpoint => "loginWithCustomAuthEndpoint",
            Procedure::LoginWithEmailOtp => "loginWithEmailOtp",
            Procedure::LoginWithModal => "loginWithModal",
        }
    }
}

impl fmt::Display for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request/response channel to the signer context (object-safe).
///
/// One request yields one response or one failure. Implementations report a
/// failure signalled by the remote side as [`WalletError::Remote`] and a
/// broken channel as [`WalletError::Transport`].
#[async_trait]
pub trait Bridge: Send + Sync {
    /// Invoke a procedure; `params` is `Value::Null` for procedures without arguments
    async fn call(&self, procedure: Procedure, params: Value) -> Result<Value, WalletError>;
}

/// Opens a bridge for a client. Called once per client by the session registry.
#[async_trait]
pub trait BridgeConnector: Send + Sync {
    /// Open a bridge scoped to `client`
    async fn connect(&self, client: &Client) -> Result<Arc<dyn Bridge>, WalletError>;
}

/// Call a procedure and deserialize its response
pub async fn call_typed<T: DeserializeOwned>(
    bridge: &dyn Bridge,
    procedure: Procedure,
    params: Value,
) -> Result<T, WalletError> {
    tracing::debug!(procedure = %procedure, "bridge call");
    let value = bridge.call(procedure, params).await?;
    serde_json::from_value(value).map_err(|e| {
        WalletError::Serialization(format!("{} response: {}", procedure, e))
    })
}

/// Scripted response of a [`MockBridge`]
#[derive(Debug, Clone)]
enum Scripted {
    Ok(Value),
    Err(String),
}

/// Mock bridge for testing.
///
/// Answers from scripted responses and records every call it receives.
/// Procedures without a scripted response fail as a remote error.
#[derive(Default)]
pub struct MockBridge {
    responses: Mutex<HashMap<Procedure, Scripted>>,
    calls: Mutex<Vec<(Procedure, Value)>>,
}

impl MockBridge {
    /// Create a mock bridge with no scripted responses
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock bridge for a wallet that is logged in and initialized
    pub fn logged_in(address: &str) -> Self {
        let bridge = Self::new();
        bridge.set_response(
            Procedure::GetUserStatus,
            serde_json::json!({
                "status": "Logged In, Wallet Initialized",
                "user": {
                    "authDetails": { "email": "user@example.com", "userWalletId": "wallet-user-1" },
                    "walletAddress": address,
                },
            }),
        );
        bridge.set_response(Procedure::GetAddress, serde_json::json!({ "address": address }));
        bridge
    }

    /// Set the response for a procedure
    pub fn set_response(&self, procedure: Procedure, response: Value) {
        self.responses.lock().insert(procedure, Scripted::Ok(response));
    }

    /// Make a procedure fail on the remote side
    pub fn set_error(&self, procedure: Procedure, message: &str) {
        self.responses.lock().insert(procedure, Scripted::Err(message.to_string()));
    }

    /// All calls received so far, in order
    pub fn calls(&self) -> Vec<(Procedure, Value)> {
        self.calls.lock().clone()
    }

    /// Parameters of the most recent call to `procedure`
    pub fn last_params(&self, procedure: Procedure) -> Option<Value> {
        self.calls()
            .into_iter()
            .rev()
            .find(|(p, _)| *p == procedure)
            .map(|(_, params)| params)
    }

    /// Number of calls received
    pub fn call_count(&self) -> usize {
        self.calls().len()
    }
}

#[async_trait]
impl Bridge for MockBridge {
    async fn call(&self, procedure: Procedure, params: Value) -> Result<Value, WalletError> {
        self.calls.lock().push((procedure, params));

        let scripted = self.responses.lock().get(&procedure).cloned();

        match scripted {
            Some(Scripted::Ok(value)) => Ok(value),
            Some(Scripted::Err(message)) => Err(WalletError::Remote { procedure, message }),
            None => Err(WalletError::Remote {
                procedure,
                message: format!("Procedure not found: {}", procedure),
            }),
        }
    }
}

/// Connector handing out one shared bridge to every client
pub struct StaticConnector {
    bridge: Arc<dyn Bridge>,
}

impl StaticConnector {
    /// Wrap an existing bridge
    pub fn new(bridge: Arc<dyn Bridge>) -> Self {
        Self { bridge }
    }
}

#[async_trait]
impl BridgeConnector for StaticConnector {
    async fn connect(&self, client: &Client) -> Result<Arc<dyn Bridge>, WalletError> {
        tracing::debug!(client_id = %client.client_id(), "connecting static bridge");
        Ok(Arc::clone(&self.bridge))
    }
}
