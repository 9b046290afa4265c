//! In-app wallet session

use inapp_primitives::Address;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::account::{Account, AddressResponse};
use crate::auth::{AuthArgs, AuthLoginResult, PreAuthArgs};
use crate::bridge::{call_typed, Bridge, Procedure};
use crate::broadcast::ChainRpc;
use crate::status::{UserStatusResponse, WalletStatus};
use crate::storage::DeviceShareStorage;
use crate::types::SetUpWalletResult;
use crate::{WalletConfig, WalletError};

/// Session bound to one client: owns the bridge to the signer and the
/// collaborators signing operations need.
///
/// Usually obtained from [`SessionRegistry`](crate::SessionRegistry), which
/// creates one per client.
pub struct InAppWallet {
    client_id: String,
    bridge: Arc<dyn Bridge>,
    chain_rpc: Arc<dyn ChainRpc>,
    storage: DeviceShareStorage,
    config: Arc<WalletConfig>,
}

impl InAppWallet {
    /// Assemble a session from its collaborators
    pub fn new(
        client_id: &str,
        bridge: Arc<dyn Bridge>,
        chain_rpc: Arc<dyn ChainRpc>,
        storage: DeviceShareStorage,
        config: Arc<WalletConfig>,
    ) -> Self {
        Self {
            client_id: client_id.to_string(),
            bridge,
            chain_rpc,
            storage,
            config,
        }
    }

    /// Client id this session belongs to
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Local device-share storage
    pub fn storage(&self) -> &DeviceShareStorage {
        &self.storage
    }

    /// Configuration
    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    // ==================== Status ====================

    /// Resolve the wallet status with a single `getUserStatus` call.
    ///
    /// Only [`WalletStatus::LoggedInWalletInitialized`] hands back a session
    /// handle usable for signing.
    pub async fn get_user_wallet_status(self: &Arc<Self>) -> Result<WalletStatus, WalletError> {
        let response: UserStatusResponse =
            call_typed(self.bridge.as_ref(), Procedure::GetUserStatus, Value::Null).await?;
        tracing::debug!(client_id = %self.client_id, status = ?response.status, "user status");
        WalletStatus::from_response(response, self)
    }

    // ==================== Authentication ====================

    /// Log in with the given strategy
    pub async fn authenticate(&self, args: &AuthArgs) -> Result<AuthLoginResult, WalletError> {
        let (procedure, params) = args.to_request();
        tracing::info!(client_id = %self.client_id, strategy = %args.strategy(), "authenticating");
        call_typed(self.bridge.as_ref(), procedure, params).await
    }

    /// Run the pre-authentication step (sending a one-time code).
    ///
    /// Fails without contacting the signer for strategies that have no such step.
    pub async fn pre_authenticate(&self, args: &PreAuthArgs) -> Result<Value, WalletError> {
        let (procedure, params) = args.to_request()?;
        tracing::info!(client_id = %self.client_id, strategy = %args.strategy, "pre-authenticating");
        self.bridge.call(procedure, params).await
    }

    // ==================== Wallet management ====================

    /// Persist the device share locally unless the signer stores it, then
    /// return the wallet address
    pub fn post_wallet_set_up(
        &self,
        setup: SetUpWalletResult,
        wallet_user_id: &str,
    ) -> Result<Address, WalletError> {
        if !setup.is_iframe_storage_enabled {
            self.storage
                .save_device_share(&setup.device_share_stored, wallet_user_id)?;
        }
        Ok(setup.wallet_address)
    }

    /// Provision a wallet for a freshly authenticated user
    pub async fn create_wallet(&self, wallet_user_id: &str) -> Result<Address, WalletError> {
        let setup: SetUpWalletResult =
            call_typed(self.bridge.as_ref(), Procedure::CreateWallet, Value::Null).await?;
        tracing::info!(client_id = %self.client_id, address = %setup.wallet_address, "wallet created");
        self.post_wallet_set_up(setup, wallet_user_id)
    }

    /// Restore the device share on a device the wallet has not been used on
    pub async fn set_up_new_device(&self, wallet_user_id: &str) -> Result<Address, WalletError> {
        let setup: SetUpWalletResult =
            call_typed(self.bridge.as_ref(), Procedure::SetUpNewDevice, Value::Null).await?;
        tracing::info!(client_id = %self.client_id, address = %setup.wallet_address, "device set up");
        self.post_wallet_set_up(setup, wallet_user_id)
    }

    // ==================== Signing ====================

    /// Signer facade for the logged in wallet.
    ///
    /// Expects the session to be in the initialized state; the signer rejects
    /// the calls otherwise.
    pub async fn get_account(&self) -> Result<Account, WalletError> {
        let AddressResponse { address } =
            call_typed(self.bridge.as_ref(), Procedure::GetAddress, Value::Null).await?;
        Ok(Account::new(
            address,
            Arc::clone(&self.bridge),
            Arc::clone(&self.chain_rpc),
            Arc::clone(&self.config),
        ))
    }
}

impl fmt::Debug for InAppWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InAppWallet")
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}
