//! Per-client session registry

use dashmap::DashMap;
use serde_json::Value;
use std::sync::{Arc, Weak};
use tokio::sync::OnceCell;

use crate::auth::{AuthArgs, AuthLoginResult, PreAuthArgs};
use crate::bridge::BridgeConnector;
use crate::broadcast::ChainRpc;
use crate::client::Client;
use crate::status::{AuthenticatedUser, WalletStatus};
use crate::storage::{DeviceShareStorage, FileStore, KeyValueStore, MemoryStore};
use crate::wallet::InAppWallet;
use crate::{WalletConfig, WalletError};

/// Registry slot. Holds the client weakly so the registry never keeps a
/// client alive; the weak handle also pins the allocation address used as key.
struct SessionSlot {
    identity: Weak<Client>,
    session: Arc<OnceCell<Arc<InAppWallet>>>,
}

impl SessionSlot {
    fn new(client: &Arc<Client>) -> Self {
        Self {
            identity: Arc::downgrade(client),
            session: Arc::new(OnceCell::new()),
        }
    }

    fn is_live(&self) -> bool {
        self.identity.strong_count() > 0
    }
}

/// Map from client identity to its wallet session.
///
/// A session is built on first use and reused afterwards. Concurrent first
/// uses of one client share a single construction. Entries of dropped
/// clients are discarded when a new client is registered or on
/// [`SessionRegistry::prune`].
pub struct SessionRegistry {
    sessions: DashMap<usize, SessionSlot>,
    connector: Arc<dyn BridgeConnector>,
    store: Arc<dyn KeyValueStore>,
    chain_rpc: Option<Arc<dyn ChainRpc>>,
    config: Arc<WalletConfig>,
}

fn identity_key(client: &Arc<Client>) -> usize {
    Arc::as_ptr(client) as usize
}

impl SessionRegistry {
    /// Create a registry with in-memory storage and default config
    pub fn new(connector: Arc<dyn BridgeConnector>) -> Self {
        Self {
            sessions: DashMap::new(),
            connector,
            store: Arc::new(MemoryStore::new()),
            chain_rpc: None,
            config: Arc::new(WalletConfig::default()),
        }
    }

    /// Use `config` for sessions created from now on
    pub fn with_config(mut self, config: WalletConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    /// Persist device shares in `store`
    pub fn with_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = store;
        self
    }

    /// Persist device shares on disk, in the configured storage directory
    pub fn with_file_store(self) -> Result<Self, WalletError> {
        let dir = self
            .config
            .storage_dir()
            .ok_or_else(|| WalletError::Config("cannot determine storage directory".to_string()))?;
        let store = FileStore::open(dir)?;
        Ok(self.with_store(Arc::new(store)))
    }

    /// Broadcast through `chain_rpc` instead of the configured HTTP endpoints
    pub fn with_chain_rpc(mut self, chain_rpc: Arc<dyn ChainRpc>) -> Self {
        self.chain_rpc = Some(chain_rpc);
        self
    }

    /// Configuration
    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    /// Session of `client`, creating it on first use.
    ///
    /// A failed construction is not cached; the next call tries again.
    pub async fn get_or_create(&self, client: &Arc<Client>) -> Result<Arc<InAppWallet>, WalletError> {
        let cell = self.slot(client);
        let session = cell.get_or_try_init(|| self.create_session(client)).await?;
        Ok(Arc::clone(session))
    }

    /// Session of `client` if one has been created
    pub fn get(&self, client: &Arc<Client>) -> Option<Arc<InAppWallet>> {
        self.sessions
            .get(&identity_key(client))
            .filter(|slot| slot.is_live())
            .and_then(|slot| slot.session.get().cloned())
    }

    /// Drop the session of `client`, returning whether one existed
    pub fn close_session(&self, client: &Arc<Client>) -> bool {
        let removed = self.sessions.remove(&identity_key(client)).is_some();
        if removed {
            tracing::debug!(client_id = %client.client_id(), "session closed");
        }
        removed
    }

    /// Discard entries whose client has been dropped
    pub fn prune(&self) {
        self.sessions.retain(|_, slot| slot.is_live());
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.sessions.iter().filter(|slot| slot.is_live()).count()
    }

    /// Whether there are no live entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, client: &Arc<Client>) -> Arc<OnceCell<Arc<InAppWallet>>> {
        let key = identity_key(client);
        if let Some(slot) = self.sessions.get(&key) {
            return Arc::clone(&slot.session);
        }

        // New identity: clear out dead entries before adding one.
        self.prune();
        let entry = self
            .sessions
            .entry(key)
            .or_insert_with(|| SessionSlot::new(client));
        Arc::clone(&entry.session)
    }

    async fn create_session(&self, client: &Arc<Client>) -> Result<Arc<InAppWallet>, WalletError> {
        tracing::info!(client_id = %client.client_id(), "creating in-app wallet session");
        let bridge = self.connector.connect(client).await?;
        let chain_rpc = self.chain_rpc_for(client)?;
        let storage = DeviceShareStorage::new(client.client_id(), Arc::clone(&self.store));
        Ok(Arc::new(InAppWallet::new(
            client.client_id(),
            bridge,
            chain_rpc,
            storage,
            Arc::clone(&self.config),
        )))
    }

    #[cfg(feature = "http")]
    fn chain_rpc_for(&self, client: &Client) -> Result<Arc<dyn ChainRpc>, WalletError> {
        Ok(match &self.chain_rpc {
            Some(rpc) => Arc::clone(rpc),
            None => Arc::new(crate::broadcast::HttpChainRpc::new((*self.config).clone(), client)),
        })
    }

    #[cfg(not(feature = "http"))]
    fn chain_rpc_for(&self, _client: &Client) -> Result<Arc<dyn ChainRpc>, WalletError> {
        self.chain_rpc
            .clone()
            .ok_or_else(|| WalletError::Config("no chain RPC configured".to_string()))
    }

    // ==================== Convenience ====================

    /// Log `client` in
    pub async fn authenticate(
        &self,
        client: &Arc<Client>,
        args: &AuthArgs,
    ) -> Result<AuthLoginResult, WalletError> {
        self.get_or_create(client).await?.authenticate(args).await
    }

    /// Run the pre-authentication step for `client`.
    ///
    /// Strategies without such a step are rejected before a session is created.
    pub async fn pre_authenticate(
        &self,
        client: &Arc<Client>,
        args: &PreAuthArgs,
    ) -> Result<Value, WalletError> {
        args.to_request()?;
        self.get_or_create(client).await?.pre_authenticate(args).await
    }

    /// Wallet status of `client`
    pub async fn get_user_wallet_status(&self, client: &Arc<Client>) -> Result<WalletStatus, WalletError> {
        self.get_or_create(client).await?.get_user_wallet_status().await
    }

    /// The logged in user, when their wallet is initialized
    pub async fn get_authenticated_user(
        &self,
        client: &Arc<Client>,
    ) -> Result<Option<AuthenticatedUser>, WalletError> {
        Ok(self
            .get_user_wallet_status(client)
            .await?
            .into_authenticated_user())
    }

    /// Email of the logged in user, when their wallet is initialized
    pub async fn get_user_email(&self, client: &Arc<Client>) -> Result<Option<String>, WalletError> {
        Ok(self
            .get_authenticated_user(client)
            .await?
            .and_then(|user| user.auth_details.email))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{MockBridge, StaticConnector};
    use crate::broadcast::MockChainRpc;

    fn registry() -> SessionRegistry {
        SessionRegistry::new(Arc::new(StaticConnector::new(Arc::new(MockBridge::new()))))
            .with_chain_rpc(Arc::new(MockChainRpc::default()))
    }

    #[tokio::test]
    async fn test_same_client_same_session() {
        let registry = registry();
        let client = Client::new("client-1");
        let first = registry.get_or_create(&client).await.unwrap();
        let second = registry.get_or_create(&client).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_dropped_client_is_pruned() {
        let registry = registry();
        let client = Client::new("client-1");
        registry.get_or_create(&client).await.unwrap();
        assert_eq!(registry.len(), 1);

        drop(client);
        assert!(registry.is_empty());
        registry.prune();
        assert!(registry.sessions.is_empty());
    }

    #[tokio::test]
    async fn test_dead_entries_pruned_only_on_new_client() {
        let registry = registry();
        let kept = Client::new("kept");
        let dropped = Client::new("dropped");
        registry.get_or_create(&kept).await.unwrap();
        registry.get_or_create(&dropped).await.unwrap();
        drop(dropped);

        registry.get_or_create(&kept).await.unwrap();
        assert_eq!(registry.sessions.len(), 2);

        let fresh = Client::new("fresh");
        registry.get_or_create(&fresh).await.unwrap();
        assert_eq!(registry.sessions.len(), 2);
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_close_session() {
        let registry = registry();
        let client = Client::new("client-1");
        let first = registry.get_or_create(&client).await.unwrap();
        assert!(registry.get(&client).is_some());

        assert!(registry.close_session(&client));
        assert!(!registry.close_session(&client));
        assert!(registry.get(&client).is_none());

        let second = registry.get_or_create(&client).await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_file_store_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = WalletConfig {
            storage_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let registry = registry().with_config(config).with_file_store().unwrap();
        let client = Client::new("client-1");
        let wallet = registry.get_or_create(&client).await.unwrap();
        wallet.storage().save_device_share("share", "user-1").unwrap();
        assert!(dir.path().join(FileStore::FILE_NAME).exists());
    }
}
