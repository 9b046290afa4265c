//! Local key-value persistence for device key shares

use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::WalletError;

/// String key-value store
pub trait KeyValueStore: Send + Sync {
    /// Read a value
    fn get(&self, key: &str) -> Result<Option<String>, WalletError>;
    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<(), WalletError>;
    /// Delete a value, returning whether it existed
    fn remove(&self, key: &str) -> Result<bool, WalletError>;
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, WalletError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), WalletError> {
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, WalletError> {
        Ok(self.entries.write().remove(key).is_some())
    }
}

/// Store persisted as a single JSON object on disk.
///
/// Every write rewrites the file through a temporary sibling and a rename.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    /// File name used inside the storage directory
    pub const FILE_NAME: &'static str = "local-storage.json";

    /// Open (or lazily create) the store inside `dir`
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, WalletError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            path: dir.join(Self::FILE_NAME),
            lock: Mutex::new(()),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, WalletError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content)
            .map_err(|e| WalletError::Storage(format!("{}: {}", self.path.display(), e)))
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), WalletError> {
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, WalletError> {
        let _guard = self.lock.lock();
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), WalletError> {
        let _guard = self.lock.lock();
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> Result<bool, WalletError> {
        let _guard = self.lock.lock();
        let mut entries = self.read_all()?;
        let existed = entries.remove(key).is_some();
        if existed {
            self.write_all(&entries)?;
        }
        Ok(existed)
    }
}

/// Device key-share storage scoped to one client id
#[derive(Clone)]
pub struct DeviceShareStorage {
    client_id: String,
    store: Arc<dyn KeyValueStore>,
}

impl DeviceShareStorage {
    /// Scope `store` to `client_id`
    pub fn new(client_id: &str, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            client_id: client_id.to_string(),
            store,
        }
    }

    /// Storage key of a user's device share
    pub fn device_share_key(&self, wallet_user_id: &str) -> String {
        format!("a-{}-{}", self.client_id, wallet_user_id)
    }

    /// Persist the device share of `wallet_user_id`
    pub fn save_device_share(&self, device_share: &str, wallet_user_id: &str) -> Result<(), WalletError> {
        tracing::debug!(client_id = %self.client_id, wallet_user_id, "saving device share");
        self.store
            .set(&self.device_share_key(wallet_user_id), device_share)
    }

    /// Load the device share of `wallet_user_id`
    pub fn get_device_share(&self, wallet_user_id: &str) -> Result<Option<String>, WalletError> {
        self.store.get(&self.device_share_key(wallet_user_id))
    }

    /// Delete the device share of `wallet_user_id`
    pub fn remove_device_share(&self, wallet_user_id: &str) -> Result<bool, WalletError> {
        self.store.remove(&self.device_share_key(wallet_user_id))
    }
}

impl std::fmt::Debug for DeviceShareStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceShareStorage")
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}
