//! Client configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use inapp_primitives::ChainId;

use crate::WalletError;

/// Placeholder substituted with the chain id in [`WalletConfig::rpc_endpoint_template`]
pub const CHAIN_ID_PLACEHOLDER: &str = "{chain_id}";

/// Wallet client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletConfig {
    /// RPC endpoint template, `{chain_id}` is replaced per request
    #[serde(default = "default_rpc_endpoint_template")]
    pub rpc_endpoint_template: String,
    /// Chain id used for typed data whose domain carries none
    #[serde(default = "default_chain_id")]
    pub default_chain_id: ChainId,
    /// Chain id sent along with personal message signatures
    #[serde(default = "default_chain_id")]
    pub message_chain_id: ChainId,
    /// Directory of the file-backed local store
    #[serde(default)]
    pub storage_dir: Option<PathBuf>,
}

fn default_rpc_endpoint_template() -> String {
    format!("https://{}.rpc.thirdweb.com", CHAIN_ID_PLACEHOLDER)
}

fn default_chain_id() -> ChainId {
    1
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            rpc_endpoint_template: default_rpc_endpoint_template(),
            default_chain_id: default_chain_id(),
            message_chain_id: default_chain_id(),
            storage_dir: None,
        }
    }
}

impl WalletConfig {
    /// Get the config directory path
    pub fn config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".inapp-wallet"))
    }

    /// Get the default storage directory
    pub fn default_storage_dir() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("storage"))
    }

    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, WalletError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, WalletError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| WalletError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Load config from `path` when it exists, otherwise return the default
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, WalletError> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!("No config at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Check that the endpoint template can be rendered
    pub fn validate(&self) -> Result<(), WalletError> {
        if !self.rpc_endpoint_template.contains(CHAIN_ID_PLACEHOLDER) {
            return Err(WalletError::Config(format!(
                "rpc_endpoint_template must contain {}",
                CHAIN_ID_PLACEHOLDER
            )));
        }
        if self.default_chain_id == 0 {
            return Err(WalletError::Config("default_chain_id must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Render the RPC endpoint for a chain
    pub fn rpc_endpoint(&self, chain_id: ChainId) -> String {
        self.rpc_endpoint_template
            .replace(CHAIN_ID_PLACEHOLDER, &chain_id.to_string())
    }

    /// Get the storage directory, using default if not configured
    pub fn storage_dir(&self) -> Option<PathBuf> {
        self.storage_dir.clone().or_else(Self::default_storage_dir)
    }
}
