//! Submission of signed transactions to a chain RPC

use async_trait::async_trait;
use inapp_primitives::{ChainId, TxHash};
use parking_lot::Mutex;

use crate::WalletError;

/// Chain RPC client able to submit raw signed transactions (object-safe)
#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// Submit RLP-encoded signed transaction bytes to `chain_id`
    async fn send_raw_transaction(&self, chain_id: ChainId, raw: &[u8]) -> Result<TxHash, WalletError>;
}

/// Encode raw bytes as `0x`-prefixed hex
pub fn to_hex_data(raw: &[u8]) -> String {
    format!("0x{}", hex::encode(raw))
}

/// Mock chain RPC for testing
pub struct MockChainRpc {
    result: Mutex<Result<TxHash, (i64, String)>>,
    sent: Mutex<Vec<(ChainId, Vec<u8>)>>,
}

impl MockChainRpc {
    /// Create a mock that accepts every transaction and returns `hash`
    pub fn new(hash: TxHash) -> Self {
        Self {
            result: Mutex::new(Ok(hash)),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Make every later submission fail with a JSON-RPC error
    pub fn fail_with(&self, code: i64, message: &str) {
        *self.result.lock() = Err((code, message.to_string()));
    }

    /// Transactions submitted so far
    pub fn sent(&self) -> Vec<(ChainId, Vec<u8>)> {
        self.sent.lock().clone()
    }
}

impl Default for MockChainRpc {
    fn default() -> Self {
        Self::new(TxHash::ZERO)
    }
}

#[async_trait]
impl ChainRpc for MockChainRpc {
    async fn send_raw_transaction(&self, chain_id: ChainId, raw: &[u8]) -> Result<TxHash, WalletError> {
        self.sent.lock().push((chain_id, raw.to_vec()));

        let result = self.result.lock().clone();
        result.map_err(|(code, message)| WalletError::Rpc { code, message })
    }
}

/// HTTP JSON-RPC client resolving one endpoint per chain
#[cfg(feature = "http")]
pub struct HttpChainRpc {
    client: reqwest::Client,
    config: crate::WalletConfig,
    client_id: String,
    secret_key: Option<String>,
    request_id: std::sync::atomic::AtomicU64,
}

#[cfg(feature = "http")]
impl HttpChainRpc {
    /// Create a new HTTP chain RPC client.
    ///
    /// Requests carry the client id in `x-client-id`, and the secret key in
    /// `x-secret-key` when the client has one.
    pub fn new(config: crate::WalletConfig, client: &crate::Client) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            client_id: client.client_id().to_string(),
            secret_key: client.secret_key().map(str::to_string),
            request_id: std::sync::atomic::AtomicU64::new(1),
        }
    }

    fn post(&self, url: &str, body: &serde_json::Value) -> reqwest::RequestBuilder {
        let request = self
            .client
            .post(url)
            .header("x-client-id", &self.client_id)
            .json(body);
        match &self.secret_key {
            Some(secret_key) => request.header("x-secret-key", secret_key),
            None => request,
        }
    }

    fn next_id(&self) -> u64 {
        self.request_id
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl ChainRpc for HttpChainRpc {
    async fn send_raw_transaction(&self, chain_id: ChainId, raw: &[u8]) -> Result<TxHash, WalletError> {
        let url = self.config.rpc_endpoint(chain_id);
        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "id": self.next_id(),
            "method": "eth_sendRawTransaction",
            "params": [to_hex_data(raw)],
        });

        tracing::info!(chain_id, %url, "broadcasting signed transaction");

        let response = self
            .post(&url, &request)
            .send()
            .await
            .map_err(|e| WalletError::Broadcast(e.to_string()))?;

        let response: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| WalletError::Broadcast(e.to_string()))?;

        if let Some(error) = response.error {
            tracing::warn!(chain_id, code = error.code, "broadcast rejected: {}", error.message);
            return Err(WalletError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        let hash = response.result.ok_or_else(|| WalletError::Rpc {
            code: -32603,
            message: "No result in response".to_string(),
        })?;
        Ok(TxHash::from_hex(&hash)?)
    }
}

#[cfg(feature = "http")]
#[derive(serde::Deserialize)]
struct JsonRpcResponse {
    result: Option<String>,
    error: Option<JsonRpcError>,
}

#[cfg(feature = "http")]
#[derive(serde::Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}
