//! Caller identity

use std::fmt;
use std::sync::Arc;

/// SDK caller context.
///
/// Sessions are keyed by the identity of the `Arc<Client>` allocation, not by
/// value: two clients with the same id get separate sessions.
pub struct Client {
    client_id: String,
    secret_key: Option<String>,
}

impl Client {
    /// Create a shared client handle
    pub fn new(client_id: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            client_id: client_id.into(),
            secret_key: None,
        })
    }

    /// Create a shared client handle for server-side use
    pub fn with_secret_key(client_id: impl Into<String>, secret_key: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            client_id: client_id.into(),
            secret_key: Some(secret_key.into()),
        })
    }

    /// Client id
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Secret key, if any
    pub fn secret_key(&self) -> Option<&str> {
        self.secret_key.as_deref()
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}
