//! Wallet client error types

use thiserror::Error;

use crate::bridge::Procedure;

/// Broad classification of a [`WalletError`].
///
/// Callers decide on retry policy from this; the client itself never retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller passed something the operation cannot accept. Raised before
    /// any remote call is made.
    CallerMisuse,
    /// The signer bridge reported a failure, or could not be reached.
    RemoteProcedure,
    /// Submitting a signed transaction to the chain RPC failed.
    Broadcast,
    /// Local failure: decoding a response, storage, configuration.
    Internal,
}

/// Wallet client error type
#[derive(Debug, Error)]
pub enum WalletError {
    /// Transaction to sign has no chain id
    #[error("chainId required in tx to sign")]
    MissingChainId,

    /// Strategy has no pre-authentication step
    #[error("Provider: {0} doesnt require pre-authentication")]
    NoPreAuthentication(String),

    /// Strategy tag outside the supported set
    #[error("Invalid param: {0}")]
    UnknownStrategy(String),

    /// Missing required field
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// The remote side of the bridge rejected the call
    #[error("Remote procedure {procedure} failed: {message}")]
    Remote {
        /// Procedure that failed
        procedure: Procedure,
        /// Message reported by the remote side
        message: String,
    },

    /// The bridge channel itself failed
    #[error("Bridge transport error: {0}")]
    Transport(String),

    /// Broadcast request could not be delivered
    #[error("Broadcast failed: {0}")]
    Broadcast(String),

    /// JSON-RPC error returned by the chain RPC
    #[error("RPC error: {code} - {message}")]
    Rpc {
        /// Error code
        code: i64,
        /// Error message
        message: String,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid hex string
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    /// Local storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Malformed address or hash in a response
    #[error("Primitive error: {0}")]
    Primitive(#[from] inapp_primitives::PrimitiveError),
}

impl WalletError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            WalletError::MissingChainId
            | WalletError::NoPreAuthentication(_)
            | WalletError::UnknownStrategy(_)
            | WalletError::MissingField(_) => ErrorKind::CallerMisuse,
            WalletError::Remote { .. } | WalletError::Transport(_) => ErrorKind::RemoteProcedure,
            WalletError::Broadcast(_) | WalletError::Rpc { .. } => ErrorKind::Broadcast,
            WalletError::Serialization(_)
            | WalletError::InvalidHex(_)
            | WalletError::Storage(_)
            | WalletError::Config(_)
            | WalletError::Primitive(_) => ErrorKind::Internal,
        }
    }

    /// Whether this error was raised locally because of a bad argument
    pub fn is_caller_misuse(&self) -> bool {
        self.kind() == ErrorKind::CallerMisuse
    }
}

impl From<hex::FromHexError> for WalletError {
    fn from(e: hex::FromHexError) -> Self {
        WalletError::InvalidHex(e.to_string())
    }
}

impl From<serde_json::Error> for WalletError {
    fn from(e: serde_json::Error) -> Self {
        WalletError::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for WalletError {
    fn from(e: std::io::Error) -> Self {
        WalletError::Storage(e.to_string())
    }
}

impl From<toml::de::Error> for WalletError {
    fn from(e: toml::de::Error) -> Self {
        WalletError::Config(e.to_string())
    }
}

impl From<inapp_primitives::AddressError> for WalletError {
    fn from(e: inapp_primitives::AddressError) -> Self {
        WalletError::Primitive(e.into())
    }
}

impl From<inapp_primitives::HashError> for WalletError {
    fn from(e: inapp_primitives::HashError) -> Self {
        WalletError::Primitive(e.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(WalletError::MissingChainId.kind(), ErrorKind::CallerMisuse);
        assert_eq!(
            WalletError::NoPreAuthentication("apple".into()).kind(),
            ErrorKind::CallerMisuse
        );
        assert_eq!(
            WalletError::Remote {
                procedure: Procedure::GetAddress,
                message: "boom".into(),
            }
            .kind(),
            ErrorKind::RemoteProcedure
        );
        assert_eq!(
            WalletError::Rpc { code: -32000, message: "nonce too low".into() }.kind(),
            ErrorKind::Broadcast
        );
        assert_eq!(WalletError::Storage("disk".into()).kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            WalletError::NoPreAuthentication("google".into()).to_string(),
            "Provider: google doesnt require pre-authentication"
        );
        assert_eq!(
            WalletError::Remote {
                procedure: Procedure::VerifyEmailLoginOtp,
                message: "invalid otp".into(),
            }
            .to_string(),
            "Remote procedure verifyEmailLoginOtp failed: invalid otp"
        );
    }
}
