//! # inapp-primitives
//!
//! Primitive value types shared by the in-app wallet client.
//!
//! Addresses and hashes travel across the signer bridge and the chain RPC as
//! `0x`-prefixed hex strings, so every type here serializes that way.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod address;
mod error;
mod hash;

pub use address::{Address, AddressError};
pub use error::PrimitiveError;
pub use hash::{HashError, TxHash, H256};

// Re-export primitive-types for U256
pub use primitive_types::U256;

/// Chain identifier (EIP-155)
pub type ChainId = u64;

/// Strip an optional `0x`/`0X` prefix from a hex string.
pub fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}
