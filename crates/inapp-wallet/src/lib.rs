//! # inapp-wallet
//!
//! Session, authentication and signing client for in-app (embedded) wallets
//! whose keys live in an isolated signer context reached over a
//! request/response bridge.
//!
//! ## Features
//!
//! - **SessionRegistry**: one lazily created session per client
//! - **InAppWallet**: wallet status, login strategies, wallet set-up
//! - **Account**: address, message/typed-data/transaction signing and sending
//! - **Bridge**: the channel to the signer, with a scriptable `MockBridge`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use inapp_wallet::{
//!     AuthArgs, Client, MockBridge, PreAuthArgs, SessionRegistry, StaticConnector,
//!     TransactionRequest, WalletStatus, U256,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bridge = Arc::new(MockBridge::new());
//!     let registry = SessionRegistry::new(Arc::new(StaticConnector::new(bridge)));
//!     let client = Client::new("my-client-id");
//!
//!     // Email login: send the code, then verify it
//!     registry.pre_authenticate(&client, &PreAuthArgs::email("user@example.com")).await?;
//!     registry
//!         .authenticate(
//!             &client,
//!             &AuthArgs::Email {
//!                 email: "user@example.com".to_string(),
//!                 verification_code: "123456".to_string(),
//!             },
//!         )
//!         .await?;
//!
//!     if let WalletStatus::LoggedInWalletInitialized(user) =
//!         registry.get_user_wallet_status(&client).await?
//!     {
//!         let account = user.wallet.get_account().await?;
//!         let sent = account
//!             .send_transaction(&TransactionRequest {
//!                 to: Some(user.wallet_address),
//!                 value: Some(U256::from(1u64)),
//!                 chain_id: Some(137),
//!                 max_fee_per_gas: Some(U256::from(30_000_000_000u64)),
//!                 ..Default::default()
//!             })
//!             .await?;
//!         println!("sent {}", sent.transaction_hash);
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod account;
pub mod auth;
pub mod bridge;
pub mod broadcast;
mod client;
mod config;
mod error;
mod registry;
pub mod status;
pub mod storage;
pub mod types;
mod wallet;

pub use account::Account;
pub use auth::{AuthArgs, AuthLoginResult, OauthOptions, OauthProvider, PreAuthArgs, Strategy};
pub use bridge::{Bridge, BridgeConnector, MockBridge, Procedure, StaticConnector};
pub use broadcast::{ChainRpc, MockChainRpc};
pub use client::Client;
pub use config::{WalletConfig, CHAIN_ID_PLACEHOLDER};
pub use error::{ErrorKind, WalletError};
pub use registry::SessionRegistry;
pub use status::{AuthDetails, AuthenticatedUser, UserDetails, UserWalletStatus, WalletStatus};
pub use types::{
    transaction_type, AccessListItem, SendTransactionResult, SignableMessage, TransactionRequest,
    TypedData, TypedDataDomain, TypedDataField,
};
pub use wallet::InAppWallet;

#[cfg(feature = "http")]
pub use broadcast::HttpChainRpc;

// Re-export primitives for convenience
pub use inapp_primitives::{Address, ChainId, TxHash, H256, U256};
