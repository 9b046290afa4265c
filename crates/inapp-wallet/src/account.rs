//! Signer facade over the bridge

use bytes::Bytes;
use inapp_primitives::Address;
use serde::Deserialize;
use serde_json::json;
use std::fmt;
use std::sync::Arc;

use crate::bridge::{call_typed, Bridge, Procedure};
use crate::broadcast::ChainRpc;
use crate::types::{
    parse_hex_bytes, RemoteTransaction, SendTransactionResult, SignableMessage,
    TransactionRequest, TypedData,
};
use crate::{WalletConfig, WalletError};

#[derive(Deserialize)]
pub(crate) struct AddressResponse {
    pub(crate) address: Address,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignMessageResponse {
    signed_message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignTransactionResponse {
    signed_transaction: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignTypedDataResponse {
    signed_typed_data: String,
}

/// Account of a logged in in-app wallet.
///
/// Every operation is one round-trip to the signer, plus a broadcast for
/// [`Account::send_transaction`].
#[derive(Clone)]
pub struct Account {
    address: Address,
    bridge: Arc<dyn Bridge>,
    chain_rpc: Arc<dyn ChainRpc>,
    config: Arc<WalletConfig>,
}

impl Account {
    pub(crate) fn new(
        address: Address,
        bridge: Arc<dyn Bridge>,
        chain_rpc: Arc<dyn ChainRpc>,
        config: Arc<WalletConfig>,
    ) -> Self {
        Self {
            address,
            bridge,
            chain_rpc,
            config,
        }
    }

    /// Get the account's address
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Sign a personal message
    pub async fn sign_message(&self, message: impl Into<SignableMessage>) -> Result<Bytes, WalletError> {
        let message = message.into();
        let params = json!({
            "message": message.to_value(),
            "chainId": self.config.message_chain_id,
        });
        let response: SignMessageResponse =
            call_typed(self.bridge.as_ref(), Procedure::SignMessage, params).await?;
        parse_hex_bytes(&response.signed_message)
    }

    /// Sign a transaction, returning the serialized signed transaction.
    ///
    /// # Errors
    ///
    /// [`WalletError::MissingChainId`] when `tx.chain_id` is unset or zero; the
    /// signer is not contacted in that case.
    pub async fn sign_transaction(&self, tx: &TransactionRequest) -> Result<Bytes, WalletError> {
        let transaction = RemoteTransaction::from_request(tx)?;
        let chain_id = transaction.chain_id;
        let params = json!({
            "transaction": transaction,
            "chainId": chain_id,
            "rpcEndpoint": self.config.rpc_endpoint(chain_id),
        });
        let response: SignTransactionResponse =
            call_typed(self.bridge.as_ref(), Procedure::SignTransaction, params).await?;
        parse_hex_bytes(&response.signed_transaction)
    }

    /// Sign EIP-712 typed data.
    ///
    /// The `EIP712Domain` type entry is dropped before forwarding, the signer
    /// derives it from the domain itself.
    pub async fn sign_typed_data(&self, mut typed_data: TypedData) -> Result<Bytes, WalletError> {
        typed_data.strip_domain_type();
        let chain_id = typed_data.chain_id_or(self.config.default_chain_id);
        let params = json!({
            "domain": typed_data.domain,
            "types": typed_data.types,
            "message": typed_data.message,
            "chainId": chain_id,
            "rpcEndpoint": self.config.rpc_endpoint(chain_id),
        });
        let response: SignTypedDataResponse =
            call_typed(self.bridge.as_ref(), Procedure::SignTypedDataV4, params).await?;
        parse_hex_bytes(&response.signed_typed_data)
    }

    /// Sign a transaction and broadcast it to its chain
    pub async fn send_transaction(
        &self,
        tx: &TransactionRequest,
    ) -> Result<SendTransactionResult, WalletError> {
        let chain_id = tx.signing_chain_id()?;
        let signed = self.sign_transaction(tx).await?;
        let transaction_hash = self.chain_rpc.send_raw_transaction(chain_id, &signed).await?;
        tracing::info!(chain_id, hash = %transaction_hash, from = %self.address, "transaction sent");
        Ok(SendTransactionResult { transaction_hash })
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}
