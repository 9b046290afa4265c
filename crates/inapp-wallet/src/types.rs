//! Request and response types exchanged with the signer

use bytes::Bytes;
use inapp_primitives::{strip_hex_prefix, Address, ChainId, TxHash, H256, U256};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::WalletError;

/// Transaction type tag for legacy transactions
pub const LEGACY_TX_TYPE: u8 = 0;
/// Transaction type tag for EIP-1559 transactions
pub const EIP1559_TX_TYPE: u8 = 2;

/// Name of the EIP-712 domain separator type
pub const EIP712_DOMAIN_TYPE: &str = "EIP712Domain";

/// EIP-2930 access list entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessListItem {
    /// Accessed account
    pub address: Address,
    /// Accessed storage slots
    pub storage_keys: Vec<H256>,
}

/// Generic transaction to sign or send
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionRequest {
    /// Recipient address (None for contract creation)
    pub to: Option<Address>,
    /// Input data
    pub data: Option<Bytes>,
    /// Value to transfer
    pub value: Option<U256>,
    /// Gas limit
    pub gas: Option<u64>,
    /// Gas price (legacy)
    pub gas_price: Option<U256>,
    /// Sender nonce
    pub nonce: Option<u64>,
    /// Chain ID, required for signing
    pub chain_id: Option<ChainId>,
    /// Access list
    pub access_list: Option<Vec<AccessListItem>>,
    /// Max fee per gas (EIP-1559)
    pub max_fee_per_gas: Option<U256>,
    /// Max priority fee per gas (EIP-1559)
    pub max_priority_fee_per_gas: Option<U256>,
}

impl TransactionRequest {
    /// Chain id to sign for. Unset and zero are both rejected.
    pub fn signing_chain_id(&self) -> Result<ChainId, WalletError> {
        match self.chain_id {
            Some(chain_id) if chain_id != 0 => Ok(chain_id),
            _ => Err(WalletError::MissingChainId),
        }
    }
}

/// Transaction type sent to the signer: EIP-1559 when a non-zero max fee per
/// gas is set, legacy otherwise.
pub fn transaction_type(tx: &TransactionRequest) -> u8 {
    if tx.max_fee_per_gas.map_or(false, |fee| !fee.is_zero()) {
        EIP1559_TX_TYPE
    } else {
        LEGACY_TX_TYPE
    }
}

/// Transaction in the shape the signer's `signTransaction` expects
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteTransaction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) to: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) value: Option<U256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) gas_limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) gas_price: Option<U256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) nonce: Option<u64>,
    pub(crate) chain_id: ChainId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) access_list: Option<Vec<AccessListItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) max_fee_per_gas: Option<U256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) max_priority_fee_per_gas: Option<U256>,
    #[serde(rename = "type")]
    pub(crate) tx_type: u8,
}

impl RemoteTransaction {
    /// Map a generic transaction onto the signer's field names
    pub fn from_request(tx: &TransactionRequest) -> Result<Self, WalletError> {
        let chain_id = tx.signing_chain_id()?;
        Ok(Self {
            to: tx.to,
            data: tx.data.as_ref().map(|d| format!("0x{}", hex::encode(d))),
            value: tx.value,
            gas_limit: tx.gas,
            gas_price: tx.gas_price,
            nonce: tx.nonce,
            chain_id,
            access_list: tx.access_list.clone(),
            max_fee_per_gas: tx.max_fee_per_gas,
            max_priority_fee_per_gas: tx.max_priority_fee_per_gas,
            tx_type: transaction_type(tx),
        })
    }
}

/// Message to sign with the personal-sign scheme
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignableMessage {
    /// UTF-8 text, forwarded as-is
    Text(String),
    /// Raw bytes, forwarded as `0x` hex
    Raw(Bytes),
}

impl SignableMessage {
    /// JSON form sent to the signer
    pub fn to_value(&self) -> Value {
        match self {
            SignableMessage::Text(text) => Value::String(text.clone()),
            SignableMessage::Raw(raw) => Value::String(format!("0x{}", hex::encode(raw))),
        }
    }
}

impl From<&str> for SignableMessage {
    fn from(text: &str) -> Self {
        SignableMessage::Text(text.to_string())
    }
}

impl From<String> for SignableMessage {
    fn from(text: String) -> Self {
        SignableMessage::Text(text)
    }
}

impl From<Vec<u8>> for SignableMessage {
    fn from(raw: Vec<u8>) -> Self {
        SignableMessage::Raw(Bytes::from(raw))
    }
}

/// Member of an EIP-712 struct type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedDataField {
    /// Field name
    pub name: String,
    /// Solidity type
    #[serde(rename = "type")]
    pub kind: String,
}

/// EIP-712 domain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedDataDomain {
    /// Signing domain name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Signing domain version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Chain id; accepts a number or a decimal/hex string
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_chain_id"
    )]
    pub chain_id: Option<ChainId>,
    /// Verifying contract
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verifying_contract: Option<Address>,
    /// Disambiguating salt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<H256>,
}

/// EIP-712 typed data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedData {
    /// Domain
    #[serde(default)]
    pub domain: TypedDataDomain,
    /// Struct type definitions, possibly including `EIP712Domain`
    pub types: BTreeMap<String, Vec<TypedDataField>>,
    /// Primary type name; resolved by the signer when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_type: Option<String>,
    /// Message value
    pub message: Value,
}

impl TypedData {
    /// Remove the `EIP712Domain` type entry, returning it if present
    pub fn strip_domain_type(&mut self) -> Option<Vec<TypedDataField>> {
        self.types.remove(EIP712_DOMAIN_TYPE)
    }

    /// Domain chain id, falling back to `default` when absent or zero
    pub fn chain_id_or(&self, default: ChainId) -> ChainId {
        match self.domain.chain_id {
            Some(id) if id != 0 => id,
            _ => default,
        }
    }
}

fn deserialize_chain_id<'de, D>(deserializer: D) -> Result<Option<ChainId>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid chain id: {}", n))),
        Some(Value::String(s)) => parse_chain_id(&s).map(Some).map_err(serde::de::Error::custom),
        Some(other) => Err(serde::de::Error::custom(format!("invalid chain id: {}", other))),
    }
}

/// Parse a chain id written as decimal or `0x` hex
pub fn parse_chain_id(s: &str) -> Result<ChainId, WalletError> {
    if s.starts_with("0x") || s.starts_with("0X") {
        parse_hex_u64(s)
    } else {
        s.parse::<u64>()
            .map_err(|e| WalletError::Serialization(format!("invalid chain id {:?}: {}", s, e)))
    }
}

/// Result of a sent transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendTransactionResult {
    /// Hash of the broadcast transaction
    pub transaction_hash: TxHash,
}

/// Response of `createWallet` and `setUpNewDevice`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetUpWalletResult {
    /// Device share to persist locally
    pub device_share_stored: String,
    /// Address of the wallet
    pub wallet_address: Address,
    /// Whether the signer persists the share itself
    #[serde(default)]
    pub is_iframe_storage_enabled: bool,
}

pub(crate) fn parse_hex_u64(s: &str) -> Result<u64, WalletError> {
    u64::from_str_radix(strip_hex_prefix(s), 16).map_err(|e| WalletError::InvalidHex(e.to_string()))
}

pub(crate) fn parse_hex_bytes(s: &str) -> Result<Bytes, WalletError> {
    let s = strip_hex_prefix(s);
    if s.is_empty() {
        return Ok(Bytes::new());
    }
    let bytes = hex::decode(s)?;
    Ok(Bytes::from(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_transaction_type_derivation() {
        let eip1559 = TransactionRequest {
            max_fee_per_gas: Some(U256::from(30)),
            ..Default::default()
        };
        assert_eq!(transaction_type(&eip1559), EIP1559_TX_TYPE);

        let legacy = TransactionRequest {
            gas_price: Some(U256::from(10)),
            ..Default::default()
        };
        assert_eq!(transaction_type(&legacy), LEGACY_TX_TYPE);

        let zero_max_fee = TransactionRequest {
            max_fee_per_gas: Some(U256::zero()),
            gas_price: Some(U256::from(10)),
            ..Default::default()
        };
        assert_eq!(transaction_type(&zero_max_fee), LEGACY_TX_TYPE);
    }

    #[test]
    fn test_remote_transaction_requires_chain_id() {
        let result = RemoteTransaction::from_request(&TransactionRequest::default());
        assert!(matches!(result, Err(WalletError::MissingChainId)));

        let zero = TransactionRequest {
            chain_id: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            RemoteTransaction::from_request(&zero),
            Err(WalletError::MissingChainId)
        ));
    }

    #[test]
    fn test_remote_transaction_field_names() {
        let tx = TransactionRequest {
            to: Some(Address::from_bytes([0x11; 20])),
            data: Some(Bytes::from_static(&[0xa9, 0x05])),
            value: Some(U256::from(1000)),
            gas: Some(21000),
            nonce: Some(7),
            chain_id: Some(137),
            max_fee_per_gas: Some(U256::from(30)),
            max_priority_fee_per_gas: Some(U256::from(2)),
            ..Default::default()
        };
        let json = serde_json::to_value(RemoteTransaction::from_request(&tx).unwrap()).unwrap();

        assert_eq!(json["to"], "0x1111111111111111111111111111111111111111");
        assert_eq!(json["data"], "0xa905");
        assert_eq!(json["value"], "0x3e8");
        assert_eq!(json["gasLimit"], 21000);
        assert_eq!(json["nonce"], 7);
        assert_eq!(json["chainId"], 137);
        assert_eq!(json["maxFeePerGas"], "0x1e");
        assert_eq!(json["maxPriorityFeePerGas"], "0x2");
        assert_eq!(json["type"], 2);
        assert!(json.get("gasPrice").is_none());
        assert!(json.get("accessList").is_none());
    }

    #[test]
    fn test_signable_message_forms() {
        assert_eq!(SignableMessage::from("hello").to_value(), json!("hello"));
        assert_eq!(SignableMessage::from(vec![0xde, 0xad]).to_value(), json!("0xdead"));
    }

    #[test]
    fn test_typed_data_domain_chain_id_forms() {
        let numeric: TypedDataDomain = serde_json::from_value(json!({ "chainId": 137 })).unwrap();
        assert_eq!(numeric.chain_id, Some(137));

        let decimal: TypedDataDomain = serde_json::from_value(json!({ "chainId": "10" })).unwrap();
        assert_eq!(decimal.chain_id, Some(10));

        let hex: TypedDataDomain = serde_json::from_value(json!({ "chainId": "0x89" })).unwrap();
        assert_eq!(hex.chain_id, Some(137));

        let missing: TypedDataDomain = serde_json::from_value(json!({})).unwrap();
        assert_eq!(missing.chain_id, None);

        assert!(serde_json::from_value::<TypedDataDomain>(json!({ "chainId": true })).is_err());
    }

    #[test]
    fn test_typed_data_chain_id_fallback() {
        let mut data: TypedData = serde_json::from_value(json!({
            "domain": { "chainId": 0 },
            "types": {},
            "message": {},
        }))
        .unwrap();
        assert_eq!(data.chain_id_or(1), 1);

        data.domain.chain_id = Some(8453);
        assert_eq!(data.chain_id_or(1), 8453);
    }

    #[test]
    fn test_set_up_wallet_result_parse() {
        let result: SetUpWalletResult = serde_json::from_value(json!({
            "deviceShareStored": "share",
            "walletAddress": "0x742d35Cc6634C0532925a3b844Bc9e7595f0aB3d",
        }))
        .unwrap();
        assert_eq!(result.device_share_stored, "share");
        assert!(!result.is_iframe_storage_enabled);
    }

    #[test]
    fn test_parse_hex_helpers() {
        assert_eq!(parse_hex_u64("0x100").unwrap(), 256);
        assert_eq!(parse_hex_bytes("0x1234").unwrap().as_ref(), &[0x12, 0x34]);
        assert!(parse_hex_bytes("0x").unwrap().is_empty());
        assert!(parse_hex_bytes("0xzz").is_err());
    }
}
