//! # EVM Chain Client
//!
//! Typed wrappers over the read-only JSON-RPC calls the vault client needs:
//! chain id, bytecode lookup, `eth_call` and transaction receipts.
//!
//! ```rust,no_run
//! use lib_evm::client::EvmClient;
//!
//! # async fn example() -> Result<(), lib_evm::RpcError> {
//! let client = EvmClient::http("http://localhost:8545")?;
//! let chain_id = client.chain_id().await?;
//! println!("Connected to chain {}", chain_id);
//! # Ok(())
//! # }
//! ```

use crate::error::RpcError;
use crate::rpc::{HttpTransport, RpcTransport};
use alloy_primitives::{hex, Address, Bytes, B256, U256};
use serde::Deserialize;
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;

/// Block selector for reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTag {
    Latest,
    Number(u64),
}

impl BlockTag {
    fn to_param(self) -> Value {
        match self {
            BlockTag::Latest => json!("latest"),
            BlockTag::Number(n) => json!(format!("0x{:x}", n)),
        }
    }
}

/// Outcome of a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub transaction_hash: B256,
    pub block_number: u64,
    /// `true` when the transaction executed successfully (status `0x1`)
    pub status: bool,
    pub gas_used: U256,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    transaction_hash: String,
    block_number: Option<String>,
    status: Option<String>,
    gas_used: Option<String>,
}

impl RawReceipt {
    fn into_receipt(self) -> Result<TxReceipt, RpcError> {
        let transaction_hash = B256::from_str(&self.transaction_hash)
            .map_err(|e| RpcError::Decode(format!("Invalid transaction hash: {}", e)))?;
        let block_number = match self.block_number {
            Some(raw) => parse_quantity(&raw)?,
            None => 0,
        };
        // Pre-Byzantium receipts have no status field; treat them as successful.
        let status = match self.status {
            Some(raw) => parse_quantity(&raw)? == 1,
            None => true,
        };
        let gas_used = match self.gas_used {
            Some(raw) => parse_u256(&raw)?,
            None => U256::ZERO,
        };

        Ok(TxReceipt {
            transaction_hash,
            block_number,
            status,
            gas_used,
        })
    }
}

/// Read-only chain client.
///
/// Cheap to clone; clones share the underlying transport.
#[derive(Clone)]
pub struct EvmClient {
    transport: Arc<dyn RpcTransport>,
}

impl EvmClient {
    /// Wrap an existing transport.
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        Self { transport }
    }

    /// Client over HTTP JSON-RPC.
    pub fn http(url: &str) -> Result<Self, RpcError> {
        Ok(Self::new(Arc::new(HttpTransport::new(url)?)))
    }

    /// Underlying transport, for raw requests.
    pub fn transport(&self) -> &Arc<dyn RpcTransport> {
        &self.transport
    }

    /// `eth_chainId`
    pub async fn chain_id(&self) -> Result<u64, RpcError> {
        let value = self.transport.request("eth_chainId", json!([])).await?;
        parse_quantity(as_str(&value, "eth_chainId")?)
    }

    /// `eth_blockNumber`
    pub async fn block_number(&self) -> Result<u64, RpcError> {
        let value = self.transport.request("eth_blockNumber", json!([])).await?;
        parse_quantity(as_str(&value, "eth_blockNumber")?)
    }

    /// `eth_getCode` at the latest block. Empty bytes mean no contract.
    pub async fn get_code(&self, address: Address) -> Result<Bytes, RpcError> {
        let value = self
            .transport
            .request("eth_getCode", json!([address, "latest"]))
            .await?;
        parse_bytes(as_str(&value, "eth_getCode")?)
    }

    /// `eth_call` against `to` with ABI-encoded `data`.
    pub async fn call(
        &self,
        from: Option<Address>,
        to: Address,
        data: &Bytes,
        block: BlockTag,
    ) -> Result<Bytes, RpcError> {
        let mut tx = json!({ "to": to, "data": data });
        if let Some(from) = from {
            tx["from"] = json!(from);
        }
        let value = self
            .transport
            .request("eth_call", json!([tx, block.to_param()]))
            .await?;
        parse_bytes(as_str(&value, "eth_call")?)
    }

    /// `eth_getTransactionReceipt`. `None` while the transaction is pending.
    pub async fn get_transaction_receipt(&self, hash: B256) -> Result<Option<TxReceipt>, RpcError> {
        let value = self
            .transport
            .request("eth_getTransactionReceipt", json!([hash]))
            .await?;
        if value.is_null() {
            return Ok(None);
        }
        let raw: RawReceipt = serde_json::from_value(value)
            .map_err(|e| RpcError::Decode(format!("Invalid receipt: {}", e)))?;
        raw.into_receipt().map(Some)
    }
}

fn as_str<'a>(value: &'a Value, method: &str) -> Result<&'a str, RpcError> {
    value
        .as_str()
        .ok_or_else(|| RpcError::Decode(format!("{} returned {}, expected a hex string", method, value)))
}

/// Parse a `0x`-prefixed hex quantity into `u64`.
pub fn parse_quantity(raw: &str) -> Result<u64, RpcError> {
    let digits = raw.trim().trim_start_matches("0x");
    if digits.is_empty() {
        return Ok(0);
    }
    u64::from_str_radix(digits, 16)
        .map_err(|e| RpcError::Decode(format!("Invalid quantity '{}': {}", raw, e)))
}

/// Parse a `0x`-prefixed hex quantity into `U256`.
pub fn parse_u256(raw: &str) -> Result<U256, RpcError> {
    let digits = raw.trim().trim_start_matches("0x");
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 16)
        .map_err(|e| RpcError::Decode(format!("Invalid quantity '{}': {}", raw, e)))
}

/// Parse `0x`-prefixed hex data. `"0x"` is empty bytes.
pub fn parse_bytes(raw: &str) -> Result<Bytes, RpcError> {
    hex::decode(raw.trim())
        .map(Bytes::from)
        .map_err(|e| RpcError::Decode(format!("Invalid hex data: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTransport;
    use alloy_primitives::address;

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_quantity("0x7a69").unwrap(), 31337);
        assert_eq!(parse_quantity("0x").unwrap(), 0);
        assert_eq!(parse_u256("0x5f5e100").unwrap(), U256::from(100_000_000u64));
        assert!(parse_bytes("0x").unwrap().is_empty());
        assert_eq!(parse_bytes("0x6080").unwrap().len(), 2);
        assert!(parse_quantity("0xzz").is_err());
    }

    #[tokio::test]
    async fn test_chain_id() {
        let transport = MockTransport::new();
        transport.respond("eth_chainId", json!("0x7a69"));
        let client = EvmClient::new(transport.clone());

        assert_eq!(client.chain_id().await.unwrap(), 31337);
        assert_eq!(transport.calls("eth_chainId"), 1);
    }

    #[tokio::test]
    async fn test_pending_receipt_is_none() {
        let transport = MockTransport::new();
        transport.respond("eth_getTransactionReceipt", Value::Null);
        let client = EvmClient::new(transport);

        assert_eq!(client.get_transaction_receipt(B256::ZERO).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_failed_receipt() {
        let transport = MockTransport::new();
        transport.respond(
            "eth_getTransactionReceipt",
            json!({
                "transactionHash": B256::repeat_byte(0xab),
                "blockNumber": "0x10",
                "status": "0x0",
                "gasUsed": "0x5208"
            }),
        );
        let client = EvmClient::new(transport);

        let receipt = client
            .get_transaction_receipt(B256::repeat_byte(0xab))
            .await
            .unwrap()
            .unwrap();
        assert!(!receipt.status);
        assert_eq!(receipt.block_number, 16);
        assert_eq!(receipt.gas_used, U256::from(21_000u64));
    }

    #[tokio::test]
    async fn test_get_code() {
        let token = address!("5FbDB2315678afecb367f032d93F642f64180aa3");
        let transport = MockTransport::new();
        transport.respond_code(token, "0x6080604052");
        let client = EvmClient::new(transport);

        assert_eq!(client.get_code(token).await.unwrap().len(), 5);
    }
}
