//! # RPC Errors and Classification
//!
//! [`RpcError`] is what a transport or wallet returns. [`classify`] turns it into
//! the user-facing [`AppError`] taxonomy by inspecting the EIP-1193 / JSON-RPC
//! error code first and the message text second.
//!
//! | Input | Classified as |
//! |---|---|
//! | code `4001`, or "user rejected" / "user denied" | `UserRejected` |
//! | code `4100` | `WalletNotConnected` |
//! | code `4901` / `4902` | `NetworkMismatch` |
//! | "insufficient funds" | `InsufficientFunds` |
//! | "revert" in message, or code `3` | `ExecutionReverted` (message verbatim) |
//! | transport failure | `Rpc` |
//! | undecodable response | `Decoding` |
//! | anything else | `Unknown` |

use alloy_primitives::hex;
use alloy_sol_types::{Revert, SolError};
use lib_core::AppError;
use serde_json::Value;
use thiserror::Error;

/// EIP-1193 provider error codes.
pub mod codes {
    /// The user rejected the request.
    pub const USER_REJECTED: i64 = 4001;
    /// The requested account or method has not been authorized by the user.
    pub const UNAUTHORIZED: i64 = 4100;
    /// The provider does not support the requested method.
    pub const UNSUPPORTED_METHOD: i64 = 4200;
    /// The provider is not connected to the requested chain.
    pub const CHAIN_DISCONNECTED: i64 = 4901;
    /// The wallet does not know the requested chain (`wallet_switchEthereumChain`).
    pub const UNRECOGNIZED_CHAIN: i64 = 4902;
    /// Geth-style "execution reverted" with revert data attached.
    pub const EXECUTION_REVERTED: i64 = 3;
}

/// Error returned by a JSON-RPC transport or a wallet provider.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RpcError {
    /// The request never produced a JSON-RPC response (connection, timeout, HTTP status).
    #[error("transport error: {0}")]
    Transport(String),

    /// The node or wallet answered with a JSON-RPC error object.
    #[error("RPC error {code}: {message}")]
    Rpc {
        code: i64,
        message: String,
        data: Option<Value>,
    },

    /// The response arrived but did not have the expected shape.
    #[error("invalid response: {0}")]
    Decode(String),
}

impl RpcError {
    /// Build an error object the way a provider would report it.
    pub fn rpc(code: i64, message: impl Into<String>) -> Self {
        RpcError::Rpc {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// JSON-RPC / provider error code, if the error carries one.
    pub fn code(&self) -> Option<i64> {
        match self {
            RpcError::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// True for provider code 4902 (chain not added to the wallet).
    pub fn is_unrecognized_chain(&self) -> bool {
        self.code() == Some(codes::UNRECOGNIZED_CHAIN)
    }
}

/// Classify a transport / provider error into the application taxonomy.
pub fn classify(err: &RpcError) -> AppError {
    let (code, message, data) = match err {
        RpcError::Transport(msg) => return AppError::Rpc(msg.clone()),
        RpcError::Decode(msg) => return AppError::Decoding(msg.clone()),
        RpcError::Rpc { code, message, data } => (*code, message, data.as_ref()),
    };

    let lower = message.to_lowercase();

    match code {
        codes::USER_REJECTED => return AppError::UserRejected(message.clone()),
        codes::UNAUTHORIZED => return AppError::WalletNotConnected,
        codes::CHAIN_DISCONNECTED | codes::UNRECOGNIZED_CHAIN => {
            return AppError::NetworkMismatch(message.clone())
        }
        _ => {}
    }

    if lower.contains("user rejected") || lower.contains("user denied") {
        AppError::UserRejected(message.clone())
    } else if lower.contains("insufficient funds") {
        AppError::InsufficientFunds(message.clone())
    } else if lower.contains("revert") || code == codes::EXECUTION_REVERTED {
        AppError::ExecutionReverted(revert_message(message, data))
    } else {
        AppError::Unknown(message.clone())
    }
}

/// Keep the node's message as-is, appending the `Error(string)` reason when the
/// message itself does not already carry it.
fn revert_message(message: &str, data: Option<&Value>) -> String {
    match data.and_then(decode_revert_reason) {
        Some(reason) if !message.contains(&reason) => format!("{}: {}", message, reason),
        _ => message.to_string(),
    }
}

/// Decode a standard `Error(string)` payload from JSON-RPC error data.
///
/// Nodes put the revert bytes either directly in `data` or in `data.data`.
pub fn decode_revert_reason(data: &Value) -> Option<String> {
    let raw = data
        .as_str()
        .or_else(|| data.get("data").and_then(Value::as_str))?;
    let bytes = hex::decode(raw).ok()?;
    Revert::abi_decode(&bytes, true).ok().map(|revert| revert.reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_rejected_by_code() {
        let err = RpcError::rpc(4001, "MetaMask Tx Signature: User denied transaction signature.");
        assert!(matches!(classify(&err), AppError::UserRejected(_)));
    }

    #[test]
    fn test_insufficient_funds_by_message() {
        let err = RpcError::rpc(-32000, "insufficient funds for gas * price + value");
        assert!(matches!(classify(&err), AppError::InsufficientFunds(_)));
    }

    #[test]
    fn test_revert_message_kept_verbatim() {
        let err = RpcError::rpc(-32000, "execution reverted: InsufficientShares");
        assert_eq!(
            classify(&err),
            AppError::ExecutionReverted("execution reverted: InsufficientShares".to_string())
        );
    }

    #[test]
    fn test_revert_reason_decoded_from_data() {
        let payload = Revert::from("ERC20: transfer amount exceeds balance").abi_encode();
        let err = RpcError::Rpc {
            code: 3,
            message: "execution reverted".to_string(),
            data: Some(json!(hex::encode_prefixed(payload))),
        };
        assert_eq!(
            classify(&err),
            AppError::ExecutionReverted(
                "execution reverted: ERC20: transfer amount exceeds balance".to_string()
            )
        );
    }

    #[test]
    fn test_network_codes() {
        let err = RpcError::rpc(4902, "Unrecognized chain ID \"0x7a69\"");
        assert!(err.is_unrecognized_chain());
        assert!(matches!(classify(&err), AppError::NetworkMismatch(_)));
    }

    #[test]
    fn test_transport_and_unknown() {
        assert!(matches!(
            classify(&RpcError::Transport("connection refused".into())),
            AppError::Rpc(_)
        ));
        assert!(matches!(
            classify(&RpcError::rpc(-32603, "internal error")),
            AppError::Unknown(_)
        ));
    }
}
