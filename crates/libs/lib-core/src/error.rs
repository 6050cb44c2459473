//! # Centralized Error Handling
//!
//! This module defines the application-wide error type [`AppError`] used consistently
//! across the vault client crates. It follows the `thiserror` pattern for ergonomic error handling.
//!
//! ## Error Categories
//!
//! 1. **Validation errors** - caught before anything is sent to the chain
//!    - [`WalletNotConnected`](AppError::WalletNotConnected)
//!    - [`InvalidAmount`](AppError::InvalidAmount)
//!    - [`ContractNotConfigured`](AppError::ContractNotConfigured)
//!
//! 2. **Wallet / provider errors** - raised by the wallet while prompting or signing
//!    - [`NoWalletFound`](AppError::NoWalletFound)
//!    - [`UserRejected`](AppError::UserRejected)
//!    - [`NetworkMismatch`](AppError::NetworkMismatch)
//!
//! 3. **Chain errors** - raised by the node after submission
//!    - [`InsufficientFunds`](AppError::InsufficientFunds)
//!    - [`ExecutionReverted`](AppError::ExecutionReverted)
//!    - [`Unknown`](AppError::Unknown)
//!
//! 4. **Infrastructure errors**
//!    - [`Config`](AppError::Config), [`Rpc`](AppError::Rpc), [`Decoding`](AppError::Decoding)
//!
//! Every error is terminal for the operation that produced it. Nothing in the
//! client retries a failed write automatically; the user re-initiates.
//!
//! ## Usage Example
//!
//! ```rust
//! use lib_core::error::{AppError, Result};
//!
//! fn require_positive(amount: u64) -> Result<u64> {
//!     if amount == 0 {
//!         return Err(AppError::InvalidAmount("amount must be greater than 0".to_string()));
//!     }
//!     Ok(amount)
//! }
//!
//! assert!(require_positive(0).unwrap_err().is_validation());
//! ```

use thiserror::Error;

/// Convenience type alias for `Result<T, AppError>`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application-wide error type covering all error scenarios.
///
/// Variants carry a `String` with the underlying detail. Errors are `Clone`
/// so a failed transaction state can hold the error that ended it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    /// An operation needs a holder address but no account is connected.
    #[error("Wallet not connected")]
    WalletNotConnected,

    /// No wallet provider is available, or it exposed no accounts.
    #[error("No wallet found: {0}")]
    NoWalletFound(String),

    /// The user declined a wallet prompt (provider code 4001).
    ///
    /// Non-fatal for the session: nothing was broadcast.
    #[error("Rejected by user: {0}")]
    UserRejected(String),

    /// Amount input is zero, negative or not a decimal number.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// The wallet is attached to the wrong chain and could not be switched.
    #[error("Network mismatch: {0}")]
    NetworkMismatch(String),

    /// A contract address is missing from configuration or has no code on chain.
    #[error("Contract not configured: {0}")]
    ContractNotConfigured(String),

    /// The account cannot pay for the transaction.
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    /// The chain reverted the call. The message carries the revert reason verbatim.
    #[error("Execution reverted: {0}")]
    ExecutionReverted(String),

    /// Configuration error during startup or environment loading.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport-level failure talking to the node.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// A response could not be decoded.
    #[error("Decoding error: {0}")]
    Decoding(String),

    /// Anything the classifier could not place.
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl AppError {
    /// Short stable identifier for the variant, used in logs and JSON output.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::WalletNotConnected => "WalletNotConnected",
            AppError::NoWalletFound(_) => "NoWalletFound",
            AppError::UserRejected(_) => "UserRejected",
            AppError::InvalidAmount(_) => "InvalidAmount",
            AppError::NetworkMismatch(_) => "NetworkMismatch",
            AppError::ContractNotConfigured(_) => "ContractNotConfigured",
            AppError::InsufficientFunds(_) => "InsufficientFunds",
            AppError::ExecutionReverted(_) => "ExecutionReverted",
            AppError::Config(_) => "Config",
            AppError::Rpc(_) => "Rpc",
            AppError::Decoding(_) => "Decoding",
            AppError::Unknown(_) => "Unknown",
        }
    }

    /// True for errors raised before submission. These never reach the chain.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AppError::WalletNotConnected
                | AppError::InvalidAmount(_)
                | AppError::ContractNotConfigured(_)
        )
    }

    /// True when the user declined a wallet prompt.
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, AppError::UserRejected(_))
    }

    /// Get a user-friendly error message for notifications.
    ///
    /// Revert reasons are passed through unchanged so contract-specific causes
    /// (for example an insufficient share balance) reach the user.
    pub fn user_message(&self) -> String {
        match self {
            AppError::WalletNotConnected => {
                "Please connect your wallet to continue.".to_string()
            }
            AppError::NoWalletFound(msg) => format!("No wallet found: {}", msg),
            AppError::UserRejected(_) => {
                "Transaction was rejected by user. Please try again and approve the request in your wallet."
                    .to_string()
            }
            AppError::InvalidAmount(_) => {
                "Please enter a valid amount greater than 0.".to_string()
            }
            AppError::NetworkMismatch(msg) => msg.clone(),
            AppError::ContractNotConfigured(msg) => msg.clone(),
            AppError::InsufficientFunds(_) => {
                "Insufficient funds. Please check your balance.".to_string()
            }
            AppError::ExecutionReverted(msg) => msg.clone(),
            AppError::Rpc(_) => "Service temporarily unavailable".to_string(),
            AppError::Config(_) | AppError::Decoding(_) => {
                "An internal error occurred".to_string()
            }
            AppError::Unknown(msg) => format!("Transaction failed: {}", msg),
        }
    }
}

/// Convert `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Unknown(err.to_string())
    }
}

/// Convert `serde_json::Error` to `AppError`.
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Decoding(format!("JSON error: {}", err))
    }
}

/// Convert environment lookup failures to `AppError`.
impl From<lib_utils::envs::Error> for AppError {
    fn from(err: lib_utils::envs::Error) -> Self {
        match err {
            lib_utils::envs::Error::MissingEnv(name) => {
                AppError::Config(format!("{} must be set in environment", name))
            }
            lib_utils::envs::Error::WrongFormat(name) => {
                AppError::Config(format!("{} has an invalid format", name))
            }
        }
    }
}
