//! # EVM Library
//!
//! Wallet connection, balance synchronization and vault transaction flows
//! for an ERC-4626 style stablecoin vault on an EVM chain.

pub mod balance;
pub mod client;
pub mod contracts;
pub mod controller;
pub mod deployment;
pub mod error;
pub mod network;
pub mod notify;
pub mod rpc;
pub mod session;
pub mod transaction;
pub mod units;
pub mod vault;
pub mod wallet;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types from root for convenience
pub use balance::{BalancePoller, BalanceReader, BalanceSnapshot, PollHandle};
pub use client::{EvmClient, TxReceipt};
pub use controller::WalletController;
pub use deployment::{DeploymentChecker, DeploymentStatus};
pub use error::{classify, RpcError};
pub use network::NetworkGuard;
pub use notify::{Notification, NotificationLevel, Notifier};
pub use rpc::{HttpTransport, RpcTransport};
pub use session::{SessionState, WalletSession};
pub use transaction::{TransactionIntent, TransactionSubmitter, TxKind, TxState};
pub use vault::{VaultActions, VaultReader};
pub use wallet::{NodeWallet, ProviderEvent, Subscription, WalletAdapter, WalletProvider};
