//! # Wallet Provider Adapter
//!
//! A wallet is anything that answers EIP-1193 style requests
//! (`eth_requestAccounts`, `eth_sendTransaction`, `wallet_switchEthereumChain`
//! and so on) and emits `accountsChanged` / `chainChanged` events. The
//! [`WalletProvider`] trait is that surface; [`WalletAdapter`] wraps it with
//! typed methods and maps provider failures into [`AppError`].
//!
//! [`NodeWallet`] is the provider used against local development nodes
//! (Anvil, Hardhat) whose accounts are unlocked: the node itself signs.
//!
//! ## Example
//! ```rust,no_run
//! use lib_evm::rpc::HttpTransport;
//! use lib_evm::wallet::{NodeWallet, WalletAdapter};
//! use std::sync::Arc;
//!
//! # async fn example() -> lib_core::Result<()> {
//! let node = Arc::new(HttpTransport::new("http://localhost:8545").map_err(|e| lib_evm::classify(&e))?);
//! let wallet = WalletAdapter::new(Arc::new(NodeWallet::new(node)));
//! let address = wallet.connect().await?;
//! println!("Connected: {}", address);
//! # Ok(())
//! # }
//! ```

use crate::error::{classify, codes, RpcError};
use crate::rpc::RpcTransport;
use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use lib_core::{AppError, Result};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Events a wallet pushes to its listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// Active accounts changed. Empty means the wallet was locked or disconnected.
    AccountsChanged(Vec<Address>),
    /// The wallet moved to another chain.
    ChainChanged(u64),
}

/// EIP-1193 style wallet.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn request(&self, method: &str, params: Value) -> std::result::Result<Value, RpcError>;

    /// Subscribe to wallet events.
    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;
}

/// Listener registration. Dropping it stops the listener task.
#[must_use = "dropping a Subscription stops the listener"]
pub struct Subscription {
    handle: JoinHandle<()>,
}

impl Subscription {
    pub(crate) fn from_task(handle: JoinHandle<()>) -> Self {
        Self { handle }
    }

    /// Stop listening now.
    pub fn cancel(self) {
        self.handle.abort();
    }

    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Typed access to a [`WalletProvider`].
#[derive(Clone)]
pub struct WalletAdapter {
    provider: Arc<dyn WalletProvider>,
}

impl WalletAdapter {
    pub fn new(provider: Arc<dyn WalletProvider>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &Arc<dyn WalletProvider> {
        &self.provider
    }

    /// Ask the wallet for access and return the first account.
    ///
    /// # Errors
    /// - [`AppError::UserRejected`] when the user declines the prompt
    /// - [`AppError::NoWalletFound`] when no wallet answers or it exposes no account
    pub async fn connect(&self) -> Result<Address> {
        let value = self
            .provider
            .request("eth_requestAccounts", json!([]))
            .await
            .map_err(|e| match &e {
                RpcError::Transport(msg) => AppError::NoWalletFound(msg.clone()),
                RpcError::Rpc { code, message, .. } if *code == codes::UNSUPPORTED_METHOD => {
                    AppError::NoWalletFound(message.clone())
                }
                _ => classify(&e),
            })?;

        let accounts = parse_accounts(&value)?;
        let address = accounts
            .first()
            .copied()
            .ok_or_else(|| AppError::NoWalletFound("No accounts found".to_string()))?;

        info!(%address, "Wallet connected");
        Ok(address)
    }

    /// Accounts the wallet already exposes, without prompting.
    pub async fn accounts(&self) -> Result<Vec<Address>> {
        let value = self
            .provider
            .request("eth_accounts", json!([]))
            .await
            .map_err(|e| classify(&e))?;
        parse_accounts(&value)
    }

    /// Chain the wallet is currently attached to.
    pub async fn chain_id(&self) -> Result<u64> {
        let value = self
            .provider
            .request("eth_chainId", json!([]))
            .await
            .map_err(|e| classify(&e))?;
        let raw = value
            .as_str()
            .ok_or_else(|| AppError::Decoding(format!("eth_chainId returned {}", value)))?;
        crate::client::parse_quantity(raw).map_err(|e| classify(&e))
    }

    /// Sign and broadcast a transaction through the wallet.
    ///
    /// Returns the raw provider error so the caller can classify it with
    /// the context it has.
    pub async fn send_transaction(
        &self,
        from: Address,
        to: Address,
        data: &Bytes,
    ) -> std::result::Result<B256, RpcError> {
        let value = self
            .provider
            .request(
                "eth_sendTransaction",
                json!([{ "from": from, "to": to, "data": data }]),
            )
            .await?;
        let raw = value
            .as_str()
            .ok_or_else(|| RpcError::Decode(format!("eth_sendTransaction returned {}", value)))?;
        B256::from_str(raw).map_err(|e| RpcError::Decode(format!("Invalid transaction hash: {}", e)))
    }

    /// Raw event stream.
    pub fn events(&self) -> broadcast::Receiver<ProviderEvent> {
        self.provider.subscribe()
    }

    /// Call `callback` with every `accountsChanged` payload until the
    /// returned [`Subscription`] is dropped.
    pub fn on_accounts_changed<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Vec<Address>) + Send + Sync + 'static,
    {
        let mut events = self.events();
        Subscription::from_task(tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(ProviderEvent::AccountsChanged(accounts)) => callback(accounts),
                    Ok(ProviderEvent::ChainChanged(_)) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Wallet event listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }))
    }
}

fn parse_accounts(value: &Value) -> Result<Vec<Address>> {
    let items = value
        .as_array()
        .ok_or_else(|| AppError::Decoding(format!("Expected an account list, got {}", value)))?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .and_then(|s| Address::from_str(s).ok())
                .ok_or_else(|| AppError::Decoding(format!("Invalid account {}", item)))
        })
        .collect()
}

/// Wallet backed by a development node's unlocked accounts.
///
/// The node signs `eth_sendTransaction` itself. One of its accounts is the
/// active one; [`NodeWallet::select_account`] switches it and emits
/// `accountsChanged` the way a browser wallet would.
pub struct NodeWallet {
    node: Arc<dyn RpcTransport>,
    account_index: Mutex<usize>,
    events: broadcast::Sender<ProviderEvent>,
}

impl NodeWallet {
    pub fn new(node: Arc<dyn RpcTransport>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            node,
            account_index: Mutex::new(0),
            events,
        }
    }

    /// Use the node account at `index` as the active account.
    pub fn with_account_index(self, index: usize) -> Self {
        *self.account_index.lock() = index;
        self
    }

    /// Switch the active account and notify listeners.
    pub async fn select_account(&self, index: usize) -> std::result::Result<Option<Address>, RpcError> {
        *self.account_index.lock() = index;
        let accounts = self.active_accounts().await?;
        let _ = self.events.send(ProviderEvent::AccountsChanged(accounts.clone()));
        Ok(accounts.first().copied())
    }

    /// Node accounts with the active one first. Empty when the index is out of range.
    async fn active_accounts(&self) -> std::result::Result<Vec<Address>, RpcError> {
        let value = self.node.request("eth_accounts", json!([])).await?;
        let all: Vec<Address> = serde_json::from_value(value)
            .map_err(|e| RpcError::Decode(format!("Invalid eth_accounts response: {}", e)))?;
        let index = *self.account_index.lock();

        if index >= all.len() {
            return Ok(Vec::new());
        }
        let mut ordered = Vec::with_capacity(all.len());
        ordered.push(all[index]);
        ordered.extend(all.iter().enumerate().filter(|(i, _)| *i != index).map(|(_, a)| *a));
        Ok(ordered)
    }

    async fn switch_chain(&self, params: &Value) -> std::result::Result<Value, RpcError> {
        let requested = params
            .get(0)
            .and_then(|p| p.get("chainId"))
            .and_then(Value::as_str)
            .ok_or_else(|| RpcError::rpc(-32602, "Missing chainId"))
            .and_then(crate::client::parse_quantity)?;

        let node_chain = self.node.request("eth_chainId", json!([])).await?;
        let node_chain = node_chain
            .as_str()
            .ok_or_else(|| RpcError::Decode("eth_chainId returned a non-string".to_string()))
            .and_then(crate::client::parse_quantity)?;

        if requested == node_chain {
            Ok(Value::Null)
        } else {
            Err(RpcError::rpc(
                codes::UNRECOGNIZED_CHAIN,
                format!("Unrecognized chain ID \"0x{:x}\". Node serves chain {}.", requested, node_chain),
            ))
        }
    }
}

#[async_trait]
impl WalletProvider for NodeWallet {
    async fn request(&self, method: &str, params: Value) -> std::result::Result<Value, RpcError> {
        debug!(method, "NodeWallet request");
        match method {
            "eth_requestAccounts" | "eth_accounts" => {
                let accounts = self.active_accounts().await?;
                Ok(json!(accounts))
            }
            "wallet_switchEthereumChain" => self.switch_chain(&params).await,
            // The node serves one chain; registering another cannot make it reachable.
            "wallet_addEthereumChain" => Err(RpcError::rpc(
                codes::UNSUPPORTED_METHOD,
                "A development node wallet cannot add chains",
            )),
            "eth_chainId" | "eth_sendTransaction" => self.node.request(method, params).await,
            other => Err(RpcError::rpc(
                codes::UNSUPPORTED_METHOD,
                format!("Method {} is not supported by the node wallet", other),
            )),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}
