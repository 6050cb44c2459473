//! # Network Guard
//!
//! Makes sure the wallet is attached to the configured chain before the
//! session starts. If the wallet does not know the chain (provider code
//! 4902) it is registered with `wallet_addEthereumChain` and the switch is
//! retried once.

use crate::error::{classify, RpcError};
use crate::wallet::WalletAdapter;
use lib_core::{AppError, NetworkConfig, Result};
use serde_json::{json, Value};
use tracing::info;

/// Switches the wallet to a target chain.
#[derive(Clone)]
pub struct NetworkGuard {
    wallet: WalletAdapter,
}

impl NetworkGuard {
    pub fn new(wallet: WalletAdapter) -> Self {
        Self { wallet }
    }

    /// Switch the wallet to `target`, registering the chain first if needed.
    ///
    /// # Errors
    /// - [`AppError::UserRejected`] if the user declines either prompt
    /// - [`AppError::NetworkMismatch`] for any other failure
    pub async fn ensure_network(&self, target: &NetworkConfig) -> Result<()> {
        let chain_id = target.chain_id_hex();

        match self.switch(&chain_id).await {
            Ok(()) => {
                info!(chain_id = target.chain_id, "Wallet on target network");
                Ok(())
            }
            Err(e) if e.is_unrecognized_chain() => {
                info!(chain_id = target.chain_id, chain_name = %target.chain_name, "Chain unknown to wallet, adding it");
                self.add_chain(target).await.map_err(|e| to_network_error(&e))?;
                self.switch(&chain_id).await.map_err(|e| to_network_error(&e))?;
                info!(chain_id = target.chain_id, "Wallet switched after adding chain");
                Ok(())
            }
            Err(e) => Err(to_network_error(&e)),
        }
    }

    async fn switch(&self, chain_id: &str) -> std::result::Result<(), RpcError> {
        self.wallet
            .provider()
            .request("wallet_switchEthereumChain", json!([{ "chainId": chain_id }]))
            .await
            .map(|_| ())
    }

    async fn add_chain(&self, target: &NetworkConfig) -> std::result::Result<(), RpcError> {
        self.wallet
            .provider()
            .request("wallet_addEthereumChain", json!([add_chain_params(target)]))
            .await
            .map(|_| ())
    }
}

/// `wallet_addEthereumChain` parameter object.
pub fn add_chain_params(target: &NetworkConfig) -> Value {
    let explorers: Vec<&str> = target.explorer_url.as_deref().into_iter().collect();
    json!({
        "chainId": target.chain_id_hex(),
        "chainName": target.chain_name,
        "nativeCurrency": {
            "name": target.native_currency_name,
            "symbol": target.native_currency_symbol,
            "decimals": target.native_currency_decimals,
        },
        "rpcUrls": [target.rpc_url],
        "blockExplorerUrls": explorers,
    })
}

fn to_network_error(err: &RpcError) -> AppError {
    match classify(err) {
        rejected @ AppError::UserRejected(_) => rejected,
        _ => AppError::NetworkMismatch(format!("Could not switch wallet network: {}", err)),
    }
}
