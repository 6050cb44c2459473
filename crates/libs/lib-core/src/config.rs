//! # Application Configuration
//!
//! Static configuration for the vault client: target network, deployed contract
//! addresses, token decimals and timing. It is resolved once at startup with
//! [`Config::from_env()`] and then shared (usually behind an `Arc`) with every
//! component that needs it, so all of them agree on the same addresses.
//!
//! ```rust,no_run
//! use lib_core::config::Config;
//!
//! dotenvy::dotenv().ok();
//! let config = Config::from_env()?;
//! config.validate()?;
//! println!("Target chain: {}", config.network.chain_id);
//! # Ok::<(), lib_core::AppError>(())
//! ```
//!
//! Contract addresses are optional. A client without a vault address can still
//! connect and show balances; vault operations then fail with
//! [`AppError::ContractNotConfigured`].

use crate::error::{AppError, Result};
use alloy_primitives::Address;
use lib_utils::envs::{get_env_opt, get_env_or, get_env_parse_or};
use std::str::FromStr;
use std::time::Duration;

/// Chain the wallet must be attached to, plus the parameters needed to
/// register it with a wallet that does not know it yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkConfig {
    /// EIP-155 chain id
    pub chain_id: u64,
    /// Human readable chain name shown by the wallet
    pub chain_name: String,
    /// JSON-RPC endpoint used for reads and for registering the chain
    pub rpc_url: String,
    /// Block explorer base URL, without trailing slash
    pub explorer_url: Option<String>,
    pub native_currency_name: String,
    pub native_currency_symbol: String,
    pub native_currency_decimals: u8,
}

impl NetworkConfig {
    /// Chain id in the `0x`-prefixed hex form wallets expect.
    pub fn chain_id_hex(&self) -> String {
        format!("0x{:x}", self.chain_id)
    }
}

/// Deployed contract addresses and the decimals of the tokens they manage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractsConfig {
    /// Stablecoin (ERC-20) deposited into the vault
    pub stablecoin: Option<Address>,
    /// Vault contract. It is also the ERC-20 share token.
    pub vault: Option<Address>,
    pub stablecoin_decimals: u8,
    pub share_decimals: u8,
    pub stablecoin_symbol: String,
    pub share_symbol: String,
}

impl ContractsConfig {
    /// Vault address or [`AppError::ContractNotConfigured`].
    pub fn require_vault(&self) -> Result<Address> {
        self.vault.ok_or_else(|| {
            AppError::ContractNotConfigured("Vault contract address is not configured.".to_string())
        })
    }

    /// All configured contract addresses, stablecoin first.
    pub fn configured(&self) -> Vec<Address> {
        self.stablecoin.into_iter().chain(self.vault).collect()
    }
}

/// Polling cadences and limits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimingConfig {
    /// Balance polling cadence
    pub poll_interval: Duration,
    /// How often a pending transaction's receipt is requested
    pub receipt_poll_interval: Duration,
    /// Give up waiting for a receipt after this long
    pub receipt_timeout: Duration,
}

/// Application configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub network: NetworkConfig,
    pub contracts: ContractsConfig,
    pub timing: TimingConfig,
    /// Abort `connect` when the wallet cannot be moved to the target chain.
    /// When false the failure is logged and the connection proceeds.
    pub strict_network: bool,
}

impl Default for Config {
    /// Local Anvil development node.
    fn default() -> Self {
        Self {
            network: NetworkConfig {
                chain_id: 31337,
                chain_name: "Local Anvil".to_string(),
                rpc_url: "http://localhost:8545".to_string(),
                explorer_url: None,
                native_currency_name: "Ether".to_string(),
                native_currency_symbol: "ETH".to_string(),
                native_currency_decimals: 18,
            },
            contracts: ContractsConfig {
                stablecoin: None,
                vault: None,
                stablecoin_decimals: 6,
                share_decimals: 18,
                stablecoin_symbol: "USDC".to_string(),
                share_symbol: "SHARES".to_string(),
            },
            timing: TimingConfig {
                poll_interval: Duration::from_millis(1000),
                receipt_poll_interval: Duration::from_millis(1000),
                receipt_timeout: Duration::from_secs(120),
            },
            strict_network: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Unset variables fall back to the local development defaults.
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();

        let network = NetworkConfig {
            chain_id: get_env_parse_or("VAULT_CHAIN_ID", defaults.network.chain_id)?,
            chain_name: get_env_or("VAULT_CHAIN_NAME", &defaults.network.chain_name),
            rpc_url: get_env_or("VAULT_RPC_URL", &defaults.network.rpc_url),
            explorer_url: get_env_opt("VAULT_EXPLORER_URL")
                .map(|url| url.trim_end_matches('/').to_string()),
            native_currency_name: get_env_or(
                "VAULT_NATIVE_NAME",
                &defaults.network.native_currency_name,
            ),
            native_currency_symbol: get_env_or(
                "VAULT_NATIVE_SYMBOL",
                &defaults.network.native_currency_symbol,
            ),
            native_currency_decimals: defaults.network.native_currency_decimals,
        };

        let contracts = ContractsConfig {
            stablecoin: parse_address_env("VAULT_STABLECOIN_ADDRESS")?,
            vault: parse_address_env("VAULT_VAULT_ADDRESS")?,
            stablecoin_decimals: get_env_parse_or(
                "VAULT_STABLECOIN_DECIMALS",
                defaults.contracts.stablecoin_decimals,
            )?,
            share_decimals: get_env_parse_or(
                "VAULT_SHARE_DECIMALS",
                defaults.contracts.share_decimals,
            )?,
            stablecoin_symbol: get_env_or(
                "VAULT_STABLECOIN_SYMBOL",
                &defaults.contracts.stablecoin_symbol,
            ),
            share_symbol: get_env_or("VAULT_SHARE_SYMBOL", &defaults.contracts.share_symbol),
        };

        let timing = TimingConfig {
            poll_interval: Duration::from_millis(get_env_parse_or("VAULT_POLL_INTERVAL_MS", 1000u64)?),
            receipt_poll_interval: Duration::from_millis(get_env_parse_or(
                "VAULT_RECEIPT_POLL_MS",
                1000u64,
            )?),
            receipt_timeout: Duration::from_secs(get_env_parse_or(
                "VAULT_RECEIPT_TIMEOUT_SECS",
                120u64,
            )?),
        };

        Ok(Self {
            network,
            contracts,
            timing,
            strict_network: get_env_parse_or("VAULT_STRICT_NETWORK", false)?,
        })
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.network.chain_id == 0 {
            return Err(AppError::Config("VAULT_CHAIN_ID must be non-zero".to_string()));
        }

        if !self.network.rpc_url.starts_with("http://") && !self.network.rpc_url.starts_with("https://") {
            return Err(AppError::Config(format!(
                "VAULT_RPC_URL must be an http(s) URL, got '{}'",
                self.network.rpc_url
            )));
        }

        // 10^78 no longer fits in 256 bits
        for (name, decimals) in [
            ("VAULT_STABLECOIN_DECIMALS", self.contracts.stablecoin_decimals),
            ("VAULT_SHARE_DECIMALS", self.contracts.share_decimals),
        ] {
            if decimals > 77 {
                return Err(AppError::Config(format!("{} must be at most 77", name)));
            }
        }

        if let (Some(stablecoin), Some(vault)) = (self.contracts.stablecoin, self.contracts.vault) {
            if stablecoin == vault {
                return Err(AppError::Config(
                    "VAULT_STABLECOIN_ADDRESS and VAULT_VAULT_ADDRESS must differ".to_string(),
                ));
            }
        }

        if self.timing.poll_interval.is_zero() || self.timing.receipt_poll_interval.is_zero() {
            return Err(AppError::Config("Polling intervals must be greater than 0".to_string()));
        }

        Ok(())
    }

    /// Explorer link for a transaction hash, when an explorer is configured.
    pub fn explorer_tx_url(&self, tx_hash: &str) -> Option<String> {
        self.network
            .explorer_url
            .as_ref()
            .map(|base| format!("{}/tx/{}", base, tx_hash))
    }
}

fn parse_address_env(name: &'static str) -> Result<Option<Address>> {
    match get_env_opt(name) {
        Some(raw) => Address::from_str(raw.trim())
            .map(Some)
            .map_err(|e| AppError::Config(format!("{} is not a valid address: {}", name, e))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.network.chain_id_hex(), "0x7a69");
    }

    #[test]
    fn test_rejects_bad_rpc_url() {
        let mut config = Config::default();
        config.network.rpc_url = "localhost:8545".to_string();
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_rejects_same_addresses() {
        let mut config = Config::default();
        let addr = address!("5FbDB2315678afecb367f032d93F642f64180aa3");
        config.contracts.stablecoin = Some(addr);
        config.contracts.vault = Some(addr);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_vault_is_not_configured() {
        let config = Config::default();
        assert!(matches!(
            config.contracts.require_vault(),
            Err(AppError::ContractNotConfigured(_))
        ));
        assert!(config.contracts.configured().is_empty());
    }

    #[test]
    fn test_explorer_tx_url() {
        let mut config = Config::default();
        assert_eq!(config.explorer_tx_url("0xabc"), None);

        config.network.explorer_url = Some("https://sepolia-blockscout.lisk.com".to_string());
        assert_eq!(
            config.explorer_tx_url("0xabc").as_deref(),
            Some("https://sepolia-blockscout.lisk.com/tx/0xabc")
        );
    }
}
