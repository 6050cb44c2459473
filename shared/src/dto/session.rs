//! # Session DTOs
//!
//! Rendered snapshot of a wallet session, as printed by `status --json`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One token balance, already formatted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceView {
    pub symbol: String,
    pub token_address: String,
    /// Smallest-unit amount as a decimal string
    pub raw: String,
    /// Amount rounded to 2 decimal places
    pub display: String,
}

/// Deployment status of one configured contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractView {
    pub name: String,
    pub address: String,
    pub deployed: bool,
}

/// Vault-wide totals and the holder's position, in stablecoin units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultView {
    pub symbol: String,
    pub total_assets: String,
    /// Stablecoin value of the holder's shares
    pub position: String,
}

/// Session snapshot for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_address: Option<String>,
    /// Chain the wallet reports, if connected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    /// Chain the client is configured for
    pub target_chain_id: u64,
    pub balances: Vec<BalanceView>,
    pub contracts: Vec<ContractView>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vault: Option<VaultView>,
    pub updated_at: DateTime<Utc>,
}

impl SessionView {
    /// View of a session with no connected account.
    pub fn disconnected(target_chain_id: u64) -> Self {
        Self {
            connected: false,
            address: None,
            short_address: None,
            chain_id: None,
            target_chain_id,
            balances: Vec::new(),
            contracts: Vec::new(),
            vault: None,
            updated_at: Utc::now(),
        }
    }

    /// True when the wallet is connected to a chain other than the target.
    pub fn wrong_network(&self) -> bool {
        matches!(self.chain_id, Some(id) if id != self.target_chain_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnected_omits_address() {
        let json = serde_json::to_value(SessionView::disconnected(31337)).unwrap();
        assert_eq!(json["connected"], false);
        assert!(json.get("address").is_none());
        assert!(json.get("vault").is_none());
        assert_eq!(json["target_chain_id"], 31337);
    }

    #[test]
    fn test_wrong_network() {
        let mut view = SessionView::disconnected(31337);
        assert!(!view.wrong_network());
        view.chain_id = Some(4202);
        assert!(view.wrong_network());
    }

    #[test]
    fn test_roundtrip() {
        let mut view = SessionView::disconnected(31337);
        view.balances.push(BalanceView {
            symbol: "USDC".to_string(),
            token_address: "0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string(),
            raw: "100000000".to_string(),
            display: "100.00".to_string(),
        });
        let json = serde_json::to_string(&view).unwrap();
        let back: SessionView = serde_json::from_str(&json).unwrap();
        assert_eq!(back, view);
    }
}
