//! Session state to display DTO

use alloy_primitives::{Address, U256};
use lib_core::Config;
use lib_evm::units::format_fixed;
use lib_evm::SessionState;
use shared::dto::session::{BalanceView, ContractView, SessionView, VaultView};
use shared::utils::truncate_address;

/// Build the display view of a session snapshot.
///
/// Balances are listed for every configured token, zero until read.
/// Contracts that were never checked are reported as not deployed.
pub fn session_view(state: &SessionState, config: &Config) -> SessionView {
    let contracts = &config.contracts;
    let mut view = SessionView::disconnected(config.network.chain_id);

    view.contracts = [("Stablecoin", contracts.stablecoin), ("Vault", contracts.vault)]
        .into_iter()
        .filter_map(|(name, address)| address.map(|a| (name, a)))
        .map(|(name, address)| ContractView {
            name: name.to_string(),
            address: address.to_string(),
            deployed: state.deployment(address).unwrap_or(false),
        })
        .collect();

    let Some(holder) = state.address else {
        return view;
    };

    view.connected = true;
    view.address = Some(holder.to_string());
    view.short_address = Some(truncate_address(&holder.to_string()));
    view.chain_id = state.chain_id;

    if let Some(token) = contracts.stablecoin {
        view.balances.push(balance_view(
            &contracts.stablecoin_symbol,
            token,
            state.stablecoin_amount(),
            contracts.stablecoin_decimals,
        ));
    }
    if let Some(vault) = contracts.vault {
        view.balances.push(balance_view(
            &contracts.share_symbol,
            vault,
            state.share_amount(),
            contracts.share_decimals,
        ));
    }

    view
}

fn balance_view(symbol: &str, token: Address, amount: U256, decimals: u8) -> BalanceView {
    BalanceView {
        symbol: symbol.to_string(),
        token_address: token.to_string(),
        raw: amount.to_string(),
        display: format_fixed(amount, decimals, 2),
    }
}

/// Vault totals formatted in stablecoin units.
pub fn vault_view(total_assets: U256, position: U256, config: &Config) -> VaultView {
    let decimals = config.contracts.stablecoin_decimals;
    VaultView {
        symbol: config.contracts.stablecoin_symbol.clone(),
        total_assets: format_fixed(total_assets, decimals, 2),
        position: format_fixed(position, decimals, 2),
    }
}

/// True when two views differ in anything but their timestamp.
pub fn content_changed(prev: &SessionView, next: &SessionView) -> bool {
    prev.connected != next.connected
        || prev.address != next.address
        || prev.chain_id != next.chain_id
        || prev.balances != next.balances
        || prev.contracts != next.contracts
        || prev.vault != next.vault
}
