//! Text rendering of session views, notifications and transaction progress.
//!
//! Every function returns a `String`; printing is left to the caller.

use lib_evm::{Notification, NotificationLevel, TxState};
use lib_utils::time::short_time;
use shared::dto::session::SessionView;
use std::fmt::Write;

/// Multi-line status block.
///
/// ```text
/// Wallet     0xf39F...2266
/// Network    31337
/// Balances
///   USDC       100.00
///   SHARES     0.00
/// Vault      1000.00 USDC total, your position 0.00 USDC
/// Contracts
///   Stablecoin 0x5FbD...0aa3  deployed
///   Vault      0xe7f1...0512  not deployed
/// ```
pub fn render_session(view: &SessionView) -> String {
    let mut out = String::new();

    match &view.address {
        Some(address) if view.connected => {
            let _ = writeln!(out, "{:<10} {}", "Wallet", shared::utils::truncate_address(address));
        }
        _ => {
            let _ = writeln!(out, "{:<10} not connected", "Wallet");
        }
    }

    match view.chain_id {
        Some(id) if view.wrong_network() => {
            let _ = writeln!(out, "{:<10} {} (expected {})", "Network", id, view.target_chain_id);
        }
        Some(id) => {
            let _ = writeln!(out, "{:<10} {}", "Network", id);
        }
        None => {
            let _ = writeln!(out, "{:<10} {} (target)", "Network", view.target_chain_id);
        }
    }

    if !view.balances.is_empty() {
        out.push_str("Balances\n");
        for balance in &view.balances {
            let _ = writeln!(out, "  {:<10} {}", balance.symbol, balance.display);
        }
    }

    if let Some(vault) = &view.vault {
        let _ = writeln!(
            out,
            "{:<10} {} {} total, your position {} {}",
            "Vault", vault.total_assets, vault.symbol, vault.position, vault.symbol
        );
    }

    if view.contracts.is_empty() {
        out.push_str("Contracts  none configured\n");
    } else {
        out.push_str("Contracts\n");
        for contract in &view.contracts {
            let status = if contract.deployed { "deployed" } else { "not deployed" };
            let _ = writeln!(
                out,
                "  {:<10} {}  {}",
                contract.name,
                shared::utils::truncate_address(&contract.address),
                status
            );
        }
    }

    out
}

/// One line for `watch`: time, account and balances.
pub fn render_summary_line(view: &SessionView) -> String {
    let time = short_time(view.updated_at);
    let Some(short) = view.short_address.as_deref().filter(|_| view.connected) else {
        return format!("[{}] not connected", time);
    };

    let mut line = format!("[{}] {}", time, short);
    for balance in &view.balances {
        let _ = write!(line, "  {} {}", balance.symbol, balance.display);
    }
    if view.wrong_network() {
        line.push_str("  (wrong network)");
    }
    line
}

/// Notification as shown to the user, with the explorer link on its own line.
pub fn render_notification(notification: &Notification) -> String {
    let marker = match notification.level {
        NotificationLevel::Success => "ok",
        NotificationLevel::Error => "error",
        NotificationLevel::Info => "info",
    };

    let mut out = format!(
        "[{}] {:<5} {}",
        short_time(notification.at),
        marker,
        notification.title
    );
    if !notification.description.is_empty() {
        let _ = write!(out, ": {}", notification.description);
    }
    if let Some(url) = &notification.explorer_url {
        let _ = write!(out, "\n        {}", url);
    }
    out
}

/// Progress line for a submitter state. Terminal states are reported by
/// notifications instead, so they render as `None`.
pub fn render_tx_state(state: &TxState) -> Option<String> {
    match state {
        TxState::Submitting(kind) => Some(format!("{}: waiting for wallet signature...", kind)),
        TxState::Pending { kind, hash } => Some(format!("{}: submitted {}, waiting for receipt...", kind, hash)),
        TxState::Idle | TxState::Validating(_) | TxState::Confirmed { .. } | TxState::Failed { .. } => None,
    }
}
