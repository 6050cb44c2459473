//! # Commands
//!
//! One method per CLI subcommand. Command output goes to stdout, progress
//! and logs to stderr.

use super::view::{content_changed, session_view, vault_view};
use crate::cli::Command;
use crate::ui::{render_notification, render_session, render_summary_line, render_tx_state};
use alloy_primitives::U256;
use async_channel::Receiver;
use lib_core::{AppError, Config};
use lib_evm::{
    EvmClient, NodeWallet, Notification, Notifier, TxReceipt, VaultActions, VaultReader, WalletController,
    WalletProvider,
};
use shared::dto::session::VaultView;
use std::future::Future;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// Wired-up controller, vault flows and the notification stream they report to.
pub struct App {
    controller: Arc<WalletController>,
    actions: VaultActions,
    notifications: Receiver<Notification>,
    accounts: Option<Arc<NodeWallet>>,
}

impl App {
    pub fn new(config: Arc<Config>, client: EvmClient, provider: Arc<dyn WalletProvider>) -> Self {
        let controller = Arc::new(WalletController::new(config, client, provider));
        let (notifier, notifications) = Notifier::channel();
        let actions = VaultActions::new(controller.clone(), notifier);
        Self {
            controller,
            actions,
            notifications,
            accounts: None,
        }
    }

    /// Let `watch` switch the active node account from stdin.
    pub fn with_account_switcher(mut self, wallet: Arc<NodeWallet>) -> Self {
        self.accounts = Some(wallet);
        self
    }

    /// Run one subcommand to completion.
    pub async fn run(&self, command: Command) -> anyhow::Result<ExitCode> {
        info!(?command, "Running command");
        if command.requires_connection() && self.controller.restore().await?.is_none() {
            warn!("No authorized account; the flow will report it");
        }

        match command {
            Command::Status { json } => self.status(json).await,
            Command::Connect => self.connect().await,
            Command::Deposit { amount } => self.transact(self.actions.deposit(&amount)).await,
            Command::Withdraw { amount } => self.transact(self.actions.withdraw(&amount)).await,
            Command::Mint { amount } => self.transact(self.actions.mint(&amount)).await,
            Command::Watch => self.watch().await,
        }
    }

    async fn status(&self, json: bool) -> anyhow::Result<ExitCode> {
        self.controller.restore().await?;
        self.controller.check_deployments().await;

        let state = self.controller.session().snapshot();
        let mut view = session_view(&state, self.controller.config());
        if state.is_connected() {
            view.vault = self.read_vault(state.share_amount()).await;
        }
        if json {
            println!("{}", serde_json::to_string_pretty(&view)?);
        } else {
            print!("{}", render_session(&view));
        }
        Ok(ExitCode::SUCCESS)
    }

    /// Vault totals, or `None` when the vault is unavailable.
    async fn read_vault(&self, shares: U256) -> Option<VaultView> {
        let config = self.controller.config();
        let vault = config.contracts.vault?;
        if self.controller.session().snapshot().deployment(vault) != Some(true) {
            return None;
        }

        let reader = VaultReader::new(self.controller.client().clone(), vault);
        let totals = async {
            let total_assets = reader.total_assets().await?;
            let position = reader.convert_to_assets(shares).await?;
            Ok::<_, AppError>((total_assets, position))
        };
        match totals.await {
            Ok((total_assets, position)) => Some(vault_view(total_assets, position, config)),
            Err(e) => {
                warn!(error = %e, "Could not read vault totals");
                None
            }
        }
    }

    async fn connect(&self) -> anyhow::Result<ExitCode> {
        self.controller.check_deployments().await;
        match self.controller.connect().await {
            Ok(address) => {
                info!(%address, "Connected");
                let view = session_view(&self.controller.session().snapshot(), self.controller.config());
                print!("{}", render_session(&view));
                if view.wrong_network() {
                    warn!(
                        chain_id = ?view.chain_id,
                        expected = view.target_chain_id,
                        "Wallet is not on the target network"
                    );
                }
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                let notification = Notification::from_error(connect_error_title(&e), &e);
                println!("{}", render_notification(&notification));
                Ok(ExitCode::FAILURE)
            }
        }
    }

    /// Drive a vault flow while printing progress and notifications as they arrive.
    async fn transact<F>(&self, flow: F) -> anyhow::Result<ExitCode>
    where
        F: Future<Output = lib_core::Result<TxReceipt>>,
    {
        self.controller.check_deployments().await;

        let mut progress = self.actions.subscribe();
        tokio::pin!(flow);

        let result = loop {
            tokio::select! {
                result = &mut flow => break result,
                Ok(notification) = self.notifications.recv() => {
                    println!("{}", render_notification(&notification));
                }
                Ok(()) = progress.changed() => {
                    if let Some(line) = render_tx_state(&progress.borrow_and_update()) {
                        eprintln!("{}", line);
                    }
                }
            }
        };

        while let Ok(notification) = self.notifications.try_recv() {
            println!("{}", render_notification(&notification));
        }

        match result {
            Ok(receipt) => {
                info!(
                    tx_hash = %receipt.transaction_hash,
                    block = receipt.block_number,
                    "Flow confirmed"
                );
                let view = session_view(&self.controller.session().snapshot(), self.controller.config());
                print!("{}", render_session(&view));
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                warn!(error = %e, code = e.code(), "Flow failed");
                Ok(ExitCode::FAILURE)
            }
        }
    }

    async fn watch(&self) -> anyhow::Result<ExitCode> {
        if self.controller.restore().await?.is_none() {
            eprintln!("No authorized account yet; waiting for the wallet.");
        }
        self.controller.check_deployments().await;

        let mut session = self.controller.session().subscribe();
        let _events = self.controller.watch_wallet();
        let _poller = self.controller.start_polling();

        let config = self.controller.config();
        let mut last = session_view(&session.borrow_and_update(), config);
        println!("{}", render_summary_line(&last));

        let mut input = BufReader::new(tokio::io::stdin()).lines();
        let mut input_open = self.accounts.is_some();
        if input_open {
            eprintln!("Type an account index and press Enter to switch accounts.");
        }

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted, stopping watch");
                    break;
                }
                changed = session.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let view = session_view(&session.borrow_and_update(), config);
                    if content_changed(&last, &view) {
                        println!("{}", render_summary_line(&view));
                        last = view;
                    }
                }
                line = input.next_line(), if input_open => match line {
                    Ok(Some(text)) => self.switch_account(&text).await,
                    Ok(None) => input_open = false,
                    Err(e) => {
                        warn!(error = %e, "Could not read stdin");
                        input_open = false;
                    }
                },
            }
        }

        Ok(ExitCode::SUCCESS)
    }
}

impl App {
    /// Make the node account at the typed index active. The wallet's
    /// `accountsChanged` event carries the switch into the session.
    async fn switch_account(&self, text: &str) {
        let Some(wallet) = &self.accounts else {
            return;
        };
        let Some(index) = parse_account_index(text) else {
            eprintln!("'{}' is not an account index", text.trim());
            return;
        };
        match wallet.select_account(index).await {
            Ok(Some(address)) => eprintln!("Switched to account {} ({})", index, address),
            Ok(None) => eprintln!("The node has no account {}", index),
            Err(e) => warn!(error = %e, index, "Account switch failed"),
        }
    }
}

fn parse_account_index(text: &str) -> Option<usize> {
    text.trim().parse().ok()
}

fn connect_error_title(error: &AppError) -> &'static str {
    match error {
        AppError::NoWalletFound(_) => "No wallet found",
        AppError::UserRejected(_) => "Connection rejected",
        AppError::NetworkMismatch(_) => "Wrong network",
        _ => "Connection failed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_account_index() {
        assert_eq!(parse_account_index(" 2\n"), Some(2));
        assert_eq!(parse_account_index("0"), Some(0));
        assert_eq!(parse_account_index("-1"), None);
        assert_eq!(parse_account_index("bob"), None);
    }

    #[test]
    fn test_connect_error_title() {
        assert_eq!(
            connect_error_title(&AppError::NoWalletFound("No accounts found".to_string())),
            "No wallet found"
        );
        assert_eq!(
            connect_error_title(&AppError::UserRejected("denied".to_string())),
            "Connection rejected"
        );
        assert_eq!(
            connect_error_title(&AppError::Rpc("down".to_string())),
            "Connection failed"
        );
    }
}
