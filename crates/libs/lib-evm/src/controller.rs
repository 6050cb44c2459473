//! # Wallet Controller
//!
//! Orchestrates the session lifecycle on top of the lower-level pieces:
//!
//! ```text
//! NetworkGuard -> WalletAdapter::connect -> WalletSession (address set)
//!     -> BalanceReader refresh + DeploymentChecker -> observers
//! ```
//!
//! The controller owns no background work by itself. [`WalletController::watch_wallet`]
//! and [`WalletController::start_polling`] hand back guards that stop their
//! tasks when dropped.

use crate::balance::{BalancePoller, BalanceReader, PollHandle};
use crate::client::EvmClient;
use crate::deployment::DeploymentChecker;
use crate::network::NetworkGuard;
use crate::session::WalletSession;
use crate::wallet::{ProviderEvent, Subscription, WalletAdapter, WalletProvider};
use alloy_primitives::Address;
use lib_core::{Config, Result};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Session orchestration.
pub struct WalletController {
    config: Arc<Config>,
    client: EvmClient,
    wallet: WalletAdapter,
    session: Arc<WalletSession>,
    balances: BalanceReader,
    deployments: DeploymentChecker,
    guard: NetworkGuard,
}

impl WalletController {
    pub fn new(config: Arc<Config>, client: EvmClient, provider: Arc<dyn WalletProvider>) -> Self {
        let wallet = WalletAdapter::new(provider);
        Self {
            balances: BalanceReader::new(client.clone()),
            deployments: DeploymentChecker::new(client.clone()),
            guard: NetworkGuard::new(wallet.clone()),
            session: Arc::new(WalletSession::new()),
            config,
            client,
            wallet,
        }
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn client(&self) -> &EvmClient {
        &self.client
    }

    pub fn wallet(&self) -> &WalletAdapter {
        &self.wallet
    }

    pub fn session(&self) -> &Arc<WalletSession> {
        &self.session
    }

    pub fn balance_reader(&self) -> &BalanceReader {
        &self.balances
    }

    /// Interactive connect: move the wallet to the target chain, request
    /// account access, then load balances.
    ///
    /// A network guard failure aborts only when `strict_network` is set or
    /// the user rejected the switch prompt.
    pub async fn connect(&self) -> Result<Address> {
        if let Err(e) = self.guard.ensure_network(&self.config.network).await {
            if self.config.strict_network || e.is_user_rejection() {
                warn!(error = %e, "Network guard failed, aborting connect");
                return Err(e);
            }
            warn!(error = %e, "Network guard failed, connecting anyway");
        }

        let address = self.wallet.connect().await?;
        self.attach(address).await;
        Ok(address)
    }

    /// Silent reconnect on startup: adopt an already-authorized account
    /// without prompting. `None` leaves the session unauthenticated.
    pub async fn restore(&self) -> Result<Option<Address>> {
        let accounts = self.wallet.accounts().await?;
        match accounts.first() {
            Some(&address) => {
                info!(%address, "Restored wallet session");
                self.attach(address).await;
                Ok(Some(address))
            }
            None => {
                debug!("No authorized accounts to restore");
                Ok(None)
            }
        }
    }

    /// Re-read the wallet's accounts and reconcile the session with them.
    pub async fn refresh_connection_status(&self) -> Result<()> {
        let accounts = self.wallet.accounts().await?;
        self.apply_accounts(accounts).await;
        Ok(())
    }

    /// Forget the connected account. The wallet itself is not touched.
    pub fn disconnect(&self) {
        self.session.reset();
        info!("Wallet disconnected");
    }

    /// Read both balances for the current holder and commit them unless
    /// the holder changed meanwhile. Returns whether the result was committed.
    pub async fn refresh_balances(&self) -> bool {
        let Some(ticket) = self.session.ticket() else {
            return false;
        };

        let contracts = &self.config.contracts;
        let stablecoin = match contracts.stablecoin {
            Some(token) => Some(
                self.balances
                    .read_balance(token, ticket.holder, contracts.stablecoin_decimals)
                    .await,
            ),
            None => None,
        };
        let shares = match contracts.vault {
            Some(vault) => Some(
                self.balances
                    .read_balance(vault, ticket.holder, contracts.share_decimals)
                    .await,
            ),
            None => None,
        };

        self.session.commit_balances(ticket, stablecoin, shares)
    }

    /// Check every configured contract for bytecode and cache the result.
    pub async fn check_deployments(&self) {
        let addresses = self.config.contracts.configured();
        let statuses = self.deployments.check_all(&addresses).await;
        for status in statuses.iter().filter(|s| !s.has_code) {
            warn!(address = %status.address, "Configured contract has no code");
        }
        self.session.set_deployments(statuses);
    }

    /// Apply a wallet event to the session.
    pub async fn handle_event(&self, event: ProviderEvent) {
        match event {
            ProviderEvent::AccountsChanged(accounts) => self.apply_accounts(accounts).await,
            ProviderEvent::ChainChanged(chain_id) => {
                info!(chain_id, "Wallet chain changed");
                self.session.set_chain_id(chain_id);
                if chain_id != self.config.network.chain_id {
                    warn!(
                        chain_id,
                        expected = self.config.network.chain_id,
                        "Wallet moved off the target network"
                    );
                }
            }
        }
    }

    /// Follow wallet events until the returned guard is dropped.
    pub fn watch_wallet(self: &Arc<Self>) -> Subscription {
        let mut events = self.wallet.events();
        let controller = Arc::clone(self);
        Subscription::from_task(tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => controller.handle_event(event).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Missed wallet events, re-reading accounts");
                        if let Err(e) = controller.refresh_connection_status().await {
                            warn!(error = %e, "Account refresh failed");
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }))
    }

    /// Refresh balances every `poll_interval` until the handle is dropped.
    pub fn start_polling(self: &Arc<Self>) -> PollHandle {
        let controller = Arc::clone(self);
        BalancePoller::spawn(self.config.timing.poll_interval, move || {
            let controller = controller.clone();
            async move {
                controller.refresh_balances().await;
            }
        })
    }

    async fn apply_accounts(&self, accounts: Vec<Address>) {
        match accounts.first() {
            None => {
                if self.session.is_connected() {
                    info!("Wallet locked or disconnected");
                    self.session.reset();
                }
            }
            Some(&address) if self.session.address() == Some(address) => {}
            Some(&address) => {
                info!(%address, "Active account changed");
                self.attach(address).await;
            }
        }
    }

    async fn attach(&self, address: Address) {
        let chain_id = match self.wallet.chain_id().await {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(error = %e, "Could not read wallet chain id");
                None
            }
        };
        self.session.set_connected(address, chain_id);
        self.refresh_balances().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RpcError;
    use crate::testing::{MockTransport, MockWallet, ALICE, BOB, STABLECOIN, VAULT};
    use alloy_primitives::U256;
    use lib_core::AppError;
    use std::time::Duration;

    fn config() -> Arc<Config> {
        let mut config = Config::default();
        config.contracts.stablecoin = Some(STABLECOIN);
        config.contracts.vault = Some(VAULT);
        Arc::new(config)
    }

    fn setup() -> (Arc<MockTransport>, Arc<MockWallet>, Arc<WalletController>) {
        let node = MockTransport::new();
        let wallet = MockWallet::new(node.clone());
        let controller = Arc::new(WalletController::new(
            config(),
            EvmClient::new(node.clone()),
            wallet.clone(),
        ));
        (node, wallet, controller)
    }

    async fn wait_until(mut check: impl FnMut() -> bool) {
        for _ in 0..100 {
            if check() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached");
    }

    #[tokio::test]
    async fn test_connect_sets_address_and_fetches_balances() {
        let (node, _wallet, controller) = setup();
        node.set_balance(STABLECOIN, ALICE, U256::from(100_000_000u64));
        node.set_balance(VAULT, ALICE, U256::from(5u64) * U256::from(10u64).pow(U256::from(17u64)));

        let address = controller.connect().await.unwrap();
        assert_eq!(address, ALICE);

        let state = controller.session().snapshot();
        assert!(state.is_connected());
        assert_eq!(state.chain_id, Some(31337));
        assert_eq!(state.stablecoin_amount(), U256::from(100_000_000u64));
        assert_eq!(state.share_balance.unwrap().display(), "0.50");
    }

    #[tokio::test]
    async fn test_connect_rejected_leaves_session_empty() {
        let (_node, wallet, controller) = setup();
        wallet.fail("eth_requestAccounts", RpcError::rpc(4001, "User rejected the request."));

        assert!(matches!(controller.connect().await, Err(AppError::UserRejected(_))));
        assert!(!controller.session().is_connected());
    }

    #[tokio::test]
    async fn test_network_failure_is_not_fatal_unless_strict() {
        let (_node, wallet, controller) = setup();
        wallet.fail("wallet_switchEthereumChain", RpcError::rpc(-32603, "Internal error"));
        assert_eq!(controller.connect().await.unwrap(), ALICE);

        let node = MockTransport::new();
        let wallet = MockWallet::new(node.clone());
        wallet.fail("wallet_switchEthereumChain", RpcError::rpc(-32603, "Internal error"));
        let mut strict = (*config()).clone();
        strict.strict_network = true;
        let controller = WalletController::new(Arc::new(strict), EvmClient::new(node), wallet.clone());

        assert!(matches!(controller.connect().await, Err(AppError::NetworkMismatch(_))));
        assert_eq!(wallet.calls("eth_requestAccounts"), 0);
    }

    #[tokio::test]
    async fn test_restore_without_accounts() {
        let (_node, wallet, controller) = setup();
        wallet.set_accounts(vec![]);
        assert_eq!(controller.restore().await.unwrap(), None);
        assert!(!controller.session().is_connected());
        assert_eq!(wallet.calls("eth_requestAccounts"), 0);
    }

    #[tokio::test]
    async fn test_disconnect_during_refresh_keeps_reset_state() {
        let (node, _wallet, controller) = setup();
        node.set_balance(STABLECOIN, ALICE, U256::from(1_000_000u64));
        controller.restore().await.unwrap();

        node.hold_calls();
        let refreshing = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.refresh_balances().await })
        };
        let calls_before = node.calls("eth_call");
        wait_until(|| node.calls("eth_call") > calls_before).await;

        controller.disconnect();
        node.release_calls(2);

        assert!(!refreshing.await.unwrap());
        let state = controller.session().snapshot();
        assert_eq!(state.address, None);
        assert!(!state.is_connected());
        assert_eq!(state.stablecoin_balance, None);
        assert_eq!(state.share_balance, None);
    }

    #[tokio::test]
    async fn test_account_events_follow_wallet() {
        let (node, wallet, controller) = setup();
        node.set_balance(STABLECOIN, BOB, U256::from(42u64));
        controller.restore().await.unwrap();
        let _watch = controller.watch_wallet();
        tokio::task::yield_now().await;

        wallet.emit(ProviderEvent::AccountsChanged(vec![BOB]));
        wait_until(|| controller.session().snapshot().stablecoin_amount() == U256::from(42u64)).await;
        assert_eq!(controller.session().address(), Some(BOB));

        wallet.emit(ProviderEvent::ChainChanged(1));
        wait_until(|| controller.session().snapshot().chain_id == Some(1)).await;

        // Empty list means the wallet was locked.
        wallet.emit(ProviderEvent::AccountsChanged(vec![]));
        wait_until(|| !controller.session().is_connected()).await;
    }

    #[tokio::test]
    async fn test_check_deployments() {
        let (node, _wallet, controller) = setup();
        node.respond_code(VAULT, "0x6080");

        controller.check_deployments().await;
        let state = controller.session().snapshot();
        assert_eq!(state.deployment(VAULT), Some(true));
        assert_eq!(state.deployment(STABLECOIN), Some(false));
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_picks_up_new_balance() {
        let (node, _wallet, controller) = setup();
        controller.restore().await.unwrap();
        let poller = controller.start_polling();

        node.set_balance(STABLECOIN, ALICE, U256::from(7_000_000u64));
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(controller.session().snapshot().stablecoin_amount(), U256::from(7_000_000u64));
        drop(poller);
    }
}
