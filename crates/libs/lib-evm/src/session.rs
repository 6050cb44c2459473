//! # Wallet Session State
//!
//! Single source of truth for "who is connected, on which chain, with which
//! balances". Held behind an `Arc` and shared by the controller, the
//! transaction flows and the front end. Observers subscribe to a
//! `tokio::sync::watch` channel and always see the latest state.
//!
//! ## Stale refresh protection
//!
//! Balance reads are slow and the holder can change while one is in flight
//! (disconnect, account switch). Every change of holder bumps
//! [`SessionState::epoch`]. A refresh captures a [`SessionTicket`] before it
//! starts and may only commit while the ticket still matches; otherwise its
//! result is dropped.

use crate::balance::BalanceSnapshot;
use crate::deployment::DeploymentStatus;
use alloy_primitives::{Address, U256};
use tokio::sync::watch;
use tracing::{debug, info};

/// Observable session state.
///
/// `connected` is not stored: it is derived from `address`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionState {
    pub address: Option<Address>,
    pub chain_id: Option<u64>,
    pub stablecoin_balance: Option<BalanceSnapshot>,
    pub share_balance: Option<BalanceSnapshot>,
    /// Deployment checks of configured contracts. Independent of the wallet.
    pub deployments: Vec<DeploymentStatus>,
    /// Bumped whenever the holder changes
    pub epoch: u64,
}

impl SessionState {
    pub fn is_connected(&self) -> bool {
        self.address.is_some()
    }

    /// Stablecoin balance, zero when disconnected or not yet read.
    pub fn stablecoin_amount(&self) -> U256 {
        self.visible(&self.stablecoin_balance)
    }

    /// Share balance, zero when disconnected or not yet read.
    pub fn share_amount(&self) -> U256 {
        self.visible(&self.share_balance)
    }

    fn visible(&self, snapshot: &Option<BalanceSnapshot>) -> U256 {
        match (self.address, snapshot) {
            (Some(holder), Some(s)) if s.holder == holder => s.amount,
            _ => U256::ZERO,
        }
    }

    /// Cached deployment status. `None` if the address was never checked.
    pub fn deployment(&self, address: Address) -> Option<bool> {
        self.deployments
            .iter()
            .find(|s| s.address == address)
            .map(|s| s.has_code)
    }
}

/// Captured before a refresh; the refresh commits only while it still matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTicket {
    pub epoch: u64,
    pub holder: Address,
}

/// Shared session.
pub struct WalletSession {
    state: watch::Sender<SessionState>,
}

impl Default for WalletSession {
    fn default() -> Self {
        Self::new()
    }
}

impl WalletSession {
    /// New unauthenticated session.
    pub fn new() -> Self {
        Self {
            state: watch::Sender::new(SessionState::default()),
        }
    }

    /// Current state.
    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn address(&self) -> Option<Address> {
        self.state.borrow().address
    }

    pub fn is_connected(&self) -> bool {
        self.state.borrow().is_connected()
    }

    /// Receiver that is notified on every change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Ticket for the current holder, `None` when disconnected.
    pub fn ticket(&self) -> Option<SessionTicket> {
        let state = self.state.borrow();
        state.address.map(|holder| SessionTicket {
            epoch: state.epoch,
            holder,
        })
    }

    /// Set the connected account. A different holder starts a new epoch and
    /// clears balances; reconnecting the same holder only updates the chain.
    pub fn set_connected(&self, address: Address, chain_id: Option<u64>) -> SessionTicket {
        let mut ticket = SessionTicket { epoch: 0, holder: address };
        self.state.send_modify(|state| {
            if state.address != Some(address) {
                state.epoch += 1;
                state.address = Some(address);
                state.stablecoin_balance = None;
                state.share_balance = None;
                info!(%address, epoch = state.epoch, "Session connected");
            }
            if chain_id.is_some() {
                state.chain_id = chain_id;
            }
            ticket.epoch = state.epoch;
        });
        ticket
    }

    /// Back to the unauthenticated state. Deployment checks are kept.
    pub fn reset(&self) {
        self.state.send_modify(|state| {
            state.epoch += 1;
            state.address = None;
            state.chain_id = None;
            state.stablecoin_balance = None;
            state.share_balance = None;
            info!(epoch = state.epoch, "Session reset");
        });
    }

    pub fn set_chain_id(&self, chain_id: u64) {
        self.state.send_if_modified(|state| {
            if state.chain_id == Some(chain_id) {
                return false;
            }
            state.chain_id = Some(chain_id);
            true
        });
    }

    /// Commit refreshed balances if `ticket` is still current.
    ///
    /// Returns `false` and leaves the state untouched when the holder
    /// changed since the ticket was taken.
    pub fn commit_balances(
        &self,
        ticket: SessionTicket,
        stablecoin: Option<BalanceSnapshot>,
        shares: Option<BalanceSnapshot>,
    ) -> bool {
        let mut committed = false;
        self.state.send_if_modified(|state| {
            if state.epoch != ticket.epoch || state.address != Some(ticket.holder) {
                debug!(
                    ticket_epoch = ticket.epoch,
                    current_epoch = state.epoch,
                    "Discarding stale balance refresh"
                );
                return false;
            }
            committed = true;
            if state.stablecoin_balance == stablecoin && state.share_balance == shares {
                return false;
            }
            state.stablecoin_balance = stablecoin;
            state.share_balance = shares;
            true
        });
        committed
    }

    pub fn set_deployments(&self, deployments: Vec<DeploymentStatus>) {
        self.state.send_modify(|state| state.deployments = deployments);
    }
}
