//! # Balance Reader
//!
//! Reads ERC-20 balances with `balanceOf` over `eth_call` and keeps them
//! fresh with a background poller.
//!
//! A failed read is not an error for the caller: it produces a zero
//! snapshot and a warning, so one flaky RPC call never blanks the view.

use crate::client::{BlockTag, EvmClient};
use crate::contracts::{self, IERC20};
use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;
use lib_core::Result;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// One token balance at one point in time. Replaced wholesale on refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceSnapshot {
    pub holder: Address,
    pub token: Address,
    /// Amount in the token's smallest unit
    pub amount: U256,
    pub decimals: u8,
}

impl BalanceSnapshot {
    pub fn zero(holder: Address, token: Address, decimals: u8) -> Self {
        Self {
            holder,
            token,
            amount: U256::ZERO,
            decimals,
        }
    }

    /// Amount rounded to 2 decimal places, half-up.
    pub fn display(&self) -> String {
        crate::units::format_fixed(self.amount, self.decimals, 2)
    }
}

/// `balanceOf` reader.
#[derive(Clone)]
pub struct BalanceReader {
    client: EvmClient,
}

impl BalanceReader {
    pub fn new(client: EvmClient) -> Self {
        Self { client }
    }

    /// Balance of `holder` in `token`, or a zero snapshot if the read fails.
    pub async fn read_balance(&self, token: Address, holder: Address, decimals: u8) -> BalanceSnapshot {
        match self.try_read_balance(token, holder).await {
            Ok(amount) => {
                debug!(%token, %holder, %amount, "Balance read");
                BalanceSnapshot {
                    holder,
                    token,
                    amount,
                    decimals,
                }
            }
            Err(e) => {
                warn!(%token, %holder, error = %e, "Balance read failed, showing zero");
                BalanceSnapshot::zero(holder, token, decimals)
            }
        }
    }

    /// Balance of `holder` in `token`, surfacing failures.
    pub async fn try_read_balance(&self, token: Address, holder: Address) -> Result<U256> {
        let data = contracts::balance_of(holder);
        let raw = self
            .client
            .call(None, token, &data, BlockTag::Latest)
            .await
            .map_err(|e| crate::error::classify(&e))?;
        let decoded = IERC20::balanceOfCall::abi_decode_returns(&raw, true)
            .map_err(|e| lib_core::AppError::Decoding(format!("balanceOf: {}", e)))?;
        Ok(decoded.balance)
    }
}

/// Owns a polling task. Dropping it stops the task.
#[must_use = "dropping a PollHandle stops polling"]
pub struct PollHandle {
    handle: JoinHandle<()>,
}

impl PollHandle {
    /// Stop polling now.
    pub fn cancel(self) {
        self.handle.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Runs a refresh function on a fixed cadence.
pub struct BalancePoller;

impl BalancePoller {
    /// Call `refresh` immediately and then every `interval` until the
    /// returned handle is dropped. Ticks missed while a refresh is running
    /// are skipped, never queued.
    pub fn spawn<F, Fut>(interval: Duration, refresh: F) -> PollHandle
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                refresh().await;
            }
        });
        PollHandle { handle }
    }
}
