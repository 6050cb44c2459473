//! # Transaction Submitter
//!
//! Drives one write from user intent to a mined receipt:
//!
//! ```text
//! Idle -> Validating --(invalid)--> Idle + error
//!             |
//!             v
//!        Submitting --(user declines)--> Idle + UserRejected
//!             |     --(wallet error)----> Failed
//!             |
//!             v
//!        Pending(hash) --(revert / timeout)--> Failed
//!             |
//!             v
//!        Confirmed(hash)
//! ```
//!
//! Validation happens entirely locally, so an invalid intent never reaches
//! the wallet. The current state is published on a `watch` channel.
//! Broadcast transactions are never cancelled or retried.

use crate::client::{BlockTag, EvmClient, TxReceipt};
use crate::contracts;
use crate::error::classify;
use crate::session::WalletSession;
use crate::wallet::WalletAdapter;
use alloy_primitives::{hex, Address, Bytes, B256, U256};
use lib_core::{AppError, Result, TimingConfig};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// What a transaction does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TxKind {
    Approve,
    Deposit,
    Withdraw,
    Mint,
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TxKind::Approve => "Approve",
            TxKind::Deposit => "Deposit",
            TxKind::Withdraw => "Withdraw",
            TxKind::Mint => "Mint",
        };
        write!(f, "{}", name)
    }
}

/// A write the user asked for. Contract addresses come from configuration
/// and may be missing; validation reports that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionIntent {
    pub kind: TxKind,
    /// Contract the transaction is sent to
    pub target: Option<Address>,
    /// Amount in the smallest unit of the relevant token
    pub amount: U256,
    /// Approved spender, for [`TxKind::Approve`]
    pub spender: Option<Address>,
}

impl TransactionIntent {
    pub fn approve(token: Option<Address>, spender: Option<Address>, amount: U256) -> Self {
        Self {
            kind: TxKind::Approve,
            target: token,
            amount,
            spender,
        }
    }

    pub fn deposit(vault: Option<Address>, amount: U256) -> Self {
        Self {
            kind: TxKind::Deposit,
            target: vault,
            amount,
            spender: None,
        }
    }

    pub fn withdraw(vault: Option<Address>, amount: U256) -> Self {
        Self {
            kind: TxKind::Withdraw,
            target: vault,
            amount,
            spender: None,
        }
    }

    pub fn mint(stablecoin: Option<Address>, amount: U256) -> Self {
        Self {
            kind: TxKind::Mint,
            target: stablecoin,
            amount,
            spender: None,
        }
    }

    /// ABI-encoded call for `holder`, who is also receiver and owner.
    pub fn calldata(&self, holder: Address) -> Result<Bytes> {
        Ok(match self.kind {
            TxKind::Approve => {
                let spender = self.spender.ok_or_else(|| {
                    AppError::ContractNotConfigured("Approval spender is not configured.".to_string())
                })?;
                contracts::approve(spender, self.amount)
            }
            TxKind::Deposit => contracts::deposit(self.amount, holder),
            TxKind::Withdraw => contracts::withdraw(self.amount, holder, holder),
            TxKind::Mint => contracts::mint(holder, self.amount),
        })
    }
}

/// Observable submitter state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TxState {
    #[default]
    Idle,
    Validating(TxKind),
    Submitting(TxKind),
    Pending { kind: TxKind, hash: B256 },
    Confirmed { kind: TxKind, hash: B256 },
    Failed { kind: TxKind, hash: Option<B256>, error: AppError },
}

impl TxState {
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            TxState::Validating(_) | TxState::Submitting(_) | TxState::Pending { .. }
        )
    }

    pub fn hash(&self) -> Option<B256> {
        match self {
            TxState::Pending { hash, .. } | TxState::Confirmed { hash, .. } => Some(*hash),
            TxState::Failed { hash, .. } => *hash,
            _ => None,
        }
    }
}

/// Error from [`TransactionSubmitter::submit`] with the hash, if the
/// transaction was broadcast before it failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxFailure {
    pub error: AppError,
    pub hash: Option<B256>,
}

impl From<AppError> for TxFailure {
    fn from(error: AppError) -> Self {
        Self { error, hash: None }
    }
}

impl fmt::Display for TxFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.hash {
            Some(hash) => write!(f, "{} (tx {})", self.error, hash),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for TxFailure {}

/// Submits intents through the wallet and follows them to a receipt.
pub struct TransactionSubmitter {
    client: EvmClient,
    wallet: WalletAdapter,
    session: Arc<WalletSession>,
    timing: TimingConfig,
    state: watch::Sender<TxState>,
}

impl TransactionSubmitter {
    pub fn new(
        client: EvmClient,
        wallet: WalletAdapter,
        session: Arc<WalletSession>,
        timing: TimingConfig,
    ) -> Self {
        Self {
            client,
            wallet,
            session,
            timing,
            state: watch::Sender::new(TxState::Idle),
        }
    }

    pub fn state(&self) -> TxState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TxState> {
        self.state.subscribe()
    }

    /// Check an intent against the session without sending anything.
    ///
    /// # Errors
    /// - [`AppError::WalletNotConnected`] without a connected holder
    /// - [`AppError::InvalidAmount`] for a zero amount
    /// - [`AppError::ContractNotConfigured`] if the target is missing or known to have no code
    pub fn validate(&self, intent: &TransactionIntent) -> Result<(Address, Address)> {
        let session = self.session.snapshot();
        let holder = session.address.ok_or(AppError::WalletNotConnected)?;

        if intent.amount.is_zero() {
            return Err(AppError::InvalidAmount("amount must be greater than 0".to_string()));
        }

        let target = intent.target.ok_or_else(|| {
            AppError::ContractNotConfigured(format!("{} contract address is not configured.", intent.kind))
        })?;
        if session.deployment(target) == Some(false) {
            return Err(AppError::ContractNotConfigured(format!(
                "No contract is deployed at {}.",
                target
            )));
        }

        Ok((holder, target))
    }

    /// Run an intent to completion.
    pub async fn submit(&self, intent: &TransactionIntent) -> std::result::Result<TxReceipt, TxFailure> {
        let kind = intent.kind;
        self.state.send_replace(TxState::Validating(kind));

        let (holder, target, data) = match self
            .validate(intent)
            .and_then(|(holder, target)| Ok((holder, target, intent.calldata(holder)?)))
        {
            Ok(ready) => ready,
            Err(e) => {
                debug!(%kind, error = %e, "Intent rejected by validation");
                self.state.send_replace(TxState::Idle);
                return Err(e.into());
            }
        };

        self.state.send_replace(TxState::Submitting(kind));
        info!(%kind, %holder, %target, amount = %intent.amount, "Submitting transaction");

        let hash = match self.wallet.send_transaction(holder, target, &data).await {
            Ok(hash) => hash,
            Err(e) => {
                let error = classify(&e);
                return Err(self.fail(kind, None, error));
            }
        };

        self.state.send_replace(TxState::Pending { kind, hash });
        info!(%kind, %hash, "Transaction pending");

        let receipt = match self.wait_for_receipt(hash).await {
            Ok(receipt) => receipt,
            Err(error) => return Err(self.fail(kind, Some(hash), error)),
        };

        if !receipt.status {
            let error = self.revert_reason(holder, target, &data, receipt.block_number).await;
            return Err(self.fail(kind, Some(hash), error));
        }

        info!(%kind, %hash, block = receipt.block_number, "Transaction confirmed");
        self.state.send_replace(TxState::Confirmed { kind, hash });
        Ok(receipt)
    }

    /// A prompt declined before broadcast is not a failed transaction:
    /// the state goes back to `Idle` and only the returned error says why.
    fn fail(&self, kind: TxKind, hash: Option<B256>, error: AppError) -> TxFailure {
        if error.is_user_rejection() && hash.is_none() {
            info!(%kind, "Transaction rejected in wallet");
            self.state.send_replace(TxState::Idle);
        } else {
            error!(%kind, hash = ?hash, error = %error, "Transaction failed");
            self.state.send_replace(TxState::Failed {
                kind,
                hash,
                error: error.clone(),
            });
        }
        TxFailure { error, hash }
    }

    async fn wait_for_receipt(&self, hash: B256) -> Result<TxReceipt> {
        let poll = async {
            loop {
                match self.client.get_transaction_receipt(hash).await {
                    Ok(Some(receipt)) => return Ok(receipt),
                    Ok(None) => tokio::time::sleep(self.timing.receipt_poll_interval).await,
                    Err(e) => return Err(classify(&e)),
                }
            }
        };

        match tokio::time::timeout(self.timing.receipt_timeout, poll).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Unknown(format!(
                "Timed out after {}s waiting for transaction {}",
                self.timing.receipt_timeout.as_secs(),
                hash
            ))),
        }
    }

    /// Replay a reverted transaction as a call at its block to recover the reason.
    async fn revert_reason(&self, from: Address, to: Address, data: &Bytes, block: u64) -> AppError {
        match self.client.call(Some(from), to, data, BlockTag::Number(block)).await {
            Err(e) => match classify(&e) {
                reverted @ AppError::ExecutionReverted(_) => reverted,
                other => {
                    warn!(error = %other, "Revert replay failed");
                    AppError::ExecutionReverted("Transaction reverted".to_string())
                }
            },
            Ok(output) => {
                let reason = contracts::decode_vault_error(&output)
                    .unwrap_or_else(|| format!("Transaction reverted ({})", hex::encode_prefixed(&output)));
                AppError::ExecutionReverted(reason)
            }
        }
    }
}
