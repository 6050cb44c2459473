//! # Vault Actions
//!
//! User-level flows built on the [`TransactionSubmitter`]:
//!
//! | Flow | Transactions |
//! |---|---|
//! | deposit | `approve(vault, amount)` on the stablecoin, then `deposit(amount, holder)` |
//! | withdraw | `approve(vault, previewWithdraw(amount))` on the share token, then `withdraw(amount, holder, holder)` |
//! | mint | `mint(holder, amount)` on the stablecoin |
//!
//! Amounts are always stablecoin units; the withdraw approval is sized in
//! shares by asking the vault. The spend is sent only after its approval is confirmed. Every outcome is
//! reported through the [`Notifier`]; a confirmed spend also refreshes the
//! session balances.

use crate::client::{BlockTag, EvmClient, TxReceipt};
use crate::contracts::{IERC20, IVault};
use crate::controller::WalletController;
use crate::error::classify;
use crate::notify::{Notification, Notifier};
use crate::transaction::{TransactionIntent, TransactionSubmitter, TxFailure, TxKind, TxState};
use crate::units;
use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use lib_core::{AppError, Result};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::info;

/// Deposit / withdraw / mint flows.
pub struct VaultActions {
    controller: Arc<WalletController>,
    submitter: TransactionSubmitter,
    notifier: Notifier,
    flow: Mutex<()>,
}

impl VaultActions {
    pub fn new(controller: Arc<WalletController>, notifier: Notifier) -> Self {
        let submitter = TransactionSubmitter::new(
            controller.client().clone(),
            controller.wallet().clone(),
            controller.session().clone(),
            controller.config().timing.clone(),
        );
        Self {
            controller,
            submitter,
            notifier,
            flow: Mutex::new(()),
        }
    }

    /// Submitter state, for progress display.
    pub fn subscribe(&self) -> watch::Receiver<TxState> {
        self.submitter.subscribe()
    }

    /// Deposit `amount` stablecoin (decimal string) into the vault.
    pub async fn deposit(&self, amount: &str) -> Result<TxReceipt> {
        let contracts = &self.controller.config().contracts;
        let amount = self.parse_amount(amount, contracts.stablecoin_decimals, TxKind::Deposit)?;
        let approve = TransactionIntent::approve(contracts.stablecoin, contracts.vault, amount);
        let deposit = TransactionIntent::deposit(contracts.vault, amount);

        let label = approval_label(amount, contracts.stablecoin_decimals, &contracts.stablecoin_symbol);

        let _flow = self.flow.lock().await;
        self.approve_then(approve, deposit, label).await
    }

    /// Withdraw `amount` stablecoin (decimal string) from the vault.
    pub async fn withdraw(&self, amount: &str) -> Result<TxReceipt> {
        let contracts = &self.controller.config().contracts;
        let assets = self.parse_amount(amount, contracts.stablecoin_decimals, TxKind::Withdraw)?;
        let withdraw = TransactionIntent::withdraw(contracts.vault, assets);

        let _flow = self.flow.lock().await;
        self.precheck(&withdraw)?;
        let shares = self.shares_to_burn(assets).await.map_err(|e| {
            self.notify_failure(TxKind::Withdraw, &TxFailure::from(e.clone()));
            e
        })?;
        let approve = TransactionIntent::approve(contracts.vault, contracts.vault, shares);
        let label = approval_label(shares, contracts.share_decimals, &contracts.share_symbol);

        self.approve_then(approve, withdraw, label).await
    }

    /// Mint `amount` test stablecoin (decimal string) to the connected account.
    pub async fn mint(&self, amount: &str) -> Result<TxReceipt> {
        let contracts = &self.controller.config().contracts;
        let amount = self.parse_amount(amount, contracts.stablecoin_decimals, TxKind::Mint)?;
        let mint = TransactionIntent::mint(contracts.stablecoin, amount);

        let _flow = self.flow.lock().await;
        self.precheck(&mint)?;
        self.run(&mint).await
    }

    /// Shares the vault burns to pay out `assets`.
    async fn shares_to_burn(&self, assets: U256) -> Result<U256> {
        let config = self.controller.config();
        let vault = config.contracts.require_vault()?;
        let shares = VaultReader::new(self.controller.client().clone(), vault)
            .preview_withdraw(assets)
            .await?;
        if shares.is_zero() {
            return Err(AppError::InvalidAmount(
                "amount is too small to withdraw".to_string(),
            ));
        }
        Ok(shares)
    }

    /// Caller holds the flow lock.
    async fn approve_then(
        &self,
        approve: TransactionIntent,
        spend: TransactionIntent,
        label: String,
    ) -> Result<TxReceipt> {
        self.precheck(&spend)?;
        self.precheck(&approve)?;

        self.notifier.notify(Notification::info(
            "Request Approve",
            format!("Confirm the approval of {} in your wallet.", label),
        ));
        match self.submitter.submit(&approve).await {
            Ok(receipt) => info!(hash = %receipt.transaction_hash, "Approval confirmed"),
            Err(failure) => {
                self.notify_failure(TxKind::Approve, &failure);
                return Err(failure.error);
            }
        }

        self.run(&spend).await
    }

    async fn run(&self, intent: &TransactionIntent) -> Result<TxReceipt> {
        match self.submitter.submit(intent).await {
            Ok(receipt) => {
                self.controller.refresh_balances().await;
                let hash = receipt.transaction_hash.to_string();
                let (title, description) = success_text(intent.kind);
                self.notifier.notify(
                    Notification::success(title, description)
                        .with_explorer_url(self.controller.config().explorer_tx_url(&hash)),
                );
                Ok(receipt)
            }
            Err(failure) => {
                self.notify_failure(intent.kind, &failure);
                Err(failure.error)
            }
        }
    }

    fn parse_amount(&self, input: &str, decimals: u8, kind: TxKind) -> Result<U256> {
        units::parse_positive_units(input, decimals).map_err(|e| {
            self.notify_failure(kind, &TxFailure::from(e.clone()));
            e
        })
    }

    /// Validate up front so a flow never sends an approval it cannot follow with a spend.
    fn precheck(&self, intent: &TransactionIntent) -> Result<()> {
        self.submitter.validate(intent).map(|_| ()).map_err(|e| {
            self.notify_failure(intent.kind, &TxFailure::from(e.clone()));
            e
        })
    }

    fn notify_failure(&self, kind: TxKind, failure: &TxFailure) {
        let title = match &failure.error {
            AppError::WalletNotConnected => "Wallet not connected".to_string(),
            AppError::InvalidAmount(_) => "Invalid amount".to_string(),
            AppError::ContractNotConfigured(_) => "Contract not found".to_string(),
            _ if kind == TxKind::Approve => "Approval Failed".to_string(),
            _ => format!("{} Failed", kind),
        };
        self.notifier.notify(Notification::from_error(title, &failure.error));
    }
}

/// `"100 USDC"`, falling back to raw units if `decimals` is out of range.
fn approval_label(amount: U256, decimals: u8, symbol: &str) -> String {
    let shown = units::format_units(amount, decimals).unwrap_or_else(|_| amount.to_string());
    format!("{} {}", shown, symbol)
}

fn success_text(kind: TxKind) -> (&'static str, &'static str) {
    match kind {
        TxKind::Deposit => ("Deposit successful!", "Your tokens have been deposited to the vault."),
        TxKind::Withdraw => ("Withdraw successful!", "Your tokens have been withdrawn from the vault."),
        TxKind::Mint => ("Mint successful!", "Test tokens have been minted to your wallet."),
        TxKind::Approve => ("Approval successful!", "The vault may now spend the approved amount."),
    }
}

/// Read-only vault queries.
#[derive(Clone)]
pub struct VaultReader {
    client: EvmClient,
    vault: Address,
}

impl VaultReader {
    pub fn new(client: EvmClient, vault: Address) -> Self {
        Self { client, vault }
    }

    /// Total stablecoin managed by the vault.
    pub async fn total_assets(&self) -> Result<U256> {
        let raw = self.call(IVault::totalAssetsCall {}.abi_encode().into()).await?;
        IVault::totalAssetsCall::abi_decode_returns(&raw, true)
            .map(|r| r.totalManagedAssets)
            .map_err(|e| AppError::Decoding(format!("totalAssets: {}", e)))
    }

    /// Stablecoin value of `shares`.
    pub async fn convert_to_assets(&self, shares: U256) -> Result<U256> {
        let raw = self
            .call(IVault::convertToAssetsCall { shares }.abi_encode().into())
            .await?;
        IVault::convertToAssetsCall::abi_decode_returns(&raw, true)
            .map(|r| r.assets)
            .map_err(|e| AppError::Decoding(format!("convertToAssets: {}", e)))
    }

    /// Shares burned by `withdraw(assets, ..)`, rounded up by the vault.
    pub async fn preview_withdraw(&self, assets: U256) -> Result<U256> {
        let raw = self
            .call(IVault::previewWithdrawCall { assets }.abi_encode().into())
            .await?;
        IVault::previewWithdrawCall::abi_decode_returns(&raw, true)
            .map(|r| r.shares)
            .map_err(|e| AppError::Decoding(format!("previewWithdraw: {}", e)))
    }

    /// How much of `token` the vault may still pull from `owner`.
    pub async fn allowance(&self, token: Address, owner: Address) -> Result<U256> {
        let data: Bytes = IERC20::allowanceCall {
            owner,
            spender: self.vault,
        }
        .abi_encode()
        .into();
        let raw = self
            .client
            .call(None, token, &data, BlockTag::Latest)
            .await
            .map_err(|e| classify(&e))?;
        IERC20::allowanceCall::abi_decode_returns(&raw, true)
            .map(|r| r.remaining)
            .map_err(|e| AppError::Decoding(format!("allowance: {}", e)))
    }

    async fn call(&self, data: Bytes) -> Result<Bytes> {
        self.client
            .call(None, self.vault, &data, BlockTag::Latest)
            .await
            .map_err(|e| classify(&e))
    }
}
