//! Claim flow: check the balance behind a secret and withdraw all of it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::encryption::encryption_key_for;
use crate::fees::FeeSchedule;
use crate::flow::{FlowConfig, FlowState, FlowTicket, FlowTracker};
use crate::pool::{PrivacyPool, ScanRequest, WithdrawRequest};
use crate::session::{Activity, ActivityKind, Session};
use crate::storage::{purge_scan_cache, ScanStorage};
use crate::{Error, LinkSecret, PoolError, Result};

/// Scanned balance of a secret together with the fees a withdrawal would pay
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalanceReport {
    pub lamports: u64,
    pub fees: FeeSchedule,
}

impl BalanceReport {
    /// Whether the balance is large enough to be worth withdrawing
    pub fn covers_fees(&self) -> bool {
        self.fees.covers_fees(self.lamports)
    }

    pub fn estimated_fee(&self) -> u64 {
        self.fees.estimated_fee(self.lamports)
    }
}

/// Result of a successful withdrawal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawOutcome {
    pub recipient: String,
    /// Lamports received after fees
    pub amount_received: u64,
    pub fee: u64,
    /// Transaction signature
    pub tx: String,
}

impl WithdrawOutcome {
    /// Activity log entry for this withdrawal
    pub fn to_activity(&self) -> Activity {
        Activity::new(ActivityKind::Withdrawal, self.amount_received, &self.tx)
            .with_fee(self.fee)
            .with_counterparty(self.recipient.clone())
    }
}

/// Orchestrates balance checks and withdrawals for a claimed secret.
///
/// Both operations share one tracker: they purge and refill the same scan
/// cache, so only one may run at a time.
pub struct ClaimFlow<P: PrivacyPool> {
    pool: Arc<P>,
    storage: Arc<dyn ScanStorage>,
    config: FlowConfig,
    tracker: FlowTracker,
}

impl<P: PrivacyPool> ClaimFlow<P> {
    pub fn new(pool: Arc<P>, storage: Arc<dyn ScanStorage>, config: FlowConfig) -> Self {
        Self {
            pool,
            storage,
            config,
            tracker: FlowTracker::new("claim"),
        }
    }

    /// State tracker for this flow
    pub fn tracker(&self) -> &FlowTracker {
        &self.tracker
    }

    /// Scan the pool for notes owned by `secret`.
    ///
    /// A secret that was never funded reports a zero balance.
    pub async fn check_balance(
        &self,
        session: &Session,
        secret: &LinkSecret,
    ) -> Result<BalanceReport> {
        let ticket = self.tracker.begin()?;
        let result = async {
            let owner = session.wallet()?;
            let encryption_key = encryption_key_for(self.pool.as_ref(), secret);
            let lamports = self.scan(&ticket, &encryption_key, owner, secret).await?;
            let fees = FeeSchedule::fetch(self.pool.as_ref()).await;
            Ok::<_, Error>(BalanceReport { lamports, fees })
        }
        .await;
        ticket.finish(result)
    }

    /// Withdraw the whole balance of `secret`.
    ///
    /// `recipient` defaults to the connected wallet. The pool is rescanned
    /// first so a stale balance is never submitted.
    pub async fn withdraw_all(
        &self,
        session: &Session,
        secret: &LinkSecret,
        recipient: Option<&str>,
    ) -> Result<WithdrawOutcome> {
        let ticket = self.tracker.begin()?;
        let result = async {
            let owner = session.wallet()?;
            let recipient = match recipient.map(str::trim) {
                None => owner,
                Some("") => return Err(Error::MissingRecipient),
                Some(recipient) => recipient,
            };

            let encryption_key = encryption_key_for(self.pool.as_ref(), secret);
            let balance = self.scan(&ticket, &encryption_key, owner, secret).await?;
            if balance == 0 {
                return Err(Error::NothingToWithdraw);
            }

            let fees = FeeSchedule::fetch(self.pool.as_ref()).await;
            let estimated_fee = fees.ensure_withdrawable(balance)?;

            ticket.advance(FlowState::Submitting);
            info!(
                balance,
                estimated_fee,
                secret = %secret.fingerprint(),
                "submitting withdrawal"
            );
            let receipt = self
                .pool
                .withdraw(WithdrawRequest {
                    encryption_key: &encryption_key,
                    amount_lamports: balance,
                    key_base_path: &self.config.key_base_path,
                    owner,
                    recipient,
                    storage: self.storage.as_ref(),
                })
                .await
                .map_err(withdraw_error)?;

            let recipient = if receipt.recipient.is_empty() {
                recipient.to_string()
            } else {
                receipt.recipient
            };
            info!(tx = %receipt.tx, %recipient, "withdrawal complete");

            Ok::<_, Error>(WithdrawOutcome {
                recipient,
                amount_received: receipt.amount_lamports,
                fee: receipt.fee_lamports,
                tx: receipt.tx,
            })
        }
        .await;
        ticket.finish(result)
    }

    async fn scan(
        &self,
        ticket: &FlowTicket<'_>,
        encryption_key: &P::EncryptionKey,
        owner: &str,
        secret: &LinkSecret,
    ) -> Result<u64> {
        purge_scan_cache(self.storage.as_ref())?;

        ticket.advance(FlowState::Scanning);
        let utxos = self
            .pool
            .get_utxos(ScanRequest {
                encryption_key,
                owner,
                storage: self.storage.as_ref(),
            })
            .await?;
        let balance = self.pool.balance_from_utxos(&utxos);

        info!(
            notes = utxos.len(),
            lamports = balance.lamports,
            secret = %secret.fingerprint(),
            "scan complete"
        );
        ticket.advance(FlowState::BalanceKnown {
            lamports: balance.lamports,
        });
        Ok(balance.lamports)
    }
}

fn withdraw_error(e: PoolError) -> Error {
    warn!(error = %e, "withdrawal failed");
    if e.is_bad_request() {
        Error::WithdrawalRejected(e)
    } else {
        Error::Pool(e)
    }
}
