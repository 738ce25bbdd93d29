//! Pay and deposit flows.
//!
//! Paying a link generates a brand-new secret, shields the funds under the key
//! derived from it and hands the secret back so the payer can relay it to the
//! recipient privately. The deposit flow does the same for a secret the
//! caller already holds.

use std::sync::Arc;

use tracing::{info, warn};

use crate::amount::parse_sol_amount;
use crate::encryption::encryption_key_for;
use crate::flow::{FlowConfig, FlowState, FlowTicket, FlowTracker};
use crate::link::{build_claim_url, parse_payment_link, PaymentLinkPayload};
use crate::pool::{DepositRequest, PrivacyPool, TransactionSigner};
use crate::session::{Activity, ActivityKind, Session};
use crate::storage::ScanStorage;
use crate::{Error, LinkSecret, PoolError, Result};

/// Result of a successful deposit
#[derive(Debug, Clone)]
pub struct DepositOutcome {
    /// Transaction signature
    pub tx: String,
    /// Amount shielded
    pub amount_lamports: u64,
    /// Secret controlling the deposited funds
    pub secret: LinkSecret,
    /// Link that was paid, if this deposit answered a payment link
    pub link_id: Option<String>,
}

impl DepositOutcome {
    /// Encoded secret to relay to the recipient
    pub fn secret_base58(&self) -> String {
        self.secret.to_base58()
    }

    /// Claim link carrying the secret
    pub fn claim_url(&self, origin: &str) -> String {
        build_claim_url(origin, &self.secret)
    }

    /// Activity log entry for this deposit
    pub fn to_activity(&self) -> Activity {
        match &self.link_id {
            Some(link_id) => Activity::new(ActivityKind::Payment, self.amount_lamports, &self.tx)
                .with_counterparty(link_id.clone()),
            None => Activity::new(ActivityKind::Deposit, self.amount_lamports, &self.tx),
        }
    }
}

/// Orchestrates deposits into the shielded pool
pub struct DepositFlow<P: PrivacyPool> {
    pool: Arc<P>,
    storage: Arc<dyn ScanStorage>,
    config: FlowConfig,
    tracker: FlowTracker,
}

impl<P: PrivacyPool> DepositFlow<P> {
    pub fn new(pool: Arc<P>, storage: Arc<dyn ScanStorage>, config: FlowConfig) -> Self {
        Self {
            pool,
            storage,
            config,
            tracker: FlowTracker::new("deposit"),
        }
    }

    /// State tracker for this flow
    pub fn tracker(&self) -> &FlowTracker {
        &self.tracker
    }

    /// Pay a parsed payment link.
    ///
    /// `amount` overrides the link's requested amount when given.
    pub async fn pay_link(
        &self,
        session: &Session,
        payload: &PaymentLinkPayload,
        amount: Option<&str>,
        signer: &dyn TransactionSigner,
    ) -> Result<DepositOutcome> {
        let ticket = self.tracker.begin()?;
        let result = async {
            let payer = session.wallet()?;
            let secret = LinkSecret::generate();
            info!(
                link_id = %payload.link_id,
                secret = %secret.fingerprint(),
                "generated secret for payment"
            );

            let amount = amount.unwrap_or(payload.requested_amount.as_str());
            let (tx, amount_lamports) = self
                .submit(&ticket, &secret, amount, payer, signer)
                .await?;

            Ok::<_, Error>(DepositOutcome {
                tx,
                amount_lamports,
                secret,
                link_id: Some(payload.link_id.clone()),
            })
        }
        .await;
        ticket.finish(result)
    }

    /// Parse a payment link URL and pay it.
    ///
    /// A malformed link fails before any key derivation or pool call.
    pub async fn pay_link_url(
        &self,
        session: &Session,
        link_url: &str,
        amount: Option<&str>,
        signer: &dyn TransactionSigner,
    ) -> Result<DepositOutcome> {
        let payload = parse_payment_link(link_url)?;
        self.pay_link(session, &payload, amount, signer).await
    }

    /// Deposit `amount` SOL under a secret the caller already holds.
    ///
    /// The outcome does not carry a balance. Follow up with
    /// [`ClaimFlow::check_balance`](crate::ClaimFlow::check_balance) on the
    /// same storage to show the refreshed total.
    pub async fn deposit(
        &self,
        session: &Session,
        secret: &LinkSecret,
        amount: &str,
        signer: &dyn TransactionSigner,
    ) -> Result<DepositOutcome> {
        let ticket = self.tracker.begin()?;
        let result = async {
            let payer = session.wallet()?;
            let (tx, amount_lamports) = self
                .submit(&ticket, secret, amount, payer, signer)
                .await?;

            Ok::<_, Error>(DepositOutcome {
                tx,
                amount_lamports,
                secret: secret.clone(),
                link_id: None,
            })
        }
        .await;
        ticket.finish(result)
    }

    async fn submit(
        &self,
        ticket: &FlowTicket<'_>,
        secret: &LinkSecret,
        amount: &str,
        payer: &str,
        signer: &dyn TransactionSigner,
    ) -> Result<(String, u64)> {
        let encryption_key = encryption_key_for(self.pool.as_ref(), secret);
        let amount_lamports = parse_sol_amount(amount)?;

        ticket.advance(FlowState::Submitting);
        let receipt = self
            .pool
            .deposit(DepositRequest {
                encryption_key: &encryption_key,
                amount_lamports,
                key_base_path: &self.config.key_base_path,
                payer,
                signer,
                storage: self.storage.as_ref(),
            })
            .await
            .map_err(deposit_error)?;

        info!(
            tx = %receipt.tx,
            amount_lamports,
            secret = %secret.fingerprint(),
            "deposit submitted"
        );
        Ok((receipt.tx, amount_lamports))
    }
}

fn deposit_error(e: PoolError) -> Error {
    warn!(error = %e, "deposit failed");
    if e.is_bad_request() {
        Error::DepositRejected(e)
    } else {
        Error::Pool(e)
    }
}
