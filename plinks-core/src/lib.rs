//! # Private payment links over a shielded pool
//!
//! A payment link lets a recipient request funds without revealing anything
//! but an amount. Whoever pays it deposits into a shielded pool under a key
//! derived from a freshly generated 256-bit secret, then relays that secret to
//! the recipient privately. The secret is a bearer credential: it alone lets
//! its holder rescan the pool and withdraw.
//!
//! ## Link formats
//!
//! ```text
//! https://app.example.com/private-payments/pay?amount=0.1&id=<link id>[&o=<offset>]
//! https://app.example.com/private-payments/claim?s=<base58 secret>
//! ```
//!
//! ## Lifecycle
//!
//! 1. The recipient creates a [`PaymentLinkPayload`] and shares its URL.
//! 2. The payer opens it; [`DepositFlow::pay_link`] generates a [`LinkSecret`],
//!    derives the pool key and deposits.
//! 3. The payer sends the secret to the recipient out of band.
//! 4. The recipient runs [`ClaimFlow::check_balance`] and
//!    [`ClaimFlow::withdraw_all`] with the pasted secret.
//!
//! Proofs, note scanning and fees are the pool SDK's business, reached through
//! the [`PrivacyPool`] trait.

pub mod amount;
pub mod claim;
pub mod deposit;
pub mod encryption;
mod error;
pub mod fees;
pub mod flow;
pub mod link;
pub mod pool;
mod secret;
pub mod session;
pub mod storage;

pub use amount::{format_sol, parse_sol_amount, LAMPORTS_PER_SOL};
pub use claim::{BalanceReport, ClaimFlow, WithdrawOutcome};
pub use deposit::{DepositFlow, DepositOutcome};
pub use encryption::{encryption_key_for, KeyDeriver};
pub use error::{Error, ErrorKind, PoolError, Result};
pub use fees::FeeSchedule;
pub use flow::{FlowConfig, FlowState, FlowTracker};
pub use link::{
    build_claim_url, build_payment_link_url, parse_payment_link, secret_from_claim_url,
    PaymentLinkPayload,
};
pub use pool::{
    Balance, ConfigKey, DepositReceipt, DepositRequest, PrivacyPool, ScanRequest,
    TransactionSigner, Utxo, WithdrawReceipt, WithdrawRequest,
};
pub use secret::{generate_link_id, generate_link_id_with, LinkSecret, LINK_ID_LEN, SECRET_LEN};
pub use session::{Activity, ActivityKind, Session};
pub use storage::{purge_scan_cache, JsonFileStorage, MemoryStorage, ScanStorage};

/// Path of the page that pays a payment link
pub const PAY_PATH: &str = "/private-payments/pay";

/// Path of the page that claims a secret
pub const CLAIM_PATH: &str = "/private-payments/claim";
