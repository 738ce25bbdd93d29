//! Application session state.
//!
//! The session is an owned value passed by reference to flows. Actions take
//! `self` and return the next session instead of mutating shared state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::ScanStorage;
use crate::{Error, Result};

/// Storage key for the authentication flag
pub const AUTH_KEY: &str = "is_authenticated";

/// Storage key for the connected wallet address
pub const WALLET_ADDRESS_KEY: &str = "wallet_address";

/// Storage key for the serialized activity log
pub const ACTIVITY_LOG_KEY: &str = "activity_log";

/// What kind of private payment an activity records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    /// Paid a payment link
    Payment,
    /// Deposited under a caller-held secret
    Deposit,
    /// Withdrew a claimed secret's balance
    Withdrawal,
}

/// One entry of the append-only activity log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: Uuid,
    pub kind: ActivityKind,
    pub amount_lamports: u64,
    #[serde(default)]
    pub fee_lamports: u64,
    /// Transaction signature
    pub tx: String,
    /// Link id for payments, recipient address for withdrawals
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counterparty: Option<String>,
    pub at: DateTime<Utc>,
}

impl Activity {
    pub fn new(kind: ActivityKind, amount_lamports: u64, tx: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            amount_lamports,
            fee_lamports: 0,
            tx: tx.into(),
            counterparty: None,
            at: Utc::now(),
        }
    }

    pub fn with_fee(mut self, fee_lamports: u64) -> Self {
        self.fee_lamports = fee_lamports;
        self
    }

    pub fn with_counterparty(mut self, counterparty: impl Into<String>) -> Self {
        self.counterparty = Some(counterparty.into());
        self
    }
}

/// Session of one user of the app
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    authenticated: bool,
    wallet_address: Option<String>,
    activity: Vec<Activity>,
}

impl Session {
    /// A fresh, unauthenticated session
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn wallet_address(&self) -> Option<&str> {
        self.wallet_address.as_deref()
    }

    /// The connected wallet, required by every pool operation
    pub fn wallet(&self) -> Result<&str> {
        self.wallet_address().ok_or(Error::WalletNotConnected)
    }

    /// Activity log, oldest first
    pub fn activity(&self) -> &[Activity] {
        &self.activity
    }

    /// Connect a wallet and mark the session authenticated
    pub fn connect_wallet(self, address: impl Into<String>) -> Self {
        let address = address.into();
        let address = address.trim();
        if address.is_empty() {
            return self.disconnect_wallet();
        }
        Self {
            authenticated: true,
            wallet_address: Some(address.to_string()),
            ..self
        }
    }

    /// Drop the wallet connection; the activity log is kept
    pub fn disconnect_wallet(self) -> Self {
        Self {
            authenticated: false,
            wallet_address: None,
            ..self
        }
    }

    /// Append an activity
    pub fn record(mut self, activity: Activity) -> Self {
        self.activity.push(activity);
        self
    }

    /// Load a session from storage; missing keys yield defaults
    pub fn load(storage: &dyn ScanStorage) -> Result<Self> {
        let authenticated = storage
            .get(AUTH_KEY)
            .map(|v| v == "true")
            .unwrap_or(false);
        let wallet_address = storage
            .get(WALLET_ADDRESS_KEY)
            .filter(|addr| !addr.is_empty());
        let activity = match storage.get(ACTIVITY_LOG_KEY) {
            Some(raw) => serde_json::from_str(&raw)?,
            None => Vec::new(),
        };

        Ok(Self {
            authenticated: authenticated && wallet_address.is_some(),
            wallet_address,
            activity,
        })
    }

    /// Persist the session. Auth flag and address are stored as plain strings.
    pub fn persist(&self, storage: &dyn ScanStorage) -> Result<()> {
        storage.set(AUTH_KEY, if self.authenticated { "true" } else { "false" })?;
        match &self.wallet_address {
            Some(address) => storage.set(WALLET_ADDRESS_KEY, address)?,
            None => storage.remove(WALLET_ADDRESS_KEY)?,
        }
        storage.set(ACTIVITY_LOG_KEY, &serde_json::to_string(&self.activity)?)?;
        Ok(())
    }
}
