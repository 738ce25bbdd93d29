//! Flow state machine and re-entrancy guard.
//!
//! Each user-triggered operation walks
//! `Idle -> Scanning -> BalanceKnown -> Submitting -> Completed | Failed`,
//! skipping the states it does not need. Front ends observe the current state
//! through a watch channel.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::amount::format_sol_fixed;
use crate::{Error, Result};

/// Base path of the proving key material used by the pool's circuits
pub const DEFAULT_KEY_BASE_PATH: &str = "/circuit2/transaction2";

/// Settings shared by the deposit and claim flows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowConfig {
    pub key_base_path: String,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            key_base_path: DEFAULT_KEY_BASE_PATH.to_string(),
        }
    }
}

/// Observable state of one flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FlowState {
    /// Nothing running; waiting for input
    Idle,
    /// Deriving the key and scanning pool notes
    Scanning,
    /// Scan finished with this balance
    BalanceKnown { lamports: u64 },
    /// Proof generation and submission in flight
    Submitting,
    /// Last run succeeded
    Completed,
    /// Last run failed; the flow is actionable again
    Failed { message: String },
}

impl FlowState {
    /// Human readable status for display
    pub fn status_line(&self) -> String {
        match self {
            FlowState::Idle | FlowState::Completed => String::new(),
            FlowState::Scanning => "Scanning pool for your notes…".to_string(),
            FlowState::BalanceKnown { lamports } => {
                format!("Balance: {} SOL", format_sol_fixed(*lamports, 4))
            }
            FlowState::Submitting => "Generating proof + submitting…".to_string(),
            FlowState::Failed { message } => message.clone(),
        }
    }

    /// Whether a run is in progress
    pub fn is_running(&self) -> bool {
        matches!(
            self,
            FlowState::Scanning | FlowState::BalanceKnown { .. } | FlowState::Submitting
        )
    }
}

/// Tracks the state of one flow and rejects concurrent runs
#[derive(Debug)]
pub struct FlowTracker {
    name: &'static str,
    busy: AtomicBool,
    state: watch::Sender<FlowState>,
}

impl FlowTracker {
    pub fn new(name: &'static str) -> Self {
        let (state, _) = watch::channel(FlowState::Idle);
        Self {
            name,
            busy: AtomicBool::new(false),
            state,
        }
    }

    /// Flow name used in logs and `Busy` errors
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Subscribe to state changes
    pub fn subscribe(&self) -> watch::Receiver<FlowState> {
        self.state.subscribe()
    }

    /// Current state
    pub fn state(&self) -> FlowState {
        self.state.borrow().clone()
    }

    /// Whether a run holds the guard
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Start a run. Fails with [`Error::Busy`] while another run is in flight.
    pub fn begin(&self) -> Result<FlowTicket<'_>> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!(flow = self.name(), "rejected concurrent run");
            return Err(Error::Busy(self.name()));
        }
        debug!(flow = self.name(), "run started");
        Ok(FlowTicket { tracker: self })
    }

    fn set(&self, state: FlowState) {
        self.state.send_replace(state);
    }
}

/// Guard for one run of a flow; releases the busy flag on drop
#[derive(Debug)]
pub struct FlowTicket<'a> {
    tracker: &'a FlowTracker,
}

impl FlowTicket<'_> {
    /// Move the flow to `state`
    pub fn advance(&self, state: FlowState) {
        self.tracker.set(state);
    }

    /// Record the outcome of the run and pass it through
    pub fn finish<T>(self, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => self.tracker.set(FlowState::Completed),
            Err(e) => self.tracker.set(FlowState::Failed {
                message: e.to_string(),
            }),
        }
        result
    }
}

impl Drop for FlowTicket<'_> {
    fn drop(&mut self) {
        self.tracker.busy.store(false, Ordering::Release);
    }
}
