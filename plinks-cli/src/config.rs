//! CLI configuration.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use plinks_core::flow::DEFAULT_KEY_BASE_PATH;
use plinks_core::{FeeSchedule, FlowConfig};

const DEFAULT_ORIGIN: &str = "http://localhost:3000";
const DEFAULT_STATE_PATH: &str = ".plinks/state.json";

/// CLI configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct CliConfig {
    /// Origin that payment and claim links point at.
    pub origin: String,
    /// JSON file holding the persisted session.
    pub state_path: PathBuf,
    /// Proving key base path handed to the pool.
    pub key_base_path: String,
    /// Minimum withdrawal fee override for offline estimates.
    pub min_fee_lamports: Option<u64>,
    /// Fee rate override for offline estimates.
    pub fee_rate: Option<f64>,
}

impl CliConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let origin = lookup("PLINKS_ORIGIN").unwrap_or_else(|| DEFAULT_ORIGIN.to_string());

        let state_path = lookup("PLINKS_STATE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_PATH));

        let key_base_path = lookup("PLINKS_KEY_BASE_PATH")
            .unwrap_or_else(|| DEFAULT_KEY_BASE_PATH.to_string());

        let min_fee_lamports = lookup("PLINKS_MIN_FEE_LAMPORTS")
            .map(|s| s.trim().parse::<u64>())
            .transpose()
            .context("PLINKS_MIN_FEE_LAMPORTS must be an integer")?;

        let fee_rate = lookup("PLINKS_FEE_RATE")
            .map(|s| s.trim().parse::<f64>())
            .transpose()
            .context("PLINKS_FEE_RATE must be a number")?;

        Ok(Self {
            origin,
            state_path,
            key_base_path,
            min_fee_lamports,
            fee_rate,
        })
    }

    /// Fee schedule for offline estimates: defaults with any overrides applied.
    pub fn fee_schedule(&self) -> FeeSchedule {
        let defaults = FeeSchedule::default();
        FeeSchedule::new(
            self.min_fee_lamports.unwrap_or(defaults.min_fee_lamports),
            self.fee_rate.unwrap_or(defaults.fee_rate),
        )
    }

    pub fn flow_config(&self) -> FlowConfig {
        FlowConfig {
            key_base_path: self.key_base_path.clone(),
        }
    }
}
