//! Withdrawal fee estimation and the balance-too-low precondition.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::amount::LAMPORTS_PER_SOL;
use crate::pool::{ConfigKey, PrivacyPool};
use crate::{Error, Result};

/// Minimum withdrawal fee (SOL) used when the SDK config is unreachable
pub const DEFAULT_WITHDRAW_RENT_FEE_SOL: f64 = 0.006;

/// Proportional withdrawal fee used when the SDK config is unreachable
pub const DEFAULT_WITHDRAW_FEE_RATE: f64 = 0.0035;

/// Fee parameters for a withdrawal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Flat minimum fee in lamports
    pub min_fee_lamports: u64,
    /// Fraction of the withdrawn amount taken as fee
    pub fee_rate: f64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            min_fee_lamports: sol_to_lamports_floor(DEFAULT_WITHDRAW_RENT_FEE_SOL),
            fee_rate: DEFAULT_WITHDRAW_FEE_RATE,
        }
    }
}

impl FeeSchedule {
    pub fn new(min_fee_lamports: u64, fee_rate: f64) -> Self {
        Self {
            min_fee_lamports,
            fee_rate,
        }
    }

    /// Read the fee parameters from the pool.
    ///
    /// Each value falls back to its default on failure; this never fails.
    pub async fn fetch<P>(pool: &P) -> Self
    where
        P: PrivacyPool + ?Sized,
    {
        let defaults = Self::default();

        let min_fee_lamports = match pool.get_config(ConfigKey::WithdrawRentFee).await {
            Ok(rent_fee) if rent_fee.is_finite() && rent_fee >= 0.0 => {
                sol_to_lamports_floor(rent_fee)
            }
            Ok(rent_fee) => {
                warn!(rent_fee, "unusable withdraw_rent_fee from pool config, using default");
                defaults.min_fee_lamports
            }
            Err(e) => {
                warn!(error = %e, "failed to read withdraw_rent_fee, using default");
                defaults.min_fee_lamports
            }
        };

        let fee_rate = match pool.get_config(ConfigKey::WithdrawFeeRate).await {
            Ok(rate) if rate.is_finite() && (0.0..1.0).contains(&rate) => rate,
            Ok(rate) => {
                warn!(rate, "unusable withdraw_fee_rate from pool config, using default");
                defaults.fee_rate
            }
            Err(e) => {
                warn!(error = %e, "failed to read withdraw_fee_rate, using default");
                defaults.fee_rate
            }
        };

        Self {
            min_fee_lamports,
            fee_rate,
        }
    }

    /// `floor(balance * fee_rate) + min_fee`
    pub fn estimated_fee(&self, balance_lamports: u64) -> u64 {
        let proportional = (balance_lamports as f64 * self.fee_rate).floor() as u64;
        proportional.saturating_add(self.min_fee_lamports)
    }

    /// Smallest balance worth withdrawing: the minimum fee plus a 10% margin
    pub fn minimum_withdrawal(&self) -> u64 {
        self.min_fee_lamports
            .saturating_add(self.min_fee_lamports.div_ceil(10))
    }

    /// Quick check used to disable a withdraw action up front
    pub fn covers_fees(&self, balance_lamports: u64) -> bool {
        balance_lamports >= self.minimum_withdrawal()
    }

    /// Reject a withdrawal whose estimated fee would consume the whole balance
    pub fn ensure_withdrawable(&self, balance_lamports: u64) -> Result<u64> {
        let fee = self.estimated_fee(balance_lamports);
        if fee >= balance_lamports {
            return Err(Error::BalanceTooLow {
                balance: balance_lamports,
                minimum: self.minimum_withdrawal(),
            });
        }
        Ok(fee)
    }
}

/// Absorbs binary representation error, e.g. `0.006 * 1e9` landing just below 6_000_000
const LAMPORT_EPSILON: f64 = 1e-6;

fn sol_to_lamports_floor(sol: f64) -> u64 {
    (sol * LAMPORTS_PER_SOL as f64 + LAMPORT_EPSILON).floor() as u64
}
