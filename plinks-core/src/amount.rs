//! SOL amount parsing and formatting.
//!
//! User input is a decimal SOL string; the pool only ever sees lamports.

use crate::{Error, Result};

/// One SOL in lamports
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Decimal places carried by a lamport amount
const SOL_DECIMALS: usize = 9;

/// Parse a SOL amount string into lamports.
///
/// Digits past the ninth decimal place are truncated. The result must be a
/// positive number of lamports.
pub fn parse_sol_amount(amount_str: &str) -> Result<u64> {
    let amount_str = amount_str.trim();

    if amount_str.is_empty() {
        return Err(Error::InvalidAmount("Empty amount".to_string()));
    }

    let (whole_part, frac_part) = match amount_str.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (amount_str, ""),
    };

    if whole_part.is_empty() && frac_part.is_empty() {
        return Err(Error::InvalidAmount(amount_str.to_string()));
    }
    if !whole_part.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::InvalidAmount(format!("Invalid whole part: {}", whole_part)));
    }
    if !frac_part.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::InvalidAmount(format!("Invalid fractional part: {}", frac_part)));
    }

    let whole_lamports: u64 = if whole_part.is_empty() {
        0
    } else {
        whole_part
            .parse::<u64>()
            .map_err(|e| Error::InvalidAmount(format!("Invalid whole part: {}", e)))?
            .checked_mul(LAMPORTS_PER_SOL)
            .ok_or_else(|| Error::InvalidAmount("Amount overflow".to_string()))?
    };

    let frac_lamports: u64 = if frac_part.is_empty() {
        0
    } else {
        let digits = &frac_part[..frac_part.len().min(SOL_DECIMALS)];
        let padded = format!("{:0<width$}", digits, width = SOL_DECIMALS);
        padded
            .parse::<u64>()
            .map_err(|e| Error::InvalidAmount(format!("Invalid fractional part: {}", e)))?
    };

    let lamports = whole_lamports
        .checked_add(frac_lamports)
        .ok_or_else(|| Error::InvalidAmount("Amount overflow".to_string()))?;

    if lamports == 0 {
        return Err(Error::InvalidAmount(format!(
            "{} SOL is not a positive amount",
            amount_str
        )));
    }

    Ok(lamports)
}

/// Format lamports as the shortest SOL decimal string
pub fn format_sol(lamports: u64) -> String {
    let whole = lamports / LAMPORTS_PER_SOL;
    let frac = lamports % LAMPORTS_PER_SOL;

    if frac == 0 {
        format!("{}", whole)
    } else {
        let frac_str = format!("{:09}", frac);
        format!("{}.{}", whole, frac_str.trim_end_matches('0'))
    }
}

/// Format lamports as SOL with a fixed number of decimal places (rounded half up)
pub fn format_sol_fixed(lamports: u64, decimals: usize) -> String {
    let decimals = decimals.min(SOL_DECIMALS);
    let scale = 10u128.pow((SOL_DECIMALS - decimals) as u32);
    let rounded = (lamports as u128 + scale / 2) / scale;
    let unit = 10u128.pow(decimals as u32);

    if decimals == 0 {
        format!("{}", rounded)
    } else {
        format!(
            "{}.{:0width$}",
            rounded / unit,
            rounded % unit,
            width = decimals
        )
    }
}
