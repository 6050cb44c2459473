//! Decimal string <-> smallest-unit integer conversion.
//!
//! Amounts are typed by users as decimal strings ("100", "0.5") and sent to
//! contracts as integers scaled by the token's decimals. Parsing truncates
//! extra fractional digits toward zero; display rounds half-up to a fixed
//! number of places.

use alloy_primitives::utils::{format_units as alloy_format_units, parse_units as alloy_parse_units};
use alloy_primitives::U256;
use lib_core::{AppError, Result};

fn pow10(decimals: u8) -> Result<U256> {
    U256::from(10u64)
        .checked_pow(U256::from(decimals))
        .ok_or_else(|| AppError::InvalidAmount(format!("{} decimals is out of range", decimals)))
}

/// Parse a user-entered decimal amount into smallest units.
///
/// Fractional digits beyond `decimals` are dropped. Empty input, signs,
/// exponents and anything that is not `digits[.digits]` are rejected.
pub fn parse_units(input: &str, decimals: u8) -> Result<U256> {
    let trimmed = input.trim();
    let invalid = || AppError::InvalidAmount(format!("'{}' is not a valid amount", input));

    let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
    let is_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !is_digits(whole) || !is_digits(fraction) {
        return Err(invalid());
    }

    let whole = if whole.is_empty() { "0" } else { whole };
    let kept = &fraction[..fraction.len().min(decimals as usize)];
    let normalized = if kept.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, kept)
    };

    alloy_parse_units(&normalized, decimals)
        .map(|parsed| parsed.get_absolute())
        .map_err(|e| AppError::InvalidAmount(format!("'{}' is not a valid amount: {}", input, e)))
}

/// Parse an amount that must be strictly positive.
pub fn parse_positive_units(input: &str, decimals: u8) -> Result<U256> {
    let amount = parse_units(input, decimals)?;
    if amount.is_zero() {
        return Err(AppError::InvalidAmount("amount must be greater than 0".to_string()));
    }
    Ok(amount)
}

/// Exact decimal rendering with trailing fractional zeros removed.
///
/// `format_units(100_000_000, 6) == "100"`, `format_units(1_500_000, 6) == "1.5"`.
pub fn format_units(amount: U256, decimals: u8) -> Result<String> {
    let formatted = alloy_format_units(amount, decimals)
        .map_err(|e| AppError::InvalidAmount(format!("{} decimals: {}", decimals, e)))?;

    if !formatted.contains('.') {
        return Ok(formatted);
    }
    Ok(formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string())
}

/// Fixed-precision rendering, rounded half-up. Used for balances on screen.
///
/// `format_fixed(1_234_567, 6, 2) == "1.23"`, `format_fixed(1_235_000, 6, 2) == "1.24"`.
pub fn format_fixed(amount: U256, decimals: u8, places: u8) -> String {
    let rounded = if places >= decimals {
        amount
    } else {
        let drop = decimals - places;
        match pow10(drop) {
            Ok(unit) => {
                let half = unit / U256::from(2u64);
                amount.saturating_add(half) / unit
            }
            Err(_) => U256::ZERO,
        }
    };
    let shown_decimals = places.min(decimals);

    let digits = rounded.to_string();
    let mut out = if shown_decimals == 0 {
        digits
    } else {
        let width = shown_decimals as usize;
        let padded = format!("{:0>w$}", digits, w = width + 1);
        let (whole, fraction) = padded.split_at(padded.len() - width);
        format!("{}.{}", whole, fraction)
    };

    let missing = places.saturating_sub(decimals) as usize;
    if missing > 0 {
        if shown_decimals == 0 {
            out.push('.');
        }
        out.push_str(&"0".repeat(missing));
    }
    out
}
