//! Fixed-point conversion between whole-coin decimals and wei.

use alloy::primitives::U256;
use thiserror::Error;

/// Decimals of the native currency on every supported chain.
pub const NATIVE_DECIMALS: usize = 18;

/// Fractional digits shown for balances.
pub const BALANCE_DISPLAY_DECIMALS: usize = 6;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UnitError {
    #[error("amount is empty")]
    Empty,
    #[error("amount contains invalid character {0:?}")]
    InvalidCharacter(char),
    #[error("amount is too large")]
    Overflow,
    #[error("invalid hex quantity: {0}")]
    InvalidQuantity(String),
}

/// Parses a decimal amount of whole coins into wei.
///
/// Digits past the 18th decimal are dropped, so the result is the floor of the
/// exact value. Signs, exponents and separators are rejected.
pub fn parse_ether_amount(raw: &str) -> Result<U256, UnitError> {
    let trimmed = raw.trim();
    let (int_part, frac_part) = match trimmed.split_once('.') {
        Some((i, f)) => (i, f),
        None => (trimmed, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(UnitError::Empty);
    }
    if let Some(c) = int_part
        .chars()
        .chain(frac_part.chars())
        .find(|c| !c.is_ascii_digit())
    {
        return Err(UnitError::InvalidCharacter(c));
    }

    let frac_truncated = &frac_part[..frac_part.len().min(NATIVE_DECIMALS)];
    let mut digits = String::with_capacity(int_part.len() + NATIVE_DECIMALS);
    digits.push_str(int_part);
    digits.push_str(frac_truncated);
    for _ in frac_truncated.len()..NATIVE_DECIMALS {
        digits.push('0');
    }

    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 10).map_err(|_| UnitError::Overflow)
}

/// `0x`-prefixed lowercase hex quantity, `0x0` for zero.
pub fn to_hex_quantity(value: U256) -> String {
    format!("0x{value:x}")
}

/// Parses a JSON-RPC hex quantity such as `0xde0b6b3a7640000`.
pub fn parse_hex_quantity(raw: &str) -> Result<U256, UnitError> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if digits.is_empty() {
        return Err(UnitError::InvalidQuantity(raw.to_owned()));
    }
    U256::from_str_radix(digits, 16).map_err(|e| UnitError::InvalidQuantity(format!("{raw}: {e}")))
}

/// Formats wei as whole coins with exactly six decimals, rounding half up.
pub fn format_balance(wei: U256) -> String {
    let step = U256::from(10u64).pow(U256::from(NATIVE_DECIMALS - BALANCE_DISPLAY_DECIMALS));
    let display_scale = U256::from(10u64).pow(U256::from(BALANCE_DISPLAY_DECIMALS));
    let half_step = step / U256::from(2u64);

    let scaled = wei.saturating_add(half_step) / step;
    let whole = scaled / display_scale;
    let frac = (scaled % display_scale).to_string();
    format!("{whole}.{frac:0>width$}", width = BALANCE_DISPLAY_DECIMALS)
}
