//! Deterministic fixed-point currency amounts

use fixed::types::I64F64;

/// Currency amount. Fixed-point so that sums and comparisons are exact and
/// identical on every platform.
pub type Amount = I64F64;

pub const ZERO: Amount = I64F64::ZERO;

/// Adds up `values`, returning `None` if the total leaves the representable range.
pub fn checked_sum<I>(values: I) -> Option<Amount>
where
    I: IntoIterator<Item = Amount>,
{
    values
        .into_iter()
        .try_fold(ZERO, |total, value| total.checked_add(value))
}

/// Parses a decimal string such as `"12.5"` into an amount.
pub fn parse_amount(s: &str) -> Result<Amount, crate::error::ChainError> {
    s.trim().parse::<Amount>().map_err(|e| {
        crate::error::ChainError::InvalidTransaction(format!("Invalid amount '{}': {}", s, e))
    })
}
