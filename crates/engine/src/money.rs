//! Fixed-point money helpers.
//!
//! Monetary values are exposed as [`Decimal`] with two decimal places and
//! persisted as signed integer minor units (cents) so the database never sees
//! a floating-point value.
//!
//! # Examples
//!
//! ```rust
//! use engine::money;
//! use rust_decimal::Decimal;
//!
//! let amount = Decimal::new(1234, 2);
//! assert_eq!(money::to_minor(amount).unwrap(), 1234);
//! assert_eq!(money::from_minor(1234).to_string(), "12.34");
//! ```

use rust_decimal::{Decimal, prelude::ToPrimitive};

use crate::{EngineError, ResultEngine};

/// Number of decimal places every amount carries.
pub const DECIMAL_PLACES: u32 = 2;

/// Maximum number of digits (integer + fractional) an amount may have.
pub const MAX_DIGITS: u32 = 10;

/// Largest absolute value in minor units: `99_999_999.99`.
const MAX_ABS_MINOR: i64 = 10_i64.pow(MAX_DIGITS) - 1;

/// Converts a decimal amount into minor units.
///
/// Rejects values with more than [`DECIMAL_PLACES`] decimals or more than
/// [`MAX_DIGITS`] digits.
pub fn to_minor(value: Decimal) -> ResultEngine<i64> {
    if value.normalize().scale() > DECIMAL_PLACES {
        return Err(EngineError::InvalidAmount(format!(
            "ensure that there are no more than {DECIMAL_PLACES} decimal places"
        )));
    }

    let minor = value
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|scaled| scaled.trunc())
        .and_then(|scaled| scaled.to_i64())
        .filter(|minor| minor.abs() <= MAX_ABS_MINOR)
        .ok_or_else(|| {
            EngineError::InvalidAmount(format!(
                "ensure that there are no more than {MAX_DIGITS} digits in total"
            ))
        })?;
    Ok(minor)
}

/// Converts minor units back into a two-place decimal.
#[must_use]
pub fn from_minor(minor: i64) -> Decimal {
    Decimal::new(minor, DECIMAL_PLACES)
}

/// Sums decimal amounts exactly.
pub fn sum<'a>(amounts: impl IntoIterator<Item = &'a Decimal>) -> Decimal {
    amounts
        .into_iter()
        .fold(from_minor(0), |total, amount| total + amount)
}
