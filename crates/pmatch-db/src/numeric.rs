//! Conversions between the engine's `f64` scores and `NUMERIC` columns.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use crate::DbError;

pub(crate) fn to_decimal(field: &'static str, value: f64) -> Result<Decimal, DbError> {
    Decimal::from_f64(value).ok_or(DbError::InvalidNumeric { field, value })
}

/// Same as [`to_decimal`], rounded to `dp` decimal places to match the
/// column scale.
pub(crate) fn to_decimal_dp(field: &'static str, value: f64, dp: u32) -> Result<Decimal, DbError> {
    to_decimal(field, value).map(|d| d.round_dp(dp))
}

/// Scale of the weight, target and value columns.
const VALUE_SCALE: u32 = 2;

/// Convert a weight, target or value for a `NUMERIC(_, 2)` column.
///
/// Rejects numbers Postgres would round on insert instead of storing a
/// different value than the one given. Noise below six decimals is dropped
/// first so `75.13` is not mistaken for `75.129999...`.
pub(crate) fn to_stored_decimal(field: &'static str, value: f64) -> Result<Decimal, DbError> {
    let decimal = to_decimal_dp(field, value, 6)?;
    let stored = decimal.round_dp(VALUE_SCALE);
    if stored != decimal {
        return Err(DbError::InvalidNumeric { field, value });
    }
    Ok(stored)
}

pub(crate) fn to_f64(field: &'static str, value: Decimal) -> Result<f64, DbError> {
    value.to_f64().ok_or(DbError::NumericOutOfRange { field })
}
