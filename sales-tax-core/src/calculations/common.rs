//! Shared rounding helpers for monetary amounts.
//!
//! Every tax line and every aggregate total is rounded to cents with the
//! same strategy, so callers should never round a [`Decimal`] any other way.

use rust_decimal::Decimal;

/// Number of decimal places kept for monetary amounts.
pub const MONEY_SCALE: u32 = 2;

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// Values at exactly 0.005 are rounded up to 0.01 (away from zero).
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use sales_tax_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46)); // Away from zero
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(
        MONEY_SCALE,
        rust_decimal::RoundingStrategy::MidpointAwayFromZero,
    )
}

/// Sums already-rounded amounts and rounds the result again.
///
/// This is the second stage of the two-stage rounding used for tax totals:
/// each line is rounded on its own, then the sum of the rounded lines is
/// rounded once more.
///
/// ```
/// use rust_decimal_macros::dec;
/// use sales_tax_core::calculations::common::round_sum;
///
/// assert_eq!(round_sum([dec!(380.00), dec!(500.00)]), dec!(880.00));
/// ```
pub fn round_sum<I>(amounts: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    round_half_up(amounts.into_iter().sum())
}
