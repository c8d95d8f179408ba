//! Field-level checks shared by the `New*` and `*Patch` types.

use rust_decimal::Decimal;
use thiserror::Error;

/// A single field failed its constraint.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("{field} must be greater than zero, got {value}")]
    NotPositive { field: &'static str, value: String },

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: Decimal,
        max: Decimal,
        value: Decimal,
    },

    #[error("{field} must be one of {allowed:?}, got '{value}'")]
    InvalidChoice {
        field: &'static str,
        allowed: &'static [&'static str],
        value: String,
    },

    #[error("update must change at least one field")]
    EmptyPatch,
}

pub type ValidationResult<T> = Result<T, ValidationError>;

pub fn require_text(
    field: &'static str,
    value: &str,
) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required { field });
    }
    Ok(())
}

pub fn require_positive(
    field: &'static str,
    value: Decimal,
) -> ValidationResult<()> {
    if value <= Decimal::ZERO {
        return Err(ValidationError::NotPositive {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

pub fn require_positive_count(
    field: &'static str,
    value: i64,
) -> ValidationResult<()> {
    if value <= 0 {
        return Err(ValidationError::NotPositive {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// `value` must lie in the closed interval `[0, 1]`.
pub fn require_fraction(
    field: &'static str,
    value: Decimal,
) -> ValidationResult<()> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(ValidationError::OutOfRange {
            field,
            min: Decimal::ZERO,
            max: Decimal::ONE,
            value,
        });
    }
    Ok(())
}
