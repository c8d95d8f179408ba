//! Decimal column helpers.
//!
//! Monetary columns are stored as SQLite `REAL`. Aggregates such as
//! `COALESCE(SUM(..), 0)` may come back as `INTEGER`, and values written by
//! hand may be `TEXT`, so reads accept all three.

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use sales_tax_core::RepositoryError;
use sales_tax_core::calculations::common::round_half_up;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, TypeInfo, ValueRef};

/// Read `column` as a [`Decimal`]. `NULL` reads as zero.
pub fn get_decimal(
    row: &SqliteRow,
    column: &str,
) -> Result<Decimal, RepositoryError> {
    let value_ref = row
        .try_get_raw(column)
        .map_err(|e| RepositoryError::Database(format!("Column '{}' not found: {}", column, e)))?;

    if value_ref.is_null() {
        return Ok(Decimal::ZERO);
    }

    let type_name = value_ref.type_info().name().to_string();
    match type_name.as_str() {
        "INTEGER" => {
            let val: i64 = row.try_get(column).map_err(|e| column_error(column, &e))?;
            Ok(Decimal::from(val))
        }
        "REAL" => {
            let val: f64 = row.try_get(column).map_err(|e| column_error(column, &e))?;
            Decimal::try_from(val).map_err(|e| {
                RepositoryError::Database(format!("Cannot represent {} as Decimal: {}", val, e))
            })
        }
        "TEXT" => {
            let val: String = row.try_get(column).map_err(|e| column_error(column, &e))?;
            Decimal::from_str(val.trim()).map_err(|_| {
                RepositoryError::Database(format!(
                    "Column '{}' holds non-numeric text '{}'",
                    column, val
                ))
            })
        }
        other => Err(RepositoryError::Database(format!(
            "Unexpected type '{}' for column '{}'",
            other, column
        ))),
    }
}

/// Read `column` as an amount of money, rounded to cents.
///
/// `REAL` storage can surface binary noise (`5950.000000000001`); rounding
/// here keeps it out of the domain types.
pub fn get_money(
    row: &SqliteRow,
    column: &str,
) -> Result<Decimal, RepositoryError> {
    get_decimal(row, column).map(round_half_up)
}

/// Convert a Decimal to f64 for SQLite storage.
pub fn decimal_to_f64(d: Decimal) -> f64 {
    d.to_f64().unwrap_or(0.0)
}

fn column_error(
    column: &str,
    e: &sqlx::Error,
) -> RepositoryError {
    RepositoryError::Database(format!("Failed to read '{}': {}", column, e))
}
