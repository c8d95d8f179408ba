use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::validation::{ValidationResult, require_positive, require_positive_count};

/// An entry in the append-only sales ledger.
///
/// `unit_price` is a snapshot taken at sale time; later price changes on the
/// product do not affect it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub category_name: String,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
    pub total_tax: Decimal,
    pub total_final: Decimal,
    pub created_at: DateTime<Utc>,
}

/// For recording a sale.
///
/// Only quantity and unit price are checked; the totals are stored exactly
/// as the caller computed them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
    pub total_tax: Decimal,
    pub total_final: Decimal,
}

impl NewTransaction {
    pub fn new(
        product_id: i64,
        quantity: i64,
        unit_price: Decimal,
        subtotal: Decimal,
        total_tax: Decimal,
        total_final: Decimal,
    ) -> ValidationResult<Self> {
        let transaction = Self {
            product_id,
            quantity,
            unit_price,
            subtotal,
            total_tax,
            total_final,
        };
        transaction.validate()?;
        Ok(transaction)
    }

    pub fn validate(&self) -> ValidationResult<()> {
        require_positive_count("quantity", self.quantity)?;
        require_positive("unit_price", self.unit_price)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn zero_quantity_is_rejected() {
        let result = NewTransaction::new(1, 0, dec!(10), dec!(0), dec!(0), dec!(0));

        assert!(result.is_err());
    }

    #[test]
    fn zero_unit_price_is_rejected() {
        let result = NewTransaction::new(1, 2, dec!(0), dec!(0), dec!(0), dec!(0));

        assert!(result.is_err());
    }

    #[test]
    fn inconsistent_totals_are_accepted() {
        // Arithmetic consistency is the caller's responsibility.
        let result = NewTransaction::new(1, 2, dec!(10), dec!(999), dec!(1), dec!(3));

        assert!(result.is_ok());
    }
}
