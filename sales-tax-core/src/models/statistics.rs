use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ProductStatus;

/// Aggregate counters over the whole catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogStatistics {
    /// Only statuses with at least one product appear.
    pub products_by_status: BTreeMap<ProductStatus, i64>,
    pub total_categories: i64,
    pub total_products: i64,
    pub total_transactions: i64,
    /// Sum of `total_final` over every transaction; zero when there are none.
    pub total_sales: Decimal,
}

/// What `seed_sample_data` inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedSummary {
    pub categories: usize,
    pub products: usize,
    pub additional_taxes: usize,
}
