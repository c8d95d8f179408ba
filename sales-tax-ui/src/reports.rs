//! Read-only views over the catalog: price rankings, sales per category and
//! products grouped by status.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use sales_tax_core::calculations::common::round_half_up;
use sales_tax_core::{CatalogRepository, Product, ProductStatus, RepositoryError, Transaction};
use serde::Serialize;

/// Length of the price rankings.
pub const TOP_N: usize = 5;

/// How many of the newest transactions the sales report aggregates.
pub const SALES_REPORT_WINDOW: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySales {
    pub category: String,
    /// Wider than a single transaction's quantity so the sum cannot overflow.
    pub quantity: i128,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusGroup {
    pub status: ProductStatus,
    pub products: Vec<Product>,
}

/// The `n` highest priced products. Ties keep their listing order.
pub fn most_expensive(
    products: &[Product],
    n: usize,
) -> Vec<Product> {
    let mut ranked = products.to_vec();
    ranked.sort_by(|a, b| b.base_price.cmp(&a.base_price));
    ranked.truncate(n);
    ranked
}

/// The `n` lowest priced products. Ties keep their listing order.
pub fn cheapest(
    products: &[Product],
    n: usize,
) -> Vec<Product> {
    let mut ranked = products.to_vec();
    ranked.sort_by(|a, b| a.base_price.cmp(&b.base_price));
    ranked.truncate(n);
    ranked
}

/// Units sold and revenue per category name, sorted by name.
///
/// Revenue saturates at [`Decimal::MAX`].
pub fn sales_by_category(transactions: &[Transaction]) -> Vec<CategorySales> {
    let mut totals: BTreeMap<&str, (i128, Decimal)> = BTreeMap::new();
    for tx in transactions {
        let (quantity, total) = totals.entry(tx.category_name.as_str()).or_default();
        *quantity += i128::from(tx.quantity);
        *total = total.saturating_add(tx.total_final);
    }

    totals
        .into_iter()
        .map(|(category, (quantity, total))| CategorySales {
            category: category.to_string(),
            quantity,
            total: round_half_up(total),
        })
        .collect()
}

/// Products grouped by status, in status order; empty groups are omitted.
pub fn products_by_status(products: &[Product]) -> Vec<StatusGroup> {
    let mut groups: BTreeMap<ProductStatus, Vec<Product>> = BTreeMap::new();
    for product in products {
        groups.entry(product.status).or_default().push(product.clone());
    }

    groups
        .into_iter()
        .map(|(status, products)| StatusGroup { status, products })
        .collect()
}

pub async fn load_sales_by_category(
    repo: &dyn CatalogRepository,
) -> Result<Vec<CategorySales>, RepositoryError> {
    let transactions = repo.list_recent_transactions(SALES_REPORT_WINDOW).await?;
    Ok(sales_by_category(&transactions))
}
