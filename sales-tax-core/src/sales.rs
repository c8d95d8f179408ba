//! Pricing and recording of a sale.
//!
//! Tax is computed on one unit at the product's current price, then scaled
//! by the quantity:
//!
//! ```text
//! subtotal    = unit_price × quantity
//! total_tax   = round(unit_breakdown.total_tax × quantity)
//! total_final = subtotal + total_tax
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::calculations::common::round_half_up;
use crate::calculations::{ProductCategory, SalesTaxCalculator, TaxBreakdown, TaxError};
use crate::db::{CatalogRepository, RepositoryError};
use crate::models::validation::require_positive_count;
use crate::models::{NewTransaction, Product, ProductStatus, Transaction, ValidationError};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SaleError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("product {id} is {status} and cannot be sold")]
    ProductNotActive { id: i64, status: ProductStatus },

    #[error("product {id} belongs to '{category}', which has no tax table entry")]
    UnsupportedCategory { id: i64, category: String },

    #[error(transparent)]
    Tax(#[from] TaxError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// A priced sale that has not been recorded yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleQuote {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Decimal,
    /// Breakdown for a single unit.
    pub unit_breakdown: TaxBreakdown,
    pub subtotal: Decimal,
    pub total_tax: Decimal,
    pub total_final: Decimal,
}

impl SaleQuote {
    /// Prices `quantity` units of `product` without touching storage.
    pub fn for_product(
        product: &Product,
        quantity: i64,
    ) -> Result<Self, SaleError> {
        require_positive_count("quantity", quantity)?;

        if !product.status.is_sellable() {
            return Err(SaleError::ProductNotActive {
                id: product.id,
                status: product.status,
            });
        }

        let category = ProductCategory::parse(&product.category_name).ok_or_else(|| {
            SaleError::UnsupportedCategory {
                id: product.id,
                category: product.category_name.clone(),
            }
        })?;

        let unit_breakdown =
            SalesTaxCalculator::standard().calculate(product.base_price, category)?;
        let units = Decimal::from(quantity);
        let subtotal = product.base_price * units;
        let total_tax = round_half_up(unit_breakdown.total_tax * units);

        Ok(Self {
            product_id: product.id,
            product_name: product.name.clone(),
            quantity,
            unit_price: product.base_price,
            unit_breakdown,
            subtotal,
            total_tax,
            total_final: subtotal + total_tax,
        })
    }

    pub fn to_new_transaction(&self) -> NewTransaction {
        NewTransaction {
            product_id: self.product_id,
            quantity: self.quantity,
            unit_price: self.unit_price,
            subtotal: self.subtotal,
            total_tax: self.total_tax,
            total_final: self.total_final,
        }
    }
}

/// Looks up the product and prices the sale.
pub async fn quote_sale(
    repo: &dyn CatalogRepository,
    product_id: i64,
    quantity: i64,
) -> Result<SaleQuote, SaleError> {
    require_positive_count("quantity", quantity)?;
    let product = repo.get_product(product_id).await?;
    SaleQuote::for_product(&product, quantity).inspect_err(|e| {
        warn!(product_id, quantity, error = %e, "sale rejected");
    })
}

/// Prices the sale and appends it to the ledger.
pub async fn record_sale(
    repo: &dyn CatalogRepository,
    product_id: i64,
    quantity: i64,
) -> Result<Transaction, SaleError> {
    let quote = quote_sale(repo, product_id, quantity).await?;
    let transaction = repo.create_transaction(quote.to_new_transaction()).await?;

    info!(
        transaction_id = transaction.id,
        product_id,
        quantity,
        total_final = %transaction.total_final,
        "sale recorded"
    );
    Ok(transaction)
}
