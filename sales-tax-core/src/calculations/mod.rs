//! Sales tax calculation.
//!
//! The calculator is pure and table driven; see [`sales_tax`] for the table.

pub mod common;
pub mod sales_tax;

pub use sales_tax::{
    CategoryTaxes, MAX_BASE_VALUE, ProductCategory, SalesTaxCalculator, TAX_TABLE, TaxBreakdown,
    TaxError, TaxLine, TaxType, available_categories, compute_tax, compute_tax_from_input,
    taxes_for_category,
};
