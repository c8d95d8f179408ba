pub mod calculations;
pub mod db;
pub mod models;
pub mod sales;
pub mod sample_data;

pub use calculations::{ProductCategory, TaxBreakdown, TaxError};
pub use db::repository::{CatalogRepository, RepositoryError};
pub use models::*;
pub use sales::{SaleError, SaleQuote};
