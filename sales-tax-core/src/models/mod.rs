mod additional_tax;
mod category;
mod product;
mod statistics;
mod transaction;
pub mod validation;

pub use additional_tax::{AdditionalTax, NewAdditionalTax};
pub use category::{Category, CategoryPatch, NewCategory, default_vat_rate};
pub use product::{NewProduct, Product, ProductPatch, ProductStatus};
pub use statistics::{CatalogStatistics, SeedSummary};
pub use transaction::{NewTransaction, Transaction};
pub use validation::ValidationError;
