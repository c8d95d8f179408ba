use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    AdditionalTax, CatalogStatistics, Category, CategoryPatch, NewAdditionalTax, NewCategory,
    NewProduct, NewTransaction, Product, ProductPatch, SeedSummary, Transaction, ValidationError,
};

/// Failure classes reported by a [`CatalogRepository`].
///
/// Validation, missing rows, referential conflicts and backend failures are
/// kept apart so callers can decide whether to re-prompt, report or give up.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("{entity} named '{name}' already exists")]
    Duplicate { entity: &'static str, name: String },

    #[error("{entity} {id} is referenced by {count} {dependent}")]
    InUse {
        entity: &'static str,
        id: i64,
        dependent: &'static str,
        count: i64,
    },

    #[error("Sample data already present")]
    AlreadySeeded,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl RepositoryError {
    pub fn not_found(
        entity: &'static str,
        id: i64,
    ) -> Self {
        Self::NotFound { entity, id }
    }

    /// True for failures the caller cannot fix by changing its input.
    pub fn is_backend(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::Connection(_) | Self::Configuration(_)
        )
    }
}

/// Persistence boundary for categories, products, transactions and
/// additional tax definitions.
///
/// Every method validates its input before touching storage, checks that
/// referenced rows exist, and refuses deletes while dependents remain.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    // Categories
    async fn create_category(
        &self,
        category: NewCategory,
    ) -> Result<Category, RepositoryError>;
    async fn get_category(
        &self,
        id: i64,
    ) -> Result<Category, RepositoryError>;
    /// Ordered by name.
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError>;
    async fn update_category(
        &self,
        id: i64,
        patch: CategoryPatch,
    ) -> Result<Category, RepositoryError>;
    async fn delete_category(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError>;

    // Products
    async fn create_product(
        &self,
        product: NewProduct,
    ) -> Result<Product, RepositoryError>;
    async fn get_product(
        &self,
        id: i64,
    ) -> Result<Product, RepositoryError>;
    /// Ordered by name.
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError>;
    /// Ordered by name. An unknown category yields an empty list.
    async fn list_products_by_category(
        &self,
        category_id: i64,
    ) -> Result<Vec<Product>, RepositoryError>;
    async fn update_product(
        &self,
        id: i64,
        patch: ProductPatch,
    ) -> Result<Product, RepositoryError>;
    async fn delete_product(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError>;

    // Transactions (append-only)
    async fn create_transaction(
        &self,
        transaction: NewTransaction,
    ) -> Result<Transaction, RepositoryError>;
    /// Newest first.
    async fn list_recent_transactions(
        &self,
        limit: u32,
    ) -> Result<Vec<Transaction>, RepositoryError>;

    // Additional taxes
    async fn create_additional_tax(
        &self,
        tax: NewAdditionalTax,
    ) -> Result<AdditionalTax, RepositoryError>;
    async fn list_additional_taxes(&self) -> Result<Vec<AdditionalTax>, RepositoryError>;

    // Aggregates
    async fn get_statistics(&self) -> Result<CatalogStatistics, RepositoryError>;

    /// Inserts the fixed sample catalog. Fails with
    /// [`RepositoryError::AlreadySeeded`] while any category exists.
    async fn seed_sample_data(&self) -> Result<SeedSummary, RepositoryError>;
}
