use async_trait::async_trait;
use tracing::info;

use sales_tax_core::db::repository::{CatalogRepository, RepositoryError};
use sales_tax_core::db::{DbConfig, RepositoryFactory};

use crate::repository::SqliteRepository;

/// [`RepositoryFactory`] for SQLite.
///
/// Register this with a [`sales_tax_core::db::RepositoryRegistry`] to make the
/// `"sqlite"` backend available:
///
/// ```rust,no_run
/// use sales_tax_core::db::RepositoryRegistry;
/// use sales_tax_db_sqlite::SqliteRepositoryFactory;
///
/// let mut registry = RepositoryRegistry::new();
/// registry.register(Box::new(SqliteRepositoryFactory));
/// ```
pub struct SqliteRepositoryFactory;

#[async_trait]
impl RepositoryFactory for SqliteRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Open the database described by `config.connection_string` and bring
    /// its schema up to date.
    ///
    /// Accepted connection-string values:
    /// * A bare file path, e.g. `"sales_tax.db"`. The file is created if it
    ///   does not exist.
    /// * A `sqlite:` URL.
    /// * `":memory:"`, an ephemeral database that lives as long as the
    ///   repository.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn CatalogRepository>, RepositoryError> {
        let repo = SqliteRepository::new(&config.connection_string)
            .await
            .map_err(|e| RepositoryError::Connection(format!("{e:#}")))?;
        repo.run_migrations()
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;

        info!(location = %config.connection_string, "sqlite catalog ready");
        Ok(Box::new(repo))
    }
}
