use std::sync::Arc;

use anyhow::{Context, Result};
use sales_tax_core::db::{DbConfig, RepositoryRegistry};
use sales_tax_core::{CatalogRepository, RepositoryError, SeedSummary};
use sales_tax_db_sqlite::SqliteRepositoryFactory;
use tracing::{debug, info};

/// Registry with every storage backend compiled into this binary.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry
}

/// Opens the catalog described by `config`, ready for use.
pub async fn open_catalog(config: &DbConfig) -> Result<Arc<dyn CatalogRepository>> {
    debug!(backend = %config.backend, "opening catalog");
    let repo = build_registry()
        .create(config)
        .await
        .with_context(|| {
            format!(
                "cannot open {} catalog at '{}'",
                config.backend, config.connection_string
            )
        })?;
    Ok(Arc::from(repo))
}

/// Seeds the sample catalog unless the store already has categories.
///
/// Returns `None` when seeding was skipped.
pub async fn seed_if_empty(repo: &dyn CatalogRepository) -> Result<Option<SeedSummary>> {
    match repo.seed_sample_data().await {
        Ok(summary) => Ok(Some(summary)),
        Err(RepositoryError::AlreadySeeded) => {
            info!("catalog already has data; skipping sample data");
            Ok(None)
        }
        Err(e) => Err(e).context("failed to seed sample data"),
    }
}
