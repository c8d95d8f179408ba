use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sales_tax_core::sample_data;
use sales_tax_core::{
    AdditionalTax, CatalogRepository, CatalogStatistics, Category, CategoryPatch, NewAdditionalTax,
    NewCategory, NewProduct, NewTransaction, Product, ProductPatch, ProductStatus,
    RepositoryError, SeedSummary, Transaction,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use tracing::{debug, info, warn};

use crate::decimal::{decimal_to_f64, get_decimal, get_money};

const CATEGORY_SELECT: &str = "SELECT id, name, description, vat_rate, created_at FROM categories";

const PRODUCT_SELECT: &str = "SELECT p.id, p.name, p.description, p.base_price, p.category_id,
        c.name AS category_name, c.vat_rate AS category_vat_rate,
        p.status, p.created_at, p.updated_at
     FROM products p
     JOIN categories c ON c.id = p.category_id";

const TRANSACTION_SELECT: &str = "SELECT t.id, t.product_id, p.name AS product_name,
        c.name AS category_name, t.quantity, t.unit_price, t.subtotal,
        t.total_tax, t.total_final, t.created_at
     FROM transactions t
     JOIN products p ON p.id = t.product_id
     JOIN categories c ON c.id = p.category_id";

const ADDITIONAL_TAX_SELECT: &str =
    "SELECT id, name, rate, description, category_id, active FROM additional_taxes";

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Open (creating if needed) the database at `database_url`.
    ///
    /// Accepts a bare path, a `sqlite:` URL, or `:memory:`. An in-memory
    /// database lives as long as its single pooled connection, so that
    /// connection is never reaped.
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database location: {}", database_url))?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = database_url.contains(":memory:");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .idle_timeout(Duration::from_secs(600))
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to database: {}", database_url))?;
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn count(
        &self,
        sql: &str,
    ) -> Result<i64, RepositoryError> {
        sqlx::query_scalar(sql)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)
    }

    async fn ensure_category_exists(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM categories WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        found
            .map(|_| ())
            .ok_or(RepositoryError::not_found("category", id))
    }

    async fn ensure_product_exists(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM products WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        found
            .map(|_| ())
            .ok_or(RepositoryError::not_found("product", id))
    }

    /// Delete `id` from `table` unless rows in `dependent_table` still point
    /// at it. The count and the delete share one transaction; dropping it
    /// on an early return rolls back.
    async fn guarded_delete(
        &self,
        guard: DeleteGuard,
        id: i64,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let dependents: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM {} WHERE {} = ?",
            guard.dependent_table, guard.foreign_key
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error)?;

        if dependents > 0 {
            warn!(entity = guard.entity, id, dependents, "delete blocked by dependents");
            return Err(RepositoryError::InUse {
                entity: guard.entity,
                id,
                dependent: guard.dependent_table,
                count: dependents,
            });
        }

        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", guard.table))
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found(guard.entity, id));
        }

        tx.commit().await.map_err(db_error)?;
        info!(entity = guard.entity, id, "deleted");
        Ok(())
    }
}

struct DeleteGuard {
    entity: &'static str,
    table: &'static str,
    dependent_table: &'static str,
    foreign_key: &'static str,
}

const CATEGORY_GUARD: DeleteGuard = DeleteGuard {
    entity: "category",
    table: "categories",
    dependent_table: "products",
    foreign_key: "category_id",
};

const PRODUCT_GUARD: DeleteGuard = DeleteGuard {
    entity: "product",
    table: "products",
    dependent_table: "transactions",
    foreign_key: "product_id",
};

fn db_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

/// Maps a UNIQUE violation to [`RepositoryError::Duplicate`].
fn write_error(
    entity: &'static str,
    name: &str,
) -> impl FnOnce(sqlx::Error) -> RepositoryError {
    let name = name.to_string();
    move |e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepositoryError::Duplicate { entity, name }
        }
        _ => db_error(e),
    }
}

fn get_column<'r, T>(
    row: &'r SqliteRow,
    column: &str,
) -> Result<T, RepositoryError>
where
    T: sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite>,
{
    row.try_get(column)
        .map_err(|e| RepositoryError::Database(format!("Failed to get {}: {}", column, e)))
}

fn row_to_category(row: &SqliteRow) -> Result<Category, RepositoryError> {
    Ok(Category {
        id: get_column(row, "id")?,
        name: get_column(row, "name")?,
        description: get_column(row, "description")?,
        vat_rate: get_decimal(row, "vat_rate")?,
        created_at: get_column::<DateTime<Utc>>(row, "created_at")?,
    })
}

fn row_to_product(row: &SqliteRow) -> Result<Product, RepositoryError> {
    let status: String = get_column(row, "status")?;
    let status = ProductStatus::parse(&status)
        .ok_or_else(|| RepositoryError::Database(format!("Invalid product status: {}", status)))?;

    Ok(Product {
        id: get_column(row, "id")?,
        name: get_column(row, "name")?,
        description: get_column(row, "description")?,
        base_price: get_money(row, "base_price")?,
        category_id: get_column(row, "category_id")?,
        category_name: get_column(row, "category_name")?,
        category_vat_rate: get_decimal(row, "category_vat_rate")?,
        status,
        created_at: get_column::<DateTime<Utc>>(row, "created_at")?,
        updated_at: get_column::<DateTime<Utc>>(row, "updated_at")?,
    })
}

fn row_to_transaction(row: &SqliteRow) -> Result<Transaction, RepositoryError> {
    Ok(Transaction {
        id: get_column(row, "id")?,
        product_id: get_column(row, "product_id")?,
        product_name: get_column(row, "product_name")?,
        category_name: get_column(row, "category_name")?,
        quantity: get_column(row, "quantity")?,
        unit_price: get_money(row, "unit_price")?,
        subtotal: get_money(row, "subtotal")?,
        total_tax: get_money(row, "total_tax")?,
        total_final: get_money(row, "total_final")?,
        created_at: get_column::<DateTime<Utc>>(row, "created_at")?,
    })
}

fn row_to_additional_tax(row: &SqliteRow) -> Result<AdditionalTax, RepositoryError> {
    Ok(AdditionalTax {
        id: get_column(row, "id")?,
        name: get_column(row, "name")?,
        rate: get_decimal(row, "rate")?,
        description: get_column(row, "description")?,
        category_id: get_column(row, "category_id")?,
        active: get_column(row, "active")?,
    })
}

#[async_trait]
impl CatalogRepository for SqliteRepository {
    async fn create_category(
        &self,
        category: NewCategory,
    ) -> Result<Category, RepositoryError> {
        category.validate()?;
        debug!(name = %category.name, "creating category");

        let result = sqlx::query(
            "INSERT INTO categories (name, description, vat_rate, created_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&category.name)
        .bind(&category.description)
        .bind(decimal_to_f64(category.vat_rate))
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(write_error("category", &category.name))?;

        let id = result.last_insert_rowid();
        info!(id, name = %category.name, "category created");
        self.get_category(id).await
    }

    async fn get_category(
        &self,
        id: i64,
    ) -> Result<Category, RepositoryError> {
        let row = sqlx::query(&format!("{} WHERE id = ?", CATEGORY_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .ok_or(RepositoryError::not_found("category", id))?;

        row_to_category(&row)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query(&format!("{} ORDER BY name, id", CATEGORY_SELECT))
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        rows.iter().map(row_to_category).collect()
    }

    async fn update_category(
        &self,
        id: i64,
        patch: CategoryPatch,
    ) -> Result<Category, RepositoryError> {
        patch.validate()?;

        let mut query = QueryBuilder::<Sqlite>::new("UPDATE categories SET ");
        let mut set = query.separated(", ");
        if let Some(name) = &patch.name {
            set.push("name = ").push_bind_unseparated(name.clone());
        }
        if let Some(description) = &patch.description {
            set.push("description = ")
                .push_bind_unseparated(description.clone());
        }
        if let Some(rate) = patch.vat_rate {
            set.push("vat_rate = ")
                .push_bind_unseparated(decimal_to_f64(rate));
        }
        query.push(" WHERE id = ").push_bind(id);

        let name = patch.name.as_deref().unwrap_or_default();
        let result = query
            .build()
            .execute(&self.pool)
            .await
            .map_err(write_error("category", name))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found("category", id));
        }

        info!(id, "category updated");
        self.get_category(id).await
    }

    async fn delete_category(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError> {
        self.guarded_delete(CATEGORY_GUARD, id).await
    }

    async fn create_product(
        &self,
        product: NewProduct,
    ) -> Result<Product, RepositoryError> {
        product.validate()?;
        self.ensure_category_exists(product.category_id).await?;
        debug!(name = %product.name, category_id = product.category_id, "creating product");

        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO products (
                name, description, base_price, category_id, status, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(decimal_to_f64(product.base_price))
        .bind(product.category_id)
        .bind(product.status.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        let id = result.last_insert_rowid();
        info!(id, name = %product.name, "product created");
        self.get_product(id).await
    }

    async fn get_product(
        &self,
        id: i64,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query(&format!("{} WHERE p.id = ?", PRODUCT_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .ok_or(RepositoryError::not_found("product", id))?;

        row_to_product(&row)
    }

    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(&format!("{} ORDER BY p.name, p.id", PRODUCT_SELECT))
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        rows.iter().map(row_to_product).collect()
    }

    async fn list_products_by_category(
        &self,
        category_id: i64,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "{} WHERE p.category_id = ? ORDER BY p.name, p.id",
            PRODUCT_SELECT
        ))
        .bind(category_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter().map(row_to_product).collect()
    }

    async fn update_product(
        &self,
        id: i64,
        patch: ProductPatch,
    ) -> Result<Product, RepositoryError> {
        patch.validate()?;
        if let Some(category_id) = patch.category_id {
            self.ensure_category_exists(category_id).await?;
        }

        let mut query = QueryBuilder::<Sqlite>::new("UPDATE products SET ");
        let mut set = query.separated(", ");
        if let Some(name) = &patch.name {
            set.push("name = ").push_bind_unseparated(name.clone());
        }
        if let Some(description) = &patch.description {
            set.push("description = ")
                .push_bind_unseparated(description.clone());
        }
        if let Some(price) = patch.base_price {
            set.push("base_price = ")
                .push_bind_unseparated(decimal_to_f64(price));
        }
        if let Some(category_id) = patch.category_id {
            set.push("category_id = ")
                .push_bind_unseparated(category_id);
        }
        if let Some(status) = patch.status {
            set.push("status = ").push_bind_unseparated(status.as_str());
        }
        set.push("updated_at = ").push_bind_unseparated(Utc::now());
        query.push(" WHERE id = ").push_bind(id);

        let result = query
            .build()
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found("product", id));
        }

        info!(id, "product updated");
        self.get_product(id).await
    }

    async fn delete_product(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError> {
        self.guarded_delete(PRODUCT_GUARD, id).await
    }

    async fn create_transaction(
        &self,
        transaction: NewTransaction,
    ) -> Result<Transaction, RepositoryError> {
        transaction.validate()?;
        self.ensure_product_exists(transaction.product_id).await?;

        let result = sqlx::query(
            "INSERT INTO transactions (
                product_id, quantity, unit_price, subtotal, total_tax, total_final, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(transaction.product_id)
        .bind(transaction.quantity)
        .bind(decimal_to_f64(transaction.unit_price))
        .bind(decimal_to_f64(transaction.subtotal))
        .bind(decimal_to_f64(transaction.total_tax))
        .bind(decimal_to_f64(transaction.total_final))
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        let id = result.last_insert_rowid();
        info!(id, product_id = transaction.product_id, "transaction created");

        let row = sqlx::query(&format!("{} WHERE t.id = ?", TRANSACTION_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .ok_or(RepositoryError::not_found("transaction", id))?;
        row_to_transaction(&row)
    }

    async fn list_recent_transactions(
        &self,
        limit: u32,
    ) -> Result<Vec<Transaction>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "{} ORDER BY t.created_at DESC, t.id DESC LIMIT ?",
            TRANSACTION_SELECT
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter().map(row_to_transaction).collect()
    }

    async fn create_additional_tax(
        &self,
        tax: NewAdditionalTax,
    ) -> Result<AdditionalTax, RepositoryError> {
        tax.validate()?;
        if let Some(category_id) = tax.category_id {
            self.ensure_category_exists(category_id).await?;
        }

        let result = sqlx::query(
            "INSERT INTO additional_taxes (name, rate, description, category_id)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&tax.name)
        .bind(decimal_to_f64(tax.rate))
        .bind(&tax.description)
        .bind(tax.category_id)
        .execute(&self.pool)
        .await
        .map_err(write_error("additional tax", &tax.name))?;

        let id = result.last_insert_rowid();
        let row = sqlx::query(&format!("{} WHERE id = ?", ADDITIONAL_TAX_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .ok_or(RepositoryError::not_found("additional tax", id))?;
        row_to_additional_tax(&row)
    }

    async fn list_additional_taxes(&self) -> Result<Vec<AdditionalTax>, RepositoryError> {
        let rows = sqlx::query(&format!("{} ORDER BY name, id", ADDITIONAL_TAX_SELECT))
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        rows.iter().map(row_to_additional_tax).collect()
    }

    async fn get_statistics(&self) -> Result<CatalogStatistics, RepositoryError> {
        let rows = sqlx::query("SELECT status, COUNT(*) AS count FROM products GROUP BY status")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        let mut products_by_status = BTreeMap::new();
        for row in &rows {
            let status: String = get_column(row, "status")?;
            let status = ProductStatus::parse(&status).ok_or_else(|| {
                RepositoryError::Database(format!("Invalid product status: {}", status))
            })?;
            products_by_status.insert(status, get_column::<i64>(row, "count")?);
        }

        let sales = sqlx::query("SELECT COALESCE(SUM(total_final), 0) AS total FROM transactions")
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(CatalogStatistics {
            products_by_status,
            total_categories: self.count("SELECT COUNT(*) FROM categories").await?,
            total_products: self.count("SELECT COUNT(*) FROM products").await?,
            total_transactions: self.count("SELECT COUNT(*) FROM transactions").await?,
            total_sales: get_money(&sales, "total")?,
        })
    }

    /// Rows are inserted one statement at a time; a failure part way through
    /// leaves the rows written so far in place.
    async fn seed_sample_data(&self) -> Result<SeedSummary, RepositoryError> {
        if self.count("SELECT COUNT(*) FROM categories").await? > 0 {
            warn!("sample data requested but categories already exist");
            return Err(RepositoryError::AlreadySeeded);
        }

        let mut summary = SeedSummary::default();
        let mut category_ids = HashMap::new();

        for sample in sample_data::categories() {
            let category = self
                .create_category(NewCategory::new(
                    sample.category.as_str(),
                    sample.description,
                    sample.vat_rate,
                )?)
                .await?;
            category_ids.insert(sample.category, category.id);
            summary.categories += 1;
        }

        for sample in sample_data::products() {
            let Some(&category_id) = category_ids.get(&sample.category) else {
                continue;
            };
            self.create_product(
                NewProduct::new(sample.name, sample.base_price, category_id)?
                    .with_description(sample.description),
            )
            .await?;
            summary.products += 1;
        }

        for sample in sample_data::additional_taxes() {
            let category_id = category_ids.get(&sample.category).copied();
            self.create_additional_tax(NewAdditionalTax::new(
                sample.name,
                sample.rate,
                sample.description,
                category_id,
            )?)
            .await?;
            summary.additional_taxes += 1;
        }

        info!(
            categories = summary.categories,
            products = summary.products,
            additional_taxes = summary.additional_taxes,
            "sample data seeded"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use sales_tax_core::ValidationError;
    use sales_tax_core::sales::{SaleError, quote_sale, record_sale};

    use super::*;

    async fn setup_test_db() -> SqliteRepository {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");

        let repo = SqliteRepository::new_with_pool(pool).await;
        repo.run_migrations()
            .await
            .expect("Failed to run migrations");
        repo
    }

    async fn insert_category(
        repo: &SqliteRepository,
        name: &str,
    ) -> Category {
        repo.create_category(NewCategory::new(name, "", dec!(0.19)).unwrap())
            .await
            .expect("Should create category")
    }

    async fn insert_product(
        repo: &SqliteRepository,
        name: &str,
        price: Decimal,
        category_id: i64,
    ) -> Product {
        repo.create_product(NewProduct::new(name, price, category_id).unwrap())
            .await
            .expect("Should create product")
    }

    fn sale(
        product_id: i64,
        quantity: i64,
        unit_price: Decimal,
    ) -> NewTransaction {
        let subtotal = unit_price * Decimal::from(quantity);
        let tax = subtotal * dec!(0.19);
        NewTransaction::new(product_id, quantity, unit_price, subtotal, tax, subtotal + tax)
            .unwrap()
    }

    // ── categories ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_create_and_get_category() {
        let repo = setup_test_db().await;

        let liquors = NewCategory::new("Liquors", "Alcoholic beverages", dec!(0.19)).unwrap();
        let created = repo
            .create_category(liquors)
            .await
            .expect("Should create category");
        let fetched = repo
            .get_category(created.id)
            .await
            .expect("Should find category");

        assert_eq!(fetched, created);
        assert_eq!(fetched.name, "Liquors");
        assert_eq!(fetched.vat_rate, dec!(0.19));
    }

    #[tokio::test]
    async fn test_create_category_rejects_rate_out_of_range() {
        let repo = setup_test_db().await;
        let category = NewCategory {
            name: "Bad".to_string(),
            description: String::new(),
            vat_rate: dec!(1.2),
        };

        let result = repo.create_category(category).await;

        assert!(matches!(result, Err(RepositoryError::Validation(_))));
        assert_eq!(repo.list_categories().await, Ok(Vec::new()));
    }

    #[tokio::test]
    async fn test_create_category_duplicate_name() {
        let repo = setup_test_db().await;
        insert_category(&repo, "Fuels").await;

        let result = repo
            .create_category(NewCategory::new("Fuels", "again", dec!(0.19)).unwrap())
            .await;

        assert_eq!(
            result,
            Err(RepositoryError::Duplicate {
                entity: "category",
                name: "Fuels".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_list_categories_ordered_by_name() {
        let repo = setup_test_db().await;
        insert_category(&repo, "Other").await;
        insert_category(&repo, "Basic Food").await;
        insert_category(&repo, "Liquors").await;

        let names: Vec<String> = repo
            .list_categories()
            .await
            .expect("Should list categories")
            .into_iter()
            .map(|c| c.name)
            .collect();

        assert_eq!(names, vec!["Basic Food", "Liquors", "Other"]);
    }

    #[tokio::test]
    async fn test_update_category_partial() {
        let repo = setup_test_db().await;
        let category = insert_category(&repo, "Other").await;

        let updated = repo
            .update_category(
                category.id,
                CategoryPatch {
                    vat_rate: Some(dec!(0.16)),
                    ..Default::default()
                },
            )
            .await
            .expect("Should update category");

        assert_eq!(updated.vat_rate, dec!(0.16));
        assert_eq!(updated.name, "Other");
    }

    #[tokio::test]
    async fn test_update_category_empty_patch() {
        let repo = setup_test_db().await;
        let category = insert_category(&repo, "Other").await;

        let result = repo
            .update_category(category.id, CategoryPatch::default())
            .await;

        assert_eq!(
            result,
            Err(RepositoryError::Validation(ValidationError::EmptyPatch))
        );
    }

    #[tokio::test]
    async fn test_update_category_not_found() {
        let repo = setup_test_db().await;

        let result = repo
            .update_category(
                404,
                CategoryPatch {
                    description: Some("x".to_string()),
                    ..Default::default()
                },
            )
            .await;

        assert_eq!(result, Err(RepositoryError::not_found("category", 404)));
    }

    #[tokio::test]
    async fn test_delete_category_blocked_by_products() {
        let repo = setup_test_db().await;
        let category = insert_category(&repo, "Fuels").await;
        let product = insert_product(&repo, "Diesel", dec!(11000), category.id).await;

        let result = repo.delete_category(category.id).await;

        assert_eq!(
            result,
            Err(RepositoryError::InUse {
                entity: "category",
                id: category.id,
                dependent: "products",
                count: 1
            })
        );
        assert!(repo.get_category(category.id).await.is_ok());
        assert!(repo.get_product(product.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_category() {
        let repo = setup_test_db().await;
        let category = insert_category(&repo, "Empty").await;

        repo.delete_category(category.id)
            .await
            .expect("Should delete category");

        assert_eq!(
            repo.get_category(category.id).await,
            Err(RepositoryError::not_found("category", category.id))
        );
        assert_eq!(
            repo.delete_category(category.id).await,
            Err(RepositoryError::not_found("category", category.id))
        );
    }

    // ── products ─────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_create_product_joins_category() {
        let repo = setup_test_db().await;
        let category = insert_category(&repo, "Liquors").await;

        let product = insert_product(&repo, "National Beer", dec!(3500), category.id).await;

        assert_eq!(product.name, "National Beer");
        assert_eq!(product.base_price, dec!(3500));
        assert_eq!(product.category_name, "Liquors");
        assert_eq!(product.category_vat_rate, dec!(0.19));
        assert_eq!(product.status, ProductStatus::Active);
    }

    #[tokio::test]
    async fn test_create_product_unknown_category() {
        let repo = setup_test_db().await;

        let result = repo
            .create_product(NewProduct::new("Orphan", dec!(10), 999).unwrap())
            .await;

        assert_eq!(result, Err(RepositoryError::not_found("category", 999)));
        assert_eq!(repo.list_products().await, Ok(Vec::new()));
    }

    #[tokio::test]
    async fn test_create_product_rejects_non_positive_price() {
        let repo = setup_test_db().await;
        let category = insert_category(&repo, "Other").await;
        let product = NewProduct {
            name: "Free".to_string(),
            description: String::new(),
            base_price: dec!(0),
            category_id: category.id,
            status: ProductStatus::Active,
        };

        let result = repo.create_product(product).await;

        assert!(matches!(result, Err(RepositoryError::Validation(_))));
    }

    #[tokio::test]
    async fn test_list_products_by_category() {
        let repo = setup_test_db().await;
        let food = insert_category(&repo, "Basic Food").await;
        let other = insert_category(&repo, "Other").await;
        insert_product(&repo, "Rice", dec!(2500), food.id).await;
        insert_product(&repo, "Beans", dec!(3000), food.id).await;
        insert_product(&repo, "Laptop", dec!(1500000), other.id).await;

        let names: Vec<String> = repo
            .list_products_by_category(food.id)
            .await
            .expect("Should list products")
            .into_iter()
            .map(|p| p.name)
            .collect();

        assert_eq!(names, vec!["Beans", "Rice"]);
        assert_eq!(repo.list_products().await.map(|p| p.len()), Ok(3));
    }

    #[tokio::test]
    async fn test_update_product_fields_and_timestamp() {
        let repo = setup_test_db().await;
        let category = insert_category(&repo, "Other").await;
        let product = insert_product(&repo, "Laptop", dec!(1500000), category.id).await;

        let updated = repo
            .update_product(
                product.id,
                ProductPatch {
                    base_price: Some(dec!(1450000.50)),
                    status: Some(ProductStatus::Inactive),
                    ..Default::default()
                },
            )
            .await
            .expect("Should update product");

        assert_eq!(updated.base_price, dec!(1450000.50));
        assert_eq!(updated.status, ProductStatus::Inactive);
        assert_eq!(updated.name, "Laptop");
        assert!(updated.updated_at >= product.updated_at);
    }

    #[tokio::test]
    async fn test_update_product_empty_patch_fails_for_existing_product() {
        let repo = setup_test_db().await;
        let category = insert_category(&repo, "Other").await;
        let product = insert_product(&repo, "Laptop", dec!(1500000), category.id).await;

        let result = repo
            .update_product(product.id, ProductPatch::default())
            .await;

        assert_eq!(
            result,
            Err(RepositoryError::Validation(ValidationError::EmptyPatch))
        );
    }

    #[tokio::test]
    async fn test_update_product_unknown_category() {
        let repo = setup_test_db().await;
        let category = insert_category(&repo, "Other").await;
        let product = insert_product(&repo, "Laptop", dec!(1500000), category.id).await;

        let result = repo
            .update_product(
                product.id,
                ProductPatch {
                    category_id: Some(77),
                    ..Default::default()
                },
            )
            .await;

        assert_eq!(result, Err(RepositoryError::not_found("category", 77)));
    }

    #[tokio::test]
    async fn test_update_product_not_found() {
        let repo = setup_test_db().await;

        let result = repo
            .update_product(
                5,
                ProductPatch {
                    name: Some("Ghost".to_string()),
                    ..Default::default()
                },
            )
            .await;

        assert_eq!(result, Err(RepositoryError::not_found("product", 5)));
    }

    #[tokio::test]
    async fn test_delete_product_blocked_by_transactions() {
        let repo = setup_test_db().await;
        let category = insert_category(&repo, "Other").await;
        let product = insert_product(&repo, "Laptop", dec!(100), category.id).await;
        repo.create_transaction(sale(product.id, 1, dec!(100)))
            .await
            .expect("Should create transaction");

        let result = repo.delete_product(product.id).await;

        assert_eq!(
            result,
            Err(RepositoryError::InUse {
                entity: "product",
                id: product.id,
                dependent: "transactions",
                count: 1
            })
        );
        assert!(repo.get_product(product.id).await.is_ok());
        assert_eq!(
            repo.list_recent_transactions(10).await.map(|t| t.len()),
            Ok(1)
        );
    }

    #[tokio::test]
    async fn test_delete_product() {
        let repo = setup_test_db().await;
        let category = insert_category(&repo, "Other").await;
        let product = insert_product(&repo, "Laptop", dec!(100), category.id).await;

        repo.delete_product(product.id)
            .await
            .expect("Should delete product");

        assert_eq!(
            repo.get_product(product.id).await,
            Err(RepositoryError::not_found("product", product.id))
        );
        // The category is free again.
        repo.delete_category(category.id)
            .await
            .expect("Should delete category once empty");
    }

    // ── transactions ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_create_transaction_stores_totals_as_given() {
        let repo = setup_test_db().await;
        let category = insert_category(&repo, "Other").await;
        let product = insert_product(&repo, "Laptop", dec!(100), category.id).await;
        let odd = NewTransaction::new(product.id, 2, dec!(100), dec!(1), dec!(2), dec!(3)).unwrap();

        let stored = repo
            .create_transaction(odd)
            .await
            .expect("Should create transaction");

        assert_eq!(stored.product_name, "Laptop");
        assert_eq!(stored.category_name, "Other");
        assert_eq!(stored.quantity, 2);
        assert_eq!(stored.unit_price, dec!(100));
        assert_eq!(stored.subtotal, dec!(1));
        assert_eq!(stored.total_tax, dec!(2));
        assert_eq!(stored.total_final, dec!(3));
    }

    #[tokio::test]
    async fn test_create_transaction_unknown_product() {
        let repo = setup_test_db().await;

        let result = repo.create_transaction(sale(31, 1, dec!(10))).await;

        assert_eq!(result, Err(RepositoryError::not_found("product", 31)));
    }

    #[tokio::test]
    async fn test_create_transaction_rejects_zero_quantity() {
        let repo = setup_test_db().await;
        let category = insert_category(&repo, "Other").await;
        let product = insert_product(&repo, "Laptop", dec!(100), category.id).await;
        let bad = NewTransaction {
            product_id: product.id,
            quantity: 0,
            unit_price: dec!(100),
            subtotal: dec!(0),
            total_tax: dec!(0),
            total_final: dec!(0),
        };

        let result = repo.create_transaction(bad).await;

        assert!(matches!(result, Err(RepositoryError::Validation(_))));
    }

    #[tokio::test]
    async fn test_recent_transactions_newest_first_with_limit() {
        let repo = setup_test_db().await;
        let category = insert_category(&repo, "Other").await;
        let product = insert_product(&repo, "Pen", dec!(10), category.id).await;
        let mut ids = Vec::new();
        for quantity in 1..=4 {
            let tx = repo
                .create_transaction(sale(product.id, quantity, dec!(10)))
                .await
                .expect("Should create transaction");
            ids.push(tx.id);
        }

        let recent: Vec<i64> = repo
            .list_recent_transactions(3)
            .await
            .expect("Should list transactions")
            .into_iter()
            .map(|t| t.id)
            .collect();

        ids.reverse();
        assert_eq!(recent, ids[..3].to_vec());
    }

    // ── additional taxes ─────────────────────────────────────────────────

    #[tokio::test]
    async fn test_additional_tax_round_trip() {
        let repo = setup_test_db().await;
        let fuels = insert_category(&repo, "Fuels").await;

        let tax = repo
            .create_additional_tax(
                NewAdditionalTax::new("Carbon Levy", dec!(0.03), "per gallon", Some(fuels.id))
                    .unwrap(),
            )
            .await
            .expect("Should create additional tax");

        assert_eq!(tax.rate, dec!(0.03));
        assert_eq!(tax.category_id, Some(fuels.id));
        assert!(tax.active);
        assert_eq!(repo.list_additional_taxes().await, Ok(vec![tax]));
    }

    #[tokio::test]
    async fn test_additional_tax_unknown_category() {
        let repo = setup_test_db().await;

        let result = repo
            .create_additional_tax(NewAdditionalTax::new("Levy", dec!(0.1), "", Some(3)).unwrap())
            .await;

        assert_eq!(result, Err(RepositoryError::not_found("category", 3)));
    }

    // ── statistics ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_statistics_on_empty_store() {
        let repo = setup_test_db().await;

        let stats = repo.get_statistics().await.expect("Should get statistics");

        assert_eq!(stats, CatalogStatistics::default());
        assert_eq!(stats.total_sales, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_statistics_counts_and_sales() {
        let repo = setup_test_db().await;
        let category = insert_category(&repo, "Other").await;
        let pen = insert_product(&repo, "Pen", dec!(10), category.id).await;
        let old = insert_product(&repo, "Quill", dec!(20), category.id).await;
        repo.update_product(
            old.id,
            ProductPatch {
                status: Some(ProductStatus::Discontinued),
                ..Default::default()
            },
        )
        .await
        .expect("Should update product");
        repo.create_transaction(sale(pen.id, 1, dec!(10)))
            .await
            .expect("Should create transaction");
        repo.create_transaction(sale(pen.id, 2, dec!(10)))
            .await
            .expect("Should create transaction");

        let stats = repo.get_statistics().await.expect("Should get statistics");

        assert_eq!(stats.total_categories, 1);
        assert_eq!(stats.total_products, 2);
        assert_eq!(stats.total_transactions, 2);
        assert_eq!(stats.total_sales, dec!(35.70));
        assert_eq!(
            stats.products_by_status,
            BTreeMap::from([
                (ProductStatus::Active, 1),
                (ProductStatus::Discontinued, 1)
            ])
        );
    }

    // ── seeding ──────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_seed_sample_data_once() {
        let repo = setup_test_db().await;

        let summary = repo.seed_sample_data().await.expect("Should seed");

        assert_eq!(
            summary,
            SeedSummary {
                categories: 6,
                products: 6,
                additional_taxes: 3
            }
        );
        assert_eq!(repo.list_categories().await.map(|c| c.len()), Ok(6));
        assert_eq!(repo.list_products().await.map(|p| p.len()), Ok(6));
        assert_eq!(repo.list_additional_taxes().await.map(|t| t.len()), Ok(3));

        assert_eq!(
            repo.seed_sample_data().await,
            Err(RepositoryError::AlreadySeeded)
        );
        assert_eq!(repo.list_categories().await.map(|c| c.len()), Ok(6));
    }

    #[tokio::test]
    async fn test_seed_refused_when_any_category_exists() {
        let repo = setup_test_db().await;
        insert_category(&repo, "Custom").await;

        assert_eq!(
            repo.seed_sample_data().await,
            Err(RepositoryError::AlreadySeeded)
        );
        assert_eq!(repo.list_products().await, Ok(Vec::new()));
    }

    #[tokio::test]
    async fn test_seeded_products_are_active_and_priced() {
        let repo = setup_test_db().await;
        repo.seed_sample_data().await.expect("Should seed");

        let products = repo.list_products().await.expect("Should list products");
        let laptop = products
            .iter()
            .find(|p| p.name == "Laptop")
            .expect("Laptop should be seeded");

        assert!(products.iter().all(|p| p.status == ProductStatus::Active));
        assert_eq!(laptop.base_price, dec!(1500000));
        assert_eq!(laptop.category_name, "Other");
    }

    // ── sales ────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_record_sale_on_seeded_catalog() {
        let repo = setup_test_db().await;
        repo.seed_sample_data().await.expect("Should seed");
        let beer = repo
            .list_products()
            .await
            .expect("Should list products")
            .into_iter()
            .find(|p| p.name == "National Beer")
            .expect("beer should be seeded");

        let tx = record_sale(&repo, beer.id, 3)
            .await
            .expect("Should record sale");

        assert_eq!(tx.quantity, 3);
        assert_eq!(tx.subtotal, dec!(10500));
        assert_eq!(tx.total_tax, dec!(4620));
        assert_eq!(tx.total_final, dec!(15120));
        assert_eq!(tx.category_name, "Liquors");

        let stats = repo.get_statistics().await.expect("Should get statistics");
        assert_eq!(stats.total_transactions, 1);
        assert_eq!(stats.total_sales, dec!(15120));
    }

    #[tokio::test]
    async fn test_record_sale_refuses_inactive_product() {
        let repo = setup_test_db().await;
        let category = insert_category(&repo, "Other").await;
        let product = insert_product(&repo, "Fax Machine", dec!(90000), category.id).await;
        repo.update_product(
            product.id,
            ProductPatch {
                status: Some(ProductStatus::Discontinued),
                ..Default::default()
            },
        )
        .await
        .expect("Should update product");

        let result = record_sale(&repo, product.id, 1).await;

        assert_eq!(
            result,
            Err(SaleError::ProductNotActive {
                id: product.id,
                status: ProductStatus::Discontinued
            })
        );
        assert_eq!(repo.list_recent_transactions(10).await, Ok(Vec::new()));
    }

    #[tokio::test]
    async fn test_quote_sale_unknown_product() {
        let repo = setup_test_db().await;

        let result = quote_sale(&repo, 12, 1).await;

        assert_eq!(
            result,
            Err(SaleError::Repository(RepositoryError::not_found("product", 12)))
        );
    }

    #[tokio::test]
    async fn test_file_backed_database_is_created() {
        let path = std::env::temp_dir().join(format!(
            "sales-tax-repo-{}-{}.db",
            std::process::id(),
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        let url = path.to_string_lossy().to_string();

        let repo = SqliteRepository::new(&url)
            .await
            .expect("Should open file database");
        repo.run_migrations().await.expect("Should migrate");
        insert_category(&repo, "Other").await;
        repo.pool().close().await;

        assert!(path.exists());
        let _ = std::fs::remove_file(&path);
    }
}
