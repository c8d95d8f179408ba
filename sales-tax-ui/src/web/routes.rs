//! JSON endpoints under `/api`.

use std::str::FromStr;

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post},
};
use rust_decimal::Decimal;
use sales_tax_core::calculations::{available_categories, compute_tax_from_input};
use sales_tax_core::sales::{quote_sale, record_sale};
use sales_tax_core::{
    AdditionalTax, CatalogStatistics, Category, CategoryPatch, NewAdditionalTax, NewCategory,
    NewProduct, Product, ProductCategory, ProductPatch, SaleQuote, SeedSummary, TaxBreakdown,
    Transaction,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::AppState;
use super::error::ApiResult;
use crate::reports::{self, CategorySales, StatusGroup, TOP_N};

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct SaleRequest {
    pub product_id: i64,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    10
}

/// Calculator input. The base value may be a JSON number or text; text
/// reaches the engine exactly as typed, thousands separators included.
#[derive(Debug, Serialize, Deserialize)]
pub struct CalculatorRequest {
    pub base_value: BaseValue,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BaseValue {
    Number(serde_json::Number),
    Text(String),
}

impl std::fmt::Display for BaseValue {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            BaseValue::Number(n) => write!(f, "{n}"),
            BaseValue::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TaxRate {
    pub name: String,
    pub rate: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryTaxesResponse {
    pub category: ProductCategory,
    pub taxes: Vec<TaxRate>,
}

// =========================================================================
// API Router
// =========================================================================

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/:id",
            get(get_category)
                .patch(update_category)
                .delete(delete_category),
        )
        .route("/categories/:id/products", get(list_products_by_category))
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/:id",
            get(get_product).patch(update_product).delete(delete_product),
        )
        .route(
            "/transactions",
            get(list_transactions).post(create_transaction),
        )
        .route("/transactions/quote", post(quote_transaction))
        .route(
            "/additional-taxes",
            get(list_additional_taxes).post(create_additional_tax),
        )
        .route("/calculator", post(calculate))
        .route("/calculator/categories", get(calculator_categories))
        .route("/calculator/categories/:name/taxes", get(category_taxes))
        .route("/statistics", get(statistics))
        .route("/reports/most-expensive", get(most_expensive))
        .route("/reports/cheapest", get(cheapest))
        .route("/reports/sales-by-category", get(sales_by_category))
        .route("/reports/products-by-status", get(products_by_status))
        .route("/seed", post(seed))
}

// =========================================================================
// Categories
// =========================================================================

async fn list_categories(State(repo): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(repo.list_categories().await?))
}

async fn create_category(
    State(repo): State<AppState>,
    Json(request): Json<NewCategory>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let category = repo.create_category(request).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn get_category(
    State(repo): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Category>> {
    Ok(Json(repo.get_category(id).await?))
}

async fn update_category(
    State(repo): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<CategoryPatch>,
) -> ApiResult<Json<Category>> {
    Ok(Json(repo.update_category(id, patch).await?))
}

async fn delete_category(
    State(repo): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    repo.delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_products_by_category(
    State(repo): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(repo.list_products_by_category(id).await?))
}

// =========================================================================
// Products
// =========================================================================

async fn list_products(State(repo): State<AppState>) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(repo.list_products().await?))
}

async fn create_product(
    State(repo): State<AppState>,
    Json(request): Json<NewProduct>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let product = repo.create_product(request).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn get_product(
    State(repo): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Product>> {
    Ok(Json(repo.get_product(id).await?))
}

async fn update_product(
    State(repo): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<ProductPatch>,
) -> ApiResult<Json<Product>> {
    Ok(Json(repo.update_product(id, patch).await?))
}

async fn delete_product(
    State(repo): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    repo.delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =========================================================================
// Transactions
// =========================================================================

async fn list_transactions(
    State(repo): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> ApiResult<Json<Vec<Transaction>>> {
    Ok(Json(repo.list_recent_transactions(query.limit).await?))
}

/// Prices the sale from the stored product and records it.
async fn create_transaction(
    State(repo): State<AppState>,
    Json(request): Json<SaleRequest>,
) -> ApiResult<(StatusCode, Json<Transaction>)> {
    let transaction = record_sale(&*repo, request.product_id, request.quantity).await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

async fn quote_transaction(
    State(repo): State<AppState>,
    Json(request): Json<SaleRequest>,
) -> ApiResult<Json<SaleQuote>> {
    Ok(Json(
        quote_sale(&*repo, request.product_id, request.quantity).await?,
    ))
}

// =========================================================================
// Additional taxes
// =========================================================================

async fn list_additional_taxes(
    State(repo): State<AppState>,
) -> ApiResult<Json<Vec<AdditionalTax>>> {
    Ok(Json(repo.list_additional_taxes().await?))
}

async fn create_additional_tax(
    State(repo): State<AppState>,
    Json(request): Json<NewAdditionalTax>,
) -> ApiResult<(StatusCode, Json<AdditionalTax>)> {
    let tax = repo.create_additional_tax(request).await?;
    Ok((StatusCode::CREATED, Json(tax)))
}

// =========================================================================
// Calculator
// =========================================================================

async fn calculate(
    request: Result<Json<CalculatorRequest>, JsonRejection>,
) -> ApiResult<Json<TaxBreakdown>> {
    let Json(request) = request?;
    let base_value = request.base_value.to_string();
    debug!(base_value = %base_value, category = %request.category, "calculating tax");

    Ok(Json(compute_tax_from_input(&base_value, &request.category)?))
}

async fn calculator_categories() -> Json<Vec<&'static str>> {
    Json(available_categories())
}

async fn category_taxes(Path(name): Path<String>) -> ApiResult<Json<CategoryTaxesResponse>> {
    let category = ProductCategory::from_str(&name)?;
    let taxes = category
        .tax_types()
        .iter()
        .map(|tax| TaxRate {
            name: tax.name().to_string(),
            rate: tax.rate(),
        })
        .collect();

    Ok(Json(CategoryTaxesResponse { category, taxes }))
}

// =========================================================================
// Statistics, reports, seeding
// =========================================================================

async fn statistics(State(repo): State<AppState>) -> ApiResult<Json<CatalogStatistics>> {
    Ok(Json(repo.get_statistics().await?))
}

async fn most_expensive(State(repo): State<AppState>) -> ApiResult<Json<Vec<Product>>> {
    let products = repo.list_products().await?;
    Ok(Json(reports::most_expensive(&products, TOP_N)))
}

async fn cheapest(State(repo): State<AppState>) -> ApiResult<Json<Vec<Product>>> {
    let products = repo.list_products().await?;
    Ok(Json(reports::cheapest(&products, TOP_N)))
}

async fn sales_by_category(State(repo): State<AppState>) -> ApiResult<Json<Vec<CategorySales>>> {
    Ok(Json(reports::load_sales_by_category(&*repo).await?))
}

async fn products_by_status(State(repo): State<AppState>) -> ApiResult<Json<Vec<StatusGroup>>> {
    let products = repo.list_products().await?;
    Ok(Json(reports::products_by_status(&products)))
}

async fn seed(State(repo): State<AppState>) -> ApiResult<(StatusCode, Json<SeedSummary>)> {
    let summary = repo.seed_sample_data().await?;
    Ok((StatusCode::CREATED, Json(summary)))
}
