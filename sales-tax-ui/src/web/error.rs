//! HTTP mapping of catalog, sale and calculator failures.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sales_tax_core::{RepositoryError, SaleError, TaxError};
use serde::{Deserialize, Serialize};

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Sale(#[from] SaleError),

    #[error(transparent)]
    Tax(#[from] TaxError),

    #[error("malformed request body")]
    Body(#[from] JsonRejection),
}

const STORAGE_FAILURE: &str = "storage failure";

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

fn repository_status(err: &RepositoryError) -> (StatusCode, &'static str, Option<String>) {
    match err {
        // 400
        RepositoryError::Validation(v) => {
            (StatusCode::BAD_REQUEST, "validation_error", Some(v.to_string()))
        }

        // 404
        RepositoryError::NotFound { entity, id } => {
            (StatusCode::NOT_FOUND, "not_found", Some(format!("{entity} {id}")))
        }

        // 409
        RepositoryError::Duplicate { name, .. } => {
            (StatusCode::CONFLICT, "duplicate", Some(name.clone()))
        }
        RepositoryError::InUse { dependent, count, .. } => {
            (StatusCode::CONFLICT, "in_use", Some(format!("{count} {dependent}")))
        }
        RepositoryError::AlreadySeeded => (StatusCode::CONFLICT, "already_seeded", None),

        // 500
        RepositoryError::Database(msg)
        | RepositoryError::Connection(msg)
        | RepositoryError::Configuration(msg) => {
            tracing::error!("Storage error: {}", msg);
            (StatusCode::INTERNAL_SERVER_ERROR, "storage_error", None)
        }
    }
}

impl ApiError {
    fn classify(&self) -> (StatusCode, &'static str, Option<String>) {
        match self {
            ApiError::Repository(e) => repository_status(e),

            ApiError::Tax(TaxError::InvalidArgument(msg)) => {
                (StatusCode::BAD_REQUEST, "invalid_argument", Some(msg.clone()))
            }

            ApiError::Body(rejection) => {
                (StatusCode::BAD_REQUEST, "invalid_argument", Some(rejection.body_text()))
            }

            ApiError::Sale(sale) => match sale {
                SaleError::Validation(v) => {
                    (StatusCode::BAD_REQUEST, "validation_error", Some(v.to_string()))
                }
                SaleError::Tax(TaxError::InvalidArgument(msg)) => {
                    (StatusCode::BAD_REQUEST, "invalid_argument", Some(msg.clone()))
                }
                SaleError::ProductNotActive { status, .. } => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "product_not_active",
                    Some(status.to_string()),
                ),
                SaleError::UnsupportedCategory { category, .. } => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "unsupported_category",
                    Some(category.clone()),
                ),
                SaleError::Repository(e) => repository_status(e),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, details) = self.classify();

        // Backend messages can name files and hosts; they stay in the log.
        let error = if status.is_server_error() {
            STORAGE_FAILURE.to_string()
        } else {
            self.to_string()
        };
        let body = ErrorResponse {
            error,
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}
