use axum::response::{IntoResponse, Response};
use axum_helpers::{AppError, ErrorCode};
use thiserror::Error;
use validator::ValidationErrors;

/// Longest error detail echoed back in a failed search response
const SEARCH_DETAIL_LIMIT: usize = 120;

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("Product {0} not found")]
    NotFound(i32),

    #[error("Product with name '{0}' not found")]
    NameNotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ProductResult<T> = Result<T, ProductError>;

impl ProductError {
    /// Maps a failed search to the search endpoint's error contract.
    ///
    /// Invalid arguments stay `400`; anything else becomes `500` with
    /// `"Search failed: <detail>"`, the detail cut to a short prefix. The full
    /// error is logged.
    pub fn into_search_failure(self) -> AppError {
        match self {
            ProductError::InvalidArgument(msg) => AppError::BadRequest(msg),
            other => {
                let detail = other.to_string();
                tracing::error!(error = %detail, "Product search failed");
                AppError::InternalServerError(format!(
                    "Search failed: {}",
                    truncate_detail(&detail, SEARCH_DETAIL_LIMIT)
                ))
            }
        }
    }
}

fn truncate_detail(detail: &str, limit: usize) -> String {
    match detail.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &detail[..cut]),
        None => detail.to_string(),
    }
}

/// Convert ProductError to AppError for standardized error responses
impl From<ProductError> for AppError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::InvalidArgument(msg) => AppError::BadRequest(msg),
            ProductError::NotFound(_) | ProductError::NameNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            ProductError::Database(detail) => AppError::Database(detail),
            ProductError::Internal(detail) => {
                tracing::error!(error = %detail, "Internal product error");
                AppError::InternalServerError(ErrorCode::InternalError.default_message().to_string())
            }
        }
    }
}

impl IntoResponse for ProductError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<sea_orm::DbErr> for ProductError {
    fn from(err: sea_orm::DbErr) -> Self {
        ProductError::Database(err.to_string())
    }
}

impl From<ValidationErrors> for ProductError {
    fn from(err: ValidationErrors) -> Self {
        ProductError::InvalidArgument(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_not_found_variants_map_to_404() {
        let response = ProductError::NotFound(999).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = ProductError::NameNotFound("Kiwi".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_invalid_argument_maps_to_400() {
        let app: AppError = ProductError::InvalidArgument("bad".into()).into();
        assert_eq!(app.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_search_failure_keeps_invalid_argument() {
        let app = ProductError::InvalidArgument("Search keyword is required".into())
            .into_search_failure();
        assert!(matches!(app, AppError::BadRequest(ref m) if m == "Search keyword is required"));
    }

    #[test]
    fn test_search_failure_truncates_detail() {
        let long = "x".repeat(500);
        let app = ProductError::Database(long).into_search_failure();

        match app {
            AppError::InternalServerError(msg) => {
                assert!(msg.starts_with("Search failed: Database error: "));
                assert!(msg.ends_with("..."));
                assert!(msg.len() < 200);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_truncate_detail_respects_char_boundaries() {
        assert_eq!(truncate_detail("héllo", 2), "hé...");
        assert_eq!(truncate_detail("short", 10), "short");
    }
}
