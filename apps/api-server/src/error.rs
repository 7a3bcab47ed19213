//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Handler                                                                │
//! │  Result<Json<_>, ApiError>                                              │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ServiceError::Domain(CoreError) ── class() ──┐                         │
//! │  ServiceError::Store(DbError) ──── Internal ──┤                         │
//! │  JsonRejection ─────────────────── 400 ───────┤                         │
//! │                                               ▼                         │
//! │                                 ApiError { status, code, message }      │
//! │                                               │                         │
//! │                                               ▼                         │
//! │                     404 {"error": "Sale not found: ...",                │
//! │                          "code": "NOT_FOUND"}                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Store failures are logged here and reach the client as a generic message.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;
use ventas_core::{CoreError, ErrorClass};
use ventas_db::{DbError, ServiceError};

/// Error returned from every handler.
///
/// ## Serialization
/// ```json
/// {
///   "error": "Insufficient stock for product p-1: available 2, requested 3",
///   "code": "INSUFFICIENT_STOCK"
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: ErrorCode,
    pub message: String,
}

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Request body or parameters failed validation (400)
    ValidationError,

    /// The query gate refused a query (400)
    QueryRejected,

    /// Client, product or sale missing (404)
    NotFound,

    /// Not enough stock to complete a sale (409)
    InsufficientStock,

    /// Sale already cancelled (409)
    AlreadyCancelled,

    /// Store failure (500)
    Internal,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    code: ErrorCode,
}

impl ApiError {
    pub fn new(status: StatusCode, code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, ErrorCode::ValidationError, message)
    }

    pub fn internal() -> Self {
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::Internal,
            "Internal server error",
        )
    }
}

/// HTTP status for an error class.
pub fn status_for(class: ErrorClass) -> StatusCode {
    match class {
        ErrorClass::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorClass::NotFound => StatusCode::NOT_FOUND,
        ErrorClass::Conflict => StatusCode::CONFLICT,
        ErrorClass::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let status = status_for(err.class());

        let code = match &err {
            ServiceError::Domain(domain) => match domain {
                CoreError::Validation(_) => ErrorCode::ValidationError,
                CoreError::RejectedQuery(_) => ErrorCode::QueryRejected,
                CoreError::ClientNotFound(_)
                | CoreError::ProductNotFound(_)
                | CoreError::SaleNotFound(_) => ErrorCode::NotFound,
                CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
                CoreError::AlreadyCancelled(_) => ErrorCode::AlreadyCancelled,
            },
            ServiceError::Store(db) => {
                error!(error = %db, "Store failure while handling request");
                return ApiError::internal();
            }
        };

        ApiError::new(status, code, err.to_string())
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        ApiError::from(ServiceError::Store(err))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: &self.message,
            code: self.code,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use ventas_core::ValidationError;

    #[test]
    fn test_domain_errors_map_by_class() {
        let err = ApiError::from(ServiceError::from(CoreError::SaleNotFound("s-1".into())));
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Sale not found: s-1");

        let err = ApiError::from(ServiceError::from(CoreError::InsufficientStock {
            product_id: "p-1".into(),
            available: 2,
            requested: 3,
        }));
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.code, ErrorCode::InsufficientStock);

        let err = ApiError::from(ServiceError::from(ValidationError::Required {
            field: "email".into(),
        }));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[test]
    fn test_store_errors_are_hidden() {
        let err = ApiError::from(ServiceError::from(DbError::QueryFailed(
            "no such column: secret".into(),
        )));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code, ErrorCode::Internal);
        assert!(!err.message.contains("secret"));
    }
}
