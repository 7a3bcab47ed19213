//! # Error Types
//!
//! Domain-specific error types for ventas-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  ventas-core errors (this file)                                        │
//! │  ├── CoreError        - Domain rule violations                         │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── ErrorClass       - How outer layers should present a failure      │
//! │                                                                         │
//! │  ventas-db errors (separate crate)                                     │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── ServiceError     - CoreError | DbError                            │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ServiceError → HTTP / tool error  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::query_gate::QueryRejection;

// =============================================================================
// Error Class
// =============================================================================

/// Coarse classification shared by every transport.
///
/// ```text
/// InvalidInput → 400   NotFound → 404   Conflict → 409   Internal → 500
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Caller-fixable input problem (validation, rejected query).
    InvalidInput,
    /// A referenced sale, product or client does not exist.
    NotFound,
    /// The request conflicts with current state (stock, sale status).
    Conflict,
    /// Persistence failure.
    Internal,
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Client cannot be found.
    #[error("Client not found: {0}")]
    ClientNotFound(String),

    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Sale cannot be found.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Requested quantity exceeds the stock available at decrement time.
    ///
    /// ## User Workflow
    /// ```text
    /// create(client, [{P, qty: 10}])
    ///      │
    ///      ▼
    /// Check stock: available=2
    ///      │
    ///      ▼
    /// InsufficientStock { product_id: P, available: 2, requested: 10 }
    ///      │
    ///      ▼
    /// Whole sale rolled back, 409 returned
    /// ```
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// Cancellation requested on a sale that is already cancelled.
    #[error("Sale {0} is already cancelled")]
    AlreadyCancelled(String),

    /// The custom query gate declined a query.
    #[error("Query rejected: {0}")]
    RejectedQuery(#[from] QueryRejection),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Returns how this error should be presented to callers.
    pub fn class(&self) -> ErrorClass {
        match self {
            CoreError::Validation(_) | CoreError::RejectedQuery(_) => ErrorClass::InvalidInput,
            CoreError::ClientNotFound(_)
            | CoreError::ProductNotFound(_)
            | CoreError::SaleNotFound(_) => ErrorClass::NotFound,
            CoreError::InsufficientStock { .. } | CoreError::AlreadyCancelled(_) => {
                ErrorClass::Conflict
            }
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before any store access.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid email, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., duplicate client email).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product_id: "p-1".to_string(),
            available: 2,
            requested: 10,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for product p-1: available 2, requested 10"
        );

        let err = CoreError::AlreadyCancelled("s-1".to_string());
        assert_eq!(err.to_string(), "Sale s-1 is already cancelled");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "items".to_string(),
        };
        assert_eq!(err.to_string(), "items is required");

        let err = ValidationError::OutOfRange {
            field: "limit".to_string(),
            min: 1,
            max: 100,
        };
        assert_eq!(err.to_string(), "limit must be between 1 and 100");
    }

    #[test]
    fn test_error_classes() {
        let validation: CoreError = ValidationError::Required {
            field: "items".to_string(),
        }
        .into();
        assert_eq!(validation.class(), ErrorClass::InvalidInput);

        let rejected: CoreError = QueryRejection::NotSelect.into();
        assert_eq!(rejected.class(), ErrorClass::InvalidInput);

        assert_eq!(
            CoreError::SaleNotFound("x".into()).class(),
            ErrorClass::NotFound
        );
        assert_eq!(
            CoreError::ClientNotFound("x".into()).class(),
            ErrorClass::NotFound
        );
        assert_eq!(
            CoreError::AlreadyCancelled("x".into()).class(),
            ErrorClass::Conflict
        );
    }
}
