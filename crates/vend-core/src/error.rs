//! # Error Types
//!
//! Domain-specific error types for vend-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  vend-core errors (this file)                                          │
//! │  ├── CoreError        - Domain rule violations                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  vend-service errors (separate crate)                                  │
//! │  └── ServiceError     - Sessions, persistence, configuration           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ServiceError → caller             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant is local, synchronous and non-retryable. An operation that
//! fails leaves state unchanged.

use thiserror::Error;

use crate::amount::Amount;
use crate::types::{ProductId, TransactionStatus};

// =============================================================================
// Core Error
// =============================================================================

/// Core domain errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// A coin was constructed from a face value outside {0.5, 1, 2, 5, 10}.
    #[error("Invalid denomination: {value} (accepted: 0.5, 1, 2, 5, 10)")]
    InvalidDenomination { value: f64 },

    /// Stock would go below zero.
    ///
    /// ## When This Occurs
    /// - Dispensing a product whose quantity is 0
    /// - Settling an order that selects a product more times than in stock
    #[error("Product {name} ({product_id}) is out of stock: available {available}, requested {requested}")]
    OutOfStock {
        product_id: ProductId,
        name: String,
        available: u32,
        requested: u32,
    },

    /// The catalog has no entry with this identifier.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// Two catalog entries share one identifier.
    #[error("Duplicate product in catalog: {0}")]
    DuplicateProduct(ProductId),

    /// The transaction already reached a terminal state.
    ///
    /// ## When This Occurs
    /// - Inserting coins after `complete()` or `cancel()`
    /// - Completing or cancelling twice
    #[error("Transaction {transaction_id} is {status}, cannot {operation}")]
    TransactionClosed {
        transaction_id: String,
        status: TransactionStatus,
        operation: &'static str,
    },

    /// Selection or completion with inadequate funds.
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: Amount, available: Amount },

    /// The coin pool cannot pay this amount exactly.
    #[error("Cannot make exact change for {amount}: {shortfall} left unpaid")]
    ExactChangeUnavailable { amount: Amount, shortfall: Amount },

    /// Change was requested for a negative amount.
    #[error("Change amount cannot be negative: {0}")]
    NegativeAmount(Amount),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors raised before any domain state is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
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
        let err = CoreError::InsufficientFunds {
            required: Amount::from_cents(200),
            available: Amount::from_cents(100),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient funds: required 2.00, available 1.00"
        );

        let err = CoreError::TransactionClosed {
            transaction_id: "tx-1".to_string(),
            status: TransactionStatus::Completed,
            operation: "insert money",
        };
        assert_eq!(
            err.to_string(),
            "Transaction tx-1 is COMPLETED, cannot insert money"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
