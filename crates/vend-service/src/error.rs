//! # Service Error Types
//!
//! Errors returned by `VendingService` and its collaborators.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in vend-service                           │
//! │                                                                         │
//! │  CoreError ──────────┐                                                  │
//! │  (domain rules)      │                                                  │
//! │                      │                                                  │
//! │  RepositoryError ────┼──► ServiceError ──► code() ──► ErrorCode        │
//! │  (persistence port)  │    (#[from])                  "NOT_FOUND"        │
//! │                      │                               "INSUFFICIENT_…"  │
//! │  ConfigError ────────┘                                                  │
//! │  (TOML, env)                                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;
use vend_core::{CoreError, ProductId};

use crate::session::SessionId;

/// Result type alias for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

// =============================================================================
// Service Error
// =============================================================================

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Domain rule violation from vend-core.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The session has no open transaction.
    #[error("No active transaction for session {session_id}")]
    NoActiveTransaction { session_id: SessionId },

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ServiceError {
    /// Stable machine-readable code for callers that map errors to a UI.
    pub fn code(&self) -> ErrorCode {
        match self {
            ServiceError::Core(err) => ErrorCode::from(err),
            ServiceError::NoActiveTransaction { .. } => ErrorCode::NoActiveTransaction,
            ServiceError::Repository(RepositoryError::NotFound(_)) => ErrorCode::NotFound,
            ServiceError::Repository(_) => ErrorCode::RepositoryError,
            ServiceError::Config(_) => ErrorCode::ConfigError,
        }
    }
}

// =============================================================================
// Error Codes
// =============================================================================

/// Error codes exposed to presentation layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    ValidationError,
    InvalidDenomination,
    OutOfStock,
    InsufficientFunds,
    ExactChangeUnavailable,
    TransactionClosed,
    NoActiveTransaction,
    RepositoryError,
    ConfigError,
}

impl From<&CoreError> for ErrorCode {
    fn from(err: &CoreError) -> Self {
        match err {
            CoreError::InvalidDenomination { .. } => ErrorCode::InvalidDenomination,
            CoreError::OutOfStock { .. } => ErrorCode::OutOfStock,
            CoreError::ProductNotFound(_) => ErrorCode::NotFound,
            CoreError::TransactionClosed { .. } => ErrorCode::TransactionClosed,
            CoreError::InsufficientFunds { .. } => ErrorCode::InsufficientFunds,
            CoreError::ExactChangeUnavailable { .. } | CoreError::NegativeAmount(_) => {
                ErrorCode::ExactChangeUnavailable
            }
            CoreError::DuplicateProduct(_) | CoreError::Validation(_) => {
                ErrorCode::ValidationError
            }
        }
    }
}

// =============================================================================
// Repository Error
// =============================================================================

/// Failures of the product persistence port.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Product not found: {0}")]
    NotFound(ProductId),

    #[error("Product already exists: {0}")]
    AlreadyExists(ProductId),

    /// Backend-specific failure (connection, query, serialization).
    #[error("Storage failure: {0}")]
    Storage(String),
}

// =============================================================================
// Config Error
// =============================================================================

/// Failures while loading or validating `MachineConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// A configured product or coin failed domain validation.
    #[error("Invalid configuration entry: {0}")]
    Domain(#[from] CoreError),
}
