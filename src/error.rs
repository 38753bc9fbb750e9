//! Custom error types for tally-core
//!
//! This module defines the error hierarchy for the engine using thiserror
//! for ergonomic error definitions.

use std::collections::TryReserveError;

use thiserror::Error;

/// The main error type for tally-core operations
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for data models
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Another live entity already owns the identifier
    #[error("{entity_type} already exists: {identifier}")]
    Conflict {
        entity_type: &'static str,
        identifier: String,
    },

    /// A currency has no samples to answer the request
    #[error("No rate data: {0}")]
    NoData(String),

    /// The external rate source could not be read or parsed
    #[error("Rate source error: {0}")]
    Source(String),

    /// One account failed to clone; the whole copy was discarded
    #[error("Failed to clone account at index {index}: {reason}")]
    PartialClone { index: usize, reason: String },

    /// A container could not grow
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    /// The currency registry is not initialized (or was torn down)
    #[error("Currency registry is not initialized")]
    RegistryClosed,
}

impl EngineError {
    /// Create a "not found" error for accounts
    pub fn account_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Account",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for transactions
    pub fn transaction_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Transaction",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for currencies
    pub fn currency_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Currency",
            identifier: identifier.into(),
        }
    }

    /// Create a naming conflict error for accounts
    pub fn name_conflict(name: impl Into<String>) -> Self {
        Self::Conflict {
            entity_type: "Account",
            identifier: name.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a naming conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<csv::Error> for EngineError {
    fn from(err: csv::Error) -> Self {
        Self::Source(err.to_string())
    }
}

impl From<TryReserveError> for EngineError {
    fn from(err: TryReserveError) -> Self {
        Self::ResourceExhausted(err.to_string())
    }
}

/// Result type alias for tally-core operations
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::Config("test error".into());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_not_found_error() {
        let err = EngineError::account_not_found("Checking");
        assert_eq!(err.to_string(), "Account not found: Checking");
        assert!(err.is_not_found());
        assert!(!err.is_conflict());
    }

    #[test]
    fn test_conflict_error() {
        let err = EngineError::name_conflict("Savings");
        assert_eq!(err.to_string(), "Account already exists: Savings");
        assert!(err.is_conflict());
    }

    #[test]
    fn test_partial_clone_error() {
        let err = EngineError::PartialClone {
            index: 3,
            reason: "out of memory".into(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to clone account at index 3: out of memory"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let engine_err: EngineError = io_err.into();
        assert!(matches!(engine_err, EngineError::Io(_)));
    }

    #[test]
    fn test_from_try_reserve_error() {
        let mut v: Vec<u64> = Vec::new();
        let err = v.try_reserve(usize::MAX).unwrap_err();
        let engine_err: EngineError = err.into();
        assert!(matches!(engine_err, EngineError::ResourceExhausted(_)));
    }
}
