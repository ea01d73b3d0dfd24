//! Error types for the relayer order book

use serde::Serialize;
use thiserror::Error;

/// Validation error codes exposed to API callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValidationErrorCode {
    RequiredField,
}

/// Reasons attached to a validation error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValidationErrorReason {
    UnfillableRequiresMakerAddress,
}

/// A single rejected input field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: String,
    pub code: ValidationErrorCode,
    pub reason: ValidationErrorReason,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {:?} ({:?})", self.field, self.code, self.reason)
    }
}

/// Relayer order book errors
#[derive(Error, Debug)]
pub enum RelayerError {
    #[error("Validation failed: {0}")]
    Validation(ValidationError),

    #[error("Stored record {hash} is missing required field `{field}`")]
    Decode { hash: String, field: &'static str },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Order watcher error: {0}")]
    Watcher(String),

    #[error("Pool registry error: {0}")]
    Registry(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl RelayerError {
    /// The error raised when `isUnfillable` is requested without a maker filter
    pub fn unfillable_requires_maker() -> Self {
        RelayerError::Validation(ValidationError {
            field: "maker".to_string(),
            code: ValidationErrorCode::RequiredField,
            reason: ValidationErrorReason::UnfillableRequiresMakerAddress,
        })
    }
}

impl From<serde_json::Error> for RelayerError {
    fn from(err: serde_json::Error) -> Self {
        RelayerError::Serialization(err.to_string())
    }
}

impl From<prometheus::Error> for RelayerError {
    fn from(err: prometheus::Error) -> Self {
        RelayerError::Config(format!("metrics registration failed: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, RelayerError>;
