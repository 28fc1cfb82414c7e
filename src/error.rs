//! Error types returned synchronously by the store and by configuration loading.
//!
//! Per-line ingest failures are not errors in this sense: they are collected
//! as data in an [`IngestErrorReport`](crate::ingest::IngestErrorReport).

use thiserror::Error;

/// Failure of a single store operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("record {identifier} has no measurement labelled {label:?}")]
    LabelNotFound { identifier: String, label: String },

    #[error("record identifier must not be empty")]
    MissingIdentifier,

    #[error("identifier already in use: {0}")]
    IdentifierTaken(String),
}

impl StoreError {
    pub(crate) fn not_found(identifier: &str) -> Self {
        Self::NotFound(identifier.to_string())
    }
}

/// Rejected configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}
