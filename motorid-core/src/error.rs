//! Error types for MotorID storage and cache operations

use crate::PersonId;
use thiserror::Error;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Person not found: {id}")]
    NotFound { id: PersonId },

    #[error("Person not found for identity_no {identity_no}")]
    IdentityNotFound { identity_no: String },

    #[error("identity_no {identity_no} already exists")]
    Conflict { identity_no: String },

    #[error("Transaction failed: {reason}")]
    TransactionFailed { reason: String },

    #[error("Connection failed: {reason}")]
    ConnectionFailed { reason: String },
}

impl StorageError {
    /// True when the error is the store's uniqueness constraint firing,
    /// meaning another writer created the record first and a retry may
    /// observe it.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StorageError::Conflict { .. })
    }
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Snapshot cache errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Failed to open cache environment: {0}")]
    EnvOpen(String),

    #[error("Cache transaction error: {0}")]
    Transaction(String),

    #[error("Snapshot serialization error: {0}")]
    Serialization(String),

    #[error("Snapshot deserialization error: {0}")]
    Deserialization(String),
}
