//! Error types for the uniqueness provider.

use crate::domain::UniquenessConflict;
use shared_store::KVStoreError;
use thiserror::Error;

/// Uniqueness provider errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UniquenessError {
    /// At least one input (or reference) was already consumed by another
    /// transaction. Definitive: retrying cannot succeed.
    #[error("{0}")]
    Conflict(UniquenessConflict),

    /// The conflict table could not be read or written.
    #[error("Uniqueness storage failure: {0}")]
    Storage(#[from] KVStoreError),
}

impl UniquenessError {
    /// True when the same request may succeed if retried.
    pub fn is_transient(&self) -> bool {
        match self {
            UniquenessError::Conflict(_) => false,
            UniquenessError::Storage(e) => e.is_transient(),
        }
    }

    /// The conflict, if this is one.
    pub fn conflict(&self) -> Option<&UniquenessConflict> {
        match self {
            UniquenessError::Conflict(c) => Some(c),
            UniquenessError::Storage(_) => None,
        }
    }
}

/// Result type for uniqueness operations.
pub type UniquenessResult<T> = Result<T, UniquenessError>;
