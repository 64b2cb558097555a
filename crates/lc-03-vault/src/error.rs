//! Error types for the vault.

use shared_store::KVStoreError;
use thiserror::Error;
use uuid::Uuid;

/// Failures recording observations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    #[error("Vault storage failure: {0}")]
    Storage(#[from] KVStoreError),
}

impl VaultError {
    pub fn is_transient(&self) -> bool {
        match self {
            VaultError::Storage(e) => e.is_transient(),
        }
    }
}

/// Query failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultQueryError {
    /// Page number below 1 or page size outside `1..=MAX_PAGE_SIZE`.
    #[error("Page specification: {reason}")]
    InvalidPaging { reason: String },

    /// More results than an unpaged query may return.
    #[error(
        "There are {count} results, which exceeds the limit of {limit} for queries that do not \
         specify paging. Provide a PageSpecification to retrieve them"
    )]
    TooManyResults { count: usize, limit: usize },

    #[error("Invalid query criteria: {reason}")]
    InvalidCriteria { reason: String },

    #[error("Vault storage failure: {0}")]
    Storage(#[from] KVStoreError),
}

/// Soft-lock failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SoftLockError {
    /// Fewer states could be locked than were requested. Nothing was locked.
    #[error(
        "Attempted to reserve {requested} states for {lock_id} but only {available} of \
         {requested} available"
    )]
    StatesNotAvailable {
        lock_id: Uuid,
        requested: usize,
        available: usize,
    },

    /// Eligible-state selection failed.
    #[error(transparent)]
    Query(#[from] VaultQueryError),

    #[error("Vault storage failure: {0}")]
    Storage(#[from] KVStoreError),
}

impl SoftLockError {
    pub fn is_transient(&self) -> bool {
        match self {
            SoftLockError::StatesNotAvailable { .. } => false,
            SoftLockError::Query(VaultQueryError::Storage(e)) | SoftLockError::Storage(e) => {
                e.is_transient()
            }
            SoftLockError::Query(_) => false,
        }
    }
}

/// Result type for observation operations.
pub type VaultResult<T> = Result<T, VaultError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_available_message() {
        let err = SoftLockError::StatesNotAvailable {
            lock_id: Uuid::nil(),
            requested: 3,
            available: 2,
        };
        assert!(err.to_string().ends_with("only 2 of 3 available"));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_transient_storage() {
        let err = SoftLockError::from(KVStoreError::Contention { attempts: 4 });
        assert!(err.is_transient());
        assert!(VaultError::from(KVStoreError::LockTimeout { waited_ms: 1 }).is_transient());
    }
}
