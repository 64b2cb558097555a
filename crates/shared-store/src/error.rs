//! Storage error types.

use thiserror::Error;

/// Errors surfaced by a [`crate::KeyValueStore`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KVStoreError {
    /// I/O error during read/write.
    #[error("KV store I/O error: {message}")]
    IOError { message: String },

    /// The write lock could not be acquired within the configured wait.
    #[error("KV store lock not acquired within {waited_ms}ms")]
    LockTimeout { waited_ms: u64 },

    /// Optimistic retries were exhausted.
    #[error("KV store contention: gave up after {attempts} attempts")]
    Contention { attempts: u32 },

    /// A value could not be encoded or decoded.
    #[error("KV store serialization error: {message}")]
    Serialization { message: String },

    /// A conditional batch was rejected because a precondition did not hold.
    #[error("KV store precondition failed for key {key}")]
    PreconditionFailed { key: String },
}

impl KVStoreError {
    /// True for failures where retrying the same operation may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            KVStoreError::IOError { .. }
                | KVStoreError::LockTimeout { .. }
                | KVStoreError::Contention { .. }
                | KVStoreError::PreconditionFailed { .. }
        )
    }

    pub(crate) fn io(err: impl std::fmt::Display) -> Self {
        KVStoreError::IOError {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(KVStoreError::LockTimeout { waited_ms: 10 }.is_transient());
        assert!(KVStoreError::Contention { attempts: 3 }.is_transient());
        assert!(!KVStoreError::Serialization {
            message: "bad".into()
        }
        .is_transient());
    }

    #[test]
    fn test_display() {
        let err = KVStoreError::PreconditionFailed { key: "6e3a".into() };
        assert_eq!(err.to_string(), "KV store precondition failed for key 6e3a");
    }
}
