//! # Storage Port
//!
//! Abstract interface for key-value database operations.
//!
//! Production: `RocksDbStore` (feature `rocksdb`)
//! Development: `FileBackedKVStore`
//! Testing: `InMemoryKVStore`

use crate::adapters::{FileBackedKVStore, InMemoryKVStore};
use crate::config::{StoreBackend, StoreConfig};
use crate::error::KVStoreError;
use std::sync::Arc;

/// Key-value pairs returned by a prefix scan, ordered by key.
pub type ScanResult = Vec<(Vec<u8>, Vec<u8>)>;

/// Batch operation for atomic writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOperation {
    /// Put a key-value pair.
    Put { key: Vec<u8>, value: Vec<u8> },
    /// Delete a key.
    Delete { key: Vec<u8> },
}

impl BatchOperation {
    /// Create a Put operation.
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create a Delete operation.
    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Delete { key: key.into() }
    }
}

/// A condition checked under the write lock before a conditional batch is
/// applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
    /// The key must not exist.
    Absent { key: Vec<u8> },
    /// The key must exist with exactly this value.
    Equals { key: Vec<u8>, value: Vec<u8> },
}

impl Precondition {
    pub fn absent(key: impl Into<Vec<u8>>) -> Self {
        Precondition::Absent { key: key.into() }
    }

    pub fn equals(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Precondition::Equals {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn key(&self) -> &[u8] {
        match self {
            Precondition::Absent { key } | Precondition::Equals { key, .. } => key,
        }
    }

    /// Evaluates the condition against the current value of the key.
    pub fn holds(&self, current: Option<&[u8]>) -> bool {
        match self {
            Precondition::Absent { .. } => current.is_none(),
            Precondition::Equals { value, .. } => current == Some(value.as_slice()),
        }
    }

    pub(crate) fn failure(&self) -> KVStoreError {
        KVStoreError::PreconditionFailed {
            key: hex::encode(self.key()),
        }
    }
}

/// Abstract interface for key-value database operations.
///
/// All methods take `&self`: adapters serialise writers internally so one
/// store can be shared through an `Arc` by every request handler.
pub trait KeyValueStore: Send + Sync {
    /// Get a value by key.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError>;

    /// Get several values. The result is positionally aligned with `keys`.
    fn multi_get(&self, keys: &[Vec<u8>]) -> Result<Vec<Option<Vec<u8>>>, KVStoreError> {
        keys.iter().map(|key| self.get(key)).collect()
    }

    /// Check if a key exists.
    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError> {
        Ok(self.get(key)?.is_some())
    }

    /// Iterate over keys with a prefix, in key order.
    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, KVStoreError>;

    /// Execute an atomic batch write.
    ///
    /// Either ALL operations in the batch succeed, or NONE are applied.
    fn atomic_batch_write(&self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        self.conditional_batch_write(Vec::new(), operations)
    }

    /// Check every precondition and apply every operation as one atomic step.
    ///
    /// Returns `PreconditionFailed` naming the first failing key when any
    /// condition does not hold; nothing is written in that case.
    fn conditional_batch_write(
        &self,
        preconditions: Vec<Precondition>,
        operations: Vec<BatchOperation>,
    ) -> Result<(), KVStoreError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        (**self).get(key)
    }

    fn multi_get(&self, keys: &[Vec<u8>]) -> Result<Vec<Option<Vec<u8>>>, KVStoreError> {
        (**self).multi_get(keys)
    }

    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError> {
        (**self).exists(key)
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, KVStoreError> {
        (**self).prefix_scan(prefix)
    }

    fn atomic_batch_write(&self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        (**self).atomic_batch_write(operations)
    }

    fn conditional_batch_write(
        &self,
        preconditions: Vec<Precondition>,
        operations: Vec<BatchOperation>,
    ) -> Result<(), KVStoreError> {
        (**self).conditional_batch_write(preconditions, operations)
    }
}

/// Opens the adapter selected by `config`.
pub fn open_store(config: &StoreConfig) -> Result<Arc<dyn KeyValueStore>, KVStoreError> {
    match config.backend {
        StoreBackend::Memory => Ok(Arc::new(InMemoryKVStore::with_lock_wait(
            config.lock_wait_timeout,
        ))),
        StoreBackend::File => Ok(Arc::new(FileBackedKVStore::open(
            &config.path,
            config.lock_wait_timeout,
        )?)),
        #[cfg(feature = "rocksdb")]
        StoreBackend::RocksDb => Ok(Arc::new(crate::adapters::RocksDbStore::open(config)?)),
        #[cfg(not(feature = "rocksdb"))]
        StoreBackend::RocksDb => Err(KVStoreError::IOError {
            message: "RocksDB backend requested but the `rocksdb` feature is disabled".into(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_holds() {
        assert!(Precondition::absent(b"k".to_vec()).holds(None));
        assert!(!Precondition::absent(b"k".to_vec()).holds(Some(b"v")));
        assert!(Precondition::equals(b"k".to_vec(), b"v".to_vec()).holds(Some(b"v")));
        assert!(!Precondition::equals(b"k".to_vec(), b"v".to_vec()).holds(Some(b"w")));
        assert!(!Precondition::equals(b"k".to_vec(), b"v".to_vec()).holds(None));
    }

    #[test]
    fn test_open_memory_store() {
        let store = open_store(&StoreConfig::default()).unwrap();
        store
            .atomic_batch_write(vec![BatchOperation::put(b"a".to_vec(), b"1".to_vec())])
            .unwrap();
        assert_eq!(store.get(b"a").unwrap(), Some(b"1".to_vec()));
    }

    #[cfg(not(feature = "rocksdb"))]
    #[test]
    fn test_open_rocksdb_without_feature_fails() {
        let config = StoreConfig {
            backend: StoreBackend::RocksDb,
            ..StoreConfig::default()
        };
        assert!(matches!(open_store(&config), Err(KVStoreError::IOError { .. })));
    }
}
