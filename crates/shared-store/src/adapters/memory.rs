use super::{apply_conditional, scan_prefix, Table};
use crate::error::KVStoreError;
use crate::ports::{BatchOperation, KeyValueStore, Precondition, ScanResult};
use parking_lot::RwLock;
use std::time::Duration;

const DEFAULT_LOCK_WAIT: Duration = Duration::from_secs(5);

/// In-memory key-value store.
///
/// Backs the in-memory uniqueness provider and every unit test. Writers are
/// serialised by a `parking_lot` lock acquired with a bounded wait.
pub struct InMemoryKVStore {
    data: RwLock<Table>,
    lock_wait: Duration,
}

impl Default for InMemoryKVStore {
    fn default() -> Self {
        Self::with_lock_wait(DEFAULT_LOCK_WAIT)
    }
}

impl InMemoryKVStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lock_wait(lock_wait: Duration) -> Self {
        Self {
            data: RwLock::new(Table::new()),
            lock_wait,
        }
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn timeout(&self) -> KVStoreError {
        KVStoreError::LockTimeout {
            waited_ms: self.lock_wait.as_millis() as u64,
        }
    }
}

impl KeyValueStore for InMemoryKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        let data = self
            .data
            .try_read_for(self.lock_wait)
            .ok_or_else(|| self.timeout())?;
        Ok(data.get(key).cloned())
    }

    fn multi_get(&self, keys: &[Vec<u8>]) -> Result<Vec<Option<Vec<u8>>>, KVStoreError> {
        let data = self
            .data
            .try_read_for(self.lock_wait)
            .ok_or_else(|| self.timeout())?;
        Ok(keys.iter().map(|key| data.get(key).cloned()).collect())
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, KVStoreError> {
        let data = self
            .data
            .try_read_for(self.lock_wait)
            .ok_or_else(|| self.timeout())?;
        Ok(scan_prefix(&data, prefix))
    }

    fn conditional_batch_write(
        &self,
        preconditions: Vec<Precondition>,
        operations: Vec<BatchOperation>,
    ) -> Result<(), KVStoreError> {
        let mut data = self
            .data
            .try_write_for(self.lock_wait)
            .ok_or_else(|| self.timeout())?;
        apply_conditional(&mut data, &preconditions, operations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_in_memory_kv_batch_write() {
        let store = InMemoryKVStore::new();

        let ops = vec![
            BatchOperation::put(b"a".to_vec(), b"1".to_vec()),
            BatchOperation::put(b"b".to_vec(), b"2".to_vec()),
            BatchOperation::put(b"c".to_vec(), b"3".to_vec()),
        ];

        store.atomic_batch_write(ops).unwrap();

        assert_eq!(store.get(b"a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.get(b"b").unwrap(), Some(b"2".to_vec()));
        assert_eq!(store.get(b"c").unwrap(), Some(b"3".to_vec()));
        assert!(store.exists(b"a").unwrap());
        assert!(!store.exists(b"z").unwrap());

        store
            .atomic_batch_write(vec![BatchOperation::delete(b"b".to_vec())])
            .unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_prefix_scan_is_ordered() {
        let store = InMemoryKVStore::new();
        store
            .atomic_batch_write(vec![
                BatchOperation::put(b"v:st:2".to_vec(), b"two".to_vec()),
                BatchOperation::put(b"v:st:1".to_vec(), b"one".to_vec()),
                BatchOperation::put(b"n:cs:1".to_vec(), b"other".to_vec()),
            ])
            .unwrap();

        let rows = store.prefix_scan(b"v:st:").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].1, b"one".to_vec());
        assert_eq!(rows[1].1, b"two".to_vec());
    }

    #[test]
    fn test_failed_precondition_writes_nothing() {
        let store = InMemoryKVStore::new();
        store
            .atomic_batch_write(vec![BatchOperation::put(b"taken".to_vec(), b"x".to_vec())])
            .unwrap();

        let result = store.conditional_batch_write(
            vec![
                Precondition::absent(b"free".to_vec()),
                Precondition::absent(b"taken".to_vec()),
            ],
            vec![
                BatchOperation::put(b"free".to_vec(), b"y".to_vec()),
                BatchOperation::put(b"taken".to_vec(), b"y".to_vec()),
            ],
        );

        assert!(matches!(result, Err(KVStoreError::PreconditionFailed { .. })));
        assert_eq!(store.get(b"free").unwrap(), None);
        assert_eq!(store.get(b"taken").unwrap(), Some(b"x".to_vec()));
    }

    #[test]
    fn test_concurrent_absent_writes_have_one_winner() {
        let store = Arc::new(InMemoryKVStore::new());
        let handles: Vec<_> = (0..8u8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store
                        .conditional_batch_write(
                            vec![Precondition::absent(b"slot".to_vec())],
                            vec![BatchOperation::put(b"slot".to_vec(), vec![i])],
                        )
                        .is_ok()
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }

    #[test]
    fn test_lock_timeout() {
        let store = InMemoryKVStore::with_lock_wait(Duration::from_millis(10));
        let _guard = store.data.write();

        let result = store.conditional_batch_write(Vec::new(), Vec::new());
        assert_eq!(result, Err(KVStoreError::LockTimeout { waited_ms: 10 }));
    }
}
