//! # RocksDB Storage Adapter
//!
//! Production implementation of the `KeyValueStore` trait.
//!
//! ## Features
//!
//! - Atomic batch writes (`WriteBatch`)
//! - Snappy compression
//! - Bloom filters for point lookups on state refs
//! - Write-ahead logging, optional fsync per batch
//!
//! RocksDB has no compare-and-set across keys, so conditional batches are
//! serialised by an in-process write lock: preconditions are read and the
//! batch is written while the lock is held.

use crate::config::StoreConfig;
use crate::error::KVStoreError;
use crate::ports::{BatchOperation, KeyValueStore, Precondition, ScanResult};
use parking_lot::Mutex;
use rocksdb::{IteratorMode, Options, WriteBatch, WriteOptions, DB};
use std::time::Duration;

/// Block cache size (64MB).
const BLOCK_CACHE_SIZE: usize = 64 * 1024 * 1024;

/// RocksDB-backed key-value store.
pub struct RocksDbStore {
    db: DB,
    write_lock: Mutex<()>,
    lock_wait: Duration,
    sync_writes: bool,
}

impl RocksDbStore {
    /// Open or create a RocksDB database at `config.path`.
    pub fn open(config: &StoreConfig) -> Result<Self, KVStoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_compression_type(rocksdb::DBCompressionType::Snappy);

        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        block_opts.set_block_cache(&rocksdb::Cache::new_lru_cache(BLOCK_CACHE_SIZE));
        opts.set_block_based_table_factory(&block_opts);

        let db = DB::open(&opts, &config.path).map_err(|e| KVStoreError::IOError {
            message: format!("Failed to open RocksDB: {}", e),
        })?;

        Ok(Self {
            db,
            write_lock: Mutex::new(()),
            lock_wait: config.lock_wait_timeout,
            sync_writes: config.sync_writes,
        })
    }
}

impl KeyValueStore for RocksDbStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        self.db.get(key).map_err(|e| KVStoreError::IOError {
            message: format!("RocksDB get failed: {}", e),
        })
    }

    fn multi_get(&self, keys: &[Vec<u8>]) -> Result<Vec<Option<Vec<u8>>>, KVStoreError> {
        self.db
            .multi_get(keys)
            .into_iter()
            .map(|r| {
                r.map_err(|e| KVStoreError::IOError {
                    message: format!("RocksDB multi_get failed: {}", e),
                })
            })
            .collect()
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, KVStoreError> {
        let mut results = Vec::new();
        let iter = self
            .db
            .iterator(IteratorMode::From(prefix, rocksdb::Direction::Forward));

        for item in iter {
            let (key, value) = item.map_err(|e| KVStoreError::IOError {
                message: format!("RocksDB scan failed: {}", e),
            })?;
            if !key.starts_with(prefix) {
                break;
            }
            results.push((key.to_vec(), value.to_vec()));
        }

        Ok(results)
    }

    fn conditional_batch_write(
        &self,
        preconditions: Vec<Precondition>,
        operations: Vec<BatchOperation>,
    ) -> Result<(), KVStoreError> {
        let _guard = self
            .write_lock
            .try_lock_for(self.lock_wait)
            .ok_or(KVStoreError::LockTimeout {
                waited_ms: self.lock_wait.as_millis() as u64,
            })?;

        for precondition in &preconditions {
            let current = self.get(precondition.key())?;
            if !precondition.holds(current.as_deref()) {
                return Err(precondition.failure());
            }
        }

        let mut batch = WriteBatch::default();
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => batch.put(&key, &value),
                BatchOperation::Delete { key } => batch.delete(&key),
            }
        }

        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(self.sync_writes);
        self.db
            .write_opt(batch, &write_opts)
            .map_err(|e| KVStoreError::IOError {
                message: format!("RocksDB batch write failed: {}", e),
            })
    }
}
