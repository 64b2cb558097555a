use super::{apply_conditional, scan_prefix, Table};
use crate::codec::{decode, encode};
use crate::error::KVStoreError;
use crate::ports::{BatchOperation, KeyValueStore, Precondition, ScanResult};
use fs2::FileExt;
use parking_lot::RwLock;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// File-backed key-value store for nodes without RocksDB.
///
/// The whole table is kept in memory and rewritten to disk on every batch
/// through a temp file and an atomic rename, so a crash leaves either the
/// previous or the new table on disk. An exclusive `fs2` lock on
/// `<path>.lock` keeps a second process from opening the same file.
pub struct FileBackedKVStore {
    data: RwLock<Table>,
    path: PathBuf,
    lock_wait: Duration,
    lock_file: File,
}

impl FileBackedKVStore {
    /// Open or create a store at `path`.
    pub fn open<P: AsRef<Path>>(path: P, lock_wait: Duration) -> Result<Self, KVStoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(KVStoreError::io)?;
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path.with_extension("lock"))
            .map_err(KVStoreError::io)?;
        lock_file.try_lock_exclusive().map_err(|_| KVStoreError::IOError {
            message: format!("store already in use ({})", path.display()),
        })?;

        let data = Self::load_from_file(&path)?;
        if data.is_empty() {
            info!(path = %path.display(), "Opened empty store");
        } else {
            info!(path = %path.display(), keys = data.len(), "Loaded store");
        }

        Ok(Self {
            data: RwLock::new(data),
            path,
            lock_wait,
            lock_file,
        })
    }

    /// Path of the data file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_from_file(path: &Path) -> Result<Table, KVStoreError> {
        match std::fs::read(path) {
            Ok(bytes) if bytes.is_empty() => Ok(Table::new()),
            Ok(bytes) => decode(&bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Table::new()),
            Err(e) => Err(KVStoreError::io(e)),
        }
    }

    fn save_to_file(&self, table: &Table) -> Result<(), KVStoreError> {
        let bytes = encode(table)?;

        let temp_path = self.path.with_extension("tmp");
        let mut file = File::create(&temp_path).map_err(KVStoreError::io)?;
        file.write_all(&bytes).map_err(KVStoreError::io)?;
        file.sync_all().map_err(KVStoreError::io)?;

        std::fs::rename(&temp_path, &self.path).map_err(KVStoreError::io)?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "Store flushed");
        Ok(())
    }

    fn timeout(&self) -> KVStoreError {
        KVStoreError::LockTimeout {
            waited_ms: self.lock_wait.as_millis() as u64,
        }
    }
}

impl KeyValueStore for FileBackedKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        let data = self
            .data
            .try_read_for(self.lock_wait)
            .ok_or_else(|| self.timeout())?;
        Ok(data.get(key).cloned())
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

        // Stage on a copy so a failed flush leaves memory and disk in agreement.
        let mut staged = data.clone();
        apply_conditional(&mut staged, &preconditions, operations)?;
        self.save_to_file(&staged)?;
        *data = staged;
        Ok(())
    }
}

impl Drop for FileBackedKVStore {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.lock_file);
    }
}
