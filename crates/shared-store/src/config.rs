//! Store configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Which adapter backs the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Volatile, process-local.
    Memory,
    /// Single file rewritten atomically on every batch.
    File,
    /// RocksDB (requires the `rocksdb` feature).
    RocksDb,
}

impl StoreBackend {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "memory" | "mem" => Some(StoreBackend::Memory),
            "file" => Some(StoreBackend::File),
            "rocksdb" | "rocks" => Some(StoreBackend::RocksDb),
            _ => None,
        }
    }
}

/// Configuration for the key-value store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Adapter to open.
    pub backend: StoreBackend,

    /// File path (file backend) or directory (RocksDB backend).
    pub path: PathBuf,

    /// Maximum time a writer waits for the store's write lock.
    pub lock_wait_timeout: Duration,

    /// fsync every batch (RocksDB backend).
    pub sync_writes: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            path: PathBuf::from("./data/ledger.db"),
            lock_wait_timeout: Duration::from_millis(5_000),
            sync_writes: true,
        }
    }
}

impl StoreConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `LC_STORE_BACKEND`: `memory`, `file` or `rocksdb` (default: memory)
    /// - `LC_STORE_PATH`: data file or directory (default: ./data/ledger.db)
    /// - `LC_STORE_LOCK_WAIT_MS`: write-lock wait in ms (default: 5000)
    /// - `LC_STORE_SYNC_WRITES`: fsync every batch (default: true)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            backend: env::var("LC_STORE_BACKEND")
                .ok()
                .and_then(|v| StoreBackend::parse(&v))
                .unwrap_or(defaults.backend),

            path: env::var("LC_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.path),

            lock_wait_timeout: env::var("LC_STORE_LOCK_WAIT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.lock_wait_timeout),

            sync_writes: env::var("LC_STORE_SYNC_WRITES")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(defaults.sync_writes),
        }
    }

    /// In-memory store with the given lock wait, for tests.
    pub fn in_memory(lock_wait_timeout: Duration) -> Self {
        Self {
            lock_wait_timeout,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.backend, StoreBackend::Memory);
        assert_eq!(config.lock_wait_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!(StoreBackend::parse("FILE"), Some(StoreBackend::File));
        assert_eq!(StoreBackend::parse("rocks"), Some(StoreBackend::RocksDb));
        assert_eq!(StoreBackend::parse("postgres"), None);
    }
}
