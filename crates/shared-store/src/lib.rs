//! # Shared Store Crate
//!
//! The storage port every stateful subsystem writes through.
//!
//! ## Why a conditional batch
//!
//! The conflict table and the soft-lock columns are updated by many
//! concurrent requests. Instead of a service-level mutex each operation runs
//! optimistically:
//!
//! ```text
//! read rows ──→ decide ──→ conditional_batch_write(preconditions, writes)
//!     ↑                              │
//!     └──── PreconditionFailed ──────┘   (bounded retries)
//! ```
//!
//! The adapter checks every precondition and applies every write under one
//! write lock, so a batch is all-or-nothing and two batches whose
//! preconditions overlap can never both succeed.
//!
//! ## Adapters
//!
//! | Adapter | Durability | Use |
//! |---------|-----------|-----|
//! | [`InMemoryKVStore`] | none | tests, in-memory notary |
//! | [`FileBackedKVStore`] | temp file + rename per batch | development nodes |
//! | `RocksDbStore` (feature `rocksdb`) | WAL + WriteBatch | production |

pub mod adapters;
pub mod codec;
pub mod config;
pub mod error;
pub mod ports;

pub use adapters::{FileBackedKVStore, InMemoryKVStore};
#[cfg(feature = "rocksdb")]
pub use adapters::RocksDbStore;
pub use codec::{decode, encode};
pub use config::{StoreBackend, StoreConfig};
pub use error::KVStoreError;
pub use ports::{open_store, BatchOperation, KeyValueStore, Precondition, ScanResult};
