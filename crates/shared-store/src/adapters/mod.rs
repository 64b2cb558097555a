//! Storage Adapters
//!
//! Implementations of the `KeyValueStore` trait.

mod file;
mod memory;
#[cfg(feature = "rocksdb")]
mod rocks;

pub use file::FileBackedKVStore;
pub use memory::InMemoryKVStore;
#[cfg(feature = "rocksdb")]
pub use rocks::RocksDbStore;

use crate::error::KVStoreError;
use crate::ports::{BatchOperation, Precondition, ScanResult};
use std::collections::BTreeMap;

type Table = BTreeMap<Vec<u8>, Vec<u8>>;

/// Checks all preconditions, then applies all operations. Must be called with
/// the table's write lock held.
fn apply_conditional(
    table: &mut Table,
    preconditions: &[Precondition],
    operations: Vec<BatchOperation>,
) -> Result<(), KVStoreError> {
    if let Some(failed) = preconditions
        .iter()
        .find(|p| !p.holds(table.get(p.key()).map(Vec::as_slice)))
    {
        return Err(failed.failure());
    }
    apply_operations(table, operations);
    Ok(())
}

fn apply_operations(table: &mut Table, operations: Vec<BatchOperation>) {
    for op in operations {
        match op {
            BatchOperation::Put { key, value } => {
                table.insert(key, value);
            }
            BatchOperation::Delete { key } => {
                table.remove(&key);
            }
        }
    }
}

fn scan_prefix(table: &Table, prefix: &[u8]) -> ScanResult {
    table
        .range(prefix.to_vec()..)
        .take_while(|(k, _)| k.starts_with(prefix))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}
