//! Transaction storage for dependency resolution.

use crate::ports::outbound::TransactionResolver;
use parking_lot::RwLock;
use shared_store::{decode, encode, BatchOperation, KVStoreError, KeyValueStore};
use shared_types::{short_hex, Hash, WireTransaction};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Key prefix for recorded transactions, followed by the 32-byte id.
pub const TRANSACTION_PREFIX: &[u8] = b"n:wt:";

fn transaction_key(tx_id: &Hash) -> Vec<u8> {
    let mut key = Vec::with_capacity(TRANSACTION_PREFIX.len() + tx_id.len());
    key.extend_from_slice(TRANSACTION_PREFIX);
    key.extend_from_slice(tx_id);
    key
}

/// Transactions known to the notary, keyed by id.
#[derive(Debug, Default)]
pub struct InMemoryTransactionStore {
    transactions: RwLock<HashMap<Hash, WireTransaction>>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a transaction. Re-adding the same id replaces it.
    pub fn add(&self, tx: WireTransaction) {
        self.transactions.write().insert(tx.id, tx);
    }

    pub fn len(&self) -> usize {
        self.transactions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.read().is_empty()
    }
}

impl TransactionResolver for InMemoryTransactionStore {
    fn resolve(&self, tx_id: &Hash) -> Result<Option<WireTransaction>, KVStoreError> {
        Ok(self.transactions.read().get(tx_id).cloned())
    }
}

/// Transactions recorded in the node's key-value store, so a validating
/// notary still resolves dependencies after a restart.
pub struct PersistentTransactionStore<S: KeyValueStore> {
    store: Arc<S>,
}

impl<S: KeyValueStore> PersistentTransactionStore<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Records a transaction. Re-adding the same id overwrites it with
    /// identical bytes.
    pub fn add(&self, tx: &WireTransaction) -> Result<(), KVStoreError> {
        self.store.atomic_batch_write(vec![BatchOperation::put(
            transaction_key(&tx.id),
            encode(tx)?,
        )])?;
        debug!(tx_id = %short_hex(&tx.id), "Transaction recorded");
        Ok(())
    }

    pub fn contains(&self, tx_id: &Hash) -> Result<bool, KVStoreError> {
        self.store.exists(&transaction_key(tx_id))
    }
}

impl<S: KeyValueStore> TransactionResolver for PersistentTransactionStore<S> {
    fn resolve(&self, tx_id: &Hash) -> Result<Option<WireTransaction>, KVStoreError> {
        self.store
            .get(&transaction_key(tx_id))?
            .map(|bytes| decode(&bytes))
            .transpose()
    }
}
