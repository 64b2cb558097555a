//! Uniqueness Provider Service
//!
//! Optimistic commit over an injected [`KeyValueStore`]:
//!
//! 1. read the stored rows for every input and reference
//! 2. decide (see [`crate::domain::decide`])
//! 3. write the decision as one conditional batch guarded by `Absent`
//!    preconditions
//! 4. on `PreconditionFailed` another request won a race; go back to 1
//!
//! Step 4 is bounded by [`UniquenessConfig::max_commit_retries`].

use crate::config::UniquenessConfig;
use crate::domain::keys::{
    committed_tx_key, conflict_key, request_log_key, CONFLICT_PREFIX, REQUEST_LOG_PREFIX,
};
use crate::domain::{
    decide, duplicate_inputs, CommitDecision, CommitOutcome, CommitRequest, ConsumingTx,
};
use crate::error::{UniquenessError, UniquenessResult};
use crate::ports::inbound::UniquenessProvider;
use ledger_telemetry::{
    time_histogram, UNIQUENESS_COMMIT_DURATION, UNIQUENESS_INPUT_STATES, UNIQUENESS_RETRIES,
};
use shared_store::{
    decode, encode, BatchOperation, InMemoryKVStore, KVStoreError, KeyValueStore, Precondition,
};
use shared_types::{short_hex, Hash, Party, StateRef};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Durable uniqueness provider.
///
/// Generic over the store so the same logic runs on the in-memory,
/// file-backed and RocksDB adapters. Holds no lock of its own.
pub struct PersistentUniquenessProvider<S: KeyValueStore> {
    store: Arc<S>,
    config: UniquenessConfig,
}

impl<S: KeyValueStore> PersistentUniquenessProvider<S> {
    pub fn new(store: Arc<S>, config: UniquenessConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &UniquenessConfig {
        &self.config
    }

    /// Every logged request, oldest first.
    pub fn request_log(&self) -> UniquenessResult<Vec<CommitRequest>> {
        self.store
            .prefix_scan(REQUEST_LOG_PREFIX)?
            .iter()
            .map(|(_, value)| decode(value).map_err(UniquenessError::from))
            .collect()
    }

    fn read_rows(&self, refs: &[StateRef]) -> UniquenessResult<BTreeMap<StateRef, ConsumingTx>> {
        let keys: Vec<Vec<u8>> = refs.iter().map(conflict_key).collect();
        let values = self.store.multi_get(&keys)?;

        let mut rows = BTreeMap::new();
        for (state_ref, value) in refs.iter().zip(values) {
            if let Some(bytes) = value {
                rows.insert(*state_ref, decode::<ConsumingTx>(&bytes)?);
            }
        }
        Ok(rows)
    }

    fn log_entry(&self, request: &CommitRequest) -> UniquenessResult<Option<BatchOperation>> {
        if !self.config.record_requests {
            return Ok(None);
        }
        Ok(Some(BatchOperation::put(
            request_log_key(request.request_time, &request.request_id),
            encode(request)?,
        )))
    }

    /// Logs a request that wrote nothing else. Failures are not surfaced:
    /// the outcome has already been decided.
    fn log_outcome(&self, tx_id: Hash, requestor: &Party, outcome: CommitOutcome) {
        let request = CommitRequest::new(tx_id, requestor.clone(), outcome);
        let result = self
            .log_entry(&request)
            .and_then(|op| match op {
                Some(op) => self.store.atomic_batch_write(vec![op]).map_err(Into::into),
                None => Ok(()),
            });
        if let Err(e) = result {
            warn!(tx_id = %short_hex(&tx_id), error = %e, "Failed to append request log entry");
        }
    }

    fn try_commit(
        &self,
        tx_id: Hash,
        requestor: &Party,
        new_entries: Vec<(StateRef, ConsumingTx)>,
        guarded_references: &[StateRef],
    ) -> UniquenessResult<Result<(), KVStoreError>> {
        let request = CommitRequest::new(tx_id, requestor.clone(), CommitOutcome::Committed);

        let mut preconditions = Vec::with_capacity(new_entries.len() + guarded_references.len());
        let mut operations = Vec::with_capacity(new_entries.len() + 2);

        for (state_ref, consumer) in &new_entries {
            let key = conflict_key(state_ref);
            preconditions.push(Precondition::absent(key.clone()));
            operations.push(BatchOperation::put(key, encode(consumer)?));
        }
        for state_ref in guarded_references {
            preconditions.push(Precondition::absent(conflict_key(state_ref)));
        }
        operations.push(BatchOperation::put(
            committed_tx_key(&tx_id),
            encode(&request)?,
        ));
        if let Some(op) = self.log_entry(&request)? {
            operations.push(op);
        }

        Ok(self.store.conditional_batch_write(preconditions, operations))
    }
}

impl<S: KeyValueStore> UniquenessProvider for PersistentUniquenessProvider<S> {
    fn commit_with_references(
        &self,
        inputs: &[StateRef],
        references: &[StateRef],
        tx_id: Hash,
        requestor: &Party,
    ) -> UniquenessResult<()> {
        if inputs.is_empty() && references.is_empty() {
            return Ok(());
        }

        let _timer = time_histogram!(UNIQUENESS_COMMIT_DURATION);
        UNIQUENESS_INPUT_STATES.inc_by(inputs.len() as f64);

        if let Some(conflict) = duplicate_inputs(inputs, tx_id, requestor) {
            warn!(
                tx_id = %short_hex(&tx_id),
                duplicates = conflict.len(),
                "Transaction lists the same input more than once"
            );
            self.log_outcome(tx_id, requestor, CommitOutcome::Conflict);
            return Err(UniquenessError::Conflict(conflict));
        }

        let all_refs: Vec<StateRef> = inputs.iter().chain(references.iter()).copied().collect();
        let attempts = self.config.attempts();

        for attempt in 1..=attempts {
            let existing = self.read_rows(&all_refs)?;
            let previously_notarised = inputs.is_empty() && self.is_previously_notarised(&tx_id)?;

            match decide(inputs, references, tx_id, requestor, &existing, previously_notarised) {
                CommitDecision::Conflict(conflict) => {
                    info!(
                        tx_id = %short_hex(&tx_id),
                        requestor = %requestor,
                        conflicts = conflict.len(),
                        "Commit rejected: inputs already consumed"
                    );
                    self.log_outcome(tx_id, requestor, CommitOutcome::Conflict);
                    return Err(UniquenessError::Conflict(conflict));
                }
                CommitDecision::AlreadyCommitted => {
                    debug!(tx_id = %short_hex(&tx_id), "Transaction already committed");
                    self.log_outcome(tx_id, requestor, CommitOutcome::AlreadyCommitted);
                    return Ok(());
                }
                CommitDecision::Commit {
                    new_entries,
                    guarded_references,
                } => {
                    let states = new_entries.len();
                    match self.try_commit(tx_id, requestor, new_entries, &guarded_references)? {
                        Ok(()) => {
                            debug!(
                                tx_id = %short_hex(&tx_id),
                                states,
                                attempt,
                                "Committed input states"
                            );
                            return Ok(());
                        }
                        Err(KVStoreError::PreconditionFailed { key }) => {
                            UNIQUENESS_RETRIES.inc();
                            debug!(
                                tx_id = %short_hex(&tx_id),
                                key = %key,
                                attempt,
                                "Concurrent commit touched the same states, retrying"
                            );
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
            }
        }

        warn!(tx_id = %short_hex(&tx_id), attempts, "Commit retries exhausted");
        Err(KVStoreError::Contention { attempts }.into())
    }

    fn is_previously_notarised(&self, tx_id: &Hash) -> UniquenessResult<bool> {
        Ok(self.store.exists(&committed_tx_key(tx_id))?)
    }

    fn consuming_tx(&self, state_ref: &StateRef) -> UniquenessResult<Option<ConsumingTx>> {
        self.store
            .get(&conflict_key(state_ref))?
            .map(|bytes| decode(&bytes))
            .transpose()
            .map_err(Into::into)
    }

    fn conflict_table_size(&self) -> UniquenessResult<usize> {
        Ok(self.store.prefix_scan(CONFLICT_PREFIX)?.len())
    }
}

/// Process-local uniqueness provider. State is lost when the process exits.
pub struct InMemoryUniquenessProvider {
    inner: PersistentUniquenessProvider<InMemoryKVStore>,
}

impl InMemoryUniquenessProvider {
    pub fn new() -> Self {
        Self::with_config(UniquenessConfig::default())
    }

    pub fn with_config(config: UniquenessConfig) -> Self {
        Self {
            inner: PersistentUniquenessProvider::new(Arc::new(InMemoryKVStore::new()), config),
        }
    }
}

impl Default for InMemoryUniquenessProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl UniquenessProvider for InMemoryUniquenessProvider {
    fn commit_with_references(
        &self,
        inputs: &[StateRef],
        references: &[StateRef],
        tx_id: Hash,
        requestor: &Party,
    ) -> UniquenessResult<()> {
        self.inner
            .commit_with_references(inputs, references, tx_id, requestor)
    }

    fn is_previously_notarised(&self, tx_id: &Hash) -> UniquenessResult<bool> {
        self.inner.is_previously_notarised(tx_id)
    }

    fn consuming_tx(&self, state_ref: &StateRef) -> UniquenessResult<Option<ConsumingTx>> {
        self.inner.consuming_tx(state_ref)
    }

    fn conflict_table_size(&self) -> UniquenessResult<usize> {
        self.inner.conflict_table_size()
    }
}
