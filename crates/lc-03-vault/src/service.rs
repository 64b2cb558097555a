//! Vault Service
//!
//! Every write follows the same optimistic loop:
//!
//! 1. read the rows the operation touches
//! 2. plan the writes (see [`crate::domain`])
//! 3. apply them as one conditional batch, each row guarded by the exact
//!    value it was planned from (or by its absence)
//! 4. on `PreconditionFailed` a concurrent writer got there first; go back
//!    to 1
//!
//! Observations are additionally serialised by the feed lock so update
//! sequence numbers are published in commit order.

use crate::config::{StatesToRecord, VaultConfig};
use crate::domain::query::{
    run_query, Page, PageSpecification, QueryCriteria, RelevancyFilter, SoftLockingCondition,
    Sort, StatusFilter, VaultQueryCriteria,
};
use crate::domain::{
    plan_observation, plan_release, plan_reserve, state_key, Observation, Relevancy,
    ReservePlan, RowWrite, VaultStateRecord, SEQUENCE_KEY, STATE_PREFIX,
};
use crate::error::{SoftLockError, VaultError, VaultQueryError, VaultResult};
use crate::feed::{DataFeed, VaultUpdateFeed};
use crate::ports::inbound::VaultApi;
use crate::ports::outbound::{Clock, KeyManagement};
use ledger_telemetry::{metric_inc, VAULT_SOFT_LOCK_RESERVATIONS, VAULT_STATES_RECORDED};
use parking_lot::{Mutex, MutexGuard};
use shared_bus::{EventFilter, EventPublisher, EventTopic, InMemoryEventBus, LedgerEvent};
use shared_store::{decode, encode, BatchOperation, KVStoreError, KeyValueStore, Precondition};
use shared_types::{StateAndRef, StateRef, VaultUpdate, WireTransaction};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Vault service.
pub struct VaultService<S, K, C>
where
    S: KeyValueStore,
    K: KeyManagement,
    C: Clock,
{
    store: Arc<S>,
    keys: Arc<K>,
    clock: Arc<C>,
    bus: Arc<InMemoryEventBus>,
    config: VaultConfig,
    /// Last published update sequence.
    feed: Mutex<u64>,
}

impl<S, K, C> VaultService<S, K, C>
where
    S: KeyValueStore,
    K: KeyManagement,
    C: Clock,
{
    /// Opens the vault, resuming the update sequence persisted in `store`.
    pub fn new(
        store: Arc<S>,
        keys: Arc<K>,
        clock: Arc<C>,
        bus: Arc<InMemoryEventBus>,
        config: VaultConfig,
    ) -> VaultResult<Self> {
        let sequence = store
            .get(SEQUENCE_KEY)?
            .map(|bytes| decode::<u64>(&bytes))
            .transpose()?
            .unwrap_or(0);
        info!(sequence, states_to_record = ?config.states_to_record, "Vault opened");
        Ok(Self {
            store,
            keys,
            clock,
            bus,
            config,
            feed: Mutex::new(sequence),
        })
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    pub fn bus(&self) -> &Arc<InMemoryEventBus> {
        &self.bus
    }

    /// Sequence number of the last published update.
    pub fn last_sequence(&self) -> Result<u64, KVStoreError> {
        Ok(*self.lock_feed()?)
    }

    fn lock_feed(&self) -> Result<MutexGuard<'_, u64>, KVStoreError> {
        let wait = self.config.lock_wait_timeout;
        self.feed.try_lock_for(wait).ok_or_else(|| {
            warn!(waited_ms = wait.as_millis() as u64, "Timed out waiting for the vault feed lock");
            KVStoreError::LockTimeout {
                waited_ms: wait.as_millis() as u64,
            }
        })
    }

    /// Records transactions with the configured [`StatesToRecord`] policy.
    pub fn notify_all(&self, transactions: &[WireTransaction]) -> VaultResult<Option<VaultUpdate>> {
        self.record_transactions(self.config.states_to_record, transactions)
    }

    fn relevancy(&self, state: &StateAndRef) -> Relevancy {
        let mine = state
            .state
            .data
            .participants
            .iter()
            .any(|p| self.keys.is_mine(&p.owning_key));
        if mine {
            Relevancy::Relevant
        } else {
            Relevancy::NotRelevant
        }
    }

    fn read_rows(
        &self,
        refs: &[StateRef],
    ) -> Result<BTreeMap<StateRef, VaultStateRecord>, KVStoreError> {
        let keys: Vec<Vec<u8>> = refs.iter().map(state_key).collect();
        let values = self.store.multi_get(&keys)?;

        let mut rows = BTreeMap::new();
        for (state_ref, value) in refs.iter().zip(values) {
            if let Some(bytes) = value {
                rows.insert(*state_ref, decode::<VaultStateRecord>(&bytes)?);
            }
        }
        Ok(rows)
    }

    fn all_rows(&self) -> Result<Vec<VaultStateRecord>, KVStoreError> {
        self.store
            .prefix_scan(STATE_PREFIX)?
            .iter()
            .map(|(_, value)| decode(value))
            .collect()
    }

    /// Applies planned row writes. The outer result carries encoding
    /// failures, the inner one the outcome of the conditional write.
    fn apply(
        &self,
        writes: &[RowWrite],
        mut operations: Vec<BatchOperation>,
    ) -> Result<Result<(), KVStoreError>, KVStoreError> {
        let mut preconditions = Vec::with_capacity(writes.len());
        for write in writes {
            let key = state_key(&write.next.state_ref);
            preconditions.push(match &write.previous {
                Some(previous) => Precondition::equals(key.clone(), encode(previous)?),
                None => Precondition::absent(key.clone()),
            });
            operations.push(BatchOperation::put(key, encode(&write.next)?));
        }
        Ok(self.store.conditional_batch_write(preconditions, operations))
    }

    fn try_reserve(&self, lock_id: Uuid, requested: &[StateRef]) -> Result<(), SoftLockError> {
        let attempts = self.config.attempts();
        for attempt in 1..=attempts {
            let rows = self.read_rows(requested)?;
            let writes = match plan_reserve(lock_id, requested, &rows, self.clock.now_millis()) {
                ReservePlan::Unavailable { available } => {
                    return Err(SoftLockError::StatesNotAvailable {
                        lock_id,
                        requested: requested.len(),
                        available,
                    })
                }
                ReservePlan::Reserve(writes) if writes.is_empty() => return Ok(()),
                ReservePlan::Reserve(writes) => writes,
            };

            match self.apply(&writes, Vec::new())? {
                Ok(()) => {
                    debug!(%lock_id, states = writes.len(), attempt, "Reserved states");
                    return Ok(());
                }
                Err(KVStoreError::PreconditionFailed { key }) => {
                    debug!(%lock_id, key = %key, attempt, "Concurrent write to reserved states, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
        warn!(%lock_id, attempts, "Reservation retries exhausted");
        Err(KVStoreError::Contention { attempts }.into())
    }

    /// Eligible states in state-ref order until their quantities reach
    /// `amount`, or `None` if they never do.
    fn select_fungible(
        &self,
        eligible: &QueryCriteria,
        quantity_field: &str,
        amount: i64,
    ) -> Result<Option<Vec<StateAndRef>>, KVStoreError> {
        let mut candidates: Vec<VaultStateRecord> = self
            .all_rows()?
            .into_iter()
            .filter(|r| eligible.matches(r))
            .collect();
        candidates.sort_by(|a, b| a.state_ref.cmp(&b.state_ref));

        let mut claimed = Vec::new();
        let mut total: i64 = 0;
        for record in candidates {
            if total >= amount {
                break;
            }
            let Some(quantity) = record.state.data.field(quantity_field).and_then(|v| v.as_i64())
            else {
                continue;
            };
            total = total.saturating_add(quantity);
            claimed.push(record.to_state_and_ref());
        }
        Ok((total >= amount).then_some(claimed))
    }
}

impl<S, K, C> VaultApi for VaultService<S, K, C>
where
    S: KeyValueStore,
    K: KeyManagement,
    C: Clock,
{
    fn observe(&self, observation: Observation) -> VaultResult<Option<VaultUpdate>> {
        if observation.is_empty() {
            return Ok(None);
        }

        let mut sequence = self.lock_feed()?;
        let refs = observation.refs();
        let attempts = self.config.attempts();

        for attempt in 1..=attempts {
            let existing = self.read_rows(&refs)?;
            let now = self.clock.now_millis();
            let plan = plan_observation(&observation, &existing, |s| self.relevancy(s), now);
            if plan.is_noop() {
                debug!(refs = refs.len(), "Observation already recorded");
                return Ok(None);
            }

            let visible = !(plan.consumed.is_empty() && plan.produced.is_empty());
            let next = *sequence + 1;
            let mut operations = Vec::new();
            if visible {
                operations.push(BatchOperation::put(SEQUENCE_KEY.to_vec(), encode(&next)?));
            }

            match self.apply(&plan.writes, operations)? {
                Ok(()) => {
                    VAULT_STATES_RECORDED
                        .with_label_values(&["unconsumed"])
                        .inc_by(plan.produced.len() as f64);
                    VAULT_STATES_RECORDED
                        .with_label_values(&["consumed"])
                        .inc_by(plan.consumed_rows() as f64);

                    if !visible {
                        debug!(rows = plan.writes.len(), "Recorded states not previously known");
                        return Ok(None);
                    }

                    *sequence = next;
                    let update = VaultUpdate {
                        sequence: next,
                        consumed: plan.consumed,
                        produced: plan.produced,
                        flow_id: observation.flow_id,
                        update_type: observation.update_type,
                    };
                    debug!(
                        sequence = next,
                        consumed = update.consumed.len(),
                        produced = update.produced.len(),
                        attempt,
                        "Vault updated"
                    );
                    self.bus.publish(LedgerEvent::VaultUpdated(update.clone()));
                    return Ok(Some(update));
                }
                Err(KVStoreError::PreconditionFailed { key }) => {
                    debug!(key = %key, attempt, "Concurrent write to observed states, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        warn!(attempts, "Observation retries exhausted");
        Err(VaultError::Storage(KVStoreError::Contention { attempts }))
    }

    fn record_transactions(
        &self,
        states_to_record: StatesToRecord,
        transactions: &[WireTransaction],
    ) -> VaultResult<Option<VaultUpdate>> {
        if states_to_record == StatesToRecord::None || transactions.is_empty() {
            return Ok(None);
        }

        let mut consumed = Vec::new();
        let mut produced = Vec::new();
        let mut produced_here = BTreeSet::new();
        let mut consuming_notary = None;

        for tx in transactions {
            let outputs: Vec<StateAndRef> = tx
                .out_refs()
                .into_iter()
                .filter(|s| {
                    states_to_record == StatesToRecord::AllVisible
                        || self.relevancy(s) == Relevancy::Relevant
                })
                .collect();

            let stored = self.read_rows(&tx.inputs)?;
            let known: Vec<StateRef> = tx
                .inputs
                .iter()
                .filter(|r| stored.contains_key(r) || produced_here.contains(*r))
                .copied()
                .collect();

            if outputs.is_empty() && known.is_empty() {
                debug!(tx_inputs = tx.inputs.len(), "Skipping transaction irrelevant to this vault");
                continue;
            }

            if consuming_notary.is_none() && !known.is_empty() {
                consuming_notary = tx.notary.clone();
            }
            produced_here.extend(outputs.iter().map(|s| s.state_ref));
            consumed.extend(known);
            produced.extend(outputs);
        }

        let mut observation = Observation::new(consumed, produced);
        observation.consuming_notary = consuming_notary;
        self.observe(observation)
    }

    fn query(
        &self,
        criteria: &QueryCriteria,
        paging: &PageSpecification,
        sort: &Sort,
    ) -> Result<Page, VaultQueryError> {
        run_query(self.all_rows()?, criteria, paging, sort)
    }

    fn track(
        &self,
        criteria: &QueryCriteria,
        paging: &PageSpecification,
        sort: &Sort,
    ) -> Result<DataFeed, VaultQueryError> {
        let types = criteria.contract_state_types();
        let filter = match &types {
            Some(types) => EventFilter::vault_types(types.iter().cloned()),
            None => EventFilter::topics(vec![EventTopic::Vault]),
        };

        let sequence = self.lock_feed()?;
        let subscription = self.bus.subscribe_after(filter, *sequence);
        let snapshot = self.query(criteria, paging, sort)?;
        drop(sequence);

        Ok(DataFeed {
            snapshot,
            updates: VaultUpdateFeed::new(subscription, criteria.status_filter(), types),
        })
    }

    fn state_record(&self, state_ref: &StateRef) -> VaultResult<Option<VaultStateRecord>> {
        Ok(self.read_rows(std::slice::from_ref(state_ref))?.remove(state_ref))
    }

    fn reserve(&self, lock_id: Uuid, state_refs: &[StateRef]) -> Result<(), SoftLockError> {
        if state_refs.is_empty() {
            return Ok(());
        }
        let requested: Vec<StateRef> = state_refs
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let result = self.try_reserve(lock_id, &requested);
        match &result {
            Ok(()) => metric_inc!(VAULT_SOFT_LOCK_RESERVATIONS, &["reserved"]),
            Err(SoftLockError::StatesNotAvailable { available, .. }) => {
                metric_inc!(VAULT_SOFT_LOCK_RESERVATIONS, &["unavailable"]);
                info!(
                    %lock_id,
                    requested = requested.len(),
                    available,
                    "Soft lock reservation refused"
                );
            }
            Err(e) => {
                metric_inc!(VAULT_SOFT_LOCK_RESERVATIONS, &["error"]);
                warn!(%lock_id, error = %e, "Soft lock reservation failed");
            }
        }
        result
    }

    fn release(
        &self,
        lock_id: Uuid,
        state_refs: Option<&[StateRef]>,
    ) -> Result<usize, SoftLockError> {
        let requested: Option<Vec<StateRef>> = match state_refs {
            Some([]) => return Ok(0),
            Some(refs) => Some(refs.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()),
            None => None,
        };

        let attempts = self.config.attempts();
        for attempt in 1..=attempts {
            let rows: Vec<VaultStateRecord> = match &requested {
                Some(refs) => self.read_rows(refs)?.into_values().collect(),
                None => self.all_rows()?,
            };
            let writes = plan_release(lock_id, &rows, self.clock.now_millis());
            if writes.is_empty() {
                return Ok(0);
            }

            match self.apply(&writes, Vec::new())? {
                Ok(()) => {
                    debug!(%lock_id, states = writes.len(), attempt, "Released soft locks");
                    return Ok(writes.len());
                }
                Err(KVStoreError::PreconditionFailed { key }) => {
                    debug!(%lock_id, key = %key, attempt, "Concurrent write to released states, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
        warn!(%lock_id, attempts, "Release retries exhausted");
        Err(KVStoreError::Contention { attempts }.into())
    }

    fn try_lock_fungible_states(
        &self,
        lock_id: Uuid,
        criteria: &QueryCriteria,
        quantity_field: &str,
        amount: i64,
    ) -> Result<Vec<StateAndRef>, SoftLockError> {
        if amount <= 0 {
            return Ok(Vec::new());
        }

        let eligible = QueryCriteria::from(
            VaultQueryCriteria::new()
                .with_status(StatusFilter::Unconsumed)
                .with_relevancy(RelevancyFilter::Relevant)
                .with_soft_locking(SoftLockingCondition::unlocked_and_specified(vec![lock_id])),
        )
        .and(criteria.clone());
        eligible.validate()?;

        let attempts = self.config.attempts();
        for attempt in 1..=attempts {
            let Some(claimed) = self.select_fungible(&eligible, quantity_field, amount)? else {
                debug!(%lock_id, amount, "Insufficient fungible states");
                return Ok(Vec::new());
            };

            let refs: Vec<StateRef> = claimed.iter().map(|s| s.state_ref).collect();
            match self.reserve(lock_id, &refs) {
                Ok(()) => return Ok(claimed),
                Err(SoftLockError::StatesNotAvailable { available, .. }) => {
                    debug!(%lock_id, attempt, available, "Selected states taken concurrently, reselecting");
                }
                Err(e) => return Err(e),
            }
        }
        warn!(%lock_id, attempts, "Fungible selection kept losing to concurrent reservations");
        Ok(Vec::new())
    }

    fn locked_states(&self, lock_id: Uuid) -> Result<Vec<StateRef>, VaultQueryError> {
        Ok(self
            .all_rows()?
            .into_iter()
            .filter(|r| r.is_unconsumed() && r.lock_id == Some(lock_id))
            .map(|r| r.state_ref)
            .collect())
    }
}
