//! Driving Ports (API - Inbound)

use crate::config::StatesToRecord;
use crate::domain::query::{Page, PageSpecification, QueryCriteria, Sort};
use crate::domain::{Observation, VaultStateRecord};
use crate::error::{SoftLockError, VaultQueryError, VaultResult};
use crate::feed::DataFeed;
use shared_types::{StateAndRef, StateRef, VaultUpdate, WireTransaction};
use uuid::Uuid;

/// Primary vault API.
///
/// Every write is one atomic store batch. All methods are safe to call
/// concurrently from any number of threads.
pub trait VaultApi: Send + Sync {
    /// Records one batch of consumed and produced states.
    ///
    /// Returns the published update, or `None` when the batch changed
    /// nothing visible (a replay, or only retroactive consumed records).
    fn observe(&self, observation: Observation) -> VaultResult<Option<VaultUpdate>>;

    /// Records transactions seen by this node as one observation.
    ///
    /// Produced states are kept according to `states_to_record`. Inputs are
    /// consumed when the vault knows them. Transactions that neither produce
    /// a kept state nor consume a known one are ignored.
    fn record_transactions(
        &self,
        states_to_record: StatesToRecord,
        transactions: &[WireTransaction],
    ) -> VaultResult<Option<VaultUpdate>>;

    fn query(
        &self,
        criteria: &QueryCriteria,
        paging: &PageSpecification,
        sort: &Sort,
    ) -> Result<Page, VaultQueryError>;

    /// A snapshot plus every later update touching the same contract types.
    fn track(
        &self,
        criteria: &QueryCriteria,
        paging: &PageSpecification,
        sort: &Sort,
    ) -> Result<DataFeed, VaultQueryError>;

    /// Stored record for one state.
    fn state_record(&self, state_ref: &StateRef) -> VaultResult<Option<VaultStateRecord>>;

    /// Locks every state in `state_refs` for `lock_id`, or none of them.
    fn reserve(&self, lock_id: Uuid, state_refs: &[StateRef]) -> Result<(), SoftLockError>;

    /// Releases `lock_id` from the given states, or from every state it
    /// holds when `state_refs` is `None`. Returns how many were released.
    fn release(&self, lock_id: Uuid, state_refs: Option<&[StateRef]>)
        -> Result<usize, SoftLockError>;

    /// Picks unconsumed relevant states matching `criteria`, in state ref
    /// order, until the sum of `quantity_field` reaches `amount`, and locks
    /// them. Returns nothing when the vault cannot cover `amount`, or when
    /// concurrent reservations keep taking the selected states.
    fn try_lock_fungible_states(
        &self,
        lock_id: Uuid,
        criteria: &QueryCriteria,
        quantity_field: &str,
        amount: i64,
    ) -> Result<Vec<StateAndRef>, SoftLockError>;

    /// States currently held by `lock_id`.
    fn locked_states(&self, lock_id: Uuid) -> Result<Vec<StateRef>, VaultQueryError>;
}
