//! Vault domain: records, observation planning, soft locks and queries.
//!
//! Everything here is pure. The service reads rows, asks the domain what to
//! write, and applies the answer as one conditional batch.

pub mod query;
pub mod record;
pub mod soft_lock;
pub mod store;

pub use record::{
    state_key, unknown_notary, Relevancy, RowWrite, StateMetadata, StateStatus, VaultStateRecord,
    SEQUENCE_KEY, STATE_PREFIX, UNKNOWN_CONTRACT_TYPE,
};
pub use soft_lock::{plan_release, plan_reserve, ReservePlan};
pub use store::{plan_observation, Observation, ObservationPlan};
