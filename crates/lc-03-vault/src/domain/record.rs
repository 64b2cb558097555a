//! Vault state records.

use serde::{Deserialize, Serialize};
use shared_types::{Party, StateAndRef, StateData, StateRef, Timestamp, TransactionState};
use uuid::Uuid;

/// Contract type recorded for states first seen as already consumed.
pub const UNKNOWN_CONTRACT_TYPE: &str = "unknown";

/// Storage prefix of vault state records.
pub const STATE_PREFIX: &[u8] = b"v:st:";

/// Last published update sequence number.
pub const SEQUENCE_KEY: &[u8] = b"v:meta:seq";

/// Placeholder notary for retroactively recorded states.
pub fn unknown_notary() -> Party {
    Party::new("O=Unknown,L=Unknown,C=ZZ", [0; 32])
}

/// Record body for a state first seen being consumed.
pub fn unknown_state(notary: Option<Party>) -> TransactionState {
    TransactionState {
        data: StateData::new(UNKNOWN_CONTRACT_TYPE),
        notary: notary.unwrap_or_else(unknown_notary),
    }
}

pub fn state_key(state_ref: &StateRef) -> Vec<u8> {
    let mut key = STATE_PREFIX.to_vec();
    key.extend_from_slice(&state_ref.to_key_bytes());
    key
}

/// Consumption status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StateStatus {
    Unconsumed,
    Consumed,
}

/// Whether a state involves one of this node's keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relevancy {
    Relevant,
    NotRelevant,
}

/// One row of the vault.
///
/// `status` moves from `Unconsumed` to `Consumed` exactly once. A consumed
/// record never carries a lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultStateRecord {
    pub state_ref: StateRef,
    /// Contract state and the notary guarding it. States only ever seen
    /// being consumed carry an `unknown` contract type and the consuming
    /// transaction's notary, or [`unknown_notary`] when that is not known.
    pub state: TransactionState,
    pub status: StateStatus,
    pub recorded_time: Timestamp,
    pub consumed_time: Option<Timestamp>,
    pub lock_id: Option<Uuid>,
    pub lock_update_time: Option<Timestamp>,
    pub relevancy: Relevancy,
}

impl VaultStateRecord {
    /// A freshly produced, unlocked state.
    pub fn unconsumed(state: StateAndRef, relevancy: Relevancy, now: Timestamp) -> Self {
        Self {
            state_ref: state.state_ref,
            state: state.state,
            status: StateStatus::Unconsumed,
            recorded_time: now,
            consumed_time: None,
            lock_id: None,
            lock_update_time: None,
            relevancy,
        }
    }

    /// A state recorded directly as consumed.
    pub fn consumed(state: StateAndRef, relevancy: Relevancy, now: Timestamp) -> Self {
        let mut record = Self::unconsumed(state, relevancy, now);
        record.status = StateStatus::Consumed;
        record.consumed_time = Some(now);
        record
    }

    pub fn contract_state_type(&self) -> &str {
        &self.state.data.contract_state_type
    }

    pub fn notary(&self) -> &Party {
        &self.state.notary
    }

    pub fn is_unconsumed(&self) -> bool {
        self.status == StateStatus::Unconsumed
    }

    /// True if `lock_id` may take this state: unconsumed and either unlocked
    /// or already held by `lock_id`.
    pub fn is_lockable_by(&self, lock_id: &Uuid) -> bool {
        self.is_unconsumed() && self.lock_id.map_or(true, |held| held == *lock_id)
    }

    /// Moves to `Consumed`, clearing any lock.
    pub fn mark_consumed(&mut self, now: Timestamp) {
        self.status = StateStatus::Consumed;
        self.consumed_time = Some(now);
        if self.lock_id.take().is_some() {
            self.lock_update_time = Some(now);
        }
    }

    pub fn to_state_and_ref(&self) -> StateAndRef {
        StateAndRef {
            state: self.state.clone(),
            state_ref: self.state_ref,
        }
    }

    pub fn metadata(&self) -> StateMetadata {
        StateMetadata {
            state_ref: self.state_ref,
            contract_state_type: self.contract_state_type().to_string(),
            recorded_time: self.recorded_time,
            consumed_time: self.consumed_time,
            status: self.status,
            notary: self.state.notary.clone(),
            lock_id: self.lock_id,
            lock_update_time: self.lock_update_time,
            relevancy: self.relevancy,
        }
    }
}

/// A planned change to one row. `previous` is what the row held when it was
/// read; the write only applies if the row still holds exactly that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowWrite {
    pub previous: Option<VaultStateRecord>,
    pub next: VaultStateRecord,
}

/// Vault bookkeeping returned alongside query results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateMetadata {
    pub state_ref: StateRef,
    pub contract_state_type: String,
    pub recorded_time: Timestamp,
    pub consumed_time: Option<Timestamp>,
    pub status: StateStatus,
    pub notary: Party,
    pub lock_id: Option<Uuid>,
    pub lock_update_time: Option<Timestamp>,
    pub relevancy: Relevancy,
}
