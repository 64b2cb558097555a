//! Conflict records.

use serde::{Deserialize, Serialize};
use shared_types::{short_hex, Hash, Party, StateRef};
use std::collections::BTreeMap;
use std::fmt;

/// The transaction that consumed a state.
///
/// Written once, the first time the state is consumed, and never changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumingTx {
    /// Id of the consuming transaction.
    pub id: Hash,
    /// Position of the state among that transaction's inputs.
    pub input_index: u32,
    /// Party that requested notarisation.
    pub requesting_party: Party,
}

impl ConsumingTx {
    pub fn new(id: Hash, input_index: u32, requesting_party: Party) -> Self {
        Self {
            id,
            input_index,
            requesting_party,
        }
    }
}

/// Details of a rejected commit: for every offending state, the transaction
/// that already consumed it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniquenessConflict {
    pub state_history: BTreeMap<StateRef, ConsumingTx>,
}

impl UniquenessConflict {
    pub fn new(state_history: BTreeMap<StateRef, ConsumingTx>) -> Self {
        Self { state_history }
    }

    pub fn is_empty(&self) -> bool {
        self.state_history.is_empty()
    }

    pub fn len(&self) -> usize {
        self.state_history.len()
    }

    /// The consuming transaction recorded for `state_ref`.
    pub fn consumed_by(&self, state_ref: &StateRef) -> Option<&ConsumingTx> {
        self.state_history.get(state_ref)
    }
}

impl fmt::Display for UniquenessConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Input state(s) already consumed:")?;
        for (state_ref, consumer) in &self.state_history {
            write!(
                f,
                " {} by tx {} (input {}, requested by {});",
                state_ref,
                short_hex(&consumer.id),
                consumer.input_index,
                consumer.requesting_party
            )?;
        }
        Ok(())
    }
}
