//! # Vault Updates
//!
//! The unit of change the vault publishes on its live feed. One observation
//! batch produces at most one update carrying the states it consumed and the
//! states it produced.
//!
//! ## Netting
//!
//! ```text
//! u1: consumed {A}    produced {B, C}
//! u2: consumed {B}    produced {D}
//! ─────────────────────────────────────
//! u1 + u2: consumed {A}  produced {C, D}
//! ```
//!
//! A state produced by the left update and consumed by the right one never
//! existed from the point of view of someone applying the merged update.

use crate::entities::StateRef;
use crate::transaction::StateAndRef;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;
use uuid::Uuid;

/// What caused an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpdateType {
    General,
    NotaryChange,
    ContractUpgrade,
}

/// Updates of different kinds cannot be netted into one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cannot merge a {left:?} update with a {right:?} update")]
pub struct UpdateMergeError {
    pub left: UpdateType,
    pub right: UpdateType,
}

/// A change to the vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultUpdate {
    /// Monotonic per vault. Subscribers use it to discard redelivered updates.
    pub sequence: u64,
    /// States that moved to CONSUMED.
    pub consumed: Vec<StateAndRef>,
    /// States that were recorded as UNCONSUMED.
    pub produced: Vec<StateAndRef>,
    /// Flow that caused the change, when known.
    pub flow_id: Option<Uuid>,
    pub update_type: UpdateType,
}

impl VaultUpdate {
    /// An update with no states.
    pub fn empty(sequence: u64) -> Self {
        Self {
            sequence,
            consumed: Vec::new(),
            produced: Vec::new(),
            flow_id: None,
            update_type: UpdateType::General,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.consumed.is_empty() && self.produced.is_empty()
    }

    /// Every contract state type touched by the update.
    pub fn contract_state_types(&self) -> BTreeSet<&str> {
        self.consumed
            .iter()
            .chain(self.produced.iter())
            .map(|s| s.state.data.contract_state_type.as_str())
            .collect()
    }

    /// Combines `self` followed by `next` into one update.
    ///
    /// The result takes the later sequence number and keeps the flow id of
    /// `self` when both are set.
    pub fn merge(&self, next: &VaultUpdate) -> Result<VaultUpdate, UpdateMergeError> {
        if self.update_type != next.update_type {
            return Err(UpdateMergeError {
                left: self.update_type,
                right: next.update_type,
            });
        }

        let produced_here: BTreeSet<StateRef> =
            self.produced.iter().map(|s| s.state_ref).collect();
        let consumed_next: BTreeSet<StateRef> =
            next.consumed.iter().map(|s| s.state_ref).collect();

        let mut seen = BTreeSet::new();
        let consumed = self
            .consumed
            .iter()
            .chain(
                next.consumed
                    .iter()
                    .filter(|s| !produced_here.contains(&s.state_ref)),
            )
            .filter(|s| seen.insert(s.state_ref))
            .cloned()
            .collect();

        let mut seen = BTreeSet::new();
        let produced = self
            .produced
            .iter()
            .filter(|s| !consumed_next.contains(&s.state_ref))
            .chain(next.produced.iter())
            .filter(|s| seen.insert(s.state_ref))
            .cloned()
            .collect();

        Ok(VaultUpdate {
            sequence: self.sequence.max(next.sequence),
            consumed,
            produced,
            flow_id: self.flow_id.or(next.flow_id),
            update_type: self.update_type,
        })
    }
}
