//! Commit decision logic.
//!
//! Given the conflict-table rows currently stored for a request's inputs and
//! references, decide whether the request commits, was already committed, or
//! conflicts. The caller turns a `Commit` decision into a conditional batch.

use crate::domain::conflict::{ConsumingTx, UniquenessConflict};
use shared_types::{Hash, Party, StateRef};
use std::collections::{BTreeMap, BTreeSet};

/// Outcome of evaluating a request against the stored rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitDecision {
    /// Record `new_entries`. `guarded_references` must still be unconsumed
    /// when the batch is applied.
    Commit {
        new_entries: Vec<(StateRef, ConsumingTx)>,
        guarded_references: Vec<StateRef>,
    },
    /// Every input is already consumed by this transaction, or a
    /// reference-only transaction was notarised before.
    AlreadyCommitted,
    /// Rejected.
    Conflict(UniquenessConflict),
}

/// Detects inputs listed more than once.
///
/// A transaction that spends the same state twice conflicts with itself:
/// each duplicated ref is reported as consumed by `tx_id` at the position of
/// its first occurrence.
pub fn duplicate_inputs(
    inputs: &[StateRef],
    tx_id: Hash,
    requestor: &Party,
) -> Option<UniquenessConflict> {
    let mut first_seen: BTreeMap<StateRef, u32> = BTreeMap::new();
    let mut duplicated = BTreeSet::new();

    for (position, state_ref) in inputs.iter().enumerate() {
        if first_seen.contains_key(state_ref) {
            duplicated.insert(*state_ref);
        } else {
            first_seen.insert(*state_ref, position as u32);
        }
    }

    if duplicated.is_empty() {
        return None;
    }

    let history = duplicated
        .into_iter()
        .filter_map(|state_ref| {
            first_seen.get(&state_ref).map(|&position| {
                (
                    state_ref,
                    ConsumingTx::new(tx_id, position, requestor.clone()),
                )
            })
        })
        .collect();
    Some(UniquenessConflict::new(history))
}

/// Decides the fate of a request.
///
/// `existing` holds the stored row for every input and reference that has
/// one. `previously_notarised` is only consulted for transactions without
/// inputs.
pub fn decide(
    inputs: &[StateRef],
    references: &[StateRef],
    tx_id: Hash,
    requestor: &Party,
    existing: &BTreeMap<StateRef, ConsumingTx>,
    previously_notarised: bool,
) -> CommitDecision {
    let mut conflicts = BTreeMap::new();
    for state_ref in inputs.iter().chain(references.iter()) {
        if let Some(consumer) = existing.get(state_ref) {
            if consumer.id != tx_id {
                conflicts.insert(*state_ref, consumer.clone());
            }
        }
    }

    if inputs.is_empty() && previously_notarised {
        return CommitDecision::AlreadyCommitted;
    }

    if !conflicts.is_empty() {
        return CommitDecision::Conflict(UniquenessConflict::new(conflicts));
    }

    let new_entries: Vec<(StateRef, ConsumingTx)> = inputs
        .iter()
        .enumerate()
        .filter(|(_, state_ref)| !existing.contains_key(*state_ref))
        .map(|(position, state_ref)| {
            (
                *state_ref,
                ConsumingTx::new(tx_id, position as u32, requestor.clone()),
            )
        })
        .collect();

    if !inputs.is_empty() && new_entries.is_empty() {
        return CommitDecision::AlreadyCommitted;
    }

    let mut guarded_references: Vec<StateRef> = references
        .iter()
        .filter(|state_ref| !existing.contains_key(*state_ref))
        .copied()
        .collect();
    guarded_references.sort();
    guarded_references.dedup();

    CommitDecision::Commit {
        new_entries,
        guarded_references,
    }
}
