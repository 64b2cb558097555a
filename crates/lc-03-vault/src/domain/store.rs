//! Observation planning.
//!
//! Turns a batch of consumed refs and produced states into row writes and
//! the update to publish. Replaying a batch plans no writes.

use crate::domain::record::{unknown_state, Relevancy, RowWrite, VaultStateRecord};
use shared_types::{Party, StateAndRef, StateRef, Timestamp, UpdateType};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// One batch of ledger changes seen by the vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub consumed: Vec<StateRef>,
    pub produced: Vec<StateAndRef>,
    /// Notary of the consuming transaction, used for states the vault has
    /// never seen produced.
    pub consuming_notary: Option<Party>,
    pub flow_id: Option<Uuid>,
    pub update_type: UpdateType,
}

impl Observation {
    pub fn new(consumed: Vec<StateRef>, produced: Vec<StateAndRef>) -> Self {
        Self {
            consumed,
            produced,
            consuming_notary: None,
            flow_id: None,
            update_type: UpdateType::General,
        }
    }

    pub fn with_consuming_notary(mut self, notary: Party) -> Self {
        self.consuming_notary = Some(notary);
        self
    }

    pub fn with_flow_id(mut self, flow_id: Uuid) -> Self {
        self.flow_id = Some(flow_id);
        self
    }

    pub fn with_update_type(mut self, update_type: UpdateType) -> Self {
        self.update_type = update_type;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.consumed.is_empty() && self.produced.is_empty()
    }

    /// Every ref the batch touches, without duplicates.
    pub fn refs(&self) -> Vec<StateRef> {
        let all: BTreeSet<StateRef> = self
            .consumed
            .iter()
            .copied()
            .chain(self.produced.iter().map(|s| s.state_ref))
            .collect();
        all.into_iter().collect()
    }
}

/// Writes and visible effects of one observation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservationPlan {
    pub writes: Vec<RowWrite>,
    /// Known unconsumed states that became consumed.
    pub consumed: Vec<StateAndRef>,
    /// New unconsumed states.
    pub produced: Vec<StateAndRef>,
}

impl ObservationPlan {
    pub fn is_noop(&self) -> bool {
        self.writes.is_empty()
    }

    /// Count of rows written in the `Consumed` state.
    pub fn consumed_rows(&self) -> usize {
        self.writes.len() - self.produced.len()
    }
}

/// Plans an observation against the rows currently stored for its refs.
///
/// * produced and new: inserted `Unconsumed`
/// * produced and consumed in the same batch: inserted `Consumed`
/// * consumed and stored `Unconsumed`: moved to `Consumed`, lock cleared
/// * consumed and unknown: inserted `Consumed` with an `unknown` type
/// * anything already in the target state: untouched
pub fn plan_observation<F>(
    observation: &Observation,
    existing: &BTreeMap<StateRef, VaultStateRecord>,
    relevancy: F,
    now: Timestamp,
) -> ObservationPlan
where
    F: Fn(&StateAndRef) -> Relevancy,
{
    let consumed: BTreeSet<StateRef> = observation.consumed.iter().copied().collect();
    let mut handled = BTreeSet::new();
    let mut plan = ObservationPlan::default();

    for state in &observation.produced {
        if existing.contains_key(&state.state_ref) || !handled.insert(state.state_ref) {
            continue;
        }
        if consumed.contains(&state.state_ref) {
            plan.writes.push(RowWrite {
                previous: None,
                next: VaultStateRecord::consumed(state.clone(), relevancy(state), now),
            });
        } else {
            plan.writes.push(RowWrite {
                previous: None,
                next: VaultStateRecord::unconsumed(state.clone(), relevancy(state), now),
            });
            plan.produced.push(state.clone());
        }
    }

    for state_ref in &observation.consumed {
        if !handled.insert(*state_ref) {
            continue;
        }
        match existing.get(state_ref) {
            Some(record) if record.is_unconsumed() => {
                let mut next = record.clone();
                next.mark_consumed(now);
                plan.consumed.push(record.to_state_and_ref());
                plan.writes.push(RowWrite {
                    previous: Some(record.clone()),
                    next,
                });
            }
            Some(_) => {}
            None => {
                let state = StateAndRef {
                    state: unknown_state(observation.consuming_notary.clone()),
                    state_ref: *state_ref,
                };
                plan.writes.push(RowWrite {
                    previous: None,
                    next: VaultStateRecord::consumed(state, Relevancy::NotRelevant, now),
                });
            }
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::{StateStatus, UNKNOWN_CONTRACT_TYPE};
    use shared_types::{StateData, TransactionState};

    fn state(tx: u8, index: u32) -> StateAndRef {
        StateAndRef {
            state: TransactionState {
                data: StateData::new("cash.CashState"),
                notary: Party::new("O=Notary,L=Zurich,C=CH", [1; 32]),
            },
            state_ref: StateRef::new([tx; 32], index),
        }
    }

    fn relevant(_: &StateAndRef) -> Relevancy {
        Relevancy::Relevant
    }

    fn apply(existing: &mut BTreeMap<StateRef, VaultStateRecord>, plan: &ObservationPlan) {
        for write in &plan.writes {
            existing.insert(write.next.state_ref, write.next.clone());
        }
    }

    #[test]
    fn test_produce_then_consume() {
        let mut rows = BTreeMap::new();
        let a = state(1, 0);

        let plan = plan_observation(&Observation::new(vec![], vec![a.clone()]), &rows, relevant, 10);
        assert_eq!(plan.produced, vec![a.clone()]);
        apply(&mut rows, &plan);

        let plan = plan_observation(&Observation::new(vec![a.state_ref], vec![]), &rows, relevant, 20);
        assert_eq!(plan.consumed, vec![a.clone()]);
        assert_eq!(plan.consumed_rows(), 1);
        apply(&mut rows, &plan);
        assert_eq!(rows[&a.state_ref].status, StateStatus::Consumed);
        assert_eq!(rows[&a.state_ref].consumed_time, Some(20));
    }

    #[test]
    fn test_replay_is_noop() {
        let mut rows = BTreeMap::new();
        let a = state(1, 0);
        let b = state(2, 0);
        let batch = Observation::new(vec![a.state_ref], vec![b.clone()]);

        let plan = plan_observation(&Observation::new(vec![], vec![a]), &rows, relevant, 1);
        apply(&mut rows, &plan);
        let plan = plan_observation(&batch, &rows, relevant, 2);
        apply(&mut rows, &plan);

        let replay = plan_observation(&batch, &rows, relevant, 3);
        assert!(replay.is_noop());
        assert!(replay.consumed.is_empty() && replay.produced.is_empty());
    }

    #[test]
    fn test_netted_and_unknown() {
        let rows = BTreeMap::new();
        let a = state(1, 0);
        let unknown = StateRef::new([9; 32], 4);
        let notary = Party::new("O=Notary,L=Zurich,C=CH", [1; 32]);

        let batch = Observation::new(vec![a.state_ref, unknown], vec![a.clone()])
            .with_consuming_notary(notary.clone());
        let plan = plan_observation(&batch, &rows, relevant, 5);

        assert_eq!(plan.writes.len(), 2);
        assert!(plan.produced.is_empty());
        assert!(plan.consumed.is_empty());
        assert!(plan
            .writes
            .iter()
            .all(|w| w.next.status == StateStatus::Consumed && w.previous.is_none()));

        let retro = plan
            .writes
            .iter()
            .find(|w| w.next.state_ref == unknown)
            .unwrap();
        assert_eq!(retro.next.contract_state_type(), UNKNOWN_CONTRACT_TYPE);
        assert_eq!(retro.next.notary(), &notary);
    }

    #[test]
    fn test_duplicates_within_batch() {
        let rows = BTreeMap::new();
        let a = state(1, 0);
        let plan = plan_observation(
            &Observation::new(vec![], vec![a.clone(), a.clone()]),
            &rows,
            relevant,
            1,
        );
        assert_eq!(plan.writes.len(), 1);
    }
}
