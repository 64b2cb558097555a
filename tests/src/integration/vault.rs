//! Vault observation, query, live feed and soft-lock flows.

#[cfg(test)]
mod tests {
    use crate::fixtures::{cash, notary_party, vault, vault_on, CASH};
    use lc_03_vault::{
        AggregateFunction, AggregateValue, ColumnPredicate, Observation, PageSpecification,
        QueryCriteria, SoftLockError, SoftLockingCondition, Sort, SortAttribute, SortDirection,
        StateStatus, StatusFilter, VaultApi, VaultQueryCriteria, VaultQueryError,
    };
    use shared_bus::{EventFilter, EventPublisher, InMemoryEventBus, LedgerEvent};
    use shared_types::{ColumnValue, StateAndRef, StateRef};
    use std::sync::Arc;
    use std::time::Duration;
    use uuid::Uuid;

    fn produce(vault: &crate::fixtures::TestVault, states: Vec<StateAndRef>) -> Vec<StateRef> {
        let refs = states.iter().map(|s| s.state_ref).collect();
        vault.observe(Observation::new(vec![], states)).unwrap();
        refs
    }

    #[test]
    fn test_soft_lock_scenario() {
        let vault = vault();
        let refs = produce(&vault, (0..5).map(|i| cash(1, i, 10)).collect());
        let (l1, l2) = (Uuid::new_v4(), Uuid::new_v4());

        vault.reserve(l1, &refs[..3]).unwrap();
        let err = vault.reserve(l2, &refs[2..]).unwrap_err();
        assert_eq!(
            err,
            SoftLockError::StatesNotAvailable {
                lock_id: l2,
                requested: 3,
                available: 2,
            }
        );
        assert!(err.to_string().contains("2 of 3 available"));
        assert!(vault.locked_states(l2).unwrap().is_empty());
        assert_eq!(vault.state_record(&refs[3]).unwrap().unwrap().lock_id, None);
    }

    #[test]
    fn test_observe_replay_is_harmless() {
        let vault = vault();
        let refs = produce(&vault, vec![cash(1, 0, 10)]);
        let spend = Observation::new(refs.clone(), vec![]).with_consuming_notary(notary_party());

        let first = vault.observe(spend.clone()).unwrap().unwrap();
        let before = vault.state_record(&refs[0]).unwrap().unwrap();
        assert_eq!(first.consumed.len(), 1);

        assert_eq!(vault.observe(spend).unwrap(), None);
        let after = vault.state_record(&refs[0]).unwrap().unwrap();
        assert_eq!(after.status, StateStatus::Consumed);
        assert_eq!(after.consumed_time, before.consumed_time);
        assert_eq!(vault.last_sequence().unwrap(), 2);
    }

    #[test]
    fn test_unpaged_query_fails_fast() {
        let vault = vault();
        produce(&vault, (0..201).map(|i| cash(1, i, 1)).collect());

        let err = vault
            .query(&QueryCriteria::default(), &PageSpecification::default(), &Sort::default())
            .unwrap_err();
        assert!(matches!(err, VaultQueryError::TooManyResults { count: 201, limit: 200 }));

        let sort = Sort::by(SortAttribute::Index, SortDirection::Desc);
        let last = vault
            .query(&QueryCriteria::default(), &PageSpecification::new(3, 100), &sort)
            .unwrap();
        assert_eq!(last.total_states_available, 201);
        assert_eq!(last.len(), 1);
        assert_eq!(last.states[0].state_ref, StateRef::new([1; 32], 0));
    }

    #[test]
    fn test_aggregate_over_custom_predicate() {
        let vault = vault();
        produce(
            &vault,
            vec![cash(1, 0, 10), cash(1, 1, 25), cash(1, 2, 100)],
        );

        let criteria = QueryCriteria::from(
            VaultQueryCriteria::new().with_contract_state_types([CASH]),
        )
        .and(QueryCriteria::custom(
            "quantity",
            ColumnPredicate::LessThan(ColumnValue::Int(100)),
        ))
        .and(QueryCriteria::aggregate(AggregateFunction::Sum, "quantity"));

        let page = vault
            .query(&criteria, &PageSpecification::default(), &Sort::default())
            .unwrap();
        assert!(page.states.is_empty());
        assert_eq!(page.other_results.len(), 1);
        assert_eq!(page.other_results[0].value, AggregateValue::Value(ColumnValue::Int(35)));
    }

    #[tokio::test]
    async fn test_feed_orders_consumed_before_produced() {
        let vault = vault();
        let issued = produce(&vault, vec![cash(1, 0, 10)]);

        let all: QueryCriteria = VaultQueryCriteria::new()
            .with_status(StatusFilter::All)
            .into();
        let mut feed = vault
            .track(&all, &PageSpecification::default(), &Sort::default())
            .unwrap();
        assert_eq!(feed.snapshot.len(), 1);

        vault
            .observe(Observation::new(issued.clone(), vec![cash(2, 0, 10)]))
            .unwrap();
        let update = tokio::time::timeout(Duration::from_millis(200), feed.updates.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(update.sequence, 2);
        assert_eq!(update.consumed[0].state_ref, issued[0]);
        assert_eq!(update.produced[0].state_ref, StateRef::new([2; 32], 0));
        assert_eq!(feed.updates.last_sequence(), Some(2));
    }

    #[test]
    fn test_late_subscriber_resumes_after_sequence() {
        let bus = Arc::new(InMemoryEventBus::new());
        let vault = vault_on(Arc::clone(&bus));
        let mut early = bus.subscribe(EventFilter::all());

        produce(&vault, vec![cash(1, 0, 10)]);
        produce(&vault, vec![cash(2, 0, 10)]);
        let seen = early.drain().unwrap();
        assert_eq!(seen.len(), 2);

        let mut resumed = bus.subscribe_after(EventFilter::all(), 1);
        for event in &seen {
            bus.publish(event.clone());
        }
        let replayed: Vec<u64> = resumed
            .drain()
            .unwrap()
            .into_iter()
            .filter_map(|e| match e {
                LedgerEvent::VaultUpdated(update) => Some(update.sequence),
                _ => None,
            })
            .collect();
        assert_eq!(replayed, vec![2]);
    }

    #[test]
    fn test_fungible_selection_locks_just_enough() {
        let vault = vault();
        let refs = produce(
            &vault,
            vec![cash(1, 0, 40), cash(1, 1, 30), cash(1, 2, 50)],
        );
        let held = Uuid::new_v4();
        vault.reserve(held, &refs[1..2]).unwrap();

        let lock = Uuid::new_v4();
        let criteria: QueryCriteria = VaultQueryCriteria::new()
            .with_contract_state_types([CASH])
            .into();
        let picked = vault
            .try_lock_fungible_states(lock, &criteria, "quantity", 60)
            .unwrap();
        let picked: Vec<StateRef> = picked.iter().map(|s| s.state_ref).collect();
        assert_eq!(picked, vec![refs[0], refs[2]]);

        let more = vault
            .try_lock_fungible_states(Uuid::new_v4(), &criteria, "quantity", 1)
            .unwrap();
        assert!(more.is_empty());

        let locked: QueryCriteria = VaultQueryCriteria::new()
            .with_soft_locking(SoftLockingCondition::specified(vec![lock]))
            .into();
        let page = vault
            .query(&locked, &PageSpecification::default(), &Sort::default())
            .unwrap();
        assert_eq!(page.len(), 2);
    }
}
