//! Concurrency properties under racing threads.
//!
//! Every test drives one shared service from several OS threads released
//! together by a barrier, then checks the stored outcome.

#[cfg(test)]
mod tests {
    use crate::fixtures::{cash, registrar, sref, tx_id, vault};
    use lc_01_uniqueness::{InMemoryUniquenessProvider, UniquenessError, UniquenessProvider};
    use lc_03_vault::{Observation, QueryCriteria, SoftLockError, VaultApi, VaultQueryCriteria};
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};
    use shared_types::StateRef;
    use std::collections::HashMap;
    use std::sync::{Arc, Barrier};
    use std::thread;
    use uuid::Uuid;

    const THREADS: usize = 8;

    #[test]
    fn test_no_double_spend_under_overlapping_commits() {
        let provider = Arc::new(InMemoryUniquenessProvider::new());
        let pool: Vec<StateRef> = (0..24).map(|i| sref(1, i)).collect();
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let provider = Arc::clone(&provider);
                let barrier = Arc::clone(&barrier);
                let pool = pool.clone();
                thread::spawn(move || {
                    let mut rng = StdRng::seed_from_u64(t as u64);
                    barrier.wait();
                    let mut won = Vec::new();
                    for attempt in 0..30u64 {
                        let size = rng.gen_range(1..=4);
                        let inputs: Vec<StateRef> =
                            pool.choose_multiple(&mut rng, size).copied().collect();
                        let id = tx_id(t as u64 * 1_000 + attempt);
                        match provider.commit(&inputs, id, &registrar()) {
                            Ok(()) => won.push((id, inputs)),
                            Err(UniquenessError::Conflict(_)) => {}
                            Err(e) => panic!("unexpected storage failure: {e}"),
                        }
                    }
                    won
                })
            })
            .collect();

        let mut consumer_of: HashMap<StateRef, [u8; 32]> = HashMap::new();
        for handle in handles {
            for (id, inputs) in handle.join().unwrap() {
                for state_ref in inputs {
                    assert!(
                        consumer_of.insert(state_ref, id).is_none(),
                        "{state_ref:?} spent twice"
                    );
                }
            }
        }
        for (state_ref, id) in &consumer_of {
            assert_eq!(provider.consuming_tx(state_ref).unwrap().unwrap().id, *id);
        }
        assert_eq!(provider.conflict_table_size().unwrap(), consumer_of.len());
    }

    #[test]
    fn test_identical_commits_race_to_one_winner() {
        let provider = Arc::new(InMemoryUniquenessProvider::new());
        let inputs = vec![sref(2, 0), sref(2, 1), sref(2, 2)];
        let barrier = Arc::new(Barrier::new(THREADS));

        let results: Vec<_> = (0..THREADS)
            .map(|t| {
                let provider = Arc::clone(&provider);
                let barrier = Arc::clone(&barrier);
                let inputs = inputs.clone();
                thread::spawn(move || {
                    barrier.wait();
                    provider.commit(&inputs, tx_id(t as u64), &registrar())
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        let winner = inputs
            .iter()
            .map(|s| provider.consuming_tx(s).unwrap().unwrap().id)
            .collect::<Vec<_>>();
        assert!(winner.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_reservation_mutual_exclusion() {
        let vault = Arc::new(vault());
        let states: Vec<_> = (0..4).map(|i| cash(3, i, 10)).collect();
        let refs: Vec<StateRef> = states.iter().map(|s| s.state_ref).collect();
        vault.observe(Observation::new(vec![], states)).unwrap();
        let barrier = Arc::new(Barrier::new(THREADS));

        let outcomes: Vec<(Uuid, Result<(), SoftLockError>)> = (0..THREADS)
            .map(|_| {
                let vault = Arc::clone(&vault);
                let barrier = Arc::clone(&barrier);
                let refs = refs.clone();
                thread::spawn(move || {
                    let lock = Uuid::new_v4();
                    barrier.wait();
                    (lock, vault.reserve(lock, &refs))
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect();

        let winners: Vec<Uuid> = outcomes
            .iter()
            .filter(|(_, r)| r.is_ok())
            .map(|(lock, _)| *lock)
            .collect();
        assert_eq!(winners.len(), 1);
        for (lock, outcome) in &outcomes {
            if let Err(err) = outcome {
                assert_eq!(
                    err,
                    &SoftLockError::StatesNotAvailable {
                        lock_id: *lock,
                        requested: 4,
                        available: 0,
                    }
                );
                assert!(vault.locked_states(*lock).unwrap().is_empty());
            }
        }
        assert_eq!(vault.locked_states(winners[0]).unwrap(), refs);
    }

    #[test]
    fn test_fungible_selection_never_overcommits() {
        let vault = Arc::new(vault());
        let states: Vec<_> = (0..20).map(|i| cash(4, i, 5)).collect();
        vault.observe(Observation::new(vec![], states)).unwrap();
        let criteria: QueryCriteria = VaultQueryCriteria::new().into();
        let barrier = Arc::new(Barrier::new(THREADS));

        let claims: Vec<Vec<StateRef>> = (0..THREADS)
            .map(|_| {
                let vault = Arc::clone(&vault);
                let barrier = Arc::clone(&barrier);
                let criteria = criteria.clone();
                thread::spawn(move || {
                    barrier.wait();
                    let mut claimed = Vec::new();
                    for _ in 0..4 {
                        match vault.try_lock_fungible_states(
                            Uuid::new_v4(),
                            &criteria,
                            "quantity",
                            12,
                        ) {
                            Ok(states) => claimed.extend(states.into_iter().map(|s| s.state_ref)),
                            Err(SoftLockError::StatesNotAvailable { .. }) => {}
                            Err(e) if e.is_transient() => {}
                            Err(e) => panic!("unexpected failure: {e}"),
                        }
                    }
                    claimed
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect();

        let mut all: Vec<StateRef> = claims.into_iter().flatten().collect();
        let total = all.len();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), total, "a state was handed to two locks");
        assert!(total <= 20);
    }
}
