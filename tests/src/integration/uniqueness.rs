//! Uniqueness provider over each store backend.

#[cfg(test)]
mod tests {
    use crate::fixtures::{other, registrar, sref, tx_id};
    use lc_01_uniqueness::{
        ConsumingTx, PersistentUniquenessProvider, UniquenessConfig, UniquenessError,
        UniquenessProvider,
    };
    use shared_store::{open_store, KeyValueStore, StoreBackend, StoreConfig};
    use std::sync::Arc;

    fn provider(config: &StoreConfig) -> PersistentUniquenessProvider<Arc<dyn KeyValueStore>> {
        let store = open_store(config).unwrap();
        PersistentUniquenessProvider::new(Arc::new(store), UniquenessConfig::default())
    }

    fn file_config(dir: &tempfile::TempDir) -> StoreConfig {
        StoreConfig {
            backend: StoreBackend::File,
            path: dir.path().join("conflicts.db"),
            ..StoreConfig::default()
        }
    }

    #[test]
    fn test_partial_overlap_is_all_or_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let provider = provider(&file_config(&dir));
        let (a, b, c) = (sref(1, 0), sref(1, 1), sref(1, 2));

        provider.commit(&[a, b], tx_id(1), &registrar()).unwrap();
        let err = provider.commit(&[b, c], tx_id(2), &other()).unwrap_err();

        let conflict = err.conflict().unwrap();
        assert_eq!(conflict.len(), 1);
        assert_eq!(
            conflict.consumed_by(&b),
            Some(&ConsumingTx::new(tx_id(1), 1, registrar()))
        );
        assert_eq!(provider.consuming_tx(&c).unwrap(), None);
        assert_eq!(provider.conflict_table_size().unwrap(), 2);
    }

    #[test]
    fn test_idempotent_commit_leaves_table_unchanged() {
        let provider = provider(&StoreConfig::default());
        let inputs = [sref(3, 0), sref(3, 1)];

        provider.commit(&inputs, tx_id(5), &registrar()).unwrap();
        provider.commit(&inputs, tx_id(5), &registrar()).unwrap();
        assert_eq!(provider.conflict_table_size().unwrap(), 2);
        assert!(provider.is_previously_notarised(&tx_id(5)).unwrap());
    }

    #[test]
    fn test_duplicate_inputs_conflict_deterministically() {
        let provider = provider(&StoreConfig::default());
        let inputs = [sref(4, 0), sref(4, 1), sref(4, 0)];

        for _ in 0..3 {
            let err = provider.commit(&inputs, tx_id(9), &registrar()).unwrap_err();
            let UniquenessError::Conflict(conflict) = err else {
                panic!("expected self-conflict");
            };
            assert_eq!(conflict.len(), 1);
            assert_eq!(
                conflict.consumed_by(&sref(4, 0)),
                Some(&ConsumingTx::new(tx_id(9), 0, registrar()))
            );
        }
        assert_eq!(provider.conflict_table_size().unwrap(), 0);
    }

    #[test]
    fn test_conflicts_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let config = file_config(&dir);
        {
            let provider = provider(&config);
            provider
                .commit(&[sref(6, 0)], tx_id(1), &registrar())
                .unwrap();
        }

        let reopened = provider(&config);
        assert!(reopened.is_previously_notarised(&tx_id(1)).unwrap());
        let err = reopened
            .commit(&[sref(6, 0)], tx_id(2), &other())
            .unwrap_err();
        assert_eq!(
            err.conflict().unwrap().consumed_by(&sref(6, 0)).unwrap().id,
            tx_id(1)
        );
    }
}
