//! Structural transaction verification.
//!
//! Stands in for contract execution. Checks what can be checked without
//! running contract code and walks the dependency chain through a
//! [`TransactionResolver`].

use crate::ports::outbound::{TransactionResolver, TransactionVerifier, VerificationError};
use shared_types::{Hash, StateRef, WireTransaction};
use std::collections::{BTreeSet, HashSet, VecDeque};

type ContractCheck = Box<dyn Fn(&WireTransaction) -> Result<(), String> + Send + Sync>;

/// Verifier used by the validating notary.
pub struct StructuralVerifier<R: TransactionResolver> {
    resolver: R,
    contract_check: Option<ContractCheck>,
}

impl<R: TransactionResolver> StructuralVerifier<R> {
    pub fn new(resolver: R) -> Self {
        Self {
            resolver,
            contract_check: None,
        }
    }

    /// Runs `check` on the submitted transaction after the structural checks.
    pub fn with_contract_check<F>(mut self, check: F) -> Self
    where
        F: Fn(&WireTransaction) -> Result<(), String> + Send + Sync + 'static,
    {
        self.contract_check = Some(Box::new(check));
        self
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    fn check_shape(tx: &WireTransaction) -> Result<(), VerificationError> {
        if !tx.has_valid_id() {
            return Err(VerificationError::IdMismatch);
        }
        if tx.inputs.is_empty()
            && tx.references.is_empty()
            && tx.outputs.is_empty()
            && tx.commands.is_empty()
        {
            return Err(VerificationError::Empty);
        }
        let mut seen = BTreeSet::new();
        if let Some(dup) = tx.inputs.iter().find(|s| !seen.insert(**s)) {
            return Err(VerificationError::DuplicateInput(*dup));
        }
        if !tx.inputs.is_empty() && tx.notary.is_none() {
            return Err(VerificationError::MissingNotary);
        }
        Ok(())
    }

    fn producer(&self, tx_id: &Hash) -> Result<WireTransaction, VerificationError> {
        self.resolver
            .resolve(tx_id)?
            .ok_or(VerificationError::UnresolvedDependency(*tx_id))
    }

    /// Resolves every state `tx` depends on and returns the producing
    /// transaction ids.
    fn check_dependencies(&self, tx: &WireTransaction) -> Result<Vec<Hash>, VerificationError> {
        let mut producers = Vec::new();
        let consumed = tx.inputs.iter().map(|s| (s, true));
        let referenced = tx.references.iter().map(|s| (s, false));

        for (state_ref, is_input) in consumed.chain(referenced) {
            let producer = self.producer(&state_ref.tx_id)?;
            let output = producer
                .outputs
                .get(state_ref.index as usize)
                .ok_or(VerificationError::MissingOutput(*state_ref))?;

            if is_input {
                check_input_notary(tx, state_ref, &output.notary.name.0)?;
            }
            producers.push(producer.id);
        }
        Ok(producers)
    }
}

fn check_input_notary(
    tx: &WireTransaction,
    state_ref: &StateRef,
    guarded_by: &str,
) -> Result<(), VerificationError> {
    match &tx.notary {
        Some(notary) if notary.name.0 == guarded_by => Ok(()),
        Some(notary) => Err(VerificationError::NotaryMismatch {
            state_ref: *state_ref,
            expected: notary.name.0.clone(),
            actual: guarded_by.to_string(),
        }),
        None => Err(VerificationError::MissingNotary),
    }
}

impl<R: TransactionResolver> TransactionVerifier for StructuralVerifier<R> {
    fn verify(&self, tx: &WireTransaction) -> Result<(), VerificationError> {
        Self::check_shape(tx)?;

        let mut visited: HashSet<Hash> = HashSet::new();
        visited.insert(tx.id);
        let mut pending: VecDeque<Hash> = self.check_dependencies(tx)?.into();

        while let Some(tx_id) = pending.pop_front() {
            if !visited.insert(tx_id) {
                continue;
            }
            let dependency = self.producer(&tx_id)?;
            Self::check_shape(&dependency)?;
            pending.extend(self.check_dependencies(&dependency)?);
        }

        if let Some(check) = &self.contract_check {
            check(tx).map_err(VerificationError::Contract)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryTransactionStore;
    use shared_store::KVStoreError;
    use shared_types::{Command, Party, StateData, TransactionState};
    use std::sync::Arc;

    fn notary() -> Party {
        Party::new("O=Notary,L=Zurich,C=CH", [7; 32])
    }

    fn output(quantity: i64) -> TransactionState {
        TransactionState {
            data: StateData::new("cash.CashState").with_field("quantity", quantity),
            notary: notary(),
        }
    }

    fn issue(quantity: i64) -> WireTransaction {
        WireTransaction::new(
            vec![],
            vec![],
            vec![output(quantity)],
            vec![Command::new("cash.Issue")],
            Some(notary()),
        )
        .unwrap()
    }

    fn spend(inputs: Vec<StateRef>, notary: Option<Party>) -> WireTransaction {
        WireTransaction::new(
            inputs,
            vec![],
            vec![output(1)],
            vec![Command::new("cash.Move")],
            notary,
        )
        .unwrap()
    }

    #[test]
    fn test_resolved_chain_verifies() {
        let store = Arc::new(InMemoryTransactionStore::new());
        let genesis = issue(10);
        let middle = spend(vec![StateRef::new(genesis.id, 0)], Some(notary()));
        store.add(genesis);
        store.add(middle.clone());

        let verifier = StructuralVerifier::new(Arc::clone(&store));
        let tip = spend(vec![StateRef::new(middle.id, 0)], Some(notary()));
        assert!(verifier.verify(&tip).is_ok());
    }

    #[test]
    fn test_missing_dependency() {
        let verifier = StructuralVerifier::new(InMemoryTransactionStore::new());
        let tx = spend(vec![StateRef::new([3; 32], 0)], Some(notary()));
        assert_eq!(
            verifier.verify(&tx),
            Err(VerificationError::UnresolvedDependency([3; 32]))
        );
    }

    #[test]
    fn test_missing_dependency_deep_in_chain() {
        let store = Arc::new(InMemoryTransactionStore::new());
        let middle = spend(vec![StateRef::new([3; 32], 0)], Some(notary()));
        store.add(middle.clone());

        let verifier = StructuralVerifier::new(store);
        let tip = spend(vec![StateRef::new(middle.id, 0)], Some(notary()));
        assert_eq!(
            verifier.verify(&tip),
            Err(VerificationError::UnresolvedDependency([3; 32]))
        );
    }

    #[test]
    fn test_shape_checks() {
        let store = Arc::new(InMemoryTransactionStore::new());
        let genesis = issue(10);
        store.add(genesis.clone());
        let verifier = StructuralVerifier::new(store);
        let s = StateRef::new(genesis.id, 0);

        assert_eq!(
            verifier.verify(&spend(vec![s, s], Some(notary()))),
            Err(VerificationError::DuplicateInput(s))
        );
        assert_eq!(
            verifier.verify(&spend(vec![s], None)),
            Err(VerificationError::MissingNotary)
        );

        let mut tampered = spend(vec![s], Some(notary()));
        tampered.outputs.push(output(1_000));
        assert_eq!(verifier.verify(&tampered), Err(VerificationError::IdMismatch));

        let empty = WireTransaction::new(vec![], vec![], vec![], vec![], None).unwrap();
        assert_eq!(verifier.verify(&empty), Err(VerificationError::Empty));
    }

    #[test]
    fn test_missing_output_and_wrong_notary() {
        let store = Arc::new(InMemoryTransactionStore::new());
        let genesis = issue(10);
        store.add(genesis.clone());
        let verifier = StructuralVerifier::new(store);

        let bad_index = StateRef::new(genesis.id, 5);
        assert_eq!(
            verifier.verify(&spend(vec![bad_index], Some(notary()))),
            Err(VerificationError::MissingOutput(bad_index))
        );

        let other = Party::new("O=Other Notary,L=Oslo,C=NO", [8; 32]);
        assert!(matches!(
            verifier.verify(&spend(vec![StateRef::new(genesis.id, 0)], Some(other))),
            Err(VerificationError::NotaryMismatch { .. })
        ));
    }

    #[test]
    fn test_contract_check() {
        let verifier = StructuralVerifier::new(InMemoryTransactionStore::new())
            .with_contract_check(|tx| {
                let negative = tx
                    .outputs
                    .iter()
                    .filter_map(|o| o.data.field("quantity").and_then(|v| v.as_i64()))
                    .any(|q| q < 0);
                if negative {
                    Err("negative quantity".to_string())
                } else {
                    Ok(())
                }
            });

        assert!(verifier.verify(&issue(5)).is_ok());
        assert_eq!(
            verifier.verify(&issue(-5)),
            Err(VerificationError::Contract("negative quantity".into()))
        );
    }

    struct UnreachableStore;

    impl TransactionResolver for UnreachableStore {
        fn resolve(&self, _tx_id: &Hash) -> Result<Option<WireTransaction>, KVStoreError> {
            Err(KVStoreError::LockTimeout { waited_ms: 5 })
        }
    }

    #[test]
    fn test_unreadable_dependency_is_transient() {
        let verifier = StructuralVerifier::new(UnreachableStore);
        let err = verifier
            .verify(&spend(vec![StateRef::new([1; 32], 0)], Some(notary())))
            .unwrap_err();
        assert_eq!(
            err,
            VerificationError::Storage(KVStoreError::LockTimeout { waited_ms: 5 })
        );
        assert!(err.is_transient());
    }
}
