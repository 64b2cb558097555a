//! Driving Ports (API - Inbound)

use crate::domain::ConsumingTx;
use crate::error::UniquenessResult;
use shared_types::{Hash, Party, StateRef};
use std::sync::Arc;

/// Primary uniqueness API.
///
/// Implementations are shared by every in-flight notarisation request and
/// must be safe under arbitrary interleaving of calls.
pub trait UniquenessProvider: Send + Sync {
    /// Records `inputs` as consumed by `tx_id`.
    ///
    /// Empty inputs succeed without writing. Duplicate inputs conflict with
    /// the transaction itself. Repeating a successful commit succeeds and
    /// changes nothing.
    fn commit(&self, inputs: &[StateRef], tx_id: Hash, requestor: &Party) -> UniquenessResult<()> {
        self.commit_with_references(inputs, &[], tx_id, requestor)
    }

    /// As [`UniquenessProvider::commit`], additionally requiring that
    /// `references` are unconsumed. References are not consumed.
    fn commit_with_references(
        &self,
        inputs: &[StateRef],
        references: &[StateRef],
        tx_id: Hash,
        requestor: &Party,
    ) -> UniquenessResult<()>;

    /// True if `tx_id` was committed before.
    fn is_previously_notarised(&self, tx_id: &Hash) -> UniquenessResult<bool>;

    /// The transaction that consumed `state_ref`, if any.
    fn consuming_tx(&self, state_ref: &StateRef) -> UniquenessResult<Option<ConsumingTx>>;

    /// Number of consumed states recorded.
    fn conflict_table_size(&self) -> UniquenessResult<usize>;
}

impl<T: UniquenessProvider + ?Sized> UniquenessProvider for Arc<T> {
    fn commit(&self, inputs: &[StateRef], tx_id: Hash, requestor: &Party) -> UniquenessResult<()> {
        (**self).commit(inputs, tx_id, requestor)
    }

    fn commit_with_references(
        &self,
        inputs: &[StateRef],
        references: &[StateRef],
        tx_id: Hash,
        requestor: &Party,
    ) -> UniquenessResult<()> {
        (**self).commit_with_references(inputs, references, tx_id, requestor)
    }

    fn is_previously_notarised(&self, tx_id: &Hash) -> UniquenessResult<bool> {
        (**self).is_previously_notarised(tx_id)
    }

    fn consuming_tx(&self, state_ref: &StateRef) -> UniquenessResult<Option<ConsumingTx>> {
        (**self).consuming_tx(state_ref)
    }

    fn conflict_table_size(&self) -> UniquenessResult<usize> {
        (**self).conflict_table_size()
    }
}
