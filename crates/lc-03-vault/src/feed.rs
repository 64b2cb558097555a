//! Live vault feed.
//!
//! A [`DataFeed`] pairs a query snapshot with the updates published after
//! it. The subscription is opened before the snapshot is taken, at the
//! sequence number the snapshot reflects, so nothing falls between the two
//! and nothing is seen twice.
//!
//! If the consumer falls behind the bus capacity, updates are lost. The feed
//! then fails with [`SubscriptionError::Lagged`] and the consumer must take a
//! fresh snapshot with `track` before trusting its view again.

use crate::domain::query::{Page, StatusFilter};
use shared_bus::{LedgerEvent, Subscription, SubscriptionError};
use shared_types::{StateAndRef, VaultUpdate};
use std::collections::BTreeSet;

/// Snapshot plus live updates.
pub struct DataFeed {
    pub snapshot: Page,
    pub updates: VaultUpdateFeed,
}

/// Vault updates relevant to a tracked query.
///
/// An update is delivered when the side of it the query's status selects
/// (produced for unconsumed, consumed for consumed, either for all) holds a
/// state of a tracked contract type.
pub struct VaultUpdateFeed {
    subscription: Subscription,
    status: StatusFilter,
    contract_state_types: Option<BTreeSet<String>>,
}

impl VaultUpdateFeed {
    pub(crate) fn new(
        subscription: Subscription,
        status: StatusFilter,
        contract_state_types: Option<BTreeSet<String>>,
    ) -> Self {
        Self {
            subscription,
            status,
            contract_state_types,
        }
    }

    fn wants(&self, update: &VaultUpdate) -> bool {
        let tracked = |states: &[StateAndRef]| {
            states.iter().any(|s| {
                self.contract_state_types
                    .as_ref()
                    .map_or(true, |types| types.contains(&s.state.data.contract_state_type))
            })
        };
        match self.status {
            StatusFilter::Unconsumed => tracked(&update.produced),
            StatusFilter::Consumed => tracked(&update.consumed),
            StatusFilter::All => tracked(&update.produced) || tracked(&update.consumed),
        }
    }

    fn admit(&self, event: LedgerEvent) -> Option<VaultUpdate> {
        match event {
            LedgerEvent::VaultUpdated(update) if self.wants(&update) => Some(update),
            _ => None,
        }
    }

    /// Next matching update.
    pub async fn recv(&mut self) -> Result<VaultUpdate, SubscriptionError> {
        loop {
            let event = self.subscription.recv().await?;
            if let Some(update) = self.admit(event) {
                return Ok(update);
            }
        }
    }

    /// Next matching update if one is buffered.
    pub fn try_recv(&mut self) -> Result<Option<VaultUpdate>, SubscriptionError> {
        while let Some(event) = self.subscription.try_recv()? {
            if let Some(update) = self.admit(event) {
                return Ok(Some(update));
            }
        }
        Ok(None)
    }

    /// Every matching update currently buffered.
    pub fn drain(&mut self) -> Result<Vec<VaultUpdate>, SubscriptionError> {
        Ok(self
            .subscription
            .drain()?
            .into_iter()
            .filter_map(|event| self.admit(event))
            .collect())
    }

    /// Highest update sequence delivered so far, including the snapshot's.
    pub fn last_sequence(&self) -> Option<u64> {
        self.subscription.sequence_tracker().last()
    }
}
