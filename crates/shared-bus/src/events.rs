//! # Ledger Events
//!
//! Every event type that flows through the bus.

use serde::{Deserialize, Serialize};
use shared_types::{Hash, PartyName, VaultUpdate};
use std::collections::BTreeSet;

/// All events that can be published to the bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LedgerEvent {
    // =========================================================================
    // LC-03: VAULT
    // =========================================================================
    /// The vault recorded an observation batch.
    VaultUpdated(VaultUpdate),

    // =========================================================================
    // LC-02: NOTARY
    // =========================================================================
    /// The notary signed a transaction.
    TransactionNotarised {
        /// Id of the signed transaction.
        tx_id: Hash,
        /// Who asked for the signature.
        requesting_party: PartyName,
        /// Number of inputs consumed.
        input_count: usize,
    },

    /// The notary refused a transaction.
    NotarisationRejected {
        /// Id of the refused transaction.
        tx_id: Hash,
        /// Rendered `NotaryError`.
        reason: String,
    },
}

impl LedgerEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::VaultUpdated(_) => EventTopic::Vault,
            Self::TransactionNotarised { .. } | Self::NotarisationRejected { .. } => {
                EventTopic::Notary
            }
        }
    }

    /// Get the originating subsystem name.
    #[must_use]
    pub fn source_subsystem(&self) -> &'static str {
        match self.topic() {
            EventTopic::Vault => "lc-03-vault",
            EventTopic::Notary => "lc-02-notary",
        }
    }

    /// Sequence number of a vault update.
    #[must_use]
    pub fn sequence(&self) -> Option<u64> {
        match self {
            Self::VaultUpdated(update) => Some(update.sequence),
            _ => None,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// lc-03 events.
    Vault,
    /// lc-02 events.
    Notary,
}

/// Filter applied by a subscription before delivering an event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// Topics to receive. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Restrict vault updates to those touching one of these contract state
    /// types. `None` means any type.
    pub contract_state_types: Option<BTreeSet<String>>,
}

impl EventFilter {
    /// Receive everything.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Receive only the given topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            contract_state_types: None,
        }
    }

    /// Receive vault updates touching any of the given contract state types.
    #[must_use]
    pub fn vault_types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            topics: vec![EventTopic::Vault],
            contract_state_types: Some(types.into_iter().map(Into::into).collect()),
        }
    }

    /// Check whether an event passes this filter.
    #[must_use]
    pub fn matches(&self, event: &LedgerEvent) -> bool {
        if !self.topics.is_empty() && !self.topics.contains(&event.topic()) {
            return false;
        }
        match (event, &self.contract_state_types) {
            (LedgerEvent::VaultUpdated(update), Some(wanted)) => update
                .contract_state_types()
                .iter()
                .any(|t| wanted.contains(*t)),
            _ => true,
        }
    }
}
