//! In-memory network map cache.

use crate::ports::outbound::NetworkMapCache;
use parking_lot::RwLock;
use shared_types::{NodeRegistration, Party, PartyName, RegistrationKind, Timestamp};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Latest registration seen for each legal identity.
///
/// Map changes can arrive out of order. Each node's registrations carry a
/// monotonic serial and a change at or below the serial already held is
/// dropped. A `Remove` is kept as a tombstone so a late `Add` with an older
/// serial cannot bring the node back.
#[derive(Debug, Default)]
pub struct InMemoryNetworkMapCache {
    entries: RwLock<HashMap<PartyName, NodeRegistration>>,
}

impl InMemoryNetworkMapCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache holding a non-expiring registration for each party.
    pub fn with_identities(parties: impl IntoIterator<Item = Party>) -> Self {
        let cache = Self::new();
        for party in parties {
            cache.apply(NodeRegistration::add(party, 1));
        }
        cache
    }

    /// Applies one map change. Returns false when it was stale.
    pub fn apply(&self, registration: NodeRegistration) -> bool {
        let Some(name) = registration.node_info.legal_identity().map(|p| p.name.clone()) else {
            warn!(serial = registration.serial, "Ignoring registration without an identity");
            return false;
        };

        let mut entries = self.entries.write();
        if let Some(current) = entries.get(&name) {
            if registration.serial <= current.serial {
                debug!(
                    node = %name,
                    serial = registration.serial,
                    current = current.serial,
                    "Ignoring stale network map change"
                );
                return false;
            }
        }

        debug!(node = %name, serial = registration.serial, kind = ?registration.kind, "Network map updated");
        entries.insert(name, registration);
        true
    }

    /// Nodes whose latest change is an `Add`, expired or not.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .values()
            .filter(|r| r.kind == RegistrationKind::Add)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NetworkMapCache for InMemoryNetworkMapCache {
    fn party_from_name(&self, name: &PartyName, now: Timestamp) -> Option<Party> {
        let entries = self.entries.read();
        entries
            .get(name)
            .filter(|r| r.is_active(now))?
            .node_info
            .legal_identities
            .iter()
            .find(|p| &p.name == name)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notary(key: u8) -> Party {
        Party::new("O=Notary Service,L=Zurich,C=CH", [key; 32])
    }

    #[test]
    fn test_add_then_remove() {
        let cache = InMemoryNetworkMapCache::new();
        assert!(cache.apply(NodeRegistration::add(notary(1), 1)));
        assert_eq!(cache.party_from_name(&notary(1).name, 0), Some(notary(1)));

        assert!(cache.apply(NodeRegistration::remove(notary(1), 2)));
        assert_eq!(cache.party_from_name(&notary(1).name, 0), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_stale_changes_are_ignored() {
        let cache = InMemoryNetworkMapCache::new();
        cache.apply(NodeRegistration::add(notary(1), 5));

        assert!(!cache.apply(NodeRegistration::add(notary(2), 4)));
        assert!(!cache.apply(NodeRegistration::remove(notary(1), 5)));
        assert_eq!(cache.party_from_name(&notary(1).name, 0), Some(notary(1)));

        assert!(cache.apply(NodeRegistration::add(notary(2), 6)));
        assert_eq!(cache.party_from_name(&notary(1).name, 0), Some(notary(2)));
    }

    #[test]
    fn test_remove_is_not_undone_by_older_add() {
        let cache = InMemoryNetworkMapCache::new();
        cache.apply(NodeRegistration::add(notary(1), 1));
        cache.apply(NodeRegistration::remove(notary(1), 3));

        assert!(!cache.apply(NodeRegistration::add(notary(1), 2)));
        assert_eq!(cache.party_from_name(&notary(1).name, 0), None);
    }

    #[test]
    fn test_expired_registration_is_not_resolved() {
        let cache = InMemoryNetworkMapCache::new();
        let mut registration = NodeRegistration::add(notary(1), 1);
        registration.expires = 1_000;
        cache.apply(registration);

        assert!(cache.party_from_name(&notary(1).name, 999).is_some());
        assert!(cache.party_from_name(&notary(1).name, 1_000).is_none());
        assert_eq!(cache.len(), 1);
    }
}
