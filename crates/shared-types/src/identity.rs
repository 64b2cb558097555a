//! # Identities
//!
//! Parties that request notarisation or participate in states, plus the
//! read-only view of network-map registrations the core consumes.

use crate::entities::{PublicKey, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// X.500-style legal name, e.g. `O=Registrar,L=London,C=GB`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartyName(pub String);

impl PartyName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `O=` attribute, or the full name when no organisation is present.
    pub fn organisation(&self) -> &str {
        self.0
            .split(',')
            .map(str::trim)
            .find_map(|attr| attr.strip_prefix("O="))
            .unwrap_or(&self.0)
    }
}

impl fmt::Display for PartyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A well-known identity on the network.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Party {
    /// Legal name.
    pub name: PartyName,
    /// Key the party signs with.
    pub owning_key: PublicKey,
}

impl Party {
    pub fn new(name: impl Into<String>, owning_key: PublicKey) -> Self {
        Self {
            name: PartyName::new(name),
            owning_key,
        }
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Node information published in the network map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    /// Network addresses (`host:port`).
    pub addresses: Vec<String>,
    /// Identities hosted by the node. The first one is the node's legal identity.
    pub legal_identities: Vec<Party>,
    /// Platform version the node runs.
    pub platform_version: u32,
    /// Monotonic serial assigned by the node on every change.
    pub serial: i64,
}

impl NodeInfo {
    /// The node's main identity.
    pub fn legal_identity(&self) -> Option<&Party> {
        self.legal_identities.first()
    }
}

/// Kind of a network-map registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationKind {
    Add,
    Remove,
}

/// A network-map entry.
///
/// Owned by the network-map service; the notary and vault only read
/// identities out of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRegistration {
    pub node_info: NodeInfo,
    pub serial: i64,
    pub kind: RegistrationKind,
    pub expires: Timestamp,
}

impl NodeRegistration {
    /// A non-expiring `Add` for a node hosting the single identity `party`.
    pub fn add(party: Party, serial: i64) -> Self {
        Self::single(party, serial, RegistrationKind::Add)
    }

    /// A `Remove` for the node hosting `party`.
    pub fn remove(party: Party, serial: i64) -> Self {
        Self::single(party, serial, RegistrationKind::Remove)
    }

    fn single(party: Party, serial: i64, kind: RegistrationKind) -> Self {
        Self {
            node_info: NodeInfo {
                addresses: Vec::new(),
                legal_identities: vec![party],
                platform_version: 1,
                serial,
            },
            serial,
            kind,
            expires: Timestamp::MAX,
        }
    }

    /// True if the registration is an `Add` that has not expired at `now`.
    pub fn is_active(&self, now: Timestamp) -> bool {
        self.kind == RegistrationKind::Add && now < self.expires
    }
}
