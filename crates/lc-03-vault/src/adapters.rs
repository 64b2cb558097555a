//! Adapters for the vault's driven ports.

use crate::ports::outbound::{Clock, KeyManagement};
use parking_lot::RwLock;
use shared_types::{PublicKey, Timestamp};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Key set held in memory.
#[derive(Debug, Default)]
pub struct InMemoryKeyManagement {
    keys: RwLock<HashSet<PublicKey>>,
}

impl InMemoryKeyManagement {
    pub fn new<I: IntoIterator<Item = PublicKey>>(keys: I) -> Self {
        Self {
            keys: RwLock::new(keys.into_iter().collect()),
        }
    }

    pub fn add(&self, key: PublicKey) {
        self.keys.write().insert(key);
    }
}

impl KeyManagement for InMemoryKeyManagement {
    fn is_mine(&self, key: &PublicKey) -> bool {
        self.keys.read().contains(key)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> Timestamp {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as Timestamp)
            .unwrap_or(0)
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(now: Timestamp) -> Self {
        Self {
            now: AtomicU64::new(now),
        }
    }

    pub fn advance(&self, millis: u64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}
