//! Driven Ports (SPI - Outbound Dependencies)

use shared_types::{PublicKey, Timestamp};
use std::sync::Arc;

/// The node's own signing keys.
pub trait KeyManagement: Send + Sync {
    fn is_mine(&self, key: &PublicKey) -> bool;

    /// The subset of `keys` held by this node.
    fn filter_my_keys(&self, keys: &[PublicKey]) -> Vec<PublicKey> {
        keys.iter().copied().filter(|k| self.is_mine(k)).collect()
    }
}

/// Clock used to stamp recorded, consumed and lock update times.
pub trait Clock: Send + Sync {
    /// Milliseconds since the UNIX epoch.
    fn now_millis(&self) -> Timestamp;
}

impl<T: KeyManagement + ?Sized> KeyManagement for Arc<T> {
    fn is_mine(&self, key: &PublicKey) -> bool {
        (**self).is_mine(key)
    }
}

impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn now_millis(&self) -> Timestamp {
        (**self).now_millis()
    }
}
