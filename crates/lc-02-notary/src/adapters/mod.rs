//! Adapters for the notary's driven ports.

pub mod clock;
pub mod network_map;
pub mod resolver;
pub mod verifier;

pub use clock::{ManualTimeSource, SystemTimeSource};
pub use network_map::InMemoryNetworkMapCache;
pub use resolver::{InMemoryTransactionStore, PersistentTransactionStore, TRANSACTION_PREFIX};
pub use verifier::StructuralVerifier;
