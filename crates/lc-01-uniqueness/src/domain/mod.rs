//! Domain layer for the uniqueness provider.
//!
//! Pure logic: nothing in here touches the store.

pub mod conflict;
pub mod decision;
pub mod keys;
pub mod request;

pub use conflict::{ConsumingTx, UniquenessConflict};
pub use decision::{decide, duplicate_inputs, CommitDecision};
pub use request::{CommitOutcome, CommitRequest};
