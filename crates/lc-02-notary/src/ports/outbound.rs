//! Driven Ports (SPI - Outbound Dependencies)

use shared_store::KVStoreError;
use shared_types::{short_hex, Hash, Party, PartyName, StateRef, Timestamp, WireTransaction};
use std::sync::Arc;
use thiserror::Error;

/// Why a transaction failed verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    #[error("Transaction id does not match its content")]
    IdMismatch,

    #[error("Transaction has no inputs, references, outputs or commands")]
    Empty,

    #[error("Input {0} is listed more than once")]
    DuplicateInput(StateRef),

    #[error("Transaction has inputs but names no notary")]
    MissingNotary,

    #[error("Dependency {} could not be resolved", short_hex(.0))]
    UnresolvedDependency(Hash),

    #[error("State {0} does not exist in its producing transaction")]
    MissingOutput(StateRef),

    #[error("State {state_ref} is guarded by {actual}, transaction names {expected}")]
    NotaryMismatch {
        state_ref: StateRef,
        expected: String,
        actual: String,
    },

    #[error("Contract rejected the transaction: {0}")]
    Contract(String),

    /// Dependencies could not be read. Says nothing about the transaction.
    #[error("Transaction storage unavailable: {0}")]
    Storage(#[from] KVStoreError),
}

impl VerificationError {
    /// True when the same transaction may verify if retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, VerificationError::Storage(_))
    }
}

/// Verifies a full transaction before its inputs are committed.
///
/// Used by a validating notary. Implementations resolve the dependency
/// chain on their own.
pub trait TransactionVerifier: Send + Sync {
    fn verify(&self, tx: &WireTransaction) -> Result<(), VerificationError>;
}

/// Looks up previously recorded transactions by id.
pub trait TransactionResolver: Send + Sync {
    fn resolve(&self, tx_id: &Hash) -> Result<Option<WireTransaction>, KVStoreError>;
}

/// Read-only view of the network map.
///
/// The notary resolves its own identity through it at startup.
pub trait NetworkMapCache: Send + Sync {
    /// The identity registered under `name`, if its registration is an
    /// unexpired `Add` at `now`.
    fn party_from_name(&self, name: &PartyName, now: Timestamp) -> Option<Party>;
}

/// The notary clock.
pub trait TimeSource: Send + Sync {
    /// Milliseconds since the UNIX epoch.
    fn now_millis(&self) -> Timestamp;
}

impl<T: TransactionVerifier + ?Sized> TransactionVerifier for Arc<T> {
    fn verify(&self, tx: &WireTransaction) -> Result<(), VerificationError> {
        (**self).verify(tx)
    }
}

impl<T: TransactionResolver + ?Sized> TransactionResolver for Arc<T> {
    fn resolve(&self, tx_id: &Hash) -> Result<Option<WireTransaction>, KVStoreError> {
        (**self).resolve(tx_id)
    }
}

impl<T: NetworkMapCache + ?Sized> NetworkMapCache for Arc<T> {
    fn party_from_name(&self, name: &PartyName, now: Timestamp) -> Option<Party> {
        (**self).party_from_name(name, now)
    }
}

impl<T: TimeSource + ?Sized> TimeSource for Arc<T> {
    fn now_millis(&self) -> Timestamp {
        (**self).now_millis()
    }
}
