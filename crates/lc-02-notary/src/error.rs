//! Error types for the Notary subsystem.
//!
//! `NotaryError` travels back to the requesting node inside a
//! `NotarisationResponse`, so it is serde-serialisable.

use lc_01_uniqueness::{UniquenessConflict, UniquenessError};
use serde::{Deserialize, Serialize};
use shared_types::{short_hex, Hash, PartyName, TimeWindow, Timestamp};
use thiserror::Error;

/// Notary error types.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum NotaryError {
    /// The transaction is guarded by a different notary (or none).
    #[error("Transaction names notary {actual:?}, this notary is {expected}")]
    WrongNotary {
        expected: PartyName,
        actual: Option<PartyName>,
    },

    /// The notary clock lies outside the transaction's time window.
    #[error("Current time {current_time} is outside the time window {time_window}")]
    TimestampInvalid {
        current_time: Timestamp,
        time_window: TimeWindow,
    },

    /// More than one command declares a time window.
    #[error("Transaction declares more than one time window")]
    MoreThanOneTimestamp,

    /// Contract or structural verification failed.
    #[error("Transaction invalid: {reason}")]
    TransactionInvalid { reason: String },

    /// One or more inputs were already consumed.
    #[error("Transaction {} conflicts: {conflict}", short_hex(.tx_id))]
    Conflict {
        tx_id: Hash,
        conflict: UniquenessConflict,
    },

    /// Transient failure of the notary's storage. The request may be retried.
    #[error("Notary service unavailable: {reason}")]
    ServiceUnavailable { reason: String },
}

impl NotaryError {
    /// True when the same request may succeed if retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, NotaryError::ServiceUnavailable { .. })
    }

    /// Label for the `outcome` dimension of `lc_notary_commits_total`.
    pub fn outcome_label(&self) -> &'static str {
        match self {
            NotaryError::WrongNotary { .. } => "wrong_notary",
            NotaryError::TimestampInvalid { .. } | NotaryError::MoreThanOneTimestamp => {
                "time_window"
            }
            NotaryError::TransactionInvalid { .. } => "invalid",
            NotaryError::Conflict { .. } => "conflict",
            NotaryError::ServiceUnavailable { .. } => "unavailable",
        }
    }

    pub(crate) fn from_uniqueness(tx_id: Hash, err: UniquenessError) -> Self {
        match err {
            UniquenessError::Conflict(conflict) => NotaryError::Conflict { tx_id, conflict },
            UniquenessError::Storage(e) => NotaryError::ServiceUnavailable {
                reason: e.to_string(),
            },
        }
    }
}

/// Failures resolving the notary's own identity at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// No active network map registration for the configured legal name.
    #[error("No active network map registration for {0}")]
    NotRegistered(PartyName),

    /// The registered key is not the key the notary signs with.
    #[error("Network map key for {0} does not match the notary signing key")]
    KeyMismatch(PartyName),
}

/// Result type for notary operations.
pub type NotaryResult<T> = Result<T, NotaryError>;
