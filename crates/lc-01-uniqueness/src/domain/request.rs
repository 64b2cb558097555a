//! Request log entries.

use serde::{Deserialize, Serialize};
use shared_types::{Hash, Party, Timestamp};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// How a commit request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommitOutcome {
    /// Inputs were recorded as consumed.
    Committed,
    /// The transaction had already been committed; nothing was written.
    AlreadyCommitted,
    /// Rejected with a conflict.
    Conflict,
}

impl CommitOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommitOutcome::Committed => "committed",
            CommitOutcome::AlreadyCommitted => "already_committed",
            CommitOutcome::Conflict => "conflict",
        }
    }
}

/// One entry of the request log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRequest {
    pub request_id: Uuid,
    pub tx_id: Hash,
    pub requesting_party: Party,
    /// Milliseconds since the UNIX epoch.
    pub request_time: Timestamp,
    pub outcome: CommitOutcome,
}

impl CommitRequest {
    /// A fresh entry stamped with the current wall-clock time.
    pub fn new(tx_id: Hash, requesting_party: Party, outcome: CommitOutcome) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            tx_id,
            requesting_party,
            request_time: now_millis(),
            outcome,
        }
    }
}

pub(crate) fn now_millis() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as Timestamp)
        .unwrap_or(0)
}
