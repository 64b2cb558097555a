//! Storage keys for the notary tables.

use shared_types::{Hash, StateRef, Timestamp};
use uuid::Uuid;

/// Conflict table: `StateRef → ConsumingTx`.
pub const CONFLICT_PREFIX: &[u8] = b"n:cs:";

/// Transactions that were successfully notarised.
pub const COMMITTED_TX_PREFIX: &[u8] = b"n:tx:";

/// Append-only audit log of commit requests.
pub const REQUEST_LOG_PREFIX: &[u8] = b"n:rl:";

pub fn conflict_key(state_ref: &StateRef) -> Vec<u8> {
    let mut key = CONFLICT_PREFIX.to_vec();
    key.extend_from_slice(&state_ref.to_key_bytes());
    key
}

pub fn committed_tx_key(tx_id: &Hash) -> Vec<u8> {
    let mut key = COMMITTED_TX_PREFIX.to_vec();
    key.extend_from_slice(tx_id);
    key
}

/// Log keys sort by request time, then request id.
pub fn request_log_key(request_time: Timestamp, request_id: &Uuid) -> Vec<u8> {
    let mut key = REQUEST_LOG_PREFIX.to_vec();
    key.extend_from_slice(&request_time.to_be_bytes());
    key.extend_from_slice(request_id.as_bytes());
    key
}

/// Recovers the state ref from a conflict table key.
pub fn state_ref_from_conflict_key(key: &[u8]) -> Option<StateRef> {
    key.strip_prefix(CONFLICT_PREFIX)
        .and_then(StateRef::from_key_bytes)
}
