//! Soft-lock planning.
//!
//! A reservation is all-or-nothing: either every requested state can be
//! taken by the lock, or nothing is written and the caller learns how many
//! were available.

use crate::domain::record::{RowWrite, VaultStateRecord};
use shared_types::{StateRef, Timestamp};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Result of planning a reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReservePlan {
    /// Write these rows. Rows already held by the lock are not rewritten, so
    /// the list may be empty.
    Reserve(Vec<RowWrite>),
    /// Only `available` of the requested states can be taken.
    Unavailable { available: usize },
}

/// Plans `lock_id` taking every ref in `requested`.
///
/// `requested` must be free of duplicates. Unknown refs count as unavailable.
pub fn plan_reserve(
    lock_id: Uuid,
    requested: &[StateRef],
    rows: &BTreeMap<StateRef, VaultStateRecord>,
    now: Timestamp,
) -> ReservePlan {
    let lockable: Vec<&VaultStateRecord> = requested
        .iter()
        .filter_map(|state_ref| rows.get(state_ref))
        .filter(|record| record.is_lockable_by(&lock_id))
        .collect();

    if lockable.len() < requested.len() {
        return ReservePlan::Unavailable {
            available: lockable.len(),
        };
    }

    let writes = lockable
        .into_iter()
        .filter(|record| record.lock_id.is_none())
        .map(|record| {
            let mut next = record.clone();
            next.lock_id = Some(lock_id);
            next.lock_update_time = Some(now);
            RowWrite {
                previous: Some(record.clone()),
                next,
            }
        })
        .collect();
    ReservePlan::Reserve(writes)
}

/// Plans releasing `lock_id` from the given rows. Rows that are consumed or
/// held by another lock are left alone.
pub fn plan_release<'a, I>(lock_id: Uuid, rows: I, now: Timestamp) -> Vec<RowWrite>
where
    I: IntoIterator<Item = &'a VaultStateRecord>,
{
    rows.into_iter()
        .filter(|record| record.is_unconsumed() && record.lock_id == Some(lock_id))
        .map(|record| {
            let mut next = record.clone();
            next.lock_id = None;
            next.lock_update_time = Some(now);
            RowWrite {
                previous: Some(record.clone()),
                next,
            }
        })
        .collect()
}
