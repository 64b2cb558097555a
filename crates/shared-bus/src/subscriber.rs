//! # Event Subscriber
//!
//! Defines the subscription side of the event bus.

use crate::events::{EventFilter, LedgerEvent};
use crate::sequence::SequenceTracker;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The event bus was closed.
    #[error("Event bus closed")]
    Closed,

    /// The subscriber fell behind the channel capacity and the oldest
    /// events were overwritten. Anything built from earlier events is stale.
    #[error("Subscriber lagged, {missed} events lost")]
    Lagged { missed: u64 },
}

/// Decrements the per-topic subscription count when dropped.
struct SubscriptionGuard {
    subscriptions: Arc<RwLock<HashMap<String, usize>>>,
    topic_key: String,
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        let Ok(mut subs) = self.subscriptions.write() else {
            return;
        };
        if let Some(count) = subs.get_mut(&self.topic_key) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                subs.remove(&self.topic_key);
            }
        }
        debug!(topic = %self.topic_key, "Subscription dropped");
    }
}

/// Filter plus replay protection.
struct Gate {
    filter: EventFilter,
    tracker: SequenceTracker,
}

impl Gate {
    fn admit(&mut self, event: &LedgerEvent) -> bool {
        if !self.filter.matches(event) {
            return false;
        }
        match event.sequence() {
            Some(sequence) => self.tracker.accept(sequence),
            None => true,
        }
    }
}

/// A subscription handle for receiving events.
///
/// When dropped, the subscription is automatically cleaned up.
pub struct Subscription {
    receiver: broadcast::Receiver<LedgerEvent>,
    gate: Gate,
    guard: SubscriptionGuard,
}

impl Subscription {
    pub(crate) fn new(
        receiver: broadcast::Receiver<LedgerEvent>,
        filter: EventFilter,
        subscriptions: Arc<RwLock<HashMap<String, usize>>>,
        topic_key: String,
    ) -> Self {
        Self {
            receiver,
            gate: Gate {
                filter,
                tracker: SequenceTracker::new(),
            },
            guard: SubscriptionGuard {
                subscriptions,
                topic_key,
            },
        }
    }

    /// Treat every vault update with a sequence up to and including
    /// `sequence` as already delivered.
    #[must_use]
    pub fn skip_through(mut self, sequence: u64) -> Self {
        self.gate.tracker = SequenceTracker::starting_after(sequence);
        self
    }

    /// Receive the next event that matches the filter.
    ///
    /// - `Err(SubscriptionError::Closed)` once the bus has been dropped
    /// - `Err(SubscriptionError::Lagged)` if events were lost since the last
    ///   call. Receiving again resumes at the oldest event still buffered.
    pub async fn recv(&mut self) -> Result<LedgerEvent, SubscriptionError> {
        loop {
            let event = match self.receiver.recv().await {
                Ok(e) => e,
                Err(broadcast::error::RecvError::Closed) => return Err(SubscriptionError::Closed),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "Subscriber lagged, events dropped");
                    return Err(SubscriptionError::Lagged { missed });
                }
            };

            if self.gate.admit(&event) {
                return Ok(event);
            }
        }
    }

    /// Try to receive the next event without blocking.
    ///
    /// - `Ok(Some(event))` - An event was available and matched
    /// - `Ok(None)` - No event available (would block)
    /// - `Err(SubscriptionError::Closed)` - The channel was closed
    /// - `Err(SubscriptionError::Lagged)` - Events were lost
    pub fn try_recv(&mut self) -> Result<Option<LedgerEvent>, SubscriptionError> {
        loop {
            let event = match self.receiver.try_recv() {
                Ok(e) => e,
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
                Err(broadcast::error::TryRecvError::Lagged(missed)) => {
                    warn!(missed, "Subscriber lagged, events dropped");
                    return Err(SubscriptionError::Lagged { missed });
                }
            };

            if self.gate.admit(&event) {
                return Ok(Some(event));
            }
        }
    }

    /// Drain every event currently buffered.
    ///
    /// A closed bus ends the drain. A lag fails it, since the events
    /// collected so far no longer form a complete sequence.
    pub fn drain(&mut self) -> Result<Vec<LedgerEvent>, SubscriptionError> {
        let mut events = Vec::new();
        loop {
            match self.try_recv() {
                Ok(Some(event)) => events.push(event),
                Ok(None) | Err(SubscriptionError::Closed) => return Ok(events),
                Err(lagged) => return Err(lagged),
            }
        }
    }

    /// Get the filter for this subscription.
    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.gate.filter
    }

    /// Replay-protection state.
    #[must_use]
    pub fn sequence_tracker(&self) -> &SequenceTracker {
        &self.gate.tracker
    }
}
