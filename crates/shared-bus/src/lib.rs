//! # Shared Bus - Ledger Event Feed
//!
//! Publish/subscribe channel between the ledger subsystems and anything that
//! wants to follow them: vault observers, transaction builders waiting for a
//! state to appear, operators tailing notarisation outcomes.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │ lc-03 vault  │    publish()       │   tracker    │
//! │ lc-02 notary │ ──────┐            │   (track())  │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Event Bus   │ ─────────┘
//!                  └──────────────┘  subscribe()
//! ```
//!
//! ## Delivery
//!
//! - One `VaultUpdated` event per observation batch, consumed states before
//!   produced states.
//! - Delivery is at-least-once from the subscriber's point of view. Every
//!   vault update carries a sequence number and each [`Subscription`] drops
//!   sequence numbers it has already delivered.
//! - A subscriber that falls more than the channel capacity behind loses the
//!   oldest events. Its next receive fails with
//!   [`SubscriptionError::Lagged`] so it can rebuild from a fresh snapshot.

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod sequence;
pub mod subscriber;

pub use events::{EventFilter, EventTopic, LedgerEvent};
pub use publisher::{EventPublisher, InMemoryEventBus, NullPublisher};
pub use sequence::{SequenceError, SequenceTracker};
pub use subscriber::{Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before the oldest are dropped.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacity() {
        assert_eq!(DEFAULT_CHANNEL_CAPACITY, 1000);
    }
}
