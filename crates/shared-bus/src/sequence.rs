//! # Sequence Tracker
//!
//! Replay protection for the vault feed. A subscriber that sees the same
//! update twice (redelivery after a reconnect, or a replayed snapshot
//! overlapping the live feed) must apply it only once.
//!
//! ## Rules
//!
//! - A sequence at or below the last accepted one is a duplicate.
//! - A sequence more than one above the last accepted one is accepted but
//!   reported as a gap so the subscriber can re-query.

use thiserror::Error;

/// Outcome of offering a sequence number to the tracker.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SequenceError {
    /// Already delivered.
    #[error("Sequence {sequence} already delivered (last: {last})")]
    Duplicate { sequence: u64, last: u64 },

    /// Accepted, but earlier sequences were never seen.
    #[error("Sequence gap: expected {expected}, got {got}")]
    Gap { expected: u64, got: u64 },
}

/// Tracks the highest delivered sequence number.
#[derive(Debug, Clone, Default)]
pub struct SequenceTracker {
    last: Option<u64>,
    duplicates: u64,
    gaps: u64,
}

impl SequenceTracker {
    /// A tracker that has delivered nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// A tracker that treats everything up to `last` as delivered, e.g. the
    /// sequence a snapshot was taken at.
    pub fn starting_after(last: u64) -> Self {
        Self {
            last: Some(last),
            ..Self::default()
        }
    }

    /// Offer a sequence number. `Ok` and `Gap` both mean "deliver".
    pub fn offer(&mut self, sequence: u64) -> Result<(), SequenceError> {
        match self.last {
            Some(last) if sequence <= last => {
                self.duplicates += 1;
                Err(SequenceError::Duplicate { sequence, last })
            }
            Some(last) if sequence > last + 1 => {
                self.gaps += 1;
                self.last = Some(sequence);
                Err(SequenceError::Gap {
                    expected: last + 1,
                    got: sequence,
                })
            }
            _ => {
                self.last = Some(sequence);
                Ok(())
            }
        }
    }

    /// True if the sequence should be delivered, recording it if so.
    pub fn accept(&mut self, sequence: u64) -> bool {
        !matches!(self.offer(sequence), Err(SequenceError::Duplicate { .. }))
    }

    /// Highest delivered sequence.
    pub fn last(&self) -> Option<u64> {
        self.last
    }

    /// Number of duplicates dropped.
    pub fn duplicates(&self) -> u64 {
        self.duplicates
    }

    /// Number of gaps seen.
    pub fn gaps(&self) -> u64 {
        self.gaps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_order_delivery() {
        let mut tracker = SequenceTracker::new();
        assert!(tracker.offer(1).is_ok());
        assert!(tracker.offer(2).is_ok());
        assert_eq!(tracker.last(), Some(2));
    }

    #[test]
    fn test_duplicate_is_dropped() {
        let mut tracker = SequenceTracker::new();
        assert!(tracker.accept(5));
        assert!(!tracker.accept(5));
        assert!(!tracker.accept(3));
        assert_eq!(tracker.duplicates(), 2);
    }

    #[test]
    fn test_gap_is_reported_but_accepted() {
        let mut tracker = SequenceTracker::starting_after(10);
        assert_eq!(
            tracker.offer(13),
            Err(SequenceError::Gap {
                expected: 11,
                got: 13
            })
        );
        assert_eq!(tracker.last(), Some(13));
        assert_eq!(tracker.gaps(), 1);
        assert!(tracker.accept(14));
    }
}
