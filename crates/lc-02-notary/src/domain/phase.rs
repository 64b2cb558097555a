//! Notarisation state machine.
//!
//! ```text
//! Received ──→ TimeWindowCheck ──→ ContractValidation ──→ UniquenessCheck ──→ Signed
//!    │               │                    │                     │
//!    └───────────────┴────────────────────┴─────────────────────┴──────────→ Rejected
//! ```
//!
//! `ContractValidation` is only entered by a validating notary; a
//! non-validating notary goes from `TimeWindowCheck` straight to
//! `UniquenessCheck`. `Signed` and `Rejected` are terminal.

use serde::{Deserialize, Serialize};
use shared_types::{short_hex, Hash};
use thiserror::Error;

/// Phase of one notarisation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotarisationPhase {
    Received,
    TimeWindowCheck,
    ContractValidation,
    UniquenessCheck,
    Signed,
    Rejected,
}

impl NotarisationPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, NotarisationPhase::Signed | NotarisationPhase::Rejected)
    }

    /// Whether moving from `self` to `next` is allowed.
    pub fn can_transition_to(&self, next: NotarisationPhase) -> bool {
        use NotarisationPhase::*;
        match (self, next) {
            (Signed | Rejected, _) => false,
            (_, Rejected) => true,
            (Received, TimeWindowCheck) => true,
            (TimeWindowCheck, ContractValidation | UniquenessCheck) => true,
            (ContractValidation, UniquenessCheck) => true,
            (UniquenessCheck, Signed) => true,
            _ => false,
        }
    }
}

/// Attempted a transition the state machine does not allow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Illegal notarisation transition {from:?} -> {to:?} for tx {tx}")]
pub struct IllegalTransition {
    pub from: NotarisationPhase,
    pub to: NotarisationPhase,
    pub tx: String,
}

/// Tracks the phase of a single request.
#[derive(Debug, Clone)]
pub struct Notarisation {
    tx_id: Hash,
    phase: NotarisationPhase,
    history: Vec<NotarisationPhase>,
}

impl Notarisation {
    pub fn new(tx_id: Hash) -> Self {
        Self {
            tx_id,
            phase: NotarisationPhase::Received,
            history: vec![NotarisationPhase::Received],
        }
    }

    pub fn phase(&self) -> NotarisationPhase {
        self.phase
    }

    /// Every phase visited, in order.
    pub fn history(&self) -> &[NotarisationPhase] {
        &self.history
    }

    pub fn advance(&mut self, next: NotarisationPhase) -> Result<(), IllegalTransition> {
        if !self.phase.can_transition_to(next) {
            return Err(IllegalTransition {
                from: self.phase,
                to: next,
                tx: short_hex(&self.tx_id),
            });
        }
        self.phase = next;
        self.history.push(next);
        Ok(())
    }

    /// Moves to `Rejected` unless already terminal.
    pub fn reject(&mut self) {
        if !self.phase.is_terminal() {
            self.phase = NotarisationPhase::Rejected;
            self.history.push(NotarisationPhase::Rejected);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use NotarisationPhase::*;

    #[test]
    fn test_validating_path() {
        let mut n = Notarisation::new([1; 32]);
        for next in [TimeWindowCheck, ContractValidation, UniquenessCheck, Signed] {
            n.advance(next).unwrap();
        }
        assert_eq!(n.history().len(), 5);
        assert!(n.phase().is_terminal());
    }

    #[test]
    fn test_non_validating_skips_validation() {
        assert!(TimeWindowCheck.can_transition_to(UniquenessCheck));
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(!Received.can_transition_to(Signed));
        assert!(!Received.can_transition_to(UniquenessCheck));
        assert!(!Signed.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(Received));

        let mut n = Notarisation::new([1; 32]);
        let err = n.advance(Signed).unwrap_err();
        assert_eq!(err.from, Received);
        assert_eq!(n.phase(), Received);
    }

    #[test]
    fn test_reject_is_terminal() {
        let mut n = Notarisation::new([1; 32]);
        n.reject();
        n.reject();
        assert_eq!(n.phase(), Rejected);
        assert_eq!(n.history(), &[Received, Rejected]);
    }
}
