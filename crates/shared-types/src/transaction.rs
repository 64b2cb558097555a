//! # Transactions
//!
//! The wire form of a ledger transaction as submitted to the notary and
//! recorded by the vault.
//!
//! ## Transaction Identity
//!
//! ```text
//! id = SHA-256( bincode(inputs, references, outputs, commands, notary) )
//! ```
//!
//! The id commits to the full input list, so two different input sets can
//! never share an id.

use crate::entities::{Hash, StateRef, Timestamp};
use crate::errors::{EncodingError, TimeWindowError};
use crate::identity::Party;
use crate::state::StateData;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Validity interval attached to a transaction and enforced by the notary.
///
/// Bounds are in milliseconds since the UNIX epoch. At least one bound is
/// present; a missing bound is open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    pub from: Option<Timestamp>,
    pub until: Option<Timestamp>,
}

impl TimeWindow {
    /// A window with both bounds.
    pub fn between(from: Timestamp, until: Timestamp) -> Result<Self, TimeWindowError> {
        if from > until {
            return Err(TimeWindowError::Inverted { from, until });
        }
        Ok(Self {
            from: Some(from),
            until: Some(until),
        })
    }

    /// Valid from `from` onwards.
    pub fn from_only(from: Timestamp) -> Self {
        Self {
            from: Some(from),
            until: None,
        }
    }

    /// Valid up to `until`.
    pub fn until_only(until: Timestamp) -> Self {
        Self {
            from: None,
            until: Some(until),
        }
    }

    /// `[instant - tolerance, instant + tolerance]`.
    pub fn with_tolerance(instant: Timestamp, tolerance: u64) -> Self {
        Self {
            from: Some(instant.saturating_sub(tolerance)),
            until: Some(instant.saturating_add(tolerance)),
        }
    }

    /// Builds a window from optional bounds.
    pub fn new(from: Option<Timestamp>, until: Option<Timestamp>) -> Result<Self, TimeWindowError> {
        match (from, until) {
            (None, None) => Err(TimeWindowError::Unbounded),
            (Some(f), Some(u)) => Self::between(f, u),
            _ => Ok(Self { from, until }),
        }
    }

    /// True if `now` lies within the window widened by `tolerance` on both
    /// sides. Both bounds are inclusive.
    pub fn contains(&self, now: Timestamp, tolerance: u64) -> bool {
        let after_start = self
            .from
            .map_or(true, |from| now >= from.saturating_sub(tolerance));
        let before_end = self
            .until
            .map_or(true, |until| now <= until.saturating_add(tolerance));
        after_start && before_end
    }

    /// Midpoint of a closed window.
    pub fn midpoint(&self) -> Option<Timestamp> {
        match (self.from, self.until) {
            (Some(f), Some(u)) => Some(f + (u - f) / 2),
            _ => None,
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.from, self.until) {
            (Some(from), Some(until)) => write!(f, "[{from}, {until}]"),
            (Some(from), None) => write!(f, "[{from}, ∞)"),
            (None, Some(until)) => write!(f, "(-∞, {until}]"),
            (None, None) => write!(f, "(-∞, ∞)"),
        }
    }
}

/// A command in a transaction. Only the signers and an optional time window
/// matter to the notary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// Contract-defined command name, e.g. `cash.Move`.
    pub name: String,
    /// Keys that must sign the transaction.
    pub signers: Vec<crate::entities::PublicKey>,
    /// Validity interval declared by this command.
    pub time_window: Option<TimeWindow>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            signers: Vec::new(),
            time_window: None,
        }
    }

    pub fn with_signer(mut self, key: crate::entities::PublicKey) -> Self {
        self.signers.push(key);
        self
    }

    pub fn with_time_window(mut self, window: TimeWindow) -> Self {
        self.time_window = Some(window);
        self
    }
}

/// An output of a transaction: the contract state plus the notary that will
/// guard its consumption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionState {
    pub data: StateData,
    pub notary: Party,
}

/// A state paired with the reference that identifies it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateAndRef {
    pub state: TransactionState,
    pub state_ref: StateRef,
}

/// Canonical content of a transaction. Everything except the id.
#[derive(Serialize)]
struct WireTransactionContent<'a> {
    inputs: &'a [StateRef],
    references: &'a [StateRef],
    outputs: &'a [TransactionState],
    commands: &'a [Command],
    notary: &'a Option<Party>,
}

/// A transaction in its wire form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireTransaction {
    /// SHA-256 of the canonical encoding of the remaining fields.
    pub id: Hash,
    /// States consumed by this transaction.
    pub inputs: Vec<StateRef>,
    /// States read but not consumed.
    pub references: Vec<StateRef>,
    /// States produced by this transaction.
    pub outputs: Vec<TransactionState>,
    pub commands: Vec<Command>,
    /// Notary guarding the inputs. Required when there are inputs.
    pub notary: Option<Party>,
}

impl WireTransaction {
    /// Builds a transaction and computes its id.
    pub fn new(
        inputs: Vec<StateRef>,
        references: Vec<StateRef>,
        outputs: Vec<TransactionState>,
        commands: Vec<Command>,
        notary: Option<Party>,
    ) -> Result<Self, EncodingError> {
        let id = Self::compute_id(&inputs, &references, &outputs, &commands, &notary)?;
        Ok(Self {
            id,
            inputs,
            references,
            outputs,
            commands,
            notary,
        })
    }

    /// Hashes the canonical content.
    pub fn compute_id(
        inputs: &[StateRef],
        references: &[StateRef],
        outputs: &[TransactionState],
        commands: &[Command],
        notary: &Option<Party>,
    ) -> Result<Hash, EncodingError> {
        let content = WireTransactionContent {
            inputs,
            references,
            outputs,
            commands,
            notary,
        };
        let bytes = bincode::serialize(&content).map_err(|e| EncodingError {
            message: e.to_string(),
        })?;
        Ok(Sha256::digest(&bytes).into())
    }

    /// True if the stored id matches the content.
    pub fn has_valid_id(&self) -> bool {
        Self::compute_id(
            &self.inputs,
            &self.references,
            &self.outputs,
            &self.commands,
            &self.notary,
        )
        .map(|id| id == self.id)
        .unwrap_or(false)
    }

    /// Every time window declared by the commands.
    pub fn time_windows(&self) -> Vec<&TimeWindow> {
        self.commands
            .iter()
            .filter_map(|c| c.time_window.as_ref())
            .collect()
    }

    /// Reference to output `index`.
    pub fn out_ref(&self, index: u32) -> Option<StateAndRef> {
        self.outputs.get(index as usize).map(|state| StateAndRef {
            state: state.clone(),
            state_ref: StateRef::new(self.id, index),
        })
    }

    /// All outputs paired with their references.
    pub fn out_refs(&self) -> Vec<StateAndRef> {
        self.outputs
            .iter()
            .enumerate()
            .map(|(i, state)| StateAndRef {
                state: state.clone(),
                state_ref: StateRef::new(self.id, i as u32),
            })
            .collect()
    }
}
