//! # Contract State Payloads
//!
//! The vault never interprets contract logic. It sees a state as a type name,
//! a participant list, an optional linear id and a flat map of named columns.
//! The columns stand in for per-schema mapped tables and are what custom
//! query predicates, aggregates and sort attributes address.

use crate::entities::Timestamp;
use crate::identity::Party;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// A single mapped column value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnValue {
    Int(i64),
    Text(String),
    Bool(bool),
    Time(Timestamp),
}

impl ColumnValue {
    /// Compares two values of the same kind. Values of different kinds are
    /// incomparable.
    pub fn compare(&self, other: &ColumnValue) -> Option<Ordering> {
        match (self, other) {
            (ColumnValue::Int(a), ColumnValue::Int(b)) => Some(a.cmp(b)),
            (ColumnValue::Text(a), ColumnValue::Text(b)) => Some(a.cmp(b)),
            (ColumnValue::Bool(a), ColumnValue::Bool(b)) => Some(a.cmp(b)),
            (ColumnValue::Time(a), ColumnValue::Time(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Numeric view used by SUM/AVG aggregates.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ColumnValue::Int(v) => Some(*v),
            ColumnValue::Time(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ColumnValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for ColumnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnValue::Int(v) => write!(f, "{v}"),
            ColumnValue::Text(v) => write!(f, "{v}"),
            ColumnValue::Bool(v) => write!(f, "{v}"),
            ColumnValue::Time(v) => write!(f, "{v}ms"),
        }
    }
}

impl From<i64> for ColumnValue {
    fn from(v: i64) -> Self {
        ColumnValue::Int(v)
    }
}

impl From<i32> for ColumnValue {
    fn from(v: i32) -> Self {
        ColumnValue::Int(i64::from(v))
    }
}

impl From<&str> for ColumnValue {
    fn from(v: &str) -> Self {
        ColumnValue::Text(v.to_string())
    }
}

impl From<String> for ColumnValue {
    fn from(v: String) -> Self {
        ColumnValue::Text(v)
    }
}

impl From<bool> for ColumnValue {
    fn from(v: bool) -> Self {
        ColumnValue::Bool(v)
    }
}

/// Contract state as stored in a transaction output and in the vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateData {
    /// Fully qualified contract state type, e.g. `cash.CashState`.
    pub contract_state_type: String,
    /// Parties that must be informed about the state.
    pub participants: Vec<Party>,
    /// Present for linear states that evolve through a chain of transactions.
    pub linear_id: Option<Uuid>,
    /// Mapped schema columns.
    pub fields: BTreeMap<String, ColumnValue>,
}

impl StateData {
    pub fn new(contract_state_type: impl Into<String>) -> Self {
        Self {
            contract_state_type: contract_state_type.into(),
            participants: Vec::new(),
            linear_id: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_participant(mut self, party: Party) -> Self {
        self.participants.push(party);
        self
    }

    pub fn with_linear_id(mut self, linear_id: Uuid) -> Self {
        self.linear_id = Some(linear_id);
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<ColumnValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&ColumnValue> {
        self.fields.get(name)
    }
}
