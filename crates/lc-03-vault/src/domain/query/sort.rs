//! Result ordering.

use crate::domain::record::VaultStateRecord;
use serde::{Deserialize, Serialize};
use shared_types::ColumnValue;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortAttribute {
    StateRef,
    TxId,
    Index,
    Notary,
    ContractStateType,
    Status,
    RecordedTime,
    ConsumedTime,
    LockId,
    LinearId,
    /// A custom column of the state data.
    Custom(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortColumn {
    pub attribute: SortAttribute,
    pub direction: SortDirection,
}

/// Sort order. Missing values sort first when ascending; the state ref
/// breaks remaining ties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub columns: Vec<SortColumn>,
}

impl Sort {
    pub fn by(attribute: SortAttribute, direction: SortDirection) -> Self {
        Self::default().then(attribute, direction)
    }

    pub fn then(mut self, attribute: SortAttribute, direction: SortDirection) -> Self {
        self.columns.push(SortColumn {
            attribute,
            direction,
        });
        self
    }

    pub fn compare(&self, a: &VaultStateRecord, b: &VaultStateRecord) -> Ordering {
        self.columns
            .iter()
            .map(|column| {
                let ordering = compare_attribute(&column.attribute, a, b);
                match column.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| a.state_ref.cmp(&b.state_ref))
    }

    pub fn apply(&self, records: &mut [VaultStateRecord]) {
        records.sort_by(|a, b| self.compare(a, b));
    }
}

fn compare_attribute(attribute: &SortAttribute, a: &VaultStateRecord, b: &VaultStateRecord) -> Ordering {
    match attribute {
        SortAttribute::StateRef => a.state_ref.cmp(&b.state_ref),
        SortAttribute::TxId => a.state_ref.tx_id.cmp(&b.state_ref.tx_id),
        SortAttribute::Index => a.state_ref.index.cmp(&b.state_ref.index),
        SortAttribute::Notary => a.notary().cmp(b.notary()),
        SortAttribute::ContractStateType => a.contract_state_type().cmp(b.contract_state_type()),
        SortAttribute::Status => a.status.cmp(&b.status),
        SortAttribute::RecordedTime => a.recorded_time.cmp(&b.recorded_time),
        SortAttribute::ConsumedTime => a.consumed_time.cmp(&b.consumed_time),
        SortAttribute::LockId => a.lock_id.cmp(&b.lock_id),
        SortAttribute::LinearId => a.state.data.linear_id.cmp(&b.state.data.linear_id),
        SortAttribute::Custom(column) => {
            compare_columns(a.state.data.field(column), b.state.data.field(column))
        }
    }
}

/// Orders optional column values, missing first. Values of different kinds
/// order by kind.
pub(crate) fn compare_columns(a: Option<&ColumnValue>, b: Option<&ColumnValue>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => a.compare(b).unwrap_or_else(|| kind(a).cmp(&kind(b))),
    }
}

fn kind(value: &ColumnValue) -> u8 {
    match value {
        ColumnValue::Int(_) => 0,
        ColumnValue::Text(_) => 1,
        ColumnValue::Bool(_) => 2,
        ColumnValue::Time(_) => 3,
    }
}
