//! Query criteria.
//!
//! Criteria are plain values evaluated against [`VaultStateRecord`]s. They
//! compose with [`QueryCriteria::and`] and [`QueryCriteria::or`].

use crate::domain::record::{Relevancy, StateStatus, VaultStateRecord};
use crate::error::VaultQueryError;
use serde::{Deserialize, Serialize};
use shared_types::{ColumnValue, Party, StateRef};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use uuid::Uuid;

/// Which consumption states a query selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StatusFilter {
    #[default]
    Unconsumed,
    Consumed,
    All,
}

impl StatusFilter {
    pub fn matches(self, status: StateStatus) -> bool {
        match self {
            StatusFilter::Unconsumed => status == StateStatus::Unconsumed,
            StatusFilter::Consumed => status == StateStatus::Consumed,
            StatusFilter::All => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RelevancyFilter {
    Relevant,
    NotRelevant,
    #[default]
    All,
}

impl RelevancyFilter {
    pub fn matches(self, relevancy: Relevancy) -> bool {
        match self {
            RelevancyFilter::Relevant => relevancy == Relevancy::Relevant,
            RelevancyFilter::NotRelevant => relevancy == Relevancy::NotRelevant,
            RelevancyFilter::All => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoftLockingKind {
    /// No lock held.
    UnlockedOnly,
    /// Any lock held.
    LockedOnly,
    /// Held by one of the listed locks.
    Specified,
    /// Unlocked, or held by one of the listed locks.
    UnlockedAndSpecified,
}

/// Soft-lock filter. The two `Specified` kinds need at least one lock id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftLockingCondition {
    pub kind: SoftLockingKind,
    pub lock_ids: Vec<Uuid>,
}

impl SoftLockingCondition {
    pub fn unlocked_only() -> Self {
        Self {
            kind: SoftLockingKind::UnlockedOnly,
            lock_ids: Vec::new(),
        }
    }

    pub fn locked_only() -> Self {
        Self {
            kind: SoftLockingKind::LockedOnly,
            lock_ids: Vec::new(),
        }
    }

    pub fn specified(lock_ids: Vec<Uuid>) -> Self {
        Self {
            kind: SoftLockingKind::Specified,
            lock_ids,
        }
    }

    pub fn unlocked_and_specified(lock_ids: Vec<Uuid>) -> Self {
        Self {
            kind: SoftLockingKind::UnlockedAndSpecified,
            lock_ids,
        }
    }

    fn validate(&self) -> Result<(), VaultQueryError> {
        match self.kind {
            SoftLockingKind::Specified | SoftLockingKind::UnlockedAndSpecified
                if self.lock_ids.is_empty() =>
            {
                Err(VaultQueryError::InvalidCriteria {
                    reason: "Must specify one or more lockIds".into(),
                })
            }
            _ => Ok(()),
        }
    }

    pub fn matches(&self, lock_id: Option<Uuid>) -> bool {
        match (self.kind, lock_id) {
            (SoftLockingKind::UnlockedOnly, held) => held.is_none(),
            (SoftLockingKind::LockedOnly, held) => held.is_some(),
            (SoftLockingKind::Specified, Some(held)) => self.lock_ids.contains(&held),
            (SoftLockingKind::Specified, None) => false,
            (SoftLockingKind::UnlockedAndSpecified, None) => true,
            (SoftLockingKind::UnlockedAndSpecified, Some(held)) => self.lock_ids.contains(&held),
        }
    }
}

/// Filters on the vault's own columns. Unset lists do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultQueryCriteria {
    pub status: StatusFilter,
    pub contract_state_types: Option<BTreeSet<String>>,
    pub state_refs: Option<Vec<StateRef>>,
    pub notaries: Option<Vec<Party>>,
    /// Matches states with any of these participants.
    pub participants: Option<Vec<Party>>,
    pub linear_ids: Option<Vec<Uuid>>,
    pub relevancy: RelevancyFilter,
    pub soft_locking: Option<SoftLockingCondition>,
}

impl VaultQueryCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    pub fn with_contract_state_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.contract_state_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_state_refs(mut self, state_refs: Vec<StateRef>) -> Self {
        self.state_refs = Some(state_refs);
        self
    }

    pub fn with_notaries(mut self, notaries: Vec<Party>) -> Self {
        self.notaries = Some(notaries);
        self
    }

    pub fn with_participants(mut self, participants: Vec<Party>) -> Self {
        self.participants = Some(participants);
        self
    }

    pub fn with_linear_ids(mut self, linear_ids: Vec<Uuid>) -> Self {
        self.linear_ids = Some(linear_ids);
        self
    }

    pub fn with_relevancy(mut self, relevancy: RelevancyFilter) -> Self {
        self.relevancy = relevancy;
        self
    }

    pub fn with_soft_locking(mut self, condition: SoftLockingCondition) -> Self {
        self.soft_locking = Some(condition);
        self
    }

    fn matches(&self, record: &VaultStateRecord) -> bool {
        let data = &record.state.data;
        self.status.matches(record.status)
            && self.relevancy.matches(record.relevancy)
            && self
                .contract_state_types
                .as_ref()
                .map_or(true, |types| types.contains(&data.contract_state_type))
            && self
                .state_refs
                .as_ref()
                .map_or(true, |refs| refs.contains(&record.state_ref))
            && self
                .notaries
                .as_ref()
                .map_or(true, |notaries| notaries.contains(record.notary()))
            && self.participants.as_ref().map_or(true, |wanted| {
                data.participants.iter().any(|p| wanted.contains(p))
            })
            && self.linear_ids.as_ref().map_or(true, |ids| {
                data.linear_id.map_or(false, |id| ids.contains(&id))
            })
            && self
                .soft_locking
                .as_ref()
                .map_or(true, |condition| condition.matches(record.lock_id))
    }
}

/// Predicate over a custom column. Comparisons against a value of a
/// different kind, or against a missing column, are false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnPredicate {
    Equal(ColumnValue),
    NotEqual(ColumnValue),
    LessThan(ColumnValue),
    LessThanOrEqual(ColumnValue),
    GreaterThan(ColumnValue),
    GreaterThanOrEqual(ColumnValue),
    Between(ColumnValue, ColumnValue),
    In(Vec<ColumnValue>),
    NotIn(Vec<ColumnValue>),
    /// SQL pattern: `%` matches any run, `_` one character.
    Like(String),
    NotLike(String),
    IsNull,
    NotNull,
}

impl ColumnPredicate {
    pub fn evaluate(&self, value: Option<&ColumnValue>) -> bool {
        let Some(value) = value else {
            return matches!(self, ColumnPredicate::IsNull);
        };
        let ordered = |bound: &ColumnValue, accept: fn(Ordering) -> bool| {
            value.compare(bound).map_or(false, accept)
        };
        match self {
            ColumnPredicate::Equal(v) => value == v,
            ColumnPredicate::NotEqual(v) => value.compare(v).map_or(false, Ordering::is_ne),
            ColumnPredicate::LessThan(v) => ordered(v, Ordering::is_lt),
            ColumnPredicate::LessThanOrEqual(v) => ordered(v, Ordering::is_le),
            ColumnPredicate::GreaterThan(v) => ordered(v, Ordering::is_gt),
            ColumnPredicate::GreaterThanOrEqual(v) => ordered(v, Ordering::is_ge),
            ColumnPredicate::Between(low, high) => {
                ordered(low, Ordering::is_ge) && ordered(high, Ordering::is_le)
            }
            ColumnPredicate::In(values) => values.contains(value),
            ColumnPredicate::NotIn(values) => !values.contains(value),
            ColumnPredicate::Like(pattern) => value.as_str().map_or(false, |s| like(pattern, s)),
            ColumnPredicate::NotLike(pattern) => {
                value.as_str().map_or(false, |s| !like(pattern, s))
            }
            ColumnPredicate::IsNull => false,
            ColumnPredicate::NotNull => true,
        }
    }
}

/// SQL `LIKE` over characters.
pub fn like(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    // matched[j]: pattern[..i] matches text[..j]
    let mut matched = vec![false; text.len() + 1];
    matched[0] = true;
    for p in &pattern {
        let mut next = vec![false; text.len() + 1];
        match p {
            '%' => {
                let mut any = false;
                for j in 0..=text.len() {
                    any |= matched[j];
                    next[j] = any;
                }
            }
            _ => {
                for j in 1..=text.len() {
                    next[j] = matched[j - 1] && (*p == '_' || *p == text[j - 1]);
                }
            }
        }
        matched = next;
    }
    matched[text.len()]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregateFunction {
    Count,
    Sum,
    Min,
    Max,
    Avg,
}

impl AggregateFunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateFunction::Count => "count",
            AggregateFunction::Sum => "sum",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
            AggregateFunction::Avg => "avg",
        }
    }
}

/// An aggregate requested somewhere in a criteria tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateSpec {
    pub function: AggregateFunction,
    pub column: String,
    pub group_by: Vec<String>,
}

/// A composable vault query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryCriteria {
    Vault(VaultQueryCriteria),
    /// A predicate over one custom column of the state data.
    Custom {
        column: String,
        predicate: ColumnPredicate,
        status: StatusFilter,
    },
    /// Selects by status and asks for an aggregate over the selection.
    Aggregate {
        function: AggregateFunction,
        column: String,
        group_by: Vec<String>,
        status: StatusFilter,
    },
    And(Box<QueryCriteria>, Box<QueryCriteria>),
    Or(Box<QueryCriteria>, Box<QueryCriteria>),
}

impl Default for QueryCriteria {
    fn default() -> Self {
        QueryCriteria::Vault(VaultQueryCriteria::default())
    }
}

impl From<VaultQueryCriteria> for QueryCriteria {
    fn from(criteria: VaultQueryCriteria) -> Self {
        QueryCriteria::Vault(criteria)
    }
}

impl QueryCriteria {
    pub fn custom(column: impl Into<String>, predicate: ColumnPredicate) -> Self {
        QueryCriteria::Custom {
            column: column.into(),
            predicate,
            status: StatusFilter::Unconsumed,
        }
    }

    pub fn aggregate(function: AggregateFunction, column: impl Into<String>) -> Self {
        QueryCriteria::Aggregate {
            function,
            column: column.into(),
            group_by: Vec::new(),
            status: StatusFilter::Unconsumed,
        }
    }

    pub fn grouped_by<I, S>(self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match self {
            QueryCriteria::Aggregate {
                function,
                column,
                status,
                ..
            } => QueryCriteria::Aggregate {
                function,
                column,
                group_by: columns.into_iter().map(Into::into).collect(),
                status,
            },
            other => other,
        }
    }

    pub fn and(self, other: impl Into<QueryCriteria>) -> Self {
        QueryCriteria::And(Box::new(self), Box::new(other.into()))
    }

    pub fn or(self, other: impl Into<QueryCriteria>) -> Self {
        QueryCriteria::Or(Box::new(self), Box::new(other.into()))
    }

    pub fn validate(&self) -> Result<(), VaultQueryError> {
        match self {
            QueryCriteria::Vault(criteria) => criteria
                .soft_locking
                .as_ref()
                .map_or(Ok(()), SoftLockingCondition::validate),
            QueryCriteria::Custom { column, .. } | QueryCriteria::Aggregate { column, .. }
                if column.is_empty() =>
            {
                Err(VaultQueryError::InvalidCriteria {
                    reason: "Column name must not be empty".into(),
                })
            }
            QueryCriteria::Custom { .. } | QueryCriteria::Aggregate { .. } => Ok(()),
            QueryCriteria::And(left, right) | QueryCriteria::Or(left, right) => {
                left.validate()?;
                right.validate()
            }
        }
    }

    pub fn matches(&self, record: &VaultStateRecord) -> bool {
        match self {
            QueryCriteria::Vault(criteria) => criteria.matches(record),
            QueryCriteria::Custom {
                column,
                predicate,
                status,
            } => status.matches(record.status) && predicate.evaluate(record.state.data.field(column)),
            QueryCriteria::Aggregate { status, .. } => status.matches(record.status),
            QueryCriteria::And(left, right) => left.matches(record) && right.matches(record),
            QueryCriteria::Or(left, right) => left.matches(record) || right.matches(record),
        }
    }

    /// Aggregates requested anywhere in the tree, left to right.
    pub fn aggregates(&self) -> Vec<AggregateSpec> {
        let mut found = Vec::new();
        self.collect_aggregates(&mut found);
        found
    }

    fn collect_aggregates(&self, found: &mut Vec<AggregateSpec>) {
        match self {
            QueryCriteria::Aggregate {
                function,
                column,
                group_by,
                ..
            } => found.push(AggregateSpec {
                function: *function,
                column: column.clone(),
                group_by: group_by.clone(),
            }),
            QueryCriteria::And(left, right) | QueryCriteria::Or(left, right) => {
                left.collect_aggregates(found);
                right.collect_aggregates(found);
            }
            _ => {}
        }
    }

    /// Status the query selects. Composites whose branches disagree select
    /// `All`.
    pub fn status_filter(&self) -> StatusFilter {
        match self {
            QueryCriteria::Vault(criteria) => criteria.status,
            QueryCriteria::Custom { status, .. } | QueryCriteria::Aggregate { status, .. } => {
                *status
            }
            QueryCriteria::And(left, right) | QueryCriteria::Or(left, right) => {
                let (left, right) = (left.status_filter(), right.status_filter());
                if left == right {
                    left
                } else {
                    StatusFilter::All
                }
            }
        }
    }

    /// Contract state types the query can return, `None` when unrestricted.
    pub fn contract_state_types(&self) -> Option<BTreeSet<String>> {
        match self {
            QueryCriteria::Vault(criteria) => criteria.contract_state_types.clone(),
            QueryCriteria::Custom { .. } | QueryCriteria::Aggregate { .. } => None,
            QueryCriteria::And(left, right) => {
                match (left.contract_state_types(), right.contract_state_types()) {
                    (Some(l), Some(r)) => Some(l.intersection(&r).cloned().collect()),
                    (Some(types), None) | (None, Some(types)) => Some(types),
                    (None, None) => None,
                }
            }
            QueryCriteria::Or(left, right) => {
                match (left.contract_state_types(), right.contract_state_types()) {
                    (Some(l), Some(r)) => Some(l.union(&r).cloned().collect()),
                    _ => None,
                }
            }
        }
    }
}
