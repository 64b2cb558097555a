//! Query evaluation over a set of vault records.

use crate::domain::query::criteria::{AggregateFunction, AggregateSpec, QueryCriteria, StatusFilter};
use crate::domain::query::paging::PageSpecification;
use crate::domain::query::sort::{compare_columns, Sort};
use crate::domain::record::{StateMetadata, VaultStateRecord};
use crate::error::VaultQueryError;
use shared_types::{ColumnValue, StateAndRef};
use std::cmp::Ordering;

/// Value of one aggregate.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregateValue {
    Count(u64),
    /// `SUM`, `MIN` or `MAX` result.
    Value(ColumnValue),
    Average(f64),
    /// No rows in the group had a usable value.
    Null,
}

/// One aggregate result. `group` holds the group-by column values, in the
/// order the columns were named.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRow {
    pub function: AggregateFunction,
    pub column: String,
    pub group: Vec<Option<ColumnValue>>,
    pub value: AggregateValue,
}

/// One page of query results.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub states: Vec<StateAndRef>,
    pub states_metadata: Vec<StateMetadata>,
    /// Matches across all pages, or -1 for an unpaged query.
    pub total_states_available: i64,
    pub state_types: StatusFilter,
    /// Aggregate results. When present, `states` is empty.
    pub other_results: Vec<AggregateRow>,
}

impl Page {
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// Filters, sorts and pages `records`.
pub fn run_query(
    records: Vec<VaultStateRecord>,
    criteria: &QueryCriteria,
    paging: &PageSpecification,
    sort: &Sort,
) -> Result<Page, VaultQueryError> {
    criteria.validate()?;
    paging.validate()?;

    let mut matched: Vec<VaultStateRecord> =
        records.into_iter().filter(|r| criteria.matches(r)).collect();
    let total_states_available = if paging.is_default() {
        -1
    } else {
        matched.len() as i64
    };

    let aggregates = criteria.aggregates();
    if !aggregates.is_empty() {
        let other_results = aggregates
            .iter()
            .flat_map(|spec| aggregate(spec, &matched))
            .collect();
        return Ok(Page {
            states: Vec::new(),
            states_metadata: Vec::new(),
            total_states_available,
            state_types: criteria.status_filter(),
            other_results,
        });
    }

    sort.apply(&mut matched);
    let selected = paging.select(matched)?;

    Ok(Page {
        states: selected.iter().map(VaultStateRecord::to_state_and_ref).collect(),
        states_metadata: selected.iter().map(VaultStateRecord::metadata).collect(),
        total_states_available,
        state_types: criteria.status_filter(),
        other_results: Vec::new(),
    })
}

fn aggregate(spec: &AggregateSpec, records: &[VaultStateRecord]) -> Vec<AggregateRow> {
    let mut groups: Vec<(Vec<Option<ColumnValue>>, Vec<&ColumnValue>)> = Vec::new();

    for record in records {
        let key: Vec<Option<ColumnValue>> = spec
            .group_by
            .iter()
            .map(|column| record.state.data.field(column).cloned())
            .collect();
        let value = record.state.data.field(&spec.column);

        let position = match groups.iter().position(|(k, _)| *k == key) {
            Some(position) => position,
            None => {
                groups.push((key, Vec::new()));
                groups.len() - 1
            }
        };
        if let Some(value) = value {
            groups[position].1.push(value);
        }
    }

    if groups.is_empty() && spec.group_by.is_empty() {
        groups.push((Vec::new(), Vec::new()));
    }

    groups.sort_by(|(a, _), (b, _)| compare_groups(a, b));
    groups
        .into_iter()
        .map(|(group, values)| AggregateRow {
            function: spec.function,
            column: spec.column.clone(),
            group,
            value: evaluate(spec.function, &values),
        })
        .collect()
}

fn compare_groups(a: &[Option<ColumnValue>], b: &[Option<ColumnValue>]) -> Ordering {
    a.iter()
        .zip(b)
        .map(|(x, y)| compare_columns(x.as_ref(), y.as_ref()))
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

fn evaluate(function: AggregateFunction, values: &[&ColumnValue]) -> AggregateValue {
    let numbers: Vec<i64> = values.iter().filter_map(|v| v.as_i64()).collect();
    match function {
        AggregateFunction::Count => AggregateValue::Count(values.len() as u64),
        AggregateFunction::Sum if numbers.is_empty() => AggregateValue::Null,
        AggregateFunction::Sum => AggregateValue::Value(ColumnValue::Int(
            numbers.iter().fold(0i64, |acc, n| acc.saturating_add(*n)),
        )),
        AggregateFunction::Avg if numbers.is_empty() => AggregateValue::Null,
        AggregateFunction::Avg => {
            AggregateValue::Average(numbers.iter().map(|n| *n as f64).sum::<f64>() / numbers.len() as f64)
        }
        AggregateFunction::Min => extreme(values, Ordering::Less),
        AggregateFunction::Max => extreme(values, Ordering::Greater),
    }
}

fn extreme(values: &[&ColumnValue], wanted: Ordering) -> AggregateValue {
    values
        .iter()
        .copied()
        .reduce(|best, next| {
            if compare_columns(Some(next), Some(best)) == wanted {
                next
            } else {
                best
            }
        })
        .map_or(AggregateValue::Null, |v| AggregateValue::Value(v.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::query::criteria::{ColumnPredicate, VaultQueryCriteria};
    use crate::domain::record::Relevancy;
    use shared_types::{Party, StateData, StateRef, TransactionState};

    fn record(index: u32, quantity: i64, currency: &str) -> VaultStateRecord {
        let state = StateAndRef {
            state: TransactionState {
                data: StateData::new("cash.CashState")
                    .with_field("quantity", quantity)
                    .with_field("currency", currency),
                notary: Party::new("O=Notary,L=Zurich,C=CH", [1; 32]),
            },
            state_ref: StateRef::new([4; 32], index),
        };
        VaultStateRecord::unconsumed(state, Relevancy::Relevant, 1)
    }

    fn records(count: u32) -> Vec<VaultStateRecord> {
        (0..count)
            .map(|i| record(i, i64::from(i), if i % 2 == 0 { "GBP" } else { "USD" }))
            .collect()
    }

    #[test]
    fn test_unpaged_limit() {
        let criteria = QueryCriteria::default();
        let page = run_query(records(200), &criteria, &PageSpecification::default(), &Sort::default())
            .unwrap();
        assert_eq!(page.len(), 200);
        assert_eq!(page.total_states_available, -1);

        let err = run_query(records(201), &criteria, &PageSpecification::default(), &Sort::default())
            .unwrap_err();
        assert!(matches!(err, VaultQueryError::TooManyResults { count: 201, .. }));
    }

    #[test]
    fn test_paged_totals() {
        let page = run_query(
            records(250),
            &QueryCriteria::default(),
            &PageSpecification::new(2, 100),
            &Sort::default(),
        )
        .unwrap();
        assert_eq!(page.len(), 100);
        assert_eq!(page.total_states_available, 250);
        assert_eq!(page.states[0].state_ref.index, 100);
        assert_eq!(page.states_metadata.len(), 100);
    }

    #[test]
    fn test_grouped_sum() {
        let criteria = QueryCriteria::aggregate(AggregateFunction::Sum, "quantity")
            .grouped_by(["currency"]);
        let page = run_query(records(6), &criteria, &PageSpecification::default(), &Sort::default())
            .unwrap();

        assert!(page.states.is_empty());
        assert_eq!(page.other_results.len(), 2);
        assert_eq!(page.other_results[0].group, vec![Some(ColumnValue::from("GBP"))]);
        assert_eq!(page.other_results[0].value, AggregateValue::Value(ColumnValue::Int(6)));
        assert_eq!(page.other_results[1].value, AggregateValue::Value(ColumnValue::Int(9)));
    }

    #[test]
    fn test_filtered_aggregates() {
        let gbp = QueryCriteria::custom("currency", ColumnPredicate::Equal("GBP".into()));
        let criteria = gbp
            .and(QueryCriteria::aggregate(AggregateFunction::Max, "quantity"))
            .and(QueryCriteria::aggregate(AggregateFunction::Avg, "quantity"))
            .and(QueryCriteria::aggregate(AggregateFunction::Count, "quantity"));
        let page = run_query(records(5), &criteria, &PageSpecification::default(), &Sort::default())
            .unwrap();

        let values: Vec<_> = page.other_results.iter().map(|r| r.value.clone()).collect();
        assert_eq!(
            values,
            vec![
                AggregateValue::Value(ColumnValue::Int(4)),
                AggregateValue::Average(2.0),
                AggregateValue::Count(3),
            ]
        );
    }

    #[test]
    fn test_aggregate_over_nothing() {
        let criteria = QueryCriteria::from(VaultQueryCriteria::new().with_contract_state_types(["none"]))
            .and(QueryCriteria::aggregate(AggregateFunction::Min, "quantity"));
        let page = run_query(records(3), &criteria, &PageSpecification::default(), &Sort::default())
            .unwrap();
        assert_eq!(page.other_results.len(), 1);
        assert_eq!(page.other_results[0].value, AggregateValue::Null);
    }
}
