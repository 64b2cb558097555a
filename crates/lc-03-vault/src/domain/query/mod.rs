//! Vault queries: criteria, paging, sorting and evaluation.

pub mod criteria;
pub mod engine;
pub mod paging;
pub mod sort;

pub use criteria::{
    like, AggregateFunction, AggregateSpec, ColumnPredicate, QueryCriteria, RelevancyFilter,
    SoftLockingCondition, SoftLockingKind, StatusFilter, VaultQueryCriteria,
};
pub use engine::{run_query, AggregateRow, AggregateValue, Page};
pub use paging::{PageSpecification, DEFAULT_PAGE_NUM, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use sort::{Sort, SortAttribute, SortColumn, SortDirection};
