//! # Vault Subsystem
//!
//! The node's local view of ledger states: which are unconsumed, which are
//! consumed, and which are reserved for a transaction being built.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                           LC-03 VAULT                             │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  record_transactions ──→ observe ──┐                              │
//! │                                    ▼                              │
//! │  reserve / release ──→ plan ──→ conditional_batch_write ──→ store │
//! │                                    │               (v:st: rows)   │
//! │                                    ▼                              │
//! │                           VaultUpdate{sequence} ──→ shared-bus    │
//! │                                                          │        │
//! │  query ──→ run_query(criteria, paging, sort) ──→ Page    │        │
//! │  track ──→ snapshot Page + VaultUpdateFeed ◄─────────────┘        │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//!
//! | Operation | Guarantee |
//! |-----------|-----------|
//! | `observe` | atomic; replaying a batch changes nothing and publishes nothing |
//! | `reserve` | all requested states locked, or none; same lock id is idempotent |
//! | `release` | only touches unconsumed states held by the lock |
//! | `query` | unpaged queries matching more than 200 states fail |
//! | `track` | every update after the snapshot delivered exactly once |
//!
//! A consumed state never carries a lock. Locks have no timeout: the flow
//! that reserved them releases them.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod feed;
pub mod ports;
pub mod service;

pub use adapters::{InMemoryKeyManagement, ManualClock, SystemClock};
pub use config::{StatesToRecord, VaultConfig};
pub use domain::query::{
    AggregateFunction, AggregateRow, AggregateValue, ColumnPredicate, Page, PageSpecification,
    QueryCriteria, RelevancyFilter, SoftLockingCondition, Sort, SortAttribute, SortDirection,
    StatusFilter, VaultQueryCriteria,
};
pub use domain::{Observation, Relevancy, StateMetadata, StateStatus, VaultStateRecord};
pub use error::{SoftLockError, VaultError, VaultQueryError, VaultResult};
pub use feed::{DataFeed, VaultUpdateFeed};
pub use ports::inbound::VaultApi;
pub use ports::outbound::{Clock, KeyManagement};
pub use service::VaultService;
