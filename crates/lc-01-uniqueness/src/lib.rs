//! # Uniqueness Provider Subsystem
//!
//! Guarantees that every ledger state is consumed by at most one transaction.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                    LC-01 UNIQUENESS PROVIDER                      │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  commit(inputs, references, tx_id, requestor)                    │
//! │           │                                                      │
//! │           ▼                                                      │
//! │  ┌─────────────────┐   duplicate input ──→ self-conflict         │
//! │  │ duplicate scan  │                                             │
//! │  └────────┬────────┘                                             │
//! │           ▼                                                      │
//! │  ┌─────────────────┐  multi_get(n:cs:<ref>…)                     │
//! │  │ read conflicts  │ ◄──────────────────────── KeyValueStore     │
//! │  └────────┬────────┘                                             │
//! │           ▼                                                      │
//! │  ┌─────────────────┐  Conflict │ AlreadyCommitted │ Commit        │
//! │  │     decide      │                                             │
//! │  └────────┬────────┘                                             │
//! │           ▼ Commit                                               │
//! │  conditional_batch_write(Absent(n:cs:<ref>)…, Put…) ─────────┐   │
//! │           ▲                                                  │   │
//! │           └────────── PreconditionFailed (bounded retry) ◄───┘   │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//!
//! | Property | Mechanism |
//! |----------|-----------|
//! | No double spend | `Absent` precondition per input, checked under the store write lock |
//! | No partial commit | One conditional batch per commit |
//! | Idempotence | Inputs already consumed by the same tx id are not conflicts |
//! | Crash safety | Durable adapters apply the batch atomically |
//!
//! ## Persisted Layout
//!
//! | Prefix | Key suffix | Value |
//! |--------|-----------|-------|
//! | `n:cs:` | `StateRef` key bytes | [`ConsumingTx`] |
//! | `n:tx:` | transaction id | [`CommitRequest`] of the commit |
//! | `n:rl:` | request time ‖ request id | [`CommitRequest`] |

pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use config::UniquenessConfig;
pub use domain::{
    CommitDecision, CommitOutcome, CommitRequest, ConsumingTx, UniquenessConflict,
};
pub use error::{UniquenessError, UniquenessResult};
pub use ports::inbound::UniquenessProvider;
pub use service::{InMemoryUniquenessProvider, PersistentUniquenessProvider};
