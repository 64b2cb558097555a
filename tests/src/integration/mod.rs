//! # Integration Tests
//!
//! Flows that cross crate boundaries, and the concurrency properties the
//! uniqueness provider and soft-lock manager must hold under racing
//! threads.

pub mod concurrency;
pub mod notarisation;
pub mod uniqueness;
pub mod vault;
