//! # Ledger-Core Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Parties, states and service builders
//! └── integration/      # Cross-crate flows and concurrency properties
//!     ├── uniqueness.rs
//!     ├── notarisation.rs
//!     ├── vault.rs
//!     └── concurrency.rs
//! tests/benches/
//! └── ledger_benchmarks.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p lc-tests
//! cargo test -p lc-tests integration::concurrency::
//! cargo bench -p lc-tests
//! ```

pub mod fixtures;
pub mod integration;
