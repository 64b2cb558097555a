//! # Node Runtime Library
//!
//! Configuration and wiring for a ledger-core node. The `main.rs` binary is
//! a thin shell around [`LedgerNode`].
//!
//! ## Startup Sequence
//!
//! 1. Load [`NodeConfig`] from the environment
//! 2. Initialise logging and metrics
//! 3. Validate the configuration (a durable store needs a fixed notary key)
//! 4. Open the store, register the node's identity in the network map cache,
//!    then build uniqueness, notary and vault on top of the store
//! 5. Start the audit log and signal ready

pub mod audit;
pub mod config;
pub mod node;

pub use audit::spawn_audit_log;
pub use config::{ConfigError, NodeConfig};
pub use node::{LedgerNode, NodeError};
