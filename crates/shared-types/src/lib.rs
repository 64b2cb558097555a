//! # Shared Types Crate
//!
//! Ledger value types shared by the notary (`lc-02-notary`), the uniqueness
//! provider (`lc-01-uniqueness`), the vault (`lc-03-vault`) and the update
//! feed (`shared-bus`).
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Every type that crosses a subsystem boundary
//!   lives here.
//! - **Pure Values**: Nothing in this crate performs I/O or holds locks.
//! - **Structural Identity**: A [`StateRef`] is equal to another exactly when
//!   both the transaction id and the output index match.
//!
//! ## Clusters
//!
//! | Module | Contents |
//! |--------|----------|
//! | `entities` | `Hash`, `Timestamp`, `StateRef`, `DigitalSignature` |
//! | `identity` | `Party`, `PartyName`, network-map registrations |
//! | `state` | `StateData`, `ColumnValue` |
//! | `transaction` | `TimeWindow`, `Command`, `WireTransaction` |
//! | `vault` | `VaultUpdate`, `UpdateType` |
//! | `errors` | construction errors for the value types |

pub mod entities;
pub mod errors;
pub mod identity;
pub mod state;
pub mod transaction;
pub mod vault;

pub use entities::*;
pub use errors::*;
pub use identity::*;
pub use state::*;
pub use transaction::*;
pub use vault::*;
