//! # Notary Service Subsystem
//!
//! Signs transactions whose inputs have not been spent before.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                       LC-02 NOTARY SERVICE                        │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  NotarisationRequest (bincode) ──→ NotaryIpcHandler              │
//! │                                          │                       │
//! │                                          ▼                       │
//! │  ┌────────────┐   ┌─────────────────┐   ┌────────────────────┐   │
//! │  │  Received  │──→│ TimeWindowCheck │──→│ ContractValidation │   │
//! │  │ (notary?)  │   │   (TimeSource)  │   │  (validating only) │   │
//! │  └────────────┘   └─────────────────┘   └─────────┬──────────┘   │
//! │                                                   ▼              │
//! │  ┌────────────┐   ┌─────────────────────────────────────────┐    │
//! │  │   Signed   │◄──│ UniquenessCheck (lc-01 commit)          │    │
//! │  │ (Ed25519)  │   └─────────────────────────────────────────┘    │
//! │  └────────────┘                                                  │
//! │        any failure ──→ Rejected ──→ NotarisationResponse::Error  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Error Semantics
//!
//! | Error | Retry? |
//! |-------|--------|
//! | `WrongNotary` | no |
//! | `TimestampInvalid` / `MoreThanOneTimestamp` | no |
//! | `TransactionInvalid` | no, conflict table untouched |
//! | `Conflict` | no, definitive |
//! | `ServiceUnavailable` | yes |
//!
//! ## Identity
//!
//! The notary's `Party` is looked up by legal name in the network map cache
//! when the service is built. A missing registration, or one whose key is
//! not the signing key, fails construction with `IdentityError`.
//!
//! ## Events
//!
//! Every request publishes either `TransactionNotarised` or
//! `NotarisationRejected` on the bus.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod ipc;
pub mod ports;
pub mod service;

pub use adapters::{
    InMemoryNetworkMapCache, InMemoryTransactionStore, ManualTimeSource,
    PersistentTransactionStore, StructuralVerifier, SystemTimeSource,
};
pub use config::{NotaryConfig, NotaryKind};
pub use domain::{NotarisationPhase, NotarySignature};
pub use error::{IdentityError, NotaryError, NotaryResult};
pub use ipc::{NotarisationRequest, NotarisationResponse, NotaryIpcHandler};
pub use ports::inbound::NotaryApi;
pub use ports::outbound::{
    NetworkMapCache, TimeSource, TransactionResolver, TransactionVerifier, VerificationError,
};
pub use service::NotaryService;
