//! Ports for the uniqueness provider.
//!
//! The only driven dependency is `shared_store::KeyValueStore`, injected
//! directly into the service.

pub mod inbound;
