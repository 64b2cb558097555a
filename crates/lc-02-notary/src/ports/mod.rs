//! Ports for the notary (hexagonal architecture).

pub mod inbound;
pub mod outbound;
