//! Ports for the vault (hexagonal architecture).

pub mod inbound;
pub mod outbound;
