//! Driving Ports (API - Inbound)

use crate::domain::NotarySignature;
use crate::error::NotaryResult;
use async_trait::async_trait;
use shared_types::{Party, WireTransaction};

/// Primary notary API.
#[async_trait]
pub trait NotaryApi: Send + Sync {
    /// Notarise a transaction on behalf of `caller`.
    ///
    /// Returns the notary's signature over the transaction id, or the reason
    /// the transaction was refused. A `Conflict` is definitive; only
    /// `ServiceUnavailable` is worth retrying.
    async fn notarise(
        &self,
        wire_tx: WireTransaction,
        caller: Party,
    ) -> NotaryResult<NotarySignature>;

    /// The identity this notary signs as.
    fn notary_identity(&self) -> Party;
}
