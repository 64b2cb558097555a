//! Request and response payloads exchanged with requesting nodes.

use crate::domain::NotarySignature;
use crate::error::{NotaryError, NotaryResult};
use serde::{Deserialize, Serialize};
use shared_types::{Party, WireTransaction};

/// Sent by a node that wants its transaction notarised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotarisationRequest {
    pub wire_transaction: WireTransaction,
    /// Identity of the requesting node.
    pub caller: Party,
}

/// The notary's answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotarisationResponse {
    Signed(NotarySignature),
    Error(NotaryError),
}

impl NotarisationResponse {
    pub fn into_result(self) -> NotaryResult<NotarySignature> {
        match self {
            NotarisationResponse::Signed(signature) => Ok(signature),
            NotarisationResponse::Error(e) => Err(e),
        }
    }
}

impl From<NotaryResult<NotarySignature>> for NotarisationResponse {
    fn from(result: NotaryResult<NotarySignature>) -> Self {
        match result {
            Ok(signature) => NotarisationResponse::Signed(signature),
            Err(e) => NotarisationResponse::Error(e),
        }
    }
}
