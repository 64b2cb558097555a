//! IPC Handler for the Notary subsystem
//!
//! Decodes bincode-framed [`NotarisationRequest`]s, runs them through a
//! [`NotaryApi`] and encodes the [`NotarisationResponse`].

use crate::ipc::messages::{NotarisationRequest, NotarisationResponse};
use crate::ports::inbound::NotaryApi;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Framing failures. Notarisation failures travel inside the response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IpcError {
    #[error("Malformed notarisation request: {0}")]
    MalformedRequest(String),

    #[error("Malformed notarisation response: {0}")]
    MalformedResponse(String),

    #[error("Failed to encode notarisation message: {0}")]
    Encoding(String),
}

/// IPC handler in front of a notary.
pub struct NotaryIpcHandler<N>
where
    N: NotaryApi + ?Sized,
{
    notary: Arc<N>,
}

impl<N> NotaryIpcHandler<N>
where
    N: NotaryApi + ?Sized,
{
    pub fn new(notary: Arc<N>) -> Self {
        Self { notary }
    }

    /// Handle a decoded request.
    pub async fn handle(&self, request: NotarisationRequest) -> NotarisationResponse {
        self.notary
            .notarise(request.wire_transaction, request.caller)
            .await
            .into()
    }

    /// Handle a bincode-encoded request and return the encoded response.
    pub async fn handle_bytes(&self, bytes: &[u8]) -> Result<Vec<u8>, IpcError> {
        let request: NotarisationRequest = bincode::deserialize(bytes).map_err(|e| {
            warn!(error = %e, len = bytes.len(), "Dropping malformed notarisation request");
            IpcError::MalformedRequest(e.to_string())
        })?;
        debug!(caller = %request.caller, "Notarisation request received");

        let response = self.handle(request).await;
        bincode::serialize(&response).map_err(|e| IpcError::Encoding(e.to_string()))
    }
}

/// Encodes a request for [`NotaryIpcHandler::handle_bytes`].
pub fn encode_request(request: &NotarisationRequest) -> Result<Vec<u8>, IpcError> {
    bincode::serialize(request).map_err(|e| IpcError::Encoding(e.to_string()))
}

/// Decodes the bytes returned by [`NotaryIpcHandler::handle_bytes`].
pub fn decode_response(bytes: &[u8]) -> Result<NotarisationResponse, IpcError> {
    bincode::deserialize(bytes).map_err(|e| IpcError::MalformedResponse(e.to_string()))
}
