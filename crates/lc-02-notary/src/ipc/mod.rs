//! Notary wire protocol.

pub mod handler;
pub mod messages;

pub use handler::{decode_response, encode_request, IpcError, NotaryIpcHandler};
pub use messages::{NotarisationRequest, NotarisationResponse};
