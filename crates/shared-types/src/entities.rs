//! # Core Ledger Entities
//!
//! The identity of a single transaction output and the primitive aliases used
//! to describe it.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use std::fmt;

/// A 32-byte SHA-256 hash (transaction ids).
pub type Hash = [u8; 32];

/// Milliseconds since the UNIX epoch.
pub type Timestamp = u64;

/// A 64-byte Ed25519 signature.
pub type Signature = [u8; 64];

/// A 32-byte Ed25519 public key.
pub type PublicKey = [u8; 32];

/// Length of the canonical key encoding of a [`StateRef`].
pub const STATE_REF_KEY_LEN: usize = 36;

/// Hex rendering of the first four bytes of a hash, for log lines.
pub fn short_hex(hash: &Hash) -> String {
    hex::encode(&hash[..4])
}

/// Identifier of one output slot of one transaction.
///
/// Ordering is by transaction id first, then by output index, which matches
/// the byte ordering of [`StateRef::to_key_bytes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateRef {
    /// Id of the transaction that produced the state.
    pub tx_id: Hash,
    /// Position of the state in that transaction's outputs.
    pub index: u32,
}

impl StateRef {
    /// Creates a new state reference.
    pub fn new(tx_id: Hash, index: u32) -> Self {
        Self { tx_id, index }
    }

    /// Canonical storage key: `tx_id ‖ index (big-endian)`.
    ///
    /// A prefix scan over a transaction id therefore yields that
    /// transaction's outputs in index order.
    pub fn to_key_bytes(&self) -> [u8; STATE_REF_KEY_LEN] {
        let mut out = [0u8; STATE_REF_KEY_LEN];
        out[..32].copy_from_slice(&self.tx_id);
        out[32..].copy_from_slice(&self.index.to_be_bytes());
        out
    }

    /// Decodes the canonical storage key. Returns `None` on a length mismatch.
    pub fn from_key_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != STATE_REF_KEY_LEN {
            return None;
        }
        let mut tx_id = [0u8; 32];
        tx_id.copy_from_slice(&bytes[..32]);
        let index = u32::from_be_bytes(bytes[32..].try_into().ok()?);
        Some(Self { tx_id, index })
    }
}

impl fmt::Display for StateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", hex::encode(self.tx_id), self.index)
    }
}

/// A signature together with the key that produced it.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitalSignature {
    /// Public key of the signer.
    pub by: PublicKey,
    /// Raw Ed25519 signature bytes.
    #[serde_as(as = "Bytes")]
    pub bytes: Signature,
}
