//! Notary signatures over transaction ids.

use serde::{Deserialize, Serialize};
use shared_crypto::{CryptoError, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
use shared_types::{DigitalSignature, Hash, Party};

/// The notary's attestation that a transaction's inputs were unconsumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotarySignature {
    /// Transaction the signature covers.
    pub tx_id: Hash,
    /// Notary identity that signed.
    pub notary: Party,
    pub signature: DigitalSignature,
}

impl NotarySignature {
    /// Signs `tx_id` with the notary key.
    pub fn sign(key: &Ed25519KeyPair, notary: Party, tx_id: Hash) -> Self {
        let signature = key.sign(&tx_id);
        Self {
            tx_id,
            notary,
            signature: DigitalSignature {
                by: *key.public_key().as_bytes(),
                bytes: *signature.as_bytes(),
            },
        }
    }

    /// Checks that this is a valid signature by the named notary over `tx_id`.
    pub fn verify(&self, tx_id: &Hash) -> Result<(), CryptoError> {
        if &self.tx_id != tx_id || self.signature.by != self.notary.owning_key {
            return Err(CryptoError::SignatureVerificationFailed);
        }
        let key = Ed25519PublicKey::from_bytes(self.signature.by)?;
        key.verify(tx_id, &Ed25519Signature::from_bytes(self.signature.bytes))
    }
}
