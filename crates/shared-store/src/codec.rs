//! Value encoding. Every record is a bincode-encoded serde struct.

use crate::error::KVStoreError;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encodes a record for storage.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, KVStoreError> {
    bincode::serialize(value).map_err(|e| KVStoreError::Serialization {
        message: e.to_string(),
    })
}

/// Decodes a stored record.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, KVStoreError> {
    bincode::deserialize(bytes).map_err(|e| KVStoreError::Serialization {
        message: e.to_string(),
    })
}
