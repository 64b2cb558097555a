//! # Error Types
//!
//! Construction errors for the shared value types.

use thiserror::Error;

/// Errors raised while building a [`crate::TimeWindow`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeWindowError {
    /// Neither bound was supplied.
    #[error("Time window must have at least one bound")]
    Unbounded,

    /// `from` is after `until`.
    #[error("Time window start {from} is after its end {until}")]
    Inverted { from: u64, until: u64 },
}

/// Errors raised while encoding a value for hashing or storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Encoding failed: {message}")]
pub struct EncodingError {
    pub message: String,
}
