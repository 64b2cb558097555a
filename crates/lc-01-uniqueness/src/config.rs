//! Uniqueness provider configuration.

use std::env;

/// Configuration for a [`crate::PersistentUniquenessProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniquenessConfig {
    /// Optimistic attempts before a commit gives up with
    /// `KVStoreError::Contention`.
    pub max_commit_retries: u32,

    /// Append every request to the `n:rl:` audit log.
    pub record_requests: bool,
}

impl Default for UniquenessConfig {
    fn default() -> Self {
        Self {
            max_commit_retries: 16,
            record_requests: true,
        }
    }
}

impl UniquenessConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `LC_UNIQUENESS_MAX_RETRIES`: optimistic attempts (default: 16)
    /// - `LC_UNIQUENESS_REQUEST_LOG`: keep the request log (default: true)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_commit_retries: env::var("LC_UNIQUENESS_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_commit_retries),

            record_requests: env::var("LC_UNIQUENESS_REQUEST_LOG")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(defaults.record_requests),
        }
    }

    /// Attempts actually made. A zero setting still makes one attempt.
    pub fn attempts(&self) -> u32 {
        self.max_commit_retries.max(1)
    }
}
