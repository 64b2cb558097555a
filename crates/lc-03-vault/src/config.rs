//! Vault configuration.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Which outputs of a recorded transaction the vault keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatesToRecord {
    /// Record nothing.
    None,
    /// Only outputs with at least one participant key held by this node.
    OnlyRelevant,
    /// Every output.
    AllVisible,
}

impl StatesToRecord {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "none" => Some(StatesToRecord::None),
            "onlyrelevant" | "relevant" => Some(StatesToRecord::OnlyRelevant),
            "allvisible" | "all" => Some(StatesToRecord::AllVisible),
            _ => None,
        }
    }
}

/// Vault configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultConfig {
    /// Optimistic attempts for reserve/release/observe before giving up with
    /// `KVStoreError::Contention`.
    pub max_reserve_retries: u32,

    /// Default policy for `record_transactions`.
    pub states_to_record: StatesToRecord,

    /// How long an observation or `track` waits for the feed lock before
    /// failing with `KVStoreError::LockTimeout`.
    pub lock_wait_timeout: Duration,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            max_reserve_retries: 16,
            states_to_record: StatesToRecord::OnlyRelevant,
            lock_wait_timeout: Duration::from_millis(5000),
        }
    }
}

impl VaultConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `LC_VAULT_MAX_RETRIES`: optimistic attempts (default: 16)
    /// - `LC_VAULT_STATES_TO_RECORD`: `none`, `only-relevant` or `all-visible`
    ///   (default: only-relevant)
    /// - `LC_VAULT_LOCK_WAIT_MS`: feed lock wait in milliseconds (default: 5000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_reserve_retries: env::var("LC_VAULT_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_reserve_retries),

            states_to_record: env::var("LC_VAULT_STATES_TO_RECORD")
                .ok()
                .and_then(|v| StatesToRecord::parse(&v))
                .unwrap_or(defaults.states_to_record),

            lock_wait_timeout: env::var("LC_VAULT_LOCK_WAIT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.lock_wait_timeout),
        }
    }

    pub(crate) fn attempts(&self) -> u32 {
        self.max_reserve_retries.max(1)
    }
}
