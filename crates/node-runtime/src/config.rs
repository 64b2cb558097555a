//! # Node Configuration
//!
//! Unified configuration for every subsystem.
//!
//! ## Requirements
//!
//! - A node with a durable store MUST be given a notary key seed, otherwise
//!   the notary identity changes on every restart while its conflict table
//!   does not.

use lc_01_uniqueness::UniquenessConfig;
use lc_02_notary::NotaryConfig;
use lc_03_vault::VaultConfig;
use ledger_telemetry::TelemetryConfig;
use shared_crypto::Ed25519KeyPair;
use shared_store::{StoreBackend, StoreConfig};
use std::env;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("LC_NOTARY_KEY_SEED must be 32 bytes of hex: {0}")]
    InvalidKeySeed(String),

    #[error("Notary legal name must name an organisation (O=...), got {0:?}")]
    InvalidLegalName(String),

    #[error("Store path must not be empty for the {0:?} backend")]
    MissingStorePath(StoreBackend),

    #[error(
        "A durable store needs a fixed notary key. Set LC_NOTARY_KEY_SEED or use the memory \
         backend."
    )]
    EphemeralNotaryKey,
}

/// Complete node configuration.
#[derive(Debug, Clone, Default)]
pub struct NodeConfig {
    pub store: StoreConfig,
    pub uniqueness: UniquenessConfig,
    pub notary: NotaryConfig,
    pub vault: VaultConfig,
    pub telemetry: TelemetryConfig,
    /// Seed of the notary signing key. A random key is used when absent.
    pub notary_key_seed: Option<[u8; 32]>,
}

impl NodeConfig {
    /// Create configuration from environment variables.
    ///
    /// Each subsystem reads its own variables; see their `from_env`. The
    /// node adds `LC_NOTARY_KEY_SEED` (64 hex characters).
    pub fn from_env() -> Result<Self, ConfigError> {
        let notary_key_seed = match env::var("LC_NOTARY_KEY_SEED") {
            Ok(seed) => Some(parse_seed(&seed)?),
            Err(_) => None,
        };
        Ok(Self {
            store: StoreConfig::from_env(),
            uniqueness: UniquenessConfig::from_env(),
            notary: NotaryConfig::from_env(),
            vault: VaultConfig::from_env(),
            telemetry: TelemetryConfig::from_env(),
            notary_key_seed,
        })
    }

    /// Checks the combination of settings before anything is opened.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let organisation = self
            .notary
            .legal_name
            .split(',')
            .map(str::trim)
            .any(|attr| attr.strip_prefix("O=").is_some_and(|o| !o.is_empty()));
        if !organisation {
            return Err(ConfigError::InvalidLegalName(self.notary.legal_name.clone()));
        }

        if self.store.backend != StoreBackend::Memory {
            if self.store.path.as_os_str().is_empty() {
                return Err(ConfigError::MissingStorePath(self.store.backend));
            }
            if self.notary_key_seed.is_none() {
                return Err(ConfigError::EphemeralNotaryKey);
            }
        }
        Ok(())
    }
}

fn parse_seed(value: &str) -> Result<[u8; 32], ConfigError> {
    Ed25519KeyPair::from_hex_seed(value)
        .map(|pair| pair.to_seed())
        .map_err(|e| ConfigError::InvalidKeySeed(e.to_string()))
}
