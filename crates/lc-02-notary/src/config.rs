//! Notary configuration.

use serde::{Deserialize, Serialize};
use std::env;

/// Whether the notary sees and verifies full transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotaryKind {
    /// Checks time windows and uniqueness only.
    NonValidating,
    /// Additionally resolves and verifies the transaction and its
    /// dependencies before committing.
    Validating,
}

impl NotaryKind {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "validating" => Some(NotaryKind::Validating),
            "nonvalidating" | "simple" => Some(NotaryKind::NonValidating),
            _ => None,
        }
    }
}

/// Notary configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotaryConfig {
    pub kind: NotaryKind,

    /// Legal name the notary signs as.
    pub legal_name: String,

    /// Slack applied to both ends of a time window, in milliseconds.
    pub time_tolerance_ms: u64,
}

impl Default for NotaryConfig {
    fn default() -> Self {
        Self {
            kind: NotaryKind::NonValidating,
            legal_name: "O=Notary Service,L=Zurich,C=CH".to_string(),
            time_tolerance_ms: 0,
        }
    }
}

impl NotaryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `LC_NOTARY_KIND`: `validating` or `non-validating` (default: non-validating)
    /// - `LC_NOTARY_NAME`: legal name (default: O=Notary Service,L=Zurich,C=CH)
    /// - `LC_NOTARY_TIME_TOLERANCE_MS`: time-window tolerance (default: 0)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            kind: env::var("LC_NOTARY_KIND")
                .ok()
                .and_then(|v| NotaryKind::parse(&v))
                .unwrap_or(defaults.kind),

            legal_name: env::var("LC_NOTARY_NAME").unwrap_or(defaults.legal_name),

            time_tolerance_ms: env::var("LC_NOTARY_TIME_TOLERANCE_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.time_tolerance_ms),
        }
    }

    /// A validating notary with default settings.
    pub fn validating() -> Self {
        Self {
            kind: NotaryKind::Validating,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse() {
        assert_eq!(NotaryKind::parse("Validating"), Some(NotaryKind::Validating));
        assert_eq!(NotaryKind::parse("non-validating"), Some(NotaryKind::NonValidating));
        assert_eq!(NotaryKind::parse("non_validating"), Some(NotaryKind::NonValidating));
        assert_eq!(NotaryKind::parse("bft"), None);
    }

    #[test]
    fn test_defaults() {
        let config = NotaryConfig::default();
        assert_eq!(config.kind, NotaryKind::NonValidating);
        assert_eq!(config.time_tolerance_ms, 0);
        assert_eq!(NotaryConfig::validating().kind, NotaryKind::Validating);
    }
}
