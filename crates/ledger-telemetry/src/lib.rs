//! # Ledger Telemetry
//!
//! Logging and metrics bootstrap shared by every ledger subsystem.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ledger_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! let _guard = init_telemetry(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `LC_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `LC_JSON_LOGS` | `false` | JSON log lines |
//! | `LC_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `LC_METRICS_ENABLED` | `true` | Register Prometheus collectors |
//! | `LC_SERVICE_NAME` | `ledger-core` | Service name in log lines |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::{env_filter, init_logging, LoggingGuard};
pub use metrics::{
    encode_metrics, register_metrics, HistogramTimer, MetricsHandle, NOTARY_COMMITS,
    NOTARY_COMMIT_DURATION, NOTARY_CONFLICTS, UNIQUENESS_COMMIT_DURATION, UNIQUENESS_INPUT_STATES,
    UNIQUENESS_RETRIES,
    VAULT_SOFT_LOCK_RESERVATIONS, VAULT_STATES_RECORDED,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and, when enabled, metrics.
///
/// Returns a guard that must be held for the lifetime of the application.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics = if config.metrics_enabled {
        Some(register_metrics()?)
    } else {
        None
    };
    let logging = init_logging(config)?;

    Ok(TelemetryGuard { logging, metrics })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    logging: LoggingGuard,
    metrics: Option<MetricsHandle>,
}

impl TelemetryGuard {
    /// Metrics handle, if metrics are enabled.
    pub fn metrics(&self) -> Option<&MetricsHandle> {
        self.metrics.as_ref()
    }

    /// Whether JSON logging was installed.
    pub fn json_logs(&self) -> bool {
        self.logging.json
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry");
    }
}

/// Convenience macro for creating a span with subsystem context.
///
/// ```rust,ignore
/// let _span = subsystem_span!("commit", subsystem = "uniqueness", inputs = 3).entered();
/// ```
#[macro_export]
macro_rules! subsystem_span {
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!($name, $($field)*)
    };
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
