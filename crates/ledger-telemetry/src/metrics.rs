//! Prometheus metrics for the ledger subsystems.
//!
//! All metrics follow the naming convention: `lc_<subsystem>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., notary_conflicts_total)
//! - **Histogram**: Distribution of values (e.g., notary_commit_duration_seconds)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Histogram, HistogramOpts, Opts, Registry,
    TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // NOTARY METRICS (lc-02)
    // =========================================================================

    /// Notarisation requests by outcome
    pub static ref NOTARY_COMMITS: CounterVec = CounterVec::new(
        Opts::new("lc_notary_commits_total", "Notarisation requests processed"),
        &["outcome"]  // outcome: signed/conflict/invalid/time_window/unavailable/wrong_notary
    ).expect("metric creation failed");

    /// Requests rejected because an input was already consumed
    pub static ref NOTARY_CONFLICTS: Counter = Counter::new(
        "lc_notary_conflicts_total",
        "Notarisation requests rejected with a double-spend conflict"
    ).expect("metric creation failed");

    /// End-to-end notarisation latency, verification and signing included
    pub static ref NOTARY_COMMIT_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "lc_notary_commit_duration_seconds",
            "Time spent processing a notarisation request"
        ).buckets(exponential_buckets(0.00005, 2.0, 16).expect("bucket layout"))
    ).expect("metric creation failed");

    // =========================================================================
    // UNIQUENESS METRICS (lc-01)
    // =========================================================================

    /// Input states offered to the uniqueness provider
    pub static ref UNIQUENESS_INPUT_STATES: Counter = Counter::new(
        "lc_uniqueness_input_states_total",
        "Input states submitted for uniqueness checking"
    ).expect("metric creation failed");

    /// Time spent inside the uniqueness commit
    pub static ref UNIQUENESS_COMMIT_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "lc_uniqueness_commit_duration_seconds",
            "Time spent committing input states to the conflict table"
        ).buckets(exponential_buckets(0.00005, 2.0, 16).expect("bucket layout"))
    ).expect("metric creation failed");

    /// Optimistic commit retries after a failed precondition
    pub static ref UNIQUENESS_RETRIES: Counter = Counter::new(
        "lc_uniqueness_commit_retries_total",
        "Commit attempts retried after a concurrent write"
    ).expect("metric creation failed");

    // =========================================================================
    // VAULT METRICS (lc-03)
    // =========================================================================

    /// States inserted into the vault
    pub static ref VAULT_STATES_RECORDED: CounterVec = CounterVec::new(
        Opts::new("lc_vault_states_recorded_total", "States recorded by the vault"),
        &["status"]  // status: unconsumed/consumed
    ).expect("metric creation failed");

    /// Soft-lock reservation attempts by outcome
    pub static ref VAULT_SOFT_LOCK_RESERVATIONS: CounterVec = CounterVec::new(
        Opts::new("lc_vault_soft_lock_reservations_total", "Soft-lock reservation attempts"),
        &["outcome"]  // outcome: reserved/unavailable/error
    ).expect("metric creation failed");
}

/// Handle over the registry the collectors were registered with.
#[derive(Clone)]
pub struct MetricsHandle {
    registry: Registry,
}

impl MetricsHandle {
    /// Render every registered metric in the Prometheus text format.
    pub fn gather_text(&self) -> Result<String, TelemetryError> {
        encode_registry(&self.registry)
    }
}

/// Register all metrics with the global registry.
///
/// Safe to call more than once; collectors already registered are skipped.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Notary
        Box::new(NOTARY_COMMITS.clone()),
        Box::new(NOTARY_CONFLICTS.clone()),
        Box::new(NOTARY_COMMIT_DURATION.clone()),
        // Uniqueness
        Box::new(UNIQUENESS_INPUT_STATES.clone()),
        Box::new(UNIQUENESS_COMMIT_DURATION.clone()),
        Box::new(UNIQUENESS_RETRIES.clone()),
        // Vault
        Box::new(VAULT_STATES_RECORDED.clone()),
        Box::new(VAULT_SOFT_LOCK_RESERVATIONS.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        registry: REGISTRY.clone(),
    })
}

/// Encode all metrics in the global registry as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    encode_registry(&REGISTRY)
}

fn encode_registry(registry: &Registry) -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = registry.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram
            .observe(self.start.elapsed().as_secs_f64());
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_twice_is_ok() {
        assert!(register_metrics().is_ok());
        assert!(register_metrics().is_ok());
    }

    #[test]
    fn test_counter_shows_in_exposition() {
        let handle = register_metrics().unwrap();
        NOTARY_CONFLICTS.inc();
        NOTARY_COMMITS.with_label_values(&["signed"]).inc();

        let text = handle.gather_text().unwrap();
        assert!(text.contains("lc_notary_conflicts_total"));
        assert!(text.contains("outcome=\"signed\""));
    }

    #[test]
    fn test_commit_latencies_are_separate_series() {
        let handle = register_metrics().unwrap();
        let notary_before = NOTARY_COMMIT_DURATION.get_sample_count();
        UNIQUENESS_COMMIT_DURATION.observe(0.001);

        assert_eq!(NOTARY_COMMIT_DURATION.get_sample_count(), notary_before);
        let text = handle.gather_text().unwrap();
        assert!(text.contains("lc_uniqueness_commit_duration_seconds_bucket"));
        assert!(text.contains("lc_notary_commit_duration_seconds_bucket"));
    }

    #[test]
    fn test_histogram_timer() {
        let before = NOTARY_COMMIT_DURATION.get_sample_count();
        {
            let _timer = HistogramTimer::new(&NOTARY_COMMIT_DURATION);
        }
        assert!(NOTARY_COMMIT_DURATION.get_sample_count() > before);
    }
}
