//! Prometheus metrics for flip-bot.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. A registration failure means a
//! duplicate metric name, which is a programming error and only surfaces
//! during static initialization.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge_vec, register_histogram_vec, register_int_gauge,
    CounterVec, Encoder, GaugeVec, HistogramVec, IntGauge, TextEncoder,
};

use crate::error::{TelemetryError, TelemetryResult};

/// Probe buys by outcome.
/// Labels: symbol, outcome (success/failure)
pub static PROBES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "flip_probes_total",
        "Total probe buy orders sent",
        &["symbol", "outcome"]
    )
    .unwrap()
});

/// Close-position requests by outcome.
pub static CLOSES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "flip_closes_total",
        "Total close-position requests sent",
        &["symbol", "outcome"]
    )
    .unwrap()
});

/// Processed webhook signals.
/// Labels: signal (long/short), result (handled/rejected/cooldown_flatten)
pub static SIGNALS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "flip_signals_total",
        "Total signals processed by the orchestrator",
        &["signal", "result"]
    )
    .unwrap()
});

/// Quantity reported by the last discovery run.
pub static DISCOVERED_QUANTITY: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "flip_discovered_quantity",
        "Quantity reported by the most recent discovery run",
        &["symbol"]
    )
    .unwrap()
});

/// Probes issued per discovery run.
pub static DISCOVERY_PROBES: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "flip_discovery_probes",
        "Number of probes issued per discovery run",
        &["symbol", "policy"],
        vec![1.0, 2.0, 4.0, 8.0, 12.0, 13.0, 16.0, 32.0, 64.0]
    )
    .unwrap()
});

/// Cooldown state (1 = cooling, 0 = active).
pub static COOLDOWN_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "flip_cooldown_active",
        "Whether the post-trade cooldown window is active (1=cooling)"
    )
    .unwrap()
});

fn outcome(succeeded: bool) -> &'static str {
    if succeeded {
        "success"
    } else {
        "failure"
    }
}

/// Metrics facade.
pub struct Metrics;

impl Metrics {
    /// Force registration so every metric shows up before its first update.
    pub fn init() {
        Lazy::force(&PROBES_TOTAL);
        Lazy::force(&CLOSES_TOTAL);
        Lazy::force(&SIGNALS_TOTAL);
        Lazy::force(&DISCOVERED_QUANTITY);
        Lazy::force(&DISCOVERY_PROBES);
        Lazy::force(&COOLDOWN_ACTIVE);
    }

    /// Record one probe buy.
    pub fn probe(symbol: &str, succeeded: bool) {
        PROBES_TOTAL
            .with_label_values(&[symbol, outcome(succeeded)])
            .inc();
    }

    /// Record one close-position request.
    pub fn close(symbol: &str, succeeded: bool) {
        CLOSES_TOTAL
            .with_label_values(&[symbol, outcome(succeeded)])
            .inc();
    }

    /// Record a processed signal.
    pub fn signal_processed(signal: &str, result: &str) {
        SIGNALS_TOTAL.with_label_values(&[signal, result]).inc();
    }

    /// Record the result of a discovery run.
    pub fn discovery_finished(symbol: &str, policy: &str, quantity: u64, probes: u32) {
        DISCOVERED_QUANTITY
            .with_label_values(&[symbol])
            .set(quantity as f64);
        DISCOVERY_PROBES
            .with_label_values(&[symbol, policy])
            .observe(f64::from(probes));
    }

    /// Set cooldown state.
    pub fn cooldown_active(active: bool) {
        COOLDOWN_ACTIVE.set(i64::from(active));
    }

    /// Render the default registry in the Prometheus text format.
    pub fn encode() -> TelemetryResult<String> {
        let encoder = TextEncoder::new();
        let families = prometheus::gather();
        let mut buf = Vec::new();
        encoder
            .encode(&families, &mut buf)
            .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
        String::from_utf8(buf).map_err(|e| TelemetryError::Metrics(e.to_string()))
    }
}
