//! Prometheus metrics and structured logging for flip-bot.
//!
//! - Prometheus counters for probes, closes and processed signals
//! - Structured logging with tracing (JSON in production)

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
