//! Inter-probe pacing.
//!
//! The external API is rate limited, so every probe is followed by a pause.
//! The pause is an explicit step so tests can swap in a pacer that does not
//! sleep.

use std::sync::Arc;
use std::time::Duration;

use flip_broker::BoxFuture;
use parking_lot::Mutex;
use tracing::debug;

/// Waits between broker calls.
pub trait Pacer: Send + Sync {
    fn pause(&self, duration: Duration) -> BoxFuture<'_, ()>;
}

/// Arc wrapper for Pacer trait objects.
pub type DynPacer = Arc<dyn Pacer>;

/// Real pacer backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

impl Pacer for TokioPacer {
    fn pause(&self, duration: Duration) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            debug!(pause_ms = duration.as_millis() as u64, "Pausing");
            tokio::time::sleep(duration).await;
        })
    }
}

/// Pacer that returns immediately and records each requested pause.
#[derive(Debug, Default)]
pub struct RecordingPacer {
    pauses: Mutex<Vec<Duration>>,
}

impl RecordingPacer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requested pauses, in call order.
    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.pauses.lock().len()
    }
}

impl Pacer for RecordingPacer {
    fn pause(&self, duration: Duration) -> BoxFuture<'_, ()> {
        self.pauses.lock().push(duration);
        Box::pin(async {})
    }
}
