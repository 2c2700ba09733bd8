//! Post-trade cooldown tracking.
//!
//! Two states: Active (no trade yet, or the window has elapsed) and Cooling
//! (within `period` of the last successful trade). There is no explicit
//! Cooling -> Active transition; every read re-evaluates against the clock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use flip_telemetry::Metrics;
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};

/// Tracks the time of the last successful trade.
///
/// Thread-safe and lock-free: the health endpoint reads it while a signal
/// is being processed. State is memory-resident and lost on restart.
pub struct CooldownTracker {
    period: Duration,
    /// Last successful trade (ms since epoch). 0 = never.
    last_success_ms: AtomicU64,
    clock: Arc<dyn Clock>,
}

impl CooldownTracker {
    /// Create a tracker on the system clock.
    pub fn new(period: Duration) -> Self {
        Self::with_clock(period, Arc::new(SystemClock))
    }

    pub fn with_clock(period: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            period,
            last_success_ms: AtomicU64::new(0),
            clock,
        }
    }

    /// Configured cooldown window.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Time of the last successful trade, if any.
    pub fn last_success_ms(&self) -> Option<u64> {
        match self.last_success_ms.load(Ordering::Acquire) {
            0 => None,
            ms => Some(ms),
        }
    }

    fn cooldown_end_ms(&self) -> Option<u64> {
        let period_ms = u64::try_from(self.period.as_millis()).unwrap_or(u64::MAX);
        self.last_success_ms()
            .map(|last| last.saturating_add(period_ms))
    }

    /// Time left in the window, or `None` when not cooling.
    pub fn remaining(&self) -> Option<Duration> {
        let end = self.cooldown_end_ms()?;
        let now = self.clock.now_ms();
        (now < end).then(|| Duration::from_millis(end - now))
    }

    /// Cooling iff a trade was recorded and `now < last + period`.
    ///
    /// Read-only: the `flip_cooldown_active` gauge is refreshed by
    /// `record_success` and by whoever renders metrics.
    pub fn is_in_cooldown(&self) -> bool {
        match self.remaining() {
            Some(left) => {
                debug!(
                    remaining_hours = left.as_secs_f64() / 3600.0,
                    "In cooldown period"
                );
                true
            }
            None => false,
        }
    }

    /// Start (or extend) the cooldown window from now.
    ///
    /// The stored time only moves forward, even if the clock steps back.
    pub fn record_success(&self) {
        let now = self.clock.now_ms().max(1);
        self.last_success_ms.fetch_max(now, Ordering::AcqRel);
        Metrics::cooldown_active(true);

        let until = self
            .cooldown_end_ms()
            .and_then(|end| DateTime::from_timestamp_millis(end as i64))
            .map(|t| t.to_rfc3339())
            .unwrap_or_default();
        info!(
            until = %until,
            period_hours = self.period.as_secs_f64() / 3600.0,
            "Cooldown period started"
        );
    }
}

impl std::fmt::Debug for CooldownTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CooldownTracker")
            .field("period", &self.period)
            .field("last_success_ms", &self.last_success_ms())
            .finish()
    }
}
