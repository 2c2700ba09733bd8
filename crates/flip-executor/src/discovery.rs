//! Quantity discovery by probe buys.
//!
//! The broker only answers "filled" or "not filled" for a requested size, so
//! the largest size the account currently allows is found by searching over
//! probe orders. Two policies share the same contract:
//!
//! - [`SearchPolicy::Bisection`]: binary search in `[1, max_shares]`, reports
//!   the largest accepted size.
//! - [`SearchPolicy::HalvingDescent`]: start at `max_shares`, repeat the same
//!   size while it fills, halve on rejection, reports the total filled.
//!
//! Every probe, including the last one, is followed by a pause.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use flip_broker::DynBroker;
use flip_core::DiscoveryOutcome;
use flip_telemetry::Metrics;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ExecutorError;
use crate::pacer::DynPacer;

/// Default probe ceiling.
pub const DEFAULT_MAX_SHARES: u32 = 5000;

/// Default pause after each probe.
pub const DEFAULT_PAUSE: Duration = Duration::from_secs(1);

/// Search policy used by [`QuantityDiscovery`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchPolicy {
    /// Binary search for the largest accepted size.
    ///
    /// Precondition: acceptance is monotonic in size (if Q fills, every
    /// size below Q fills too). Transient rejections break this and can make
    /// the result under- or over-shoot the real maximum.
    #[default]
    Bisection,
    /// Repeat the current size while it fills, halve it on rejection.
    ///
    /// Only a rejection lowers the size, so an account that keeps accepting
    /// `max_shares` keeps the run going indefinitely.
    HalvingDescent,
}

impl SearchPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bisection => "bisection",
            Self::HalvingDescent => "halving_descent",
        }
    }
}

impl fmt::Display for SearchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchPolicy {
    type Err = ExecutorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "bisection" | "binary" => Ok(Self::Bisection),
            "halving_descent" | "halving" => Ok(Self::HalvingDescent),
            other => Err(ExecutorError::UnknownPolicy(other.to_string())),
        }
    }
}

/// Discovery parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryConfig {
    pub policy: SearchPolicy,
    /// Largest size ever probed.
    pub max_shares: u32,
    /// Pause after every probe.
    pub pause: Duration,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            policy: SearchPolicy::default(),
            max_shares: DEFAULT_MAX_SHARES,
            pause: DEFAULT_PAUSE,
        }
    }
}

/// Probe-buy search engine.
pub struct QuantityDiscovery {
    config: DiscoveryConfig,
    broker: DynBroker,
    pacer: DynPacer,
}

impl QuantityDiscovery {
    pub fn new(config: DiscoveryConfig, broker: DynBroker, pacer: DynPacer) -> Self {
        info!(
            policy = %config.policy,
            max_shares = config.max_shares,
            pause_ms = config.pause.as_millis() as u64,
            "Initialized quantity discovery"
        );
        Self {
            config,
            broker,
            pacer,
        }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    pub fn policy(&self) -> SearchPolicy {
        self.config.policy
    }

    /// Run the configured policy against `symbol`.
    pub async fn discover(&self, symbol: &str) -> DiscoveryOutcome {
        info!(
            symbol,
            policy = %self.config.policy,
            max_shares = self.config.max_shares,
            "Starting quantity discovery"
        );

        let outcome = match self.config.policy {
            SearchPolicy::Bisection => self.bisection(symbol).await,
            SearchPolicy::HalvingDescent => self.halving_descent(symbol).await,
        };

        Metrics::discovery_finished(
            symbol,
            self.config.policy.as_str(),
            outcome.quantity,
            outcome.probes,
        );
        if outcome.any_success {
            info!(
                symbol,
                quantity = outcome.quantity,
                probes = outcome.probes,
                "Discovery complete"
            );
        } else {
            warn!(
                symbol,
                probes = outcome.probes,
                "Discovery complete, no quantity could be bought"
            );
        }

        outcome
    }

    /// Binary search over `[1, max_shares]`.
    ///
    /// Issues at most `floor(log2(max_shares)) + 1` probes and none at all
    /// when `max_shares == 0`.
    async fn bisection(&self, symbol: &str) -> DiscoveryOutcome {
        let mut low: u64 = 1;
        let mut high = u64::from(self.config.max_shares);
        let mut best: u64 = 0;
        let mut probes: u32 = 0;

        while low <= high {
            let mid = low + (high - low) / 2;
            probes = probes.saturating_add(1);

            // mid <= max_shares, so it fits in u32
            if self.probe(symbol, mid as u32).await {
                best = mid;
                low = mid + 1;
            } else {
                high = mid - 1;
            }
        }

        DiscoveryOutcome {
            any_success: best > 0,
            quantity: best,
            probes,
        }
    }

    /// Repeat the current size while it fills; halve on rejection.
    async fn halving_descent(&self, symbol: &str) -> DiscoveryOutcome {
        let mut quantity = self.config.max_shares;
        let mut total: u64 = 0;
        let mut any_success = false;
        let mut probes: u32 = 0;

        while quantity >= 1 {
            probes = probes.saturating_add(1);

            if self.probe(symbol, quantity).await {
                any_success = true;
                total = total.saturating_add(u64::from(quantity));
            } else {
                quantity /= 2;
            }
        }

        DiscoveryOutcome {
            any_success,
            quantity: total,
            probes,
        }
    }

    /// One buy followed by the configured pause.
    async fn probe(&self, symbol: &str, quantity: u32) -> bool {
        let result = self.broker.buy(symbol, quantity).await;
        Metrics::probe(symbol, result.succeeded);
        info!(
            symbol,
            quantity,
            succeeded = result.succeeded,
            "Probe finished"
        );

        self.pacer.pause(self.config.pause).await;
        result.succeeded
    }
}
