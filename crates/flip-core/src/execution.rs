//! Probe and discovery results.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of one probe buy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    /// Requested quantity (always >= 1).
    pub quantity: u32,
    /// Whether the broker accepted the order.
    pub succeeded: bool,
    /// Raw broker response, or `{"error": ...}` on transport failure.
    pub response: Value,
}

impl ProbeResult {
    pub fn new(quantity: u32, succeeded: bool, response: Value) -> Self {
        Self {
            quantity,
            succeeded,
            response,
        }
    }
}

/// Result of one discovery run against a single instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiscoveryOutcome {
    /// At least one probe succeeded.
    pub any_success: bool,
    /// Bisection: largest successful quantity. Halving descent: total filled.
    pub quantity: u64,
    /// Number of probes issued.
    pub probes: u32,
}
