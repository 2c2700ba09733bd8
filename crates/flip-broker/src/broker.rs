//! Broker trait.
//!
//! Abstracts order transport so the discovery engine and orchestrator can be
//! driven by `MockBroker` in tests and by `SignalStackClient` in production.

use std::pin::Pin;
use std::sync::Arc;

use flip_core::ProbeResult;
use serde_json::Value;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Order transport to the external brokerage.
///
/// Implementations never fail: transport errors and rejections are reported
/// through `ProbeResult::succeeded` (for buys) or an `{"error": ...}` payload
/// (for closes). Implementations must not retry.
pub trait Broker: Send + Sync {
    /// Attempt to buy `quantity` (>= 1) units of `symbol`.
    fn buy<'a>(&'a self, symbol: &'a str, quantity: u32) -> BoxFuture<'a, ProbeResult>;

    /// Close every open position in `symbol`. Closing a flat position is not
    /// an error.
    fn close_positions<'a>(&'a self, symbol: &'a str) -> BoxFuture<'a, Value>;
}

/// Arc wrapper for Broker trait objects.
pub type DynBroker = Arc<dyn Broker>;
