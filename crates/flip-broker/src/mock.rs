//! In-memory broker for tests.
//!
//! Models an account that can buy up to a fixed quantity per order.

use std::sync::atomic::{AtomicUsize, Ordering};

use flip_core::ProbeResult;
use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::broker::{BoxFuture, Broker};

/// One recorded buy call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuyRecord {
    pub symbol: String,
    pub quantity: u32,
    pub succeeded: bool,
}

/// Mock broker that accepts any buy with `quantity <= threshold`.
///
/// `with_success_limit` makes every buy fail once that many buys have
/// succeeded, which bounds halving-descent runs against an account that
/// would otherwise accept the same size forever.
#[derive(Debug)]
pub struct MockBroker {
    threshold: u32,
    success_limit: Option<usize>,
    successes: AtomicUsize,
    buys: Mutex<Vec<BuyRecord>>,
    closes: Mutex<Vec<String>>,
    close_response: Mutex<Value>,
}

impl MockBroker {
    /// Create a mock that accepts buys up to `threshold`.
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            success_limit: None,
            successes: AtomicUsize::new(0),
            buys: Mutex::new(Vec::new()),
            closes: Mutex::new(Vec::new()),
            close_response: Mutex::new(json!({"status": "ok"})),
        }
    }

    /// Mock that rejects every buy.
    pub fn always_failing() -> Self {
        Self::new(0)
    }

    /// Fail every buy after `limit` successful ones.
    pub fn with_success_limit(mut self, limit: usize) -> Self {
        self.success_limit = Some(limit);
        self
    }

    /// Set the payload returned by `close_positions`.
    pub fn set_close_response(&self, response: Value) {
        *self.close_response.lock() = response;
    }

    /// Recorded buys, in call order.
    pub fn buys(&self) -> Vec<BuyRecord> {
        self.buys.lock().clone()
    }

    /// Requested quantities, in call order.
    pub fn buy_quantities(&self) -> Vec<u32> {
        self.buys.lock().iter().map(|b| b.quantity).collect()
    }

    /// Symbols passed to `close_positions`, in call order.
    pub fn closes(&self) -> Vec<String> {
        self.closes.lock().clone()
    }

    /// Clear recorded calls.
    pub fn clear(&self) {
        self.buys.lock().clear();
        self.closes.lock().clear();
        self.successes.store(0, Ordering::SeqCst);
    }

    fn accepts(&self, quantity: u32) -> bool {
        if let Some(limit) = self.success_limit {
            if self.successes.load(Ordering::SeqCst) >= limit {
                return false;
            }
        }
        quantity <= self.threshold
    }
}

impl Broker for MockBroker {
    fn buy<'a>(&'a self, symbol: &'a str, quantity: u32) -> BoxFuture<'a, ProbeResult> {
        Box::pin(async move {
            let succeeded = self.accepts(quantity);
            if succeeded {
                self.successes.fetch_add(1, Ordering::SeqCst);
            }
            self.buys.lock().push(BuyRecord {
                symbol: symbol.to_string(),
                quantity,
                succeeded,
            });

            let response = if succeeded {
                json!({"status": "ok", "symbol": symbol, "quantity": quantity})
            } else {
                json!({"error": "insufficient buying power"})
            };
            ProbeResult::new(quantity, succeeded, response)
        })
    }

    fn close_positions<'a>(&'a self, symbol: &'a str) -> BoxFuture<'a, Value> {
        Box::pin(async move {
            self.closes.lock().push(symbol.to_string());
            self.close_response.lock().clone()
        })
    }
}
