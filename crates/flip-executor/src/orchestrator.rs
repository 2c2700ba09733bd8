//! Signal orchestration.
//!
//! Sequences one signal end to end: cooldown check, discovery on the entry
//! instrument, unwind of the exit instrument, cooldown start.
//!
//! `handle` is not reentrant-safe with respect to trading: two concurrent
//! calls could both see an expired cooldown and both run discovery. Callers
//! that dispatch signals concurrently must serialize `handle` (the webhook
//! server holds an async mutex around it).

use std::sync::Arc;

use flip_broker::{is_successful, DynBroker};
use flip_core::{Instrument, InstrumentPair, Signal};
use flip_telemetry::Metrics;
use serde_json::Value;
use tracing::{info, warn};

use crate::cooldown::CooldownTracker;
use crate::discovery::QuantityDiscovery;
use crate::pacer::DynPacer;

/// Turns signals into orders.
pub struct SignalOrchestrator {
    broker: DynBroker,
    discovery: QuantityDiscovery,
    cooldown: Arc<CooldownTracker>,
    pacer: DynPacer,
    instruments: InstrumentPair,
}

impl SignalOrchestrator {
    pub fn new(
        broker: DynBroker,
        discovery: QuantityDiscovery,
        cooldown: Arc<CooldownTracker>,
        pacer: DynPacer,
        instruments: InstrumentPair,
    ) -> Self {
        info!(
            long = %instruments.long,
            short = %instruments.short,
            policy = %discovery.policy(),
            "Initialized signal orchestrator"
        );
        Self {
            broker,
            discovery,
            cooldown,
            pacer,
            instruments,
        }
    }

    /// Shared cooldown state.
    pub fn cooldown(&self) -> &Arc<CooldownTracker> {
        &self.cooldown
    }

    pub fn instruments(&self) -> &InstrumentPair {
        &self.instruments
    }

    /// Process one signal. Returns whether it was handled.
    ///
    /// - Cooling: both instruments are closed, long then short, and no
    ///   discovery runs (handled).
    /// - Discovery succeeds: pause, close the exit instrument, start the
    ///   cooldown (handled).
    /// - Discovery fails: nothing is closed and the cooldown is untouched
    ///   (not handled).
    ///
    /// Close results are logged only; they never change the return value.
    pub async fn handle(&self, signal: Signal) -> bool {
        let (entry, exit) = signal.instruments();
        let entry_symbol = self.instruments.symbol(entry);
        let exit_symbol = self.instruments.symbol(exit);
        info!(%signal, entry = entry_symbol, exit = exit_symbol, "Executing signal");

        if let Some(remaining) = self.cooldown.remaining() {
            Metrics::cooldown_active(true);
            info!(
                %signal,
                remaining_hours = remaining.as_secs_f64() / 3600.0,
                "In cooldown period, closing both instruments"
            );
            // Long first, whatever the signal.
            self.close(Instrument::Long).await;
            self.close(Instrument::Short).await;
            Metrics::signal_processed(signal.as_str(), "cooldown_flatten");
            return true;
        }

        let outcome = self.discovery.discover(entry_symbol).await;
        if !outcome.any_success {
            warn!(
                %signal,
                symbol = entry_symbol,
                "Signal not handled, could not buy any quantity"
            );
            Metrics::signal_processed(signal.as_str(), "rejected");
            return false;
        }

        self.pacer.pause(self.discovery.config().pause).await;
        info!(
            %signal,
            bought = entry_symbol,
            quantity = outcome.quantity,
            closing = exit_symbol,
            "Entry complete, closing exit instrument"
        );
        self.close(exit).await;
        self.cooldown.record_success();

        Metrics::signal_processed(signal.as_str(), "handled");
        true
    }

    /// Best-effort close. Failures are logged and swallowed.
    async fn close(&self, instrument: Instrument) -> Value {
        let symbol = self.instruments.symbol(instrument);
        let response = self.broker.close_positions(symbol).await;
        let succeeded = is_successful(&response);
        Metrics::close(symbol, succeeded);

        if !succeeded {
            warn!(
                symbol,
                response = %response,
                "Close positions reported a failure, continuing"
            );
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, MockClock};
    use crate::discovery::{DiscoveryConfig, SearchPolicy};
    use crate::pacer::RecordingPacer;
    use flip_broker::MockBroker;
    use serde_json::json;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;

    const HOUR_MS: u64 = 3_600_000;

    struct Harness {
        broker: Arc<MockBroker>,
        pacer: Arc<RecordingPacer>,
        now: Arc<AtomicU64>,
        orchestrator: SignalOrchestrator,
    }

    fn harness(broker: MockBroker, policy: SearchPolicy) -> Harness {
        let broker = Arc::new(broker);
        let pacer = Arc::new(RecordingPacer::new());

        let now = Arc::new(AtomicU64::new(100 * HOUR_MS));
        let handle = now.clone();
        let mut clock = MockClock::new();
        clock
            .expect_now_ms()
            .returning(move || handle.load(Ordering::SeqCst));
        let clock: Arc<dyn Clock> = Arc::new(clock);
        let cooldown = Arc::new(CooldownTracker::with_clock(
            Duration::from_secs(12 * 3600),
            clock,
        ));

        let config = DiscoveryConfig {
            policy,
            max_shares: 5000,
            pause: Duration::from_secs(1),
        };
        let discovery = QuantityDiscovery::new(config, broker.clone(), pacer.clone());
        let orchestrator = SignalOrchestrator::new(
            broker.clone(),
            discovery,
            cooldown,
            pacer.clone(),
            InstrumentPair::new("AAA", "BBB"),
        );

        Harness {
            broker,
            pacer,
            now,
            orchestrator,
        }
    }

    #[tokio::test]
    async fn test_long_signal_buys_entry_and_closes_exit() {
        let h = harness(MockBroker::new(37), SearchPolicy::Bisection);

        assert!(h.orchestrator.handle(Signal::Long).await);

        let buys = h.broker.buys();
        assert!(buys.iter().all(|b| b.symbol == "AAA"));
        let best = buys
            .iter()
            .filter(|b| b.succeeded)
            .map(|b| b.quantity)
            .max();
        assert_eq!(best, Some(37));
        assert_eq!(h.broker.closes(), vec!["BBB".to_string()]);
        assert!(h.orchestrator.cooldown().is_in_cooldown());
        // one pause per probe plus the pause before the unwind
        assert_eq!(h.pacer.count(), buys.len() + 1);
    }

    #[tokio::test]
    async fn test_short_signal_during_cooldown_flattens_both() {
        let h = harness(MockBroker::new(37), SearchPolicy::Bisection);
        h.orchestrator.cooldown().record_success();

        assert!(h.orchestrator.handle(Signal::Short).await);

        assert!(h.broker.buys().is_empty());
        assert_eq!(
            h.broker.closes(),
            vec!["AAA".to_string(), "BBB".to_string()]
        );
        assert_eq!(h.pacer.count(), 0);
    }

    #[tokio::test]
    async fn test_failed_discovery_changes_nothing() {
        let h = harness(MockBroker::always_failing(), SearchPolicy::Bisection);

        assert!(!h.orchestrator.handle(Signal::Long).await);

        assert!(!h.broker.buys().is_empty());
        assert!(h.broker.closes().is_empty());
        assert!(h.orchestrator.cooldown().last_success_ms().is_none());
        assert!(!h.orchestrator.cooldown().is_in_cooldown());
    }

    #[tokio::test]
    async fn test_short_signal_enters_short_instrument() {
        let h = harness(
            MockBroker::new(100).with_success_limit(1),
            SearchPolicy::HalvingDescent,
        );

        assert!(h.orchestrator.handle(Signal::Short).await);

        assert!(h.broker.buys().iter().all(|b| b.symbol == "BBB"));
        assert_eq!(h.broker.closes(), vec!["AAA".to_string()]);
    }

    #[tokio::test]
    async fn test_close_failure_does_not_change_result() {
        let h = harness(MockBroker::new(10), SearchPolicy::Bisection);
        h.broker
            .set_close_response(json!({"error": "no open position"}));

        assert!(h.orchestrator.handle(Signal::Long).await);
        assert!(h.orchestrator.cooldown().is_in_cooldown());

        // Flattening an already-flat book during cooldown is still handled.
        h.broker.clear();
        assert!(h.orchestrator.handle(Signal::Long).await);
        assert_eq!(h.broker.closes().len(), 2);
    }

    #[tokio::test]
    async fn test_cooldown_expiry_reenables_entries() {
        let h = harness(MockBroker::new(5), SearchPolicy::Bisection);
        assert!(h.orchestrator.handle(Signal::Long).await);

        h.broker.clear();
        h.now.fetch_add(12 * HOUR_MS, Ordering::SeqCst);

        assert!(h.orchestrator.handle(Signal::Short).await);
        assert!(!h.broker.buys().is_empty());
        assert_eq!(h.broker.closes(), vec!["AAA".to_string()]);
    }

    #[tokio::test]
    async fn test_closing_flat_instrument_leaves_cooldown_untouched() {
        let h = harness(MockBroker::always_failing(), SearchPolicy::Bisection);
        h.broker.set_close_response(json!({"message": "no position"}));

        h.orchestrator.close(Instrument::Short).await;
        h.orchestrator.close(Instrument::Short).await;

        assert!(h.orchestrator.cooldown().last_success_ms().is_none());
        assert_eq!(h.broker.closes(), vec!["BBB".to_string(), "BBB".to_string()]);
    }
}
