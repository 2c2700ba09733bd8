//! Main application wiring.
//!
//! Builds the components from [`AppConfig`]:
//! - SignalStack broker client
//! - Cooldown tracker (system clock)
//! - Quantity discovery (tokio pacer)
//! - Signal orchestrator
//! - Webhook server state

use crate::config::AppConfig;
use crate::error::AppResult;
use flip_broker::{DynBroker, SignalStackClient};
use flip_executor::{
    CooldownTracker, DynPacer, QuantityDiscovery, SignalOrchestrator, TokioPacer,
};
use flip_server::{run_server, AppState};
use flip_telemetry::Metrics;
use std::sync::Arc;
use tracing::info;

/// Main application.
pub struct Application {
    config: AppConfig,
    state: AppState,
}

impl Application {
    /// Create a new application.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        Metrics::init();

        let client = SignalStackClient::new(
            config.broker.webhook_url.clone(),
            config.broker.request_timeout(),
        )?;
        let broker: DynBroker = Arc::new(client);
        let pacer: DynPacer = Arc::new(TokioPacer);

        let cooldown = Arc::new(CooldownTracker::new(config.trading.cooldown_period()));
        let discovery =
            QuantityDiscovery::new(config.trading.discovery(), broker.clone(), pacer.clone());
        let orchestrator = SignalOrchestrator::new(
            broker,
            discovery,
            cooldown,
            pacer,
            config.instruments.clone(),
        );

        Ok(Self {
            state: AppState::new(orchestrator),
            config,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Shared server state (cooldown and serialized orchestrator).
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Serve webhooks until the listener fails.
    pub async fn run(self) -> AppResult<()> {
        info!(
            host = %self.config.server.host,
            port = self.config.server.port,
            long = %self.config.instruments.long,
            short = %self.config.instruments.short,
            max_shares = self.config.trading.max_shares,
            cooldown_hours = self.config.trading.cooldown_period_hours,
            policy = %self.config.trading.policy,
            "Starting application"
        );

        run_server(self.state, self.config.server).await?;
        Ok(())
    }
}
