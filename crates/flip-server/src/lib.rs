//! flip-server - Webhook HTTP server for flip-bot.
//!
//! Receives directional signals from a charting/alerting service and hands
//! them to the [`SignalOrchestrator`](flip_executor::SignalOrchestrator).
//!
//! # Routes
//!
//! ```text
//! POST /webhook  {"signal": "long" | "short"}  -> process signal
//! GET  /health                                 -> {"status":"ok","cooldown":bool}
//! GET  /metrics                                -> Prometheus text
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use flip_server::{run_server, AppState, ServerConfig};
//!
//! let state = AppState::new(orchestrator);
//! run_server(state, ServerConfig::default()).await?;
//! ```

mod config;
mod error;
mod server;
mod types;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{create_router, run_server, AppState};
pub use types::{HealthResponse, WebhookResponse};
