//! flip-bot - webhook-driven quantity-discovery trader.
//!
//! Wires the components together:
//! - SignalStack broker client
//! - Quantity discovery and post-trade cooldown
//! - Signal orchestrator
//! - Webhook HTTP server

pub mod app;
pub mod config;
pub mod error;

pub use app::Application;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
