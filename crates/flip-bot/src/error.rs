//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Core error: {0}")]
    Core(#[from] flip_core::CoreError),

    #[error("Broker error: {0}")]
    Broker(#[from] flip_broker::BrokerError),

    #[error("Executor error: {0}")]
    Executor(#[from] flip_executor::ExecutorError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] flip_telemetry::TelemetryError),

    #[error("Server error: {0}")]
    Server(#[from] flip_server::ServerError),
}

pub type AppResult<T> = Result<T, AppError>;
