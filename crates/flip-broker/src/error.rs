//! Broker error types.
//!
//! These never reach the discovery engine: `SignalStackClient` folds them
//! into failed probe results and `{"error": ...}` close responses.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type BrokerResult<T> = Result<T, BrokerError>;
