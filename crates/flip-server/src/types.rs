//! Webhook API types.

use serde::{Deserialize, Serialize};

/// Body returned by `POST /webhook`.
///
/// `handled` and `cooldown` are only present on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub status: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown: Option<bool>,
}

impl WebhookResponse {
    pub fn processed(message: impl Into<String>, handled: bool, cooldown: bool) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            handled: Some(handled),
            cooldown: Some(cooldown),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            handled: None,
            cooldown: None,
        }
    }
}

/// Body returned by `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub cooldown: bool,
}
