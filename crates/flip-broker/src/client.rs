//! HTTP client for the SignalStack order webhook.
//!
//! Every order is a single `POST` of a small JSON document to the configured
//! webhook URL. The client never retries.

use std::time::Duration;

use flip_core::ProbeResult;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::broker::{BoxFuture, Broker};
use crate::classify::is_successful;
use crate::error::{BrokerError, BrokerResult};

/// Order action understood by the webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderAction {
    Buy,
    Close,
}

/// Request body sent to the webhook.
///
/// Buy: `{"symbol": "MSTU", "action": "buy", "quantity": 10}`
/// Close: `{"symbol": "MSTU", "action": "close"}`
#[derive(Debug, Clone, Serialize)]
pub struct OrderRequest<'a> {
    pub symbol: &'a str,
    pub action: OrderAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
}

impl<'a> OrderRequest<'a> {
    pub fn buy(symbol: &'a str, quantity: u32) -> Self {
        Self {
            symbol,
            action: OrderAction::Buy,
            quantity: Some(quantity),
        }
    }

    pub fn close(symbol: &'a str) -> Self {
        Self {
            symbol,
            action: OrderAction::Close,
            quantity: None,
        }
    }
}

/// Client for the SignalStack webhook API.
pub struct SignalStackClient {
    /// HTTP client.
    client: Client,
    /// Webhook endpoint URL.
    webhook_url: String,
}

impl SignalStackClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `webhook_url` - Full webhook URL including its token path
    /// * `timeout` - Per-request timeout; `None` keeps the HTTP client default
    pub fn new(webhook_url: impl Into<String>, timeout: Option<Duration>) -> BrokerResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| BrokerError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        // The URL embeds the account token; keep it out of the logs.
        info!(
            timeout_ms = timeout.map(|t| t.as_millis() as u64),
            "Initialized SignalStack client"
        );

        Ok(Self {
            client,
            webhook_url: webhook_url.into(),
        })
    }

    /// Send a buy order and classify the response.
    ///
    /// Transport failures are folded into a failed result whose response is
    /// `{"error": "<message>"}`.
    pub async fn buy(&self, symbol: &str, quantity: u32) -> ProbeResult {
        info!(symbol, quantity, "Attempting buy");

        match self.send_request(&OrderRequest::buy(symbol, quantity)).await {
            Ok(response) => {
                let succeeded = is_successful(&response);
                if succeeded {
                    info!(symbol, quantity, "Buy accepted");
                } else {
                    warn!(symbol, quantity, response = %response, "Buy rejected");
                }
                ProbeResult::new(quantity, succeeded, response)
            }
            Err(e) => {
                error!(symbol, quantity, error = %e, "Buy request failed");
                ProbeResult::new(quantity, false, json!({ "error": e.to_string() }))
            }
        }
    }

    /// Close all positions in `symbol`, returning whatever the API reports.
    pub async fn close_positions(&self, symbol: &str) -> Value {
        info!(symbol, "Closing all positions");

        match self.send_request(&OrderRequest::close(symbol)).await {
            Ok(response) => {
                info!(symbol, response = %response, "Close positions response");
                response
            }
            Err(e) => {
                error!(symbol, error = %e, "Close positions request failed");
                json!({ "error": e.to_string() })
            }
        }
    }

    /// POST the order and decode the body.
    ///
    /// A 2xx plain-text body comes back as `{"response": "<text>"}`. A body
    /// that claims to be JSON but does not parse is an error.
    async fn send_request(&self, request: &OrderRequest<'_>) -> BrokerResult<Value> {
        debug!(?request, "Sending request to SignalStack");

        let response = self
            .client
            .post(&self.webhook_url)
            .json(request)
            .send()
            .await
            .map_err(|e| BrokerError::HttpClient(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        let declared_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("json"));
        let body = response
            .text()
            .await
            .map_err(|e| BrokerError::HttpClient(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(BrokerError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let value = match serde_json::from_str::<Value>(&body) {
            Ok(value) => value,
            Err(e) if declared_json || looks_like_json(&body) => {
                warn!(body = %body, "Malformed JSON response from SignalStack");
                return Err(BrokerError::Json(e));
            }
            Err(_) => json!({ "response": body }),
        };
        debug!(response = %value, "Received response from SignalStack");

        Ok(value)
    }
}

fn looks_like_json(body: &str) -> bool {
    matches!(body.trim_start().chars().next(), Some('{' | '['))
}

impl Broker for SignalStackClient {
    fn buy<'a>(&'a self, symbol: &'a str, quantity: u32) -> BoxFuture<'a, ProbeResult> {
        Box::pin(SignalStackClient::buy(self, symbol, quantity))
    }

    fn close_positions<'a>(&'a self, symbol: &'a str) -> BoxFuture<'a, Value> {
        Box::pin(SignalStackClient::close_positions(self, symbol))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use axum::routing::post;
    use axum::{Json, Router};
    use parking_lot::Mutex;
    use std::sync::Arc;

    type Seen = Arc<Mutex<Vec<Value>>>;

    /// Fake webhook: the response depends on the requested symbol.
    async fn fake_hook(State(seen): State<Seen>, Json(body): Json<Value>) -> Response {
        seen.lock().push(body.clone());
        match body["symbol"].as_str().unwrap_or_default() {
            "REJECT" => Json(json!({"error": "insufficient buying power"})).into_response(),
            "DOWN" => (StatusCode::INTERNAL_SERVER_ERROR, "upstream down").into_response(),
            "TEXT" => "Order received".into_response(),
            "TRUNCATED" => r#"{"error": "insufficient buying po"#.into_response(),
            "BADJSON" => {
                ([(CONTENT_TYPE, "application/json")], "Order received").into_response()
            }
            _ => Json(json!({"status": "ok"})).into_response(),
        }
    }

    async fn spawn_fake_hook() -> (String, Seen) {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route("/hook", post(fake_hook))
            .with_state(seen.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/hook"), seen)
    }

    #[test]
    fn test_order_request_serialization() {
        let buy = serde_json::to_value(OrderRequest::buy("MSTU", 25)).unwrap();
        assert_eq!(buy, json!({"symbol": "MSTU", "action": "buy", "quantity": 25}));

        let close = serde_json::to_value(OrderRequest::close("MSTZ")).unwrap();
        assert_eq!(close, json!({"symbol": "MSTZ", "action": "close"}));
    }

    #[tokio::test]
    async fn test_buy_success_posts_payload() {
        let (url, seen) = spawn_fake_hook().await;
        let client = SignalStackClient::new(url, None).unwrap();

        let result = client.buy("MSTU", 7).await;
        assert!(result.succeeded);
        assert_eq!(result.quantity, 7);
        assert_eq!(result.response, json!({"status": "ok"}));
        assert_eq!(
            seen.lock().as_slice(),
            &[json!({"symbol": "MSTU", "action": "buy", "quantity": 7})]
        );
    }

    #[tokio::test]
    async fn test_buy_rejected_with_200_status() {
        let (url, _) = spawn_fake_hook().await;
        let client = SignalStackClient::new(url, None).unwrap();

        let result = client.buy("REJECT", 5000).await;
        assert!(!result.succeeded);
        assert_eq!(result.response["error"], "insufficient buying power");
    }

    #[tokio::test]
    async fn test_buy_http_error_is_captured() {
        let (url, _) = spawn_fake_hook().await;
        let client = SignalStackClient::new(url, None).unwrap();

        let result = client.buy("DOWN", 1).await;
        assert!(!result.succeeded);
        let message = result.response["error"].as_str().unwrap();
        assert!(message.contains("500"), "unexpected error text: {message}");
    }

    #[tokio::test]
    async fn test_non_json_body_is_wrapped() {
        let (url, _) = spawn_fake_hook().await;
        let client = SignalStackClient::new(url, None).unwrap();

        let result = client.buy("TEXT", 3).await;
        assert!(result.succeeded);
        assert_eq!(result.response, json!({"response": "Order received"}));
    }

    #[tokio::test]
    async fn test_malformed_json_body_is_failure() {
        let (url, _) = spawn_fake_hook().await;
        let client = SignalStackClient::new(url, None).unwrap();

        // Truncated JSON served as text/plain.
        let result = client.buy("TRUNCATED", 5000).await;
        assert!(!result.succeeded);
        let message = result.response["error"].as_str().unwrap();
        assert!(message.starts_with("JSON error"), "unexpected error text: {message}");

        // Declared JSON that does not parse.
        let result = client.buy("BADJSON", 10).await;
        assert!(!result.succeeded);
        assert!(result.response.get("error").is_some());

        let closed = client.close_positions("TRUNCATED").await;
        assert!(closed.get("error").is_some());
    }

    #[test]
    fn test_looks_like_json() {
        assert!(looks_like_json("  {\"a\": 1"));
        assert!(looks_like_json("[1, 2"));
        assert!(!looks_like_json("Order received"));
        assert!(!looks_like_json(""));
    }

    #[tokio::test]
    async fn test_connection_failure_is_not_raised() {
        // Nothing listens on the discard port.
        let client =
            SignalStackClient::new("http://127.0.0.1:9/hook", Some(Duration::from_secs(2)))
                .unwrap();

        let result = client.buy("MSTU", 10).await;
        assert!(!result.succeeded);
        assert!(result.response.get("error").is_some());

        let closed = client.close_positions("MSTU").await;
        assert!(closed.get("error").is_some());
    }

    #[tokio::test]
    async fn test_close_positions_forwards_response() {
        let (url, seen) = spawn_fake_hook().await;
        let client = SignalStackClient::new(url, None).unwrap();

        let response = client.close_positions("MSTZ").await;
        assert_eq!(response, json!({"status": "ok"}));

        let rejected = client.close_positions("REJECT").await;
        assert_eq!(rejected["error"], "insufficient buying power");

        assert_eq!(seen.lock()[0], json!({"symbol": "MSTZ", "action": "close"}));
    }

    #[tokio::test]
    async fn test_client_as_dyn_broker() {
        let (url, _) = spawn_fake_hook().await;
        let broker: crate::DynBroker = Arc::new(SignalStackClient::new(url, None).unwrap());

        let result = broker.buy("MSTU", 2).await;
        assert!(result.succeeded);
    }
}
