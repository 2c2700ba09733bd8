//! HTTP server implementation using axum.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use flip_core::{CoreError, Signal};
use flip_executor::{CooldownTracker, SignalOrchestrator};
use flip_telemetry::Metrics;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::JoinError;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::types::{HealthResponse, WebhookResponse};

const INVALID_FORMAT: &str = "Invalid data format. 'signal' field is required.";

/// Shared application state for axum handlers.
///
/// The orchestrator sits behind an async mutex so signals are processed one
/// at a time. The cooldown tracker is shared separately and is lock-free, so
/// `/health` answers while a signal is in flight.
#[derive(Clone)]
pub struct AppState {
    orchestrator: Arc<Mutex<SignalOrchestrator>>,
    cooldown: Arc<CooldownTracker>,
}

impl AppState {
    pub fn new(orchestrator: SignalOrchestrator) -> Self {
        let cooldown = orchestrator.cooldown().clone();
        Self {
            orchestrator: Arc::new(Mutex::new(orchestrator)),
            cooldown,
        }
    }

    pub fn cooldown(&self) -> &Arc<CooldownTracker> {
        &self.cooldown
    }
}

/// Create the axum router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(webhook))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .with_state(state)
}

fn reply(status: StatusCode, body: WebhookResponse) -> Response {
    (status, Json(body)).into_response()
}

/// Pull the `signal` string out of a raw webhook body.
fn extract_signal(body: &[u8]) -> Option<String> {
    let data: Value = serde_json::from_slice(body).ok()?;
    data.get("signal")?.as_str().map(str::to_string)
}

/// Handle `POST /webhook`.
async fn webhook(State(state): State<AppState>, body: Bytes) -> Response {
    info!(body = %String::from_utf8_lossy(&body), "Received webhook data");

    let Some(raw) = extract_signal(&body) else {
        warn!("Invalid webhook data: 'signal' field is missing");
        return reply(StatusCode::BAD_REQUEST, WebhookResponse::error(INVALID_FORMAT));
    };

    let signal = match raw.parse::<Signal>() {
        Ok(signal) => signal,
        Err(CoreError::UnknownSignal(s)) | Err(CoreError::InvalidConfig(s)) => {
            warn!(signal = %s, "Unknown signal type");
            return reply(
                StatusCode::BAD_REQUEST,
                WebhookResponse::error(format!("Unknown signal type: {s}")),
            );
        }
    };

    info!(%signal, "Processing signal");

    // Run on its own task: a dropped client connection must not cancel a
    // half-finished discovery run, and a panic surfaces as a JoinError.
    let orchestrator = state.orchestrator.clone();
    let task = tokio::spawn(async move {
        let orchestrator = orchestrator.lock().await;
        orchestrator.handle(signal).await
    });

    match task.await {
        Ok(handled) => {
            let message = match signal {
                Signal::Long => "Long signal processed",
                Signal::Short => "Short signal processed",
            };
            let cooldown = state.cooldown.is_in_cooldown();
            reply(
                StatusCode::OK,
                WebhookResponse::processed(message, handled, cooldown),
            )
        }
        Err(e) => {
            let reason = panic_message(e);
            error!(%signal, error = %reason, "Error processing webhook");
            reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                WebhookResponse::error(format!("Internal error: {reason}")),
            )
        }
    }
}

fn panic_message(err: JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    let payload = err.into_panic();
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "task panicked".to_string()
    }
}

/// Handle `GET /health`.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        cooldown: state.cooldown.is_in_cooldown(),
    })
}

/// Handle `GET /metrics`.
async fn metrics(State(state): State<AppState>) -> Response {
    // The gauge goes stale when a window expires on its own.
    Metrics::cooldown_active(state.cooldown.is_in_cooldown());

    match Metrics::encode() {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// Run the webhook HTTP server until it fails.
pub async fn run_server(state: AppState, config: ServerConfig) -> ServerResult<()> {
    let app = create_router(state);
    let addr = config.bind_addr();

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;
    info!(addr = %addr, "Starting webhook server");

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use flip_broker::{BoxFuture, Broker, MockBroker};
    use flip_core::{InstrumentPair, ProbeResult};
    use flip_executor::{DiscoveryConfig, QuantityDiscovery, RecordingPacer, SearchPolicy};
    use serde_json::json;
    use std::time::Duration;
    use tower::ServiceExt;

    fn state_with(broker: Arc<dyn Broker>) -> AppState {
        let pacer = Arc::new(RecordingPacer::new());
        let config = DiscoveryConfig {
            policy: SearchPolicy::Bisection,
            max_shares: 100,
            pause: Duration::from_millis(1),
        };
        let discovery = QuantityDiscovery::new(config, broker.clone(), pacer.clone());
        let cooldown = Arc::new(CooldownTracker::new(Duration::from_secs(12 * 3600)));
        AppState::new(SignalOrchestrator::new(
            broker,
            discovery,
            cooldown,
            pacer,
            InstrumentPair::new("AAA", "BBB"),
        ))
    }

    fn post_webhook(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/webhook")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, Value) {
        let response = create_router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_missing_signal_is_bad_request() {
        let state = state_with(Arc::new(MockBroker::new(10)));

        for body in ["{}", "not json", "", r#"{"signal": 5}"#, r#"{"other": "long"}"#] {
            let (status, json) = send(&state, post_webhook(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
            assert_eq!(
                json,
                json!({"status": "error", "message": INVALID_FORMAT})
            );
        }
    }

    #[tokio::test]
    async fn test_unknown_signal_is_bad_request() {
        let state = state_with(Arc::new(MockBroker::new(10)));

        let (status, json) = send(&state, post_webhook(r#"{"signal": "Sideways"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            json,
            json!({"status": "error", "message": "Unknown signal type: sideways"})
        );
    }

    #[tokio::test]
    async fn test_long_signal_processed() {
        let _guard = COOLDOWN_GAUGE.lock().await;
        let broker = Arc::new(MockBroker::new(10));
        let state = state_with(broker.clone());

        let (status, json) = send(&state, post_webhook(r#"{"signal": "LONG"}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json,
            json!({
                "status": "success",
                "message": "Long signal processed",
                "handled": true,
                "cooldown": true
            })
        );
        assert_eq!(broker.closes(), vec!["BBB".to_string()]);
    }

    #[tokio::test]
    async fn test_unhandled_signal_still_succeeds() {
        let state = state_with(Arc::new(MockBroker::always_failing()));

        let (status, json) = send(&state, post_webhook(r#"{"signal": "short"}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Short signal processed");
        assert_eq!(json["handled"], false);
        assert_eq!(json["cooldown"], false);
    }

    #[tokio::test]
    async fn test_health_reports_cooldown() {
        let _guard = COOLDOWN_GAUGE.lock().await;
        let state = state_with(Arc::new(MockBroker::new(10)));
        let health = || Request::builder().uri("/health").body(Body::empty()).unwrap();

        let (status, json) = send(&state, health()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({"status": "ok", "cooldown": false}));

        state.cooldown().record_success();
        let (_, json) = send(&state, health()).await;
        assert_eq!(json, json!({"status": "ok", "cooldown": true}));
    }

    /// Serializes tests that write the global cooldown gauge.
    static COOLDOWN_GAUGE: Mutex<()> = Mutex::const_new(());

    async fn scrape(state: &AppState) -> String {
        let request = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
        let response = create_router(state.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_metrics_endpoint_reflects_cooldown() {
        let _guard = COOLDOWN_GAUGE.lock().await;
        Metrics::init();
        let state = state_with(Arc::new(MockBroker::new(10)));

        let text = scrape(&state).await;
        assert!(text.contains("flip_cooldown_active 0"), "{text}");

        state.cooldown().record_success();
        let text = scrape(&state).await;
        assert!(text.contains("flip_cooldown_active 1"), "{text}");
    }

    #[tokio::test]
    async fn test_cooldown_reads_leave_gauge_alone() {
        let _guard = COOLDOWN_GAUGE.lock().await;
        Metrics::init();
        let state = state_with(Arc::new(MockBroker::new(10)));

        Metrics::cooldown_active(true);
        assert!(!state.cooldown().is_in_cooldown());
        let health = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (_, json) = send(&state, health).await;
        assert_eq!(json["cooldown"], false);

        let gauge = Metrics::encode().unwrap();
        assert!(gauge.contains("flip_cooldown_active 1"), "{gauge}");
    }

    struct PanickingBroker;

    impl Broker for PanickingBroker {
        fn buy<'a>(&'a self, _symbol: &'a str, quantity: u32) -> BoxFuture<'a, ProbeResult> {
            Box::pin(async move {
                if quantity > 0 {
                    panic!("broker exploded");
                }
                ProbeResult::new(quantity, false, json!({}))
            })
        }

        fn close_positions<'a>(&'a self, _symbol: &'a str) -> BoxFuture<'a, Value> {
            Box::pin(async { json!({"status": "ok"}) })
        }
    }

    #[tokio::test]
    async fn test_panic_becomes_internal_error() {
        let state = state_with(Arc::new(PanickingBroker));

        let (status, json) = send(&state, post_webhook(r#"{"signal": "long"}"#)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json,
            json!({"status": "error", "message": "Internal error: broker exploded"})
        );

        // The lock is released after a panic.
        let (status, _) = send(&state, post_webhook(r#"{"signal": "short"}"#)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
