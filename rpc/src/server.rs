//! Axum router, shared state and listener loop.

use crate::handlers;
use crate::{GatewayConfig, GatewayMetrics};
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderMap, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use ecobuild_ledger::LedgerAdapter;
use ecobuild_types::Clock;
use ecobuild_verification::RewardOrchestrator;
use ecobuild_vision::Classifier;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<RewardOrchestrator>,
    pub metrics: Arc<GatewayMetrics>,
    pub config: Arc<GatewayConfig>,
    next_request: Arc<AtomicU64>,
}

impl AppState {
    /// Wire the orchestrator to its dependencies, reporting into a fresh
    /// metrics registry.
    pub fn new(
        config: GatewayConfig,
        classifier: Arc<dyn Classifier>,
        ledger: Arc<dyn LedgerAdapter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let metrics = Arc::new(GatewayMetrics::new());
        let orchestrator =
            RewardOrchestrator::new(classifier, ledger, clock, config.orchestrator_config())
                .with_observer(metrics.clone());
        Self {
            orchestrator: Arc::new(orchestrator),
            metrics,
            config: Arc::new(config),
            next_request: Arc::new(AtomicU64::new(0)),
        }
    }

    /// The caller's `x-request-id`, or a process-local `req-<n>`.
    pub fn request_id(&self, headers: &HeaderMap) -> String {
        headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| {
                let n = self.next_request.fetch_add(1, Ordering::Relaxed) + 1;
                format!("req-{n}")
            })
    }
}

pub fn router(state: AppState) -> Router {
    let max_body = state.config.max_body_bytes;
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/verify", post(handlers::verify))
        .route("/attest", post(handlers::attest))
        .route("/convert", post(handlers::convert))
        .route("/stats/:address", get(handlers::player_stats))
        .route("/global-stats", get(handlers::global_stats))
        .route("/metrics", get(handlers::metrics))
        .layer(DefaultBodyLimit::max(max_body))
        .layer(RequestBodyLimitLayer::new(max_body))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o.trim()).ok())
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

pub async fn serve(
    listener: tokio::net::TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
