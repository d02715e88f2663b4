//! HTTP API route definitions.
//!
//! The generative proxy is one router fragment shared by both server
//! variants; the data proxy adds the store fragment on top of it.

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::gemini::GeminiClient;
use crate::store::RecordStore;

use super::handlers::{
    create_nutrition, create_session, health, list_nutrition, list_sessions, proxy_generate,
    GenerateState, StoreState,
};

/// Settings shared by both server variants.
#[derive(Debug, Clone)]
pub struct RouterOptions {
    /// Directory served for unmatched paths.
    pub static_dir: PathBuf,
    /// Prometheus handle; `/metrics` is only mounted when present.
    pub metrics: Option<PrometheusHandle>,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            static_dir: PathBuf::from("."),
            metrics: None,
        }
    }
}

/// Routes for the generative proxy.
pub fn generate_routes(gemini: GeminiClient) -> Router {
    Router::new()
        .route("/api/proxy-generate", post(proxy_generate))
        .with_state(GenerateState { gemini })
}

/// Routes for the per-user data endpoints.
pub fn store_routes(store: Arc<dyn RecordStore>) -> Router {
    Router::new()
        .route("/api/sessions", get(list_sessions).post(create_session))
        .route("/api/nutrition", get(list_nutrition).post(create_nutrition))
        .with_state(StoreState { store })
}

/// Gateway: generative proxy plus static files.
pub fn gateway_router(gemini: GeminiClient, options: &RouterOptions) -> Router {
    finish(generate_routes(gemini), options)
}

/// Data proxy: everything the gateway serves plus the data endpoints.
pub fn data_proxy_router(
    gemini: GeminiClient,
    store: Arc<dyn RecordStore>,
    options: &RouterOptions,
) -> Router {
    finish(generate_routes(gemini).merge(store_routes(store)), options)
}

/// Whether any path segment names a hidden file, literally or percent-encoded.
fn is_hidden_path(path: &str) -> bool {
    path.split('/').any(|segment| {
        segment.starts_with('.')
            || segment
                .get(..3)
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case("%2e"))
    })
}

/// Answer 404 for dotfile paths so `.env` and friends never reach `ServeDir`.
async fn hide_dotfiles(request: Request<Body>, next: Next) -> Response {
    if is_hidden_path(request.uri().path()) {
        return StatusCode::NOT_FOUND.into_response();
    }
    next.run(request).await
}

/// Add health/metrics, the static fallback and request tracing.
fn finish(api: Router, options: &RouterOptions) -> Router {
    let mut router = api.route("/health", get(health));

    if let Some(handle) = options.metrics.clone() {
        router = router.route(
            "/metrics",
            get(move || {
                let handle = handle.clone();
                async move { handle.render() }
            }),
        );
    }

    router
        .fallback_service(ServeDir::new(&options.static_dir))
        .layer(middleware::from_fn(hide_dotfiles))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    user_id = tracing::field::Empty,
                )
            }),
        )
}
