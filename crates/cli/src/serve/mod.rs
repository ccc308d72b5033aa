//! `praxis serve` -- HTTP JSON API for the policy engine.
//!
//! Endpoints:
//! - GET  /health    - Server status
//! - GET  /policies  - Loaded policies and their rules
//! - POST /process   - Process a request envelope
//!
//! All responses use Content-Type: application/json.

mod handlers;
mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use praxis_eval::Engine;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use self::handlers::{handle_health, handle_list_policies, handle_not_found, handle_process};
use self::state::AppState;
use crate::config::ServerSettings;

/// Construct a JSON error response with the given status code and message.
fn json_error(status: StatusCode, message: &str) -> impl IntoResponse {
    (status, Json(serde_json::json!({"error": message})))
}

fn router(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/policies", get(handle_list_policies))
        .route("/process", post(handle_process))
        .fallback(handle_not_found)
        .layer(cors)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve `engine` until Ctrl+C.
pub async fn start_server(
    settings: ServerSettings,
    engine: Engine,
) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        policies = engine.policies().len(),
        request_schema = engine.request_schema().is_some(),
        response_schema = engine.response_schema().is_some(),
        "engine ready"
    );

    let state = Arc::new(AppState {
        engine,
        request_timeout: Duration::from_millis(settings.request_timeout_ms),
    });
    let app = router(state, settings.max_body_bytes);

    let addr = format!("0.0.0.0:{}", settings.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("praxis listening on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server shut down");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    info!("received shutdown signal");
}
