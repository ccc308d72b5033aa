//! HTTP route handlers: health, policies, process.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use praxis_eval::ProcessError;
use tracing::warn;

use super::json_error;
use super::state::AppState;
use crate::commands::process::error_body;

/// Fallback handler for unmatched routes.
pub(crate) async fn handle_not_found() -> impl IntoResponse {
    json_error(StatusCode::NOT_FOUND, "not found")
}

/// GET /health
pub(crate) async fn handle_health() -> impl IntoResponse {
    let response = serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(response))
}

/// GET /policies
pub(crate) async fn handle_list_policies(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let policies: Vec<serde_json::Value> = state
        .engine
        .policies()
        .iter()
        .map(|p| {
            let rules: Vec<&str> = p.rules.iter().map(|r| r.text.as_str()).collect();
            serde_json::json!({ "name": p.name, "rules": rules })
        })
        .collect();
    (StatusCode::OK, Json(serde_json::json!({ "policies": policies })))
}

fn status_for(e: &ProcessError) -> StatusCode {
    match e {
        ProcessError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
        ProcessError::RequestValidation(_) | ProcessError::PolicyFailure(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ProcessError::ResponseValidation(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// POST /process
///
/// The body is processed on a blocking worker; the call is abandoned with
/// 504 once the configured timeout elapses.
pub(crate) async fn handle_process(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> impl IntoResponse {
    let timeout = state.request_timeout;
    let worker = state.clone();
    let task = tokio::task::spawn_blocking(move || worker.engine.process_request(&body));

    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(Ok(response))) => (StatusCode::OK, Json(response)).into_response(),
        Ok(Ok(Err(e))) => {
            let status = status_for(&e);
            warn!(kind = e.kind(), status = status.as_u16(), "request rejected");
            (status, Json(error_body(&e))).into_response()
        }
        Ok(Err(e)) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            &format!("task join error: {}", e),
        )
        .into_response(),
        Err(_) => {
            warn!(timeout_ms = timeout.as_millis() as u64, "request timed out");
            json_error(StatusCode::GATEWAY_TIMEOUT, "request processing timed out").into_response()
        }
    }
}
