//! GET /health: liveness plus a best-effort probe of the model runtime.

use std::sync::Arc;

use ai_llm_service::HealthStatus;
use axum::{extract::State, http::StatusCode, response::Response};
use serde::Serialize;
use tracing::instrument;

use crate::core::{app_state::AppState, http::response_envelope::ApiResponse};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the process serves requests.
    pub status: &'static str,
    /// One entry per distinct model profile.
    pub llm: Vec<HealthStatus>,
}

/// Handler: GET /health
///
/// Never fails; an unreachable model runtime shows up as `ok: false`.
#[instrument(name = "health_route", skip_all)]
pub async fn health_route(State(state): State<Arc<AppState>>) -> Response {
    let llm = state.llm.health_all().await;
    ApiResponse::success(HealthResponse { status: "ok", llm })
        .into_response_with_status(StatusCode::OK)
}
