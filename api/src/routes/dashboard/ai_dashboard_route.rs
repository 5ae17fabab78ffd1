//! POST /ai-dashboard: asks the model for a chart spec over the posted rows.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::Response};
use table_insights::{
    Table, build_dashboard_prompt, coerce_numeric_columns, extract_dashboard_spec,
};
use tracing::{debug, info, instrument, warn};

use crate::{
    core::{app_state::AppState, http::response_envelope::FlatSuccess},
    error_handler::{AppError, AppResult},
    routes::dashboard::dashboard_request::AiDashboardRequest,
};

/// Handler: POST /ai-dashboard
///
/// On success the model's object is returned as produced (`charts` plus any
/// extra keys) next to `success`. When the output cannot be recovered the error
/// envelope carries `raw_output`.
#[instrument(name = "ai_dashboard_route", skip_all, fields(rows = body.data.len()))]
pub async fn ai_dashboard_route(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AiDashboardRequest>,
) -> AppResult<Response> {
    if body.data.is_empty() {
        return Err(AppError::MissingInput("data"));
    }

    let mut table = Table::from_rows(body.data);
    let coerced = coerce_numeric_columns(&mut table);
    debug!(?coerced, "numeric columns coerced");

    let prompt = build_dashboard_prompt(&table);
    let raw = state.llm.generate_dashboard(&prompt).await?;

    let spec = extract_dashboard_spec(&raw)?;

    let unknown = spec.unknown_columns(table.columns());
    if !unknown.is_empty() {
        warn!(?unknown, "dashboard spec references columns not in the data");
    }
    info!(charts = spec.charts().len(), "dashboard spec extracted");

    Ok(FlatSuccess::new(spec).into_response_with_status(StatusCode::OK))
}
