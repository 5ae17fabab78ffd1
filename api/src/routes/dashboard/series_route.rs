//! POST /dashboard/series: aggregates rows into plottable series.

use axum::{Json, http::StatusCode, response::Response};
use table_insights::{Table, build_series, coerce_numeric_columns};
use tracing::{debug, instrument};

use crate::{
    core::http::response_envelope::ApiResponse,
    error_handler::{AppError, AppResult},
    routes::dashboard::dashboard_request::{SeriesRequest, SeriesResponse},
};

/// Handler: POST /dashboard/series
///
/// Pure computation; no upstream call.
#[instrument(
    name = "series_route",
    skip_all,
    fields(rows = body.data.len(), charts = body.charts.len())
)]
pub async fn series_route(Json(body): Json<SeriesRequest>) -> AppResult<Response> {
    if body.data.is_empty() {
        return Err(AppError::MissingInput("data"));
    }
    if body.charts.is_empty() {
        return Err(AppError::MissingInput("charts"));
    }

    let mut table = Table::from_rows(body.data);
    coerce_numeric_columns(&mut table);

    let series = build_series(&table, &body.charts);
    debug!(rendered = series.len(), "series built");

    Ok(ApiResponse::success(SeriesResponse { series }).into_response_with_status(StatusCode::OK))
}
