//! Tableau relay routes. Each call is stateless: the client passes the
//! session token and site id it received from `/tableau/signin`.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::Response};
use tracing::{info, instrument};

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::{AppResult, require_text},
    routes::tableau::{
        tableau_request::{SignInRequest, ViewDataRequest, ViewsRequest, WorkbooksRequest},
        tableau_response::{ViewDataResponse, ViewsResponse, WorkbooksResponse},
    },
};

/// Handler: POST /tableau/signin
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:5000/tableau/signin \
///   -H 'content-type: application/json' \
///   -d '{"username":"analyst","password":"secret","site_content_url":"sales"}'
/// ```
#[instrument(name = "tableau_signin_route", skip_all, fields(user = %body.username))]
pub async fn signin_route(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SignInRequest>,
) -> AppResult<Response> {
    let creds = body.credentials()?;
    let session = state.tableau.sign_in(&creds).await?;
    info!(site_id = %session.site_id, "tableau sign-in succeeded");
    Ok(ApiResponse::success(session).into_response_with_status(StatusCode::OK))
}

/// Handler: POST /tableau/workbooks
#[instrument(name = "tableau_workbooks_route", skip_all, fields(site_id = %body.auth.site_id))]
pub async fn workbooks_route(
    State(state): State<Arc<AppState>>,
    Json(body): Json<WorkbooksRequest>,
) -> AppResult<Response> {
    let auth = body.auth.site_auth()?;
    let workbooks = state.tableau.list_workbooks(&auth).await?;
    Ok(ApiResponse::success(WorkbooksResponse { workbooks })
        .into_response_with_status(StatusCode::OK))
}

/// Handler: POST /tableau/views
#[instrument(name = "tableau_views_route", skip_all, fields(workbook_id = %body.workbook_id))]
pub async fn views_route(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ViewsRequest>,
) -> AppResult<Response> {
    let auth = body.auth.site_auth()?;
    let workbook_id = require_text("workbook_id", &body.workbook_id)?;
    let views = state.tableau.list_views(&auth, workbook_id).await?;
    Ok(ApiResponse::success(ViewsResponse { views }).into_response_with_status(StatusCode::OK))
}

/// Handler: POST /tableau/view-data
///
/// Returns the view's rows with mostly-numeric columns already coerced.
#[instrument(name = "tableau_view_data_route", skip_all, fields(view_id = %body.view_id))]
pub async fn view_data_route(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ViewDataRequest>,
) -> AppResult<Response> {
    let auth = body.auth.site_auth()?;
    let view_id = require_text("view_id", &body.view_id)?;
    let table = state.tableau.fetch_view_data(&auth, view_id).await?;
    info!(rows = table.len(), "view data fetched");
    Ok(ApiResponse::success(ViewDataResponse::from(table))
        .into_response_with_status(StatusCode::OK))
}
