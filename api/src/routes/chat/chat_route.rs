//! POST /chat: answers a question using only the posted rows.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::Response};
use table_insights::{Table, build_chat_prompt, coerce_numeric_columns};
use tracing::{debug, info, instrument};

use crate::{
    core::{app_state::AppState, http::response_envelope::FlatSuccess},
    error_handler::{AppError, AppResult, require_text},
    routes::chat::chat_request::{ChatRequest, ChatResponse},
};

/// Handler: POST /chat
///
/// Success body: `{ "success": true, "answer": "..." }`.
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:5000/chat \
///   -H 'content-type: application/json' \
///   -d '{"question":"Which region sold the most?","data":[{"Region":"East","Sales":"1,200"}]}'
/// ```
#[instrument(name = "chat_route", skip_all, fields(rows = body.data.len()))]
pub async fn chat_route(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ChatRequest>,
) -> AppResult<Response> {
    let question = require_text("question", &body.question)?.to_string();
    if body.data.is_empty() {
        return Err(AppError::MissingInput("data"));
    }

    let mut table = Table::from_rows(body.data);
    let coerced = coerce_numeric_columns(&mut table);
    debug!(?coerced, "numeric columns coerced");

    let prompt = build_chat_prompt(&table, &question);
    let answer = state.llm.generate_chat(&prompt).await?;
    info!(answer_len = answer.len(), "chat answered");

    Ok(FlatSuccess::new(ChatResponse {
        answer: answer.trim().to_string(),
    })
    .into_response_with_status(StatusCode::OK))
}
