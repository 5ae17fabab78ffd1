use serde::{Deserialize, Serialize};
use table_insights::Row;

/// Request payload for /chat.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ChatRequest {
    /// Natural language question about `data`.
    pub question: String,
    /// Rows as shown to the user (one object per row).
    pub data: Vec<Row>,
}

/// Response payload for /chat.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// Model answer (plain text).
    pub answer: String,
}
