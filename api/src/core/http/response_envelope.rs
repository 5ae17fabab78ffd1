use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Universal response envelope for both success and error.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

/// Success body whose payload fields sit next to `success` instead of under
/// `data`, e.g. `{ "success": true, "answer": "..." }`.
///
/// The browser extension reads `answer` and `charts` from the top level.
#[derive(Debug, Serialize)]
pub struct FlatSuccess<T>
where
    T: Serialize,
{
    pub success: bool,

    #[serde(flatten)]
    pub body: T,
}

impl<T> FlatSuccess<T>
where
    T: Serialize,
{
    pub fn new(body: T) -> Self {
        Self {
            success: true,
            body,
        }
    }

    /// Convert to axum Response.
    pub fn into_response_with_status(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    /// Stable, machine-readable error code (e.g. "MISSING_INPUT").
    pub code: &'static str,
    /// Human-friendly error message.
    pub message: String,
    /// Fine-grained error details (per-field, hints, etc.).
    pub details: Vec<ApiErrorDetail>,
    /// Untouched model output when the dashboard spec could not be recovered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorDetail {
    /// Field path like `data` or `charts[2].x`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Optional hint to help the client fix the request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    /// Build a success envelope.
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Build an error envelope.
    pub fn error(
        code: &'static str,
        message: impl Into<String>,
        details: Vec<ApiErrorDetail>,
    ) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
                details,
                raw_output: None,
            }),
        }
    }

    /// Attach the raw model output to an error envelope.
    pub fn with_raw_output(mut self, raw: impl Into<String>) -> Self {
        if let Some(err) = self.error.as_mut() {
            err.raw_output = Some(raw.into());
        }
        self
    }

    /// Convert to axum Response.
    pub fn into_response_with_status(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_omits_error() {
        let v = serde_json::to_value(ApiResponse::success(json!({ "answer": "42" }))).unwrap();
        assert_eq!(v, json!({ "success": true, "data": { "answer": "42" } }));
    }

    #[test]
    fn flat_success_lifts_payload_fields() {
        let v = serde_json::to_value(FlatSuccess::new(json!({ "charts": [] }))).unwrap();
        assert_eq!(v, json!({ "success": true, "charts": [] }));
    }

    #[test]
    fn error_always_lists_details() {
        let v = serde_json::to_value(ApiResponse::<()>::error("LLM_ERROR", "down", vec![]))
            .unwrap();
        assert_eq!(
            v,
            json!({
                "success": false,
                "error": { "code": "LLM_ERROR", "message": "down", "details": [] }
            })
        );
    }

    #[test]
    fn raw_output_is_attached_to_errors_only() {
        let v = serde_json::to_value(
            ApiResponse::<()>::error("MISSING_CHARTS_FIELD", "no charts", vec![])
                .with_raw_output("{\"title\":\"oops\"}"),
        )
        .unwrap();
        assert_eq!(v["error"]["raw_output"], json!("{\"title\":\"oops\"}"));

        let ok = ApiResponse::success(1).with_raw_output("ignored");
        assert!(ok.error.is_none());
    }
}
