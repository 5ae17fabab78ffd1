use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, HeaderValue, Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::{Instrument, debug, info_span};

use crate::core::http::response_envelope::{ApiErrorDetail, ApiResponse};

pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

async fn take_body(res: Response) -> (axum::http::response::Parts, Bytes) {
    let (parts, body) = res.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();
    (parts, bytes)
}

fn guess_path_from_serde_msg(msg: &str) -> Option<String> {
    for key in [
        "data",
        "charts",
        "question",
        "username",
        "password",
        "token",
        "site_id",
        "workbook_id",
        "view_id",
    ] {
        if msg.contains(&format!("`{key}`")) {
            return Some(key.to_string());
        }
    }
    None
}

fn request_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn new_request_id() -> String {
    let now = Utc::now();
    let nanos = now
        .timestamp_nanos_opt()
        .unwrap_or_else(|| now.timestamp_micros() * 1000);
    format!("req-{nanos}")
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

/// Stamps every request/response pair with `X-Request-Id` and rewrites
/// plain-text 400/422 bodies (axum JSON extractor rejections) into the
/// JSON envelope. Envelopes produced by handlers pass through untouched.
pub async fn json_error_mapper(mut req: Request<Body>, next: Next) -> Response {
    let id = request_id(req.headers()).unwrap_or_else(new_request_id);
    if let Ok(v) = HeaderValue::from_str(&id) {
        req.headers_mut().insert(REQUEST_ID_HEADER, v);
    }

    let span = info_span!(
        "http_request",
        request_id = %id,
        method = %req.method(),
        path = %req.uri().path()
    );
    let res = next.run(req).instrument(span).await;
    let status = res.status();

    let mut res = if (status == StatusCode::BAD_REQUEST
        || status == StatusCode::UNPROCESSABLE_ENTITY)
        && !is_json(res.headers())
    {
        rejection_to_envelope(res, status).await
    } else {
        res
    };

    if let Ok(v) = HeaderValue::from_str(&id) {
        res.headers_mut().insert(REQUEST_ID_HEADER, v);
    }
    res
}

async fn rejection_to_envelope(res: Response, status: StatusCode) -> Response {
    let (mut parts, bytes) = take_body(res).await;
    let original = String::from_utf8_lossy(&bytes);
    debug!(%status, body = %original.trim(), "mapping extractor rejection");

    let detail = ApiErrorDetail {
        path: guess_path_from_serde_msg(&original),
        hint: if original.contains("expected a sequence") {
            Some("Expected an array for this field (e.g. [{\"Region\": \"East\"}]).".into())
        } else if original.contains("expected a map") || original.contains("expected struct") {
            Some("Expected a JSON object here (e.g. { \"field\": \"value\" }).".into())
        } else if original.contains("Content-Type") {
            Some("Send the body with `Content-Type: application/json`.".into())
        } else {
            None
        },
    };

    let envelope = ApiResponse::<()>::error(
        if status == StatusCode::BAD_REQUEST {
            "BAD_REQUEST"
        } else {
            "UNPROCESSABLE_ENTITY"
        },
        original.trim(),
        vec![detail],
    );

    let body = match serde_json::to_vec(&envelope) {
        Ok(v) => v,
        Err(_) => bytes.to_vec(),
    };

    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    parts.headers.remove(header::CONTENT_LENGTH);

    Response::from_parts(parts, body.into())
}
