mod core;
pub mod error_handler;
mod middleware_layer;
mod routes;

use std::{env, net::SocketAddr, sync::Arc};

use axum::{
    Router,
    routing::{get, post},
};
use tokio::signal;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

pub use crate::core::app_state::AppState;
use crate::{
    error_handler::AppError,
    middleware_layer::json_extractor::json_error_mapper,
    routes::{
        chat::chat_route::chat_route,
        dashboard::{ai_dashboard_route::ai_dashboard_route, series_route::series_route},
        health::health_route::health_route,
        tableau::tableau_routes::{signin_route, view_data_route, views_route, workbooks_route},
    },
};

/// Listen address used when `API_ADDRESS` is not set.
pub const DEFAULT_API_ADDRESS: &str = "127.0.0.1:5000";

/// Builds the HTTP router with all routes and layers.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_route))
        .route("/tableau/signin", post(signin_route))
        .route("/tableau/workbooks", post(workbooks_route))
        .route("/tableau/views", post(views_route))
        .route("/tableau/view-data", post(view_data_route))
        .route("/chat", post(chat_route))
        .route("/ai-dashboard", post(ai_dashboard_route))
        .route("/dashboard/series", post(series_route))
        .layer(axum::middleware::from_fn(json_error_mapper))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start() -> Result<(), AppError> {
    let addr = listen_address()?;
    let state = Arc::new(AppState::from_env()?);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(AppError::Bind)?;
    info!(%addr, "listening");

    // Graceful shutdown on Ctrl+C
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("server stopped");
    Ok(())
}

fn listen_address() -> Result<SocketAddr, AppError> {
    let raw = env::var("API_ADDRESS")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_API_ADDRESS.to_string());
    parse_address(&raw)
}

fn parse_address(raw: &str) -> Result<SocketAddr, AppError> {
    raw.trim()
        .parse()
        .map_err(|e: std::net::AddrParseError| AppError::InvalidEnv {
            var: "API_ADDRESS",
            reason: format!("{raw:?}: {e}"),
        })
}

/// Resolves when Ctrl+C is pressed.
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ai_llm_service::{LlmModelConfig, LlmProvider, LlmServiceProfiles};
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use httpmock::prelude::*;
    use serde_json::{Value, json};
    use tableau_client::{TableauClient, TableauConfig};
    use tower::ServiceExt;

    fn app(tableau_url: &str, ollama_url: &str) -> Router {
        let tableau = TableauClient::new(TableauConfig {
            server_url: tableau_url.to_string(),
            api_version: "3.25".into(),
            timeout_secs: 5,
        })
        .unwrap();
        let chat = LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: "llama3".into(),
            endpoint: ollama_url.to_string(),
            max_tokens: None,
            temperature: Some(0.2),
            top_p: None,
            timeout_secs: Some(5),
        };
        let llm = LlmServiceProfiles::new(chat, None, Some(2)).unwrap();
        router(Arc::new(AppState::new(tableau, Arc::new(llm))))
    }

    async fn post_json(app: Router, path: &str, body: Value) -> (StatusCode, Value) {
        let req = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn parses_listen_address() {
        assert_eq!(
            parse_address(DEFAULT_API_ADDRESS).unwrap().port(),
            5000
        );
        assert!(matches!(
            parse_address("localhost"),
            Err(AppError::InvalidEnv { var: "API_ADDRESS", .. })
        ));
    }

    #[tokio::test]
    async fn chat_without_question_is_missing_input() {
        let app = app("http://127.0.0.1:1", "http://127.0.0.1:1");
        let (status, body) =
            post_json(app, "/chat", json!({ "data": [{ "Region": "East" }] })).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["error"]["code"], "MISSING_INPUT");
        assert_eq!(body["error"]["details"][0]["path"], "question");
    }

    #[tokio::test]
    async fn malformed_json_is_wrapped_in_envelope() {
        let app = app("http://127.0.0.1:1", "http://127.0.0.1:1");
        let req = Request::builder()
            .method("POST")
            .uri("/chat")
            .header("content-type", "application/json")
            .body(Body::from("{\"question\": "))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(resp.headers().contains_key("x-request-id"));
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn signin_maps_tableau_401() {
        let server = MockServer::start_async().await;
        let m = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/3.25/auth/signin");
                then.status(401).body("<error/>");
            })
            .await;

        let app = app(&server.base_url(), "http://127.0.0.1:1");
        let (status, body) = post_json(
            app,
            "/tableau/signin",
            json!({ "username": "analyst", "password": "wrong" }),
        )
        .await;

        m.assert_async().await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "TABLEAU_UNAUTHORIZED");
    }

    #[tokio::test]
    async fn view_data_returns_typed_rows() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/3.25/sites/site-1/views/view-9/data")
                    .header("X-Tableau-Auth", "tok");
                then.status(200).body("Region,Sales\nEast,\"1,200\"\nWest,300\n");
            })
            .await;

        let app = app(&server.base_url(), "http://127.0.0.1:1");
        let (status, body) = post_json(
            app,
            "/tableau/view-data",
            json!({ "token": "tok", "site_id": "site-1", "view_id": "view-9" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["columns"], json!(["Region", "Sales"]));
        assert_eq!(body["data"]["rows"][0]["Sales"], json!(1200));
        assert_eq!(body["data"]["column_kinds"][1]["kind"], "numeric");
    }

    #[tokio::test]
    async fn views_require_workbook_id() {
        let app = app("http://127.0.0.1:1", "http://127.0.0.1:1");
        let (status, body) = post_json(
            app,
            "/tableau/views",
            json!({ "token": "tok", "site_id": "site-1" }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["details"][0]["path"], "workbook_id");
    }

    #[tokio::test]
    async fn chat_returns_trimmed_answer() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(200)
                    .json_body(json!({ "response": "  East sold the most.\n" }));
            })
            .await;

        let app = app("http://127.0.0.1:1", &server.base_url());
        let (status, body) = post_json(
            app,
            "/chat",
            json!({
                "question": "Which region sold the most?",
                "data": [{ "Region": "East", "Sales": "1,200" }, { "Region": "West", "Sales": 300 }]
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["answer"], "East sold the most.");
        assert!(body.get("data").is_none());
    }

    #[tokio::test]
    async fn ai_dashboard_returns_extracted_spec() {
        let server = MockServer::start_async().await;
        let raw = "Here you go:\n```json\n{\"charts\":[{\"title\":\"Sales by region\",\"type\":\"bar\",\"x\":\"Region\",\"y\":\"Sales\",\"agg\":\"sum\"}]}\n```";
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(200).json_body(json!({ "response": raw }));
            })
            .await;

        let app = app("http://127.0.0.1:1", &server.base_url());
        let (status, body) = post_json(
            app,
            "/ai-dashboard",
            json!({ "data": [{ "Region": "East", "Sales": 10 }] }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["charts"][0]["x"], "Region");
        assert_eq!(body["charts"][0]["type"], "bar");
    }

    #[tokio::test]
    async fn ai_dashboard_failure_carries_raw_output() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(200)
                    .json_body(json!({ "response": "I cannot chart this." }));
            })
            .await;

        let app = app("http://127.0.0.1:1", &server.base_url());
        let (status, body) = post_json(
            app,
            "/ai-dashboard",
            json!({ "data": [{ "Region": "East", "Sales": 10 }] }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "UNRECOGNIZABLE_OUTPUT");
        assert_eq!(body["error"]["raw_output"], "I cannot chart this.");
    }

    #[tokio::test]
    async fn series_aggregates_posted_rows() {
        let app = app("http://127.0.0.1:1", "http://127.0.0.1:1");
        let (status, body) = post_json(
            app,
            "/dashboard/series",
            json!({
                "data": [
                    { "Region": "East", "Sales": "100" },
                    { "Region": "West", "Sales": "50" },
                    { "Region": "East", "Sales": "25" }
                ],
                "charts": [{ "type": "bar", "x": "Region", "y": "Sales", "agg": "sum" }]
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let series = &body["data"]["series"][0];
        assert_eq!(series["labels"], json!(["East", "West"]));
        assert_eq!(series["values"], json!([125.0, 50.0]));
    }

    #[tokio::test]
    async fn health_reports_unreachable_model() {
        let app = app("http://127.0.0.1:1", "http://127.0.0.1:1");
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["data"]["status"], "ok");
        assert_eq!(body["data"]["llm"][0]["ok"], json!(false));
    }
}
