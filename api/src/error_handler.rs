use ai_llm_service::{AiLlmError, error_handler::ConfigError as LlmConfigError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use table_insights::DashboardExtractError;
use tableau_client::{TableauError, TableauProviderError};
use thiserror::Error;
use tracing::{error, warn};

use crate::core::http::response_envelope::{ApiErrorDetail, ApiResponse};

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error("invalid value for {var}: {reason}")]
    InvalidEnv { var: &'static str, reason: String },

    // --- IO / network / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request ---
    #[error("missing required field `{0}`")]
    MissingInput(&'static str),

    // --- Upstreams ---
    #[error(transparent)]
    Tableau(#[from] TableauError),

    #[error(transparent)]
    Llm(#[from] AiLlmError),

    #[error(transparent)]
    Extract(#[from] DashboardExtractError),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingInput(_) => StatusCode::BAD_REQUEST,

            AppError::Tableau(TableauError::Provider(p)) => match p {
                TableauProviderError::Unauthorized => StatusCode::UNAUTHORIZED,
                TableauProviderError::Forbidden => StatusCode::FORBIDDEN,
                TableauProviderError::NotFound => StatusCode::NOT_FOUND,
                TableauProviderError::Timeout => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::BAD_GATEWAY,
            },
            AppError::Tableau(TableauError::Parse(_)) => StatusCode::BAD_GATEWAY,
            AppError::Tableau(TableauError::Config(_)) => StatusCode::INTERNAL_SERVER_ERROR,

            AppError::Llm(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            AppError::Llm(AiLlmError::Config(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Llm(_) => StatusCode::BAD_GATEWAY,

            AppError::Extract(_) => StatusCode::BAD_GATEWAY,

            // startup-only
            AppError::InvalidEnv { .. } | AppError::Bind(_) | AppError::Server(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidEnv { .. } => "CONFIG_ERROR",
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::MissingInput(_) => "MISSING_INPUT",

            AppError::Tableau(TableauError::Provider(p)) => match p {
                TableauProviderError::Unauthorized => "TABLEAU_UNAUTHORIZED",
                TableauProviderError::Forbidden => "TABLEAU_FORBIDDEN",
                TableauProviderError::NotFound => "TABLEAU_NOT_FOUND",
                TableauProviderError::Timeout => "UPSTREAM_TIMEOUT",
                _ => "TABLEAU_UPSTREAM_ERROR",
            },
            AppError::Tableau(TableauError::Parse(_)) => "TABLEAU_BAD_RESPONSE",
            AppError::Tableau(TableauError::Config(_)) => "CONFIG_ERROR",

            AppError::Llm(e) if e.is_timeout() => "UPSTREAM_TIMEOUT",
            AppError::Llm(AiLlmError::Config(_)) => "CONFIG_ERROR",
            AppError::Llm(_) => "LLM_ERROR",

            AppError::Extract(DashboardExtractError::UnrecognizableOutput { .. }) => {
                "UNRECOGNIZABLE_OUTPUT"
            }
            AppError::Extract(DashboardExtractError::MalformedModelJson { .. }) => {
                "MALFORMED_MODEL_JSON"
            }
            AppError::Extract(DashboardExtractError::MissingChartsField { .. }) => {
                "MISSING_CHARTS_FIELD"
            }
        }
    }

    fn details(&self) -> Vec<ApiErrorDetail> {
        match self {
            AppError::MissingInput(field) => vec![ApiErrorDetail {
                path: Some((*field).to_string()),
                hint: Some("Provide a non-empty value for this field.".into()),
            }],
            AppError::Tableau(TableauError::Provider(TableauProviderError::Unauthorized)) => {
                vec![ApiErrorDetail {
                    path: None,
                    hint: Some("Sign in again to obtain a fresh Tableau token.".into()),
                }]
            }
            AppError::Llm(AiLlmError::Config(LlmConfigError::MissingVar(var))) => {
                vec![ApiErrorDetail {
                    path: Some((*var).to_string()),
                    hint: None,
                }]
            }
            _ => Vec::new(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        if status.is_server_error() {
            error!(%status, code, error = %self, "request failed");
        } else {
            warn!(%status, code, error = %self, "request rejected");
        }

        let mut envelope = ApiResponse::<()>::error(code, self.to_string(), self.details());
        if let AppError::Extract(e) = &self {
            envelope = envelope.with_raw_output(e.raw_output());
        }
        envelope.into_response_with_status(status)
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

/// Fails with [`AppError::MissingInput`] when `value` is blank.
pub fn require_text<'a>(field: &'static str, value: &'a str) -> AppResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(AppError::MissingInput(field))
    } else {
        Ok(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ai_llm_service::services::ollama_service::OllamaError;
    use std::time::Duration;
    use tableau_client::TableauParseError;

    #[test]
    fn tableau_statuses_are_passed_through() {
        let cases = [
            (TableauProviderError::Unauthorized, 401, "TABLEAU_UNAUTHORIZED"),
            (TableauProviderError::Forbidden, 403, "TABLEAU_FORBIDDEN"),
            (TableauProviderError::NotFound, 404, "TABLEAU_NOT_FOUND"),
            (TableauProviderError::Timeout, 504, "UPSTREAM_TIMEOUT"),
            (TableauProviderError::Server(503), 502, "TABLEAU_UPSTREAM_ERROR"),
            (
                TableauProviderError::Network("reset".into()),
                502,
                "TABLEAU_UPSTREAM_ERROR",
            ),
        ];
        for (provider, status, code) in cases {
            let err = AppError::from(TableauError::from(provider));
            assert_eq!(err.status_code().as_u16(), status);
            assert_eq!(err.error_code(), code);
        }
    }

    #[test]
    fn tableau_parse_failure_is_bad_gateway() {
        let err = AppError::from(TableauError::from(TableauParseError::MissingElement(
            "credentials",
        )));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.error_code(), "TABLEAU_BAD_RESPONSE");
    }

    #[test]
    fn llm_timeout_is_gateway_timeout() {
        let err = AppError::from(AiLlmError::from(OllamaError::Timeout(Duration::from_secs(
            300,
        ))));
        assert_eq!(err.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(err.error_code(), "UPSTREAM_TIMEOUT");

        let err = AppError::from(AiLlmError::from(OllamaError::Decode("x".into())));
        assert_eq!(err.error_code(), "LLM_ERROR");
    }

    #[test]
    fn extraction_codes_follow_the_variant() {
        let err = AppError::from(DashboardExtractError::MissingChartsField {
            raw: "{}".into(),
        });
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.error_code(), "MISSING_CHARTS_FIELD");
    }

    #[test]
    fn blank_text_is_missing_input() {
        assert!(matches!(
            require_text("question", "  "),
            Err(AppError::MissingInput("question"))
        ));
        assert_eq!(require_text("question", " why? ").unwrap(), "why?");
    }
}
