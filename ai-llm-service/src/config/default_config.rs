//! Default LLM configs loaded from environment variables.
//!
//! Two roles, both served by Ollama:
//!
//! - **Chat**      → answers questions about the posted rows (`temperature = 0.2`)
//! - **Dashboard** → emits a JSON chart spec (`temperature = 0.0`)
//!
//! # Environment variables
//!
//! - `OLLAMA_URL` or `OLLAMA_PORT` = endpoint (mandatory)
//! - `OLLAMA_MODEL`                = chat model (mandatory)
//! - `OLLAMA_DASHBOARD_MODEL`      = dashboard model (optional, defaults to `OLLAMA_MODEL`)
//! - `LLM_MAX_TOKENS`              = optional max tokens (u32)
//! - `LLM_TIMEOUT_SECS`            = optional request timeout (u64, default 300)

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, ConfigError, env_opt_u32, env_opt_u64, must_env, validate_http_endpoint,
    },
};

/// Default request timeout for generation calls, in seconds.
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 300;

/// Resolves the Ollama endpoint strictly from environment.
///
/// Precedence:
/// 1. `OLLAMA_URL` if present and non-empty
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
fn ollama_endpoint() -> Result<String, AiLlmError> {
    endpoint_from(
        std::env::var("OLLAMA_URL").ok(),
        std::env::var("OLLAMA_PORT").ok(),
    )
}

fn endpoint_from(url: Option<String>, port: Option<String>) -> Result<String, AiLlmError> {
    if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
        let url = url.trim().trim_end_matches('/').to_string();
        validate_http_endpoint("OLLAMA_URL", &url)?;
        return Ok(url);
    }
    if let Some(port) = port.filter(|p| !p.trim().is_empty()) {
        let port = port
            .trim()
            .parse::<u16>()
            .ok()
            .filter(|p| *p > 0)
            .ok_or(ConfigError::InvalidNumber {
                var: "OLLAMA_PORT",
                reason: "expected u16 (1..=65535)",
            })?;
        return Ok(format!("http://localhost:{port}"));
    }
    Err(AiLlmError::Config(ConfigError::MissingVar(
        "OLLAMA_URL or OLLAMA_PORT",
    )))
}

fn llm_timeout_secs() -> Result<u64, AiLlmError> {
    Ok(env_opt_u64("LLM_TIMEOUT_SECS")?
        .filter(|s| *s > 0)
        .unwrap_or(DEFAULT_LLM_TIMEOUT_SECS))
}

/// Constructs the **chat** profile.
///
/// # Env
/// - `OLLAMA_MODEL` (required)
/// - `LLM_MAX_TOKENS`, `LLM_TIMEOUT_SECS` (optional)
pub fn config_ollama_chat() -> Result<LlmModelConfig, AiLlmError> {
    let endpoint = ollama_endpoint()?;
    let model = must_env("OLLAMA_MODEL")?;

    Ok(LlmModelConfig {
        provider: LlmProvider::Ollama,
        model,
        endpoint,
        max_tokens: env_opt_u32("LLM_MAX_TOKENS")?,
        temperature: Some(0.2),
        top_p: None,
        timeout_secs: Some(llm_timeout_secs()?),
    })
}

/// Constructs the **dashboard** profile.
///
/// Uses `OLLAMA_DASHBOARD_MODEL` when set, otherwise the chat model.
/// Temperature is pinned to `0.0` so the same rows yield the same spec.
pub fn config_ollama_dashboard() -> Result<LlmModelConfig, AiLlmError> {
    let endpoint = ollama_endpoint()?;
    let model = match std::env::var("OLLAMA_DASHBOARD_MODEL") {
        Ok(m) if !m.trim().is_empty() => m,
        _ => must_env("OLLAMA_MODEL")?,
    };

    Ok(LlmModelConfig {
        provider: LlmProvider::Ollama,
        model,
        endpoint,
        max_tokens: env_opt_u32("LLM_MAX_TOKENS")?,
        temperature: Some(0.0),
        top_p: None,
        timeout_secs: Some(llm_timeout_secs()?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_wins_over_port_and_loses_trailing_slash() {
        let ep = endpoint_from(Some("http://gpu:11434/".into()), Some("1".into())).unwrap();
        assert_eq!(ep, "http://gpu:11434");
    }

    #[test]
    fn port_builds_localhost_url() {
        let ep = endpoint_from(Some("  ".into()), Some("11434".into())).unwrap();
        assert_eq!(ep, "http://localhost:11434");
    }

    #[test]
    fn bad_port_is_config_error() {
        let err = endpoint_from(None, Some("eleven".into())).unwrap_err();
        assert!(matches!(
            err,
            AiLlmError::Config(ConfigError::InvalidNumber { var: "OLLAMA_PORT", .. })
        ));
    }

    #[test]
    fn url_without_scheme_is_rejected() {
        let err = endpoint_from(Some("localhost:11434".into()), None).unwrap_err();
        assert!(matches!(
            err,
            AiLlmError::Config(ConfigError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn missing_both_is_reported() {
        let err = endpoint_from(None, None).unwrap_err();
        assert!(matches!(err, AiLlmError::Config(ConfigError::MissingVar(_))));
    }
}
