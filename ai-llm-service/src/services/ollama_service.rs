//! Lightweight Ollama service for text generation.
//!
//! Thin client for the local Ollama API:
//! - `POST {endpoint}/api/generate`: synchronous text generation (`stream=false`)
//!
//! It uses the universal configuration [`LlmModelConfig`].
//!
//! # Examples
//!
//! ```no_run
//! use ai_llm_service::{LlmModelConfig, LlmProvider};
//! use ai_llm_service::services::ollama_service::OllamaService;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = LlmModelConfig {
//!     provider: LlmProvider::Ollama,
//!     model: "llama3".into(),
//!     endpoint: "http://localhost:11434".into(),
//!     max_tokens: Some(256),
//!     temperature: Some(0.2),
//!     top_p: None,
//!     timeout_secs: Some(300),
//! };
//!
//! let svc = OllamaService::new(cfg)?;
//! let text = svc.generate("Summarize sales by region.").await?;
//! println!("Generated:\n{}", text);
//! # Ok(()) }
//! ```

use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::llm_model_config::LlmModelConfig;
use crate::error_handler::make_snippet;

const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Errors produced by [`OllamaService`].
#[derive(Debug, Error)]
pub enum OllamaError {
    /// Invalid endpoint (empty or missing http/https).
    #[error("[AI LLM Service] invalid Ollama endpoint: {0}")]
    InvalidEndpoint(String),

    /// The runtime did not answer within the configured timeout.
    #[error("[AI LLM Service] Ollama did not answer within {0:?}")]
    Timeout(Duration),

    /// Transport/HTTP client error.
    #[error("[AI LLM Service] transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// Non-successful HTTP status from upstream.
    #[error("[AI LLM Service] unexpected HTTP status {status} from {url}: {snippet}")]
    HttpStatus {
        /// Numeric HTTP status code.
        status: StatusCode,
        /// Request URL.
        url: String,
        /// Short snippet of the response body.
        snippet: String,
    },

    /// Unexpected/invalid JSON response.
    #[error("[AI LLM Service] failed to decode response: {0}")]
    Decode(String),
}

/// Result alias for Ollama operations.
pub type Result<T> = std::result::Result<T, OllamaError>;

/// Thin client for Ollama.
///
/// Initialized with a full [`LlmModelConfig`]; reuses one HTTP client whose
/// timeout comes from the config.
#[derive(Debug)]
pub struct OllamaService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    timeout: Duration,
    url_generate: String,
}

impl OllamaService {
    /// Creates a new [`OllamaService`] from the given config.
    ///
    /// # Errors
    /// - [`OllamaError::InvalidEndpoint`] if `cfg.endpoint` is invalid
    /// - [`OllamaError::Transport`] if HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self> {
        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(OllamaError::InvalidEndpoint(cfg.endpoint));
        }

        let timeout = Duration::from_secs(cfg.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(OllamaError::Transport)?;

        let url_generate = format!("{}/api/generate", endpoint.trim_end_matches('/'));

        Ok(Self {
            client,
            cfg,
            timeout,
            url_generate,
        })
    }

    /// Profile this client was built from.
    pub fn config(&self) -> &LlmModelConfig {
        &self.cfg
    }

    /// Performs a **non-streaming** generation request via `/api/generate`.
    ///
    /// Mapped options:
    /// - `model`        ← `self.cfg.model`
    /// - `prompt`       ← argument
    /// - `num_predict`  ← `self.cfg.max_tokens`
    /// - `temperature`  ← `self.cfg.temperature`
    /// - `top_p`        ← `self.cfg.top_p`
    ///
    /// # Errors
    /// - [`OllamaError::Timeout`] when the configured timeout elapses
    /// - [`OllamaError::HttpStatus`] for non-2xx responses
    /// - [`OllamaError::Transport`] for client errors
    /// - [`OllamaError::Decode`] if response cannot be parsed
    #[instrument(skip_all, fields(model = %self.cfg.model, prompt_len = prompt.len()))]
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let body = GenerateRequest::from_cfg(&self.cfg, prompt);

        debug!("POST {}", self.url_generate);
        let resp = self
            .client
            .post(&self.url_generate)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_generate.clone();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);
            warn!(%status, %snippet, "ollama generate returned non-success status");
            return Err(OllamaError::HttpStatus {
                status,
                url,
                snippet,
            });
        }

        let out: GenerateResponse = resp.json().await.map_err(|e| {
            if e.is_timeout() {
                OllamaError::Timeout(self.timeout)
            } else {
                OllamaError::Decode(format!("serde error: {e}; ensure `stream=false` is used"))
            }
        })?;

        debug!(response_len = out.response.len(), "ollama generate completed");
        Ok(out.response)
    }

    fn transport_error(&self, e: reqwest::Error) -> OllamaError {
        if e.is_timeout() {
            OllamaError::Timeout(self.timeout)
        } else {
            OllamaError::Transport(e)
        }
    }
}

/* ==========================
HTTP payloads & options
========================== */

/// Request body for `/api/generate` (non-streaming).
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerateOptions>,
}

impl<'a> GenerateRequest<'a> {
    /// Builds a request from config and prompt.
    fn from_cfg(cfg: &'a LlmModelConfig, prompt: &'a str) -> Self {
        let options = GenerateOptions {
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            num_predict: cfg.max_tokens,
        };

        Self {
            model: &cfg.model,
            prompt,
            stream: false,
            options: Some(options),
        }
    }
}

/// Subset of Ollama `options`.
#[derive(Debug, Default, Serialize)]
struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Response body for `/api/generate`; the generated text is in `response`.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}
