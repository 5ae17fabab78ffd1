//! Health service for the Ollama backend.
//!
//! Probe: `GET {endpoint}/api/tags` plus a best-effort check that the
//! configured model is listed.
//!
//! The returned [`HealthStatus`] is JSON-serializable and suitable for a `/health` endpoint.
//! [`HealthService::check`] is resilient and never fails (errors mapped to `ok=false`).
//! The strict probe (`try_probe_ollama`) returns a `Result`.

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{AiLlmError, HealthError, make_snippet};

/// Timeout used by the health probe when none is configured.
const DEFAULT_HEALTH_TIMEOUT_SECS: u64 = 10;

/// A serializable health snapshot for a single provider/config.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    /// Backend/provider (e.g., "Ollama").
    pub provider: String,
    /// Target endpoint base URL.
    pub endpoint: String,
    /// Model identifier relevant to the probe.
    pub model: Option<String>,
    /// Overall health flag.
    pub ok: bool,
    /// Measured HTTP latency in milliseconds for the main probe.
    pub latency_ms: u128,
    /// Short human-readable message with details.
    pub message: String,
}

impl HealthStatus {
    #[inline]
    fn new(
        cfg: &LlmModelConfig,
        ok: bool,
        latency_ms: u128,
        message: impl Into<String>,
    ) -> Self {
        Self {
            provider: cfg.provider.to_string(),
            endpoint: cfg.endpoint.clone(),
            model: Some(cfg.model.clone()),
            ok,
            latency_ms,
            message: message.into(),
        }
    }
}

/// A health checker that reuses a single HTTP client.
///
/// Probes use the service timeout, not the generation timeout of the
/// profile configs.
#[derive(Debug)]
pub struct HealthService {
    client: reqwest::Client,
}

impl HealthService {
    /// Creates a new health service with an optional client timeout (seconds).
    ///
    /// # Errors
    /// Returns [`AiLlmError::HttpTransport`] if the HTTP client cannot be built.
    pub fn new(timeout_secs: Option<u64>) -> Result<Self, AiLlmError> {
        let timeout = Duration::from_secs(timeout_secs.unwrap_or(DEFAULT_HEALTH_TIMEOUT_SECS));
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        info!(
            default_timeout_secs = timeout.as_secs(),
            "HealthService initialized"
        );

        Ok(Self { client })
    }

    /// Checks health for a single LLM config.
    ///
    /// This method is **resilient**: it never returns an error. Any failure is converted
    /// to `HealthStatus { ok: false, message: ... }`.
    pub async fn check(&self, cfg: &LlmModelConfig) -> HealthStatus {
        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            warn!(
                provider = %cfg.provider,
                endpoint = %cfg.endpoint,
                "invalid endpoint (empty or missing http/https)"
            );
            return HealthStatus::new(cfg, false, 0, "endpoint is empty or missing http/https");
        }

        let start = Instant::now();
        let result = match cfg.provider {
            LlmProvider::Ollama => self.try_probe_ollama(cfg).await,
        };

        match result {
            Ok(status) => {
                info!(
                    provider = %status.provider,
                    endpoint = %status.endpoint,
                    model = %status.model.as_deref().unwrap_or("n/a"),
                    ok = status.ok,
                    latency_ms = status.latency_ms,
                    "health probe completed"
                );
                status
            }
            Err(err) => {
                let status =
                    HealthStatus::new(cfg, false, start.elapsed().as_millis(), err.to_string());
                warn!(
                    provider = %status.provider,
                    endpoint = %status.endpoint,
                    latency_ms = status.latency_ms,
                    message = %status.message,
                    "health probe failed"
                );
                status
            }
        }
    }

    /// Checks health for multiple configs, one status per config.
    pub async fn check_many(&self, configs: &[LlmModelConfig]) -> Vec<HealthStatus> {
        debug!(count = configs.len(), "running batch health probes");
        let mut out = Vec::with_capacity(configs.len());
        for cfg in configs {
            out.push(self.check(cfg).await);
        }
        out
    }

    /// Strict Ollama probe. Returns an error on hard failures.
    async fn try_probe_ollama(&self, cfg: &LlmModelConfig) -> Result<HealthStatus, AiLlmError> {
        let url = format!("{}/api/tags", cfg.endpoint.trim().trim_end_matches('/'));

        let start = Instant::now();
        debug!(model = %cfg.model, "GET {}", url);

        let resp = self.client.get(&url).send().await?;
        let latency = start.elapsed().as_millis();

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);

            error!(
                %url,
                %status,
                %snippet,
                latency_ms = latency,
                "health GET /api/tags returned non-success status"
            );

            return Err(AiLlmError::from(HealthError::HttpStatus {
                status,
                url,
                snippet,
            }));
        }

        // Expected minimal JSON: { "models": [ { "name": "<model>" }, ... ] }
        #[derive(serde::Deserialize)]
        struct Tag {
            name: String,
        }
        #[derive(serde::Deserialize)]
        struct Tags {
            models: Option<Vec<Tag>>,
        }

        match resp.json::<Tags>().await {
            Ok(Tags {
                models: Some(models),
            }) => {
                if models.iter().any(|m| model_matches(&m.name, &cfg.model)) {
                    Ok(HealthStatus::new(
                        cfg,
                        true,
                        latency,
                        "Ollama is healthy; model is available",
                    ))
                } else {
                    Ok(HealthStatus::new(
                        cfg,
                        false,
                        latency,
                        "Ollama is up, but model not found in /api/tags",
                    ))
                }
            }
            Ok(Tags { models: None }) => Ok(HealthStatus::new(
                cfg,
                true,
                latency,
                "Ollama is healthy; tags response without `models` field",
            )),
            Err(e) => {
                warn!(
                    error = %e,
                    latency_ms = latency,
                    "failed to decode /api/tags; treating server as reachable"
                );
                Ok(HealthStatus::new(
                    cfg,
                    true,
                    latency,
                    format!("Ollama is reachable; failed to decode /api/tags: {e}"),
                ))
            }
        }
    }
}

/// Ollama lists untagged models as `name:latest`.
fn model_matches(listed: &str, configured: &str) -> bool {
    listed == configured || (!configured.contains(':') && listed == format!("{configured}:latest"))
}
