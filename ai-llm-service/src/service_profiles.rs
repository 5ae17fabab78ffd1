//! Shared LLM service with two active profiles: `chat` and `dashboard`.
//!
//! - Lives in the same Tokio runtime as the application.
//! - Construct once, wrap in `Arc`, and pass clones to dependents.
//! - Builds one HTTP client per distinct profile up front.
//! - If the `dashboard` profile is not provided, it falls back to `chat`
//!   with temperature pinned to `0.0`.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use ai_llm_service::{LlmModelConfig, LlmProvider, LlmServiceProfiles};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let chat = LlmModelConfig {
//!     provider: LlmProvider::Ollama,
//!     model: "llama3".into(),
//!     endpoint: "http://localhost:11434".into(),
//!     max_tokens: None,
//!     temperature: Some(0.2),
//!     top_p: None,
//!     timeout_secs: Some(300),
//! };
//!
//! let svc = Arc::new(LlmServiceProfiles::new(chat, None, Some(10))?);
//! let answer = svc.generate_chat("Which region sold the most?").await?;
//! println!("{answer}");
//! # Ok(()) }
//! ```

use std::sync::Arc;

use tracing::debug;

use crate::{
    config::{
        default_config::{config_ollama_chat, config_ollama_dashboard},
        llm_model_config::LlmModelConfig,
    },
    error_handler::AiLlmError,
    health_service::{HealthService, HealthStatus},
    services::ollama_service::OllamaService,
};

/// Shared service that manages two logical LLM profiles: **chat** and **dashboard**.
///
/// Both clients are built in [`LlmServiceProfiles::new`] and never replaced,
/// so a bad endpoint fails at startup. Identical profiles share one client.
#[derive(Debug)]
pub struct LlmServiceProfiles {
    chat: Arc<OllamaService>,
    dashboard: Arc<OllamaService>,
    health: HealthService,
}

impl LlmServiceProfiles {
    /// Creates a new service with two profiles.
    ///
    /// - `chat`: required chat profile.
    /// - `dashboard_opt`: optional dashboard profile. If `None`, falls back to
    ///   `chat` with `temperature = 0.0`.
    /// - `health_timeout_secs`: optional timeout for the health checker.
    pub fn new(
        chat: LlmModelConfig,
        dashboard_opt: Option<LlmModelConfig>,
        health_timeout_secs: Option<u64>,
    ) -> Result<Self, AiLlmError> {
        let dashboard = dashboard_opt.unwrap_or_else(|| LlmModelConfig {
            temperature: Some(0.0),
            ..chat.clone()
        });

        let shared = dashboard == chat;
        let chat = Arc::new(OllamaService::new(chat)?);
        let dashboard = if shared {
            Arc::clone(&chat)
        } else {
            Arc::new(OllamaService::new(dashboard)?)
        };
        debug!(shared, "ollama clients initialized");

        Ok(Self {
            chat,
            dashboard,
            health: HealthService::new(health_timeout_secs)?,
        })
    }

    /// Builds both profiles from environment (see [`crate::config::default_config`]).
    pub fn from_env() -> Result<Self, AiLlmError> {
        let chat = config_ollama_chat()?;
        let dashboard = config_ollama_dashboard()?;
        Self::new(chat, Some(dashboard), None)
    }

    /// Generates text using the **chat** profile.
    pub async fn generate_chat(&self, prompt: &str) -> Result<String, AiLlmError> {
        Ok(self.chat.generate(prompt).await?)
    }

    /// Generates text using the **dashboard** profile.
    pub async fn generate_dashboard(&self, prompt: &str) -> Result<String, AiLlmError> {
        Ok(self.dashboard.generate(prompt).await?)
    }

    /// Returns a health snapshot for all distinct profiles.
    ///
    /// Profiles sharing endpoint and model are probed once.
    pub async fn health_all(&self) -> Vec<HealthStatus> {
        let (c, d) = self.profiles();
        let mut list = vec![c.clone()];
        if (d.provider, &d.endpoint, &d.model) != (c.provider, &c.endpoint, &c.model) {
            list.push(d.clone());
        }
        self.health.check_many(&list).await
    }

    /// Returns references to the current profiles `(chat, dashboard)`.
    pub fn profiles(&self) -> (&LlmModelConfig, &LlmModelConfig) {
        (self.chat.config(), self.dashboard.config())
    }
}
