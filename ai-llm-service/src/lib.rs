//! Shared text-generation service for the Tableau AI relay.
//!
//! Two logical profiles sit on top of a local Ollama runtime:
//! `chat` answers questions about tabular data, `dashboard` proposes
//! chart specs and runs deterministically.

pub mod config;
pub mod error_handler;
pub mod health_service;
pub mod service_profiles;
pub mod services;
pub mod telemetry;

pub use config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider};
pub use error_handler::AiLlmError;
pub use health_service::{HealthService, HealthStatus};
pub use service_profiles::LlmServiceProfiles;
