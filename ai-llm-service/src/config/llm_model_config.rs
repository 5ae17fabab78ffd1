use crate::config::llm_provider::LlmProvider;

/// Configuration for one model invocation profile.
///
/// # Examples
///
/// ```
/// use ai_llm_service::{LlmModelConfig, LlmProvider};
///
/// let cfg = LlmModelConfig {
///     provider: LlmProvider::Ollama,
///     model: "llama3".to_string(),
///     endpoint: "http://localhost:11434".to_string(),
///     max_tokens: None,
///     temperature: Some(0.2),
///     top_p: None,
///     timeout_secs: Some(300),
/// };
/// assert_eq!(cfg.provider, LlmProvider::Ollama);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// The backend serving this profile.
    pub provider: LlmProvider,

    /// Model identifier (e.g. `"llama3"`, `"qwen2.5:14b"`).
    pub model: String,

    /// Base URL of the runtime, without the `/api/...` suffix.
    pub endpoint: String,

    /// Maximum number of tokens to generate (`num_predict`).
    pub max_tokens: Option<u32>,

    /// Sampling temperature.
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter.
    pub top_p: Option<f32>,

    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
}
