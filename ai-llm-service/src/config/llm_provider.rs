use std::fmt;

/// Backend used for text generation.
///
/// Only a local Ollama runtime is wired today; the enum keeps provider
/// routing explicit in the service and in health reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    /// Local Ollama runtime (`/api/generate`, `/api/tags`).
    Ollama,
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmProvider::Ollama => f.write_str("Ollama"),
        }
    }
}
