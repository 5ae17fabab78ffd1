use std::sync::Arc;

use ai_llm_service::LlmServiceProfiles;
use tableau_client::{TableauClient, TableauConfig};
use tracing::info;

use crate::error_handler::AppError;

/// Shared state for all HTTP handlers.
///
/// No per-user state lives here: Tableau session tokens travel with each
/// request.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Client for the Tableau REST API.
    pub tableau: TableauClient,
    /// Chat/dashboard text-generation profiles.
    pub llm: Arc<LlmServiceProfiles>,
}

impl AppState {
    pub fn new(tableau: TableauClient, llm: Arc<LlmServiceProfiles>) -> Self {
        Self { tableau, llm }
    }

    /// Load shared state from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        let tableau = TableauClient::new(TableauConfig::from_env()?)?;
        let llm = Arc::new(LlmServiceProfiles::from_env()?);

        let (chat, dashboard) = llm.profiles();
        info!(
            tableau = %tableau.base_api(),
            ollama = %chat.endpoint,
            chat_model = %chat.model,
            dashboard_model = %dashboard.model,
            "application state loaded"
        );

        Ok(Self::new(tableau, llm))
    }
}
