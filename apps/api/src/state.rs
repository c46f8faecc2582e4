use std::sync::Arc;

use crate::chat::{Guardrail, PromptTemplate};
use crate::llm_client::AiClient;
use crate::profile::ProfileService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub profiles: ProfileService,
    /// Pluggable AI backend. Anthropic in production, `MockAiClient` when
    /// AI_PROVIDER=mock and in tests.
    pub ai: Arc<dyn AiClient>,
    pub guardrail: Arc<Guardrail>,
    /// Built once at startup.
    pub prompts: Arc<PromptTemplate>,
}
