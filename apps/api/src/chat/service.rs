use std::time::Instant;

use tracing::info;

use crate::chat::{Guardrail, PromptTemplate};
use crate::errors::AppError;
use crate::llm_client::AiClient;
use crate::models::chat::{ChatMessage, TokenUsage};
use crate::profile::ProfileService;

/// Collaborators the chat pipeline needs. Borrowed from `AppState`.
pub struct ChatDeps<'a> {
    pub profiles: &'a ProfileService,
    pub guardrail: &'a Guardrail,
    pub prompts: &'a PromptTemplate,
    pub ai: &'a dyn AiClient,
}

/// Generates resume content for `user_id` from the conversation so far.
///
/// Errors: NotFound (no profile), Validation (empty or oversized input),
/// AiService (any provider failure). The profile is only read.
pub async fn generate_resume(
    deps: ChatDeps<'_>,
    user_id: &str,
    messages: &[ChatMessage],
) -> Result<(ChatMessage, TokenUsage), AppError> {
    let started = Instant::now();

    let profile = deps.profiles.get_profile(user_id).await?;
    info!(
        user_id,
        "Loaded profile: {} jobs, {} accomplishments",
        profile.jobs.len(),
        profile.accomplishments.len()
    );

    if messages.is_empty() {
        return Err(AppError::Validation(
            "Conversation must contain at least one message".to_string(),
        ));
    }

    let validated = deps.guardrail.validate_conversation(messages)?;
    info!(user_id, "Validated {} messages", validated.len());

    let (system_prompt, formatted) = deps.prompts.build_messages(&profile, &validated)?;

    let response = deps.ai.generate(&system_prompt, &formatted).await?;

    info!(
        user_id,
        model = %response.model,
        input_tokens = response.usage.input_tokens,
        output_tokens = response.usage.output_tokens,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Generated resume content"
    );

    Ok((ChatMessage::assistant(response.content), response.usage))
}
