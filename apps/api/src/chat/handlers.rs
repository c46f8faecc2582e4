use axum::{extract::State, Json};

use crate::chat::service::{generate_resume, ChatDeps};
use crate::errors::AppError;
use crate::models::chat::{ChatRequest, ChatResponse};
use crate::state::AppState;

/// POST /api/chat
///
/// Stateless: the frontend sends the full conversation each time.
pub async fn handle_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let deps = ChatDeps {
        profiles: &state.profiles,
        guardrail: &state.guardrail,
        prompts: &state.prompts,
        ai: state.ai.as_ref(),
    };
    let (message, usage) = generate_resume(deps, &request.user_id, &request.messages).await?;

    Ok(Json(ChatResponse {
        message,
        usage: Some(usage),
    }))
}
