#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm_client::{AiClient, AiResponse, LlmError};
use crate::models::chat::{ChatMessage, TokenUsage};

const MOCK_MODEL: &str = "mock-model";

/// What the chat service sent on one `generate` call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub system_prompt: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<RecordedCall>,
    custom_response: Option<String>,
    fail_with_status: Option<u16>,
}

/// Deterministic stand-in for a provider. Picks a canned resume by keyword in
/// the last message, unless a custom response or a failure is configured.
#[derive(Debug, Default)]
pub struct MockAiClient {
    state: Mutex<MockState>,
}

impl MockAiClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_custom_response(&self, response: impl Into<String>) {
        self.lock().custom_response = Some(response.into());
    }

    /// Makes every following call fail with a provider error of `status`.
    pub fn fail_with_status(&self, status: u16) {
        self.lock().fail_with_status = Some(status);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    pub fn reset(&self) {
        *self.lock() = MockState::default();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poison| poison.into_inner())
    }

    fn respond(&self, system_prompt: &str, messages: &[ChatMessage]) -> Result<AiResponse, LlmError> {
        let mut state = self.lock();
        state.calls.push(RecordedCall {
            system_prompt: system_prompt.to_string(),
            messages: messages.to_vec(),
        });

        if let Some(status) = state.fail_with_status {
            let status = reqwest::StatusCode::from_u16(status)
                .unwrap_or(reqwest::StatusCode::INTERNAL_SERVER_ERROR);
            return Err(LlmError::from_status(status, "Mock AI service error".to_string()));
        }

        if let Some(custom) = &state.custom_response {
            return Ok(AiResponse {
                content: custom.clone(),
                model: MOCK_MODEL.to_string(),
                usage: TokenUsage {
                    input_tokens: 100,
                    output_tokens: 200,
                },
            });
        }

        let last = messages
            .last()
            .map(|m| m.content.to_lowercase())
            .unwrap_or_default();
        let content = if last.contains("leadership") {
            LEADERSHIP_RESUME
        } else if last.contains("technical") || last.contains("engineer") {
            TECHNICAL_RESUME
        } else {
            GENERIC_RESUME
        };

        Ok(AiResponse {
            content: content.to_string(),
            model: MOCK_MODEL.to_string(),
            usage: TokenUsage {
                input_tokens: 150,
                output_tokens: 300,
            },
        })
    }
}

#[async_trait]
impl AiClient for MockAiClient {
    async fn generate(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
    ) -> Result<AiResponse, LlmError> {
        self.respond(system_prompt, messages)
    }

    fn model(&self) -> &str {
        MOCK_MODEL
    }
}

const GENERIC_RESUME: &str = "\
# Jane Doe

jane@example.com | San Francisco, CA

## Summary

Software engineer with 8 years building backend systems and leading small teams.

## Experience

### Senior Software Engineer | Acme Corp
*2020 - Present*

- Moved a monolith to services, cutting deploy time by 80%
- Ran infrastructure serving 1M daily users at 99.9% uptime
";

const LEADERSHIP_RESUME: &str = "\
# Jane Doe

## Summary

Engineering lead who grows teams and ships on schedule.

## Experience

### Tech Lead | Acme Corp
*2020 - Present*

- Led 8 engineers across 3 product initiatives
- Started a mentorship program that raised retention by 40%
";

const TECHNICAL_RESUME: &str = "\
# Jane Doe

## Summary

Backend engineer focused on distributed systems and performance.

## Experience

### Senior Software Engineer | Acme Corp
*2020 - Present*

- Built services handling 1M requests/day
- Cut p95 query latency from 2s to 200ms

## Skills

**Languages**: Rust, Python, SQL
";
