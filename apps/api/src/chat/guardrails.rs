//! Input bounding and prompt-injection redaction for chat content.
//!
//! Best-effort pattern matching, not a security boundary. Oversized messages
//! are rejected; matched phrases are replaced, never rejected.

use regex::{Regex, RegexBuilder};
use tracing::warn;

use crate::errors::AppError;
use crate::models::chat::ChatMessage;

/// Maximum message length, in characters.
pub const MAX_MESSAGE_LENGTH: usize = 10_000;

pub const FILTERED_PLACEHOLDER: &str = "[filtered]";

/// Matched case-insensitively, as literal text.
const INJECTION_PATTERNS: &[&str] = &[
    "ignore all previous instructions",
    "disregard all previous",
    "you are now",
    "your new instructions",
    "system:",
    "</system>",
    "<system>",
    "assistant:",
    "</assistant>",
    "<assistant>",
];

#[derive(Debug, Clone)]
pub struct Guardrail {
    max_turns: usize,
    injection: Regex,
}

impl Guardrail {
    /// `max_turns` is how many of the most recent messages a conversation keeps.
    pub fn new(max_turns: usize) -> Self {
        let alternation = INJECTION_PATTERNS
            .iter()
            .map(|p| regex::escape(p))
            .collect::<Vec<_>>()
            .join("|");
        let injection = RegexBuilder::new(&alternation)
            .case_insensitive(true)
            .build()
            .expect("injection patterns are valid literals");
        Self {
            max_turns,
            injection,
        }
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    /// Rejects messages over [`MAX_MESSAGE_LENGTH`]; otherwise returns the text
    /// with every injection phrase replaced by [`FILTERED_PLACEHOLDER`].
    pub fn validate_message(&self, content: &str) -> Result<String, AppError> {
        if content.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(AppError::Validation(format!(
                "Message exceeds maximum length of {MAX_MESSAGE_LENGTH} characters"
            )));
        }

        let sanitized = self.injection.replace_all(content, FILTERED_PLACEHOLDER);
        if sanitized != content {
            warn!("Message sanitized: removed potential prompt injection patterns");
        }
        Ok(sanitized.into_owned())
    }

    /// Keeps the most recent `max_turns` messages, in order, and validates each.
    /// The input slice is never modified.
    pub fn validate_conversation(&self, messages: &[ChatMessage]) -> Result<Vec<ChatMessage>, AppError> {
        let start = messages.len().saturating_sub(self.max_turns);
        if start > 0 {
            warn!(
                "Conversation exceeds {} turns, truncating to most recent messages",
                self.max_turns
            );
        }

        messages[start..]
            .iter()
            .map(|msg| -> Result<ChatMessage, AppError> {
                Ok(ChatMessage {
                    role: msg.role,
                    content: self.validate_message(&msg.content)?,
                })
            })
            .collect()
    }
}
