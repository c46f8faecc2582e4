use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::models::chat::ChatMessage;
use crate::models::profile::Profile;

const BUILTIN_SYSTEM_PROMPT: &str = include_str!("../../prompts/resume_system.txt");

/// The static system prompt. Built once at startup and shared through
/// `AppState`; there is no lazily-filled global.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    base: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(BUILTIN_SYSTEM_PROMPT)
    }
}

impl PromptTemplate {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let base = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read system prompt from {}", path.display()))?;
        info!("Loaded system prompt from {}", path.display());
        Ok(Self::new(base))
    }

    /// System prompt with the profile JSON embedded, plus the conversation in
    /// the role/content form the AI client takes.
    pub fn build_messages(
        &self,
        profile: &Profile,
        conversation: &[ChatMessage],
    ) -> Result<(String, Vec<ChatMessage>)> {
        let profile_json =
            serde_json::to_string_pretty(profile).context("Failed to serialize profile")?;

        let system_prompt = format!(
            "{base}\n\n\
             # User's Career Profile Data\n\n\
             <profile>\n{profile_json}\n</profile>\n\n\
             Use this career data to generate resume content. Reference specific \
             accomplishments, jobs, skills, and projects as needed.\n",
            base = self.base.trim_end(),
        );

        info!(
            "Built prompt with {} messages and profile data ({} jobs, {} accomplishments)",
            conversation.len(),
            profile.jobs.len(),
            profile.accomplishments.len()
        );

        Ok((system_prompt, conversation.to_vec()))
    }
}
