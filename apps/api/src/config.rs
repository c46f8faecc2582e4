use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

use crate::llm_client::DEFAULT_MODEL;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiProvider {
    Anthropic,
    /// Canned responses, no network. For local frontend work and demos.
    Mock,
}

impl FromStr for AiProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" => Ok(AiProvider::Anthropic),
            "mock" => Ok(AiProvider::Mock),
            other => bail!("AI_PROVIDER must be 'anthropic' or 'mock', got '{other}'"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub ai_provider: AiProvider,
    pub anthropic_api_key: Option<String>,
    pub model_name: String,
    pub data_dir: PathBuf,
    pub max_conversation_turns: usize,
    pub system_prompt_path: Option<PathBuf>,
    pub cors_origin: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let ai_provider: AiProvider = get("AI_PROVIDER")
            .unwrap_or_else(|| "anthropic".to_string())
            .parse()?;

        let anthropic_api_key = get("ANTHROPIC_API_KEY").filter(|k| !k.trim().is_empty());
        if ai_provider == AiProvider::Anthropic && anthropic_api_key.is_none() {
            bail!("Required environment variable 'ANTHROPIC_API_KEY' is not set");
        }

        let max_conversation_turns = get("MAX_CONVERSATION_TURNS")
            .unwrap_or_else(|| "20".to_string())
            .parse::<usize>()
            .context("MAX_CONVERSATION_TURNS must be a positive integer")?;
        if max_conversation_turns == 0 {
            bail!("MAX_CONVERSATION_TURNS must be at least 1");
        }

        Ok(Config {
            ai_provider,
            anthropic_api_key,
            model_name: get("MODEL_NAME").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            data_dir: PathBuf::from(get("DATA_DIR").unwrap_or_else(|| "./data".to_string())),
            max_conversation_turns,
            system_prompt_path: get("SYSTEM_PROMPT_PATH").map(PathBuf::from),
            cors_origin: get("CORS_ORIGIN")
                .unwrap_or_else(|| "http://localhost:5173".to_string()),
            port: get("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_with_api_key() {
        let c = config(&[("ANTHROPIC_API_KEY", "sk-test")]).unwrap();
        assert_eq!(c.ai_provider, AiProvider::Anthropic);
        assert_eq!(c.model_name, DEFAULT_MODEL);
        assert_eq!(c.data_dir, PathBuf::from("./data"));
        assert_eq!(c.max_conversation_turns, 20);
        assert_eq!(c.port, 8080);
        assert!(c.system_prompt_path.is_none());
    }

    #[test]
    fn test_anthropic_requires_key() {
        let err = config(&[]).unwrap_err();
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn test_mock_provider_needs_no_key() {
        let c = config(&[("AI_PROVIDER", "Mock"), ("MAX_CONVERSATION_TURNS", "5")]).unwrap();
        assert_eq!(c.ai_provider, AiProvider::Mock);
        assert_eq!(c.max_conversation_turns, 5);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(config(&[("AI_PROVIDER", "openai")]).is_err());
        assert!(config(&[("AI_PROVIDER", "mock"), ("PORT", "http")]).is_err());
        assert!(config(&[("AI_PROVIDER", "mock"), ("MAX_CONVERSATION_TURNS", "0")]).is_err());
    }
}
