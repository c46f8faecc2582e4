// Chat pipeline: load profile → guardrail → prompt → AI client.
// All model calls go through llm_client; nothing here talks HTTP to a provider.

pub mod guardrails;
pub mod handlers;
pub mod prompts;
pub mod service;

pub use guardrails::Guardrail;
pub use prompts::PromptTemplate;
