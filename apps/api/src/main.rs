mod chat;
mod config;
mod errors;
mod llm_client;
mod models;
mod profile;
mod routes;
mod state;
mod storage;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{header, HeaderValue, Method, Request},
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, info_span};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::chat::{Guardrail, PromptTemplate};
use crate::config::{AiProvider, Config};
use crate::llm_client::{AiClient, AnthropicClient, MockAiClient};
use crate::profile::ProfileService;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::JsonStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume Ragu API v{}", env!("CARGO_PKG_VERSION"));

    // Record store
    let store = JsonStore::new(&config.data_dir);

    // AI client
    let ai: Arc<dyn AiClient> = match config.ai_provider {
        AiProvider::Anthropic => {
            let api_key = config
                .anthropic_api_key
                .clone()
                .context("ANTHROPIC_API_KEY is required for the anthropic provider")?;
            Arc::new(AnthropicClient::new(api_key, config.model_name.clone()))
        }
        AiProvider::Mock => Arc::new(MockAiClient::new()),
    };
    info!("AI client initialized (model: {})", ai.model());

    // System prompt: read once, shared immutably
    let prompts = match &config.system_prompt_path {
        Some(path) => PromptTemplate::from_file(path)?,
        None => PromptTemplate::default(),
    };

    let guardrail = Guardrail::new(config.max_conversation_turns);
    info!("Conversation limit: {} turns", guardrail.max_turns());

    // Build app state
    let state = AppState {
        profiles: ProfileService::new(store),
        ai,
        guardrail: Arc::new(guardrail),
        prompts: Arc::new(prompts),
    };

    let cors = CorsLayer::new()
        .allow_origin(
            config
                .cors_origin
                .parse::<HeaderValue>()
                .context("CORS_ORIGIN must be a valid header value")?,
        )
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    // Outermost layer last: CORS → assign request id → trace span → echo id on response.
    let app = build_router(state)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id,
                )
            }),
        )
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(cors);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
