//! Deskbot application binary - composition root.
//!
//! Ties the crates together into a single executable:
//! 1. Load configuration from TOML
//! 2. Build the collaborator adapters (retriever, generator, intent)
//! 3. Build the chat orchestrator
//! 4. Start the axum REST API server

use std::path::PathBuf;
use std::sync::Arc;

use deskbot_api::AppState;
use deskbot_chat::ChatOrchestrator;
use deskbot_core::config::DeskbotConfig;
use deskbot_retrieval::{HttpRetriever, OllamaGenerator, OllamaIntentClassifier};

/// Resolve the config file path (DESKBOT_CONFIG env, or ~/.deskbot/config.toml).
fn config_path() -> PathBuf {
    if let Ok(p) = std::env::var("DESKBOT_CONFIG") {
        return PathBuf::from(p);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".deskbot").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting Deskbot v{}", env!("CARGO_PKG_VERSION"));

    // Config.
    let config_file = config_path();
    let mut config = DeskbotConfig::load_or_default(&config_file);
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    if let Some(port) = std::env::var("DESKBOT_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
    {
        config.general.port = port;
    }

    // Collaborators.
    let retriever = HttpRetriever::new(&config.retrieval)
        .map_err(|e| format!("Failed to build retriever: {}", e))?;
    let generator = OllamaGenerator::new(&config.llm)
        .map_err(|e| format!("Failed to build generator: {}", e))?;
    let intent = OllamaIntentClassifier::new(&config.llm)
        .map_err(|e| format!("Failed to build intent classifier: {}", e))?;
    tracing::info!(
        knowledge_url = %config.retrieval.knowledge_url,
        llm_url = %config.llm.base_url,
        model = %config.llm.model,
        "Collaborators configured"
    );

    // Conversation core.
    let orchestrator = ChatOrchestrator::new(
        &config,
        Arc::new(retriever),
        Arc::new(generator),
        Arc::new(intent),
    );

    let state = AppState::new(config, orchestrator);

    // API server.
    let port = state.config.general.port;
    if let Err(e) = deskbot_api::start_server(state).await {
        tracing::error!(error = %e, port, "Server failed. Is another instance already bound?");
        tracing::error!("Try: DESKBOT_PORT={} cargo run -p deskbot-app", port + 1);
        return Err(e.into());
    }

    Ok(())
}
