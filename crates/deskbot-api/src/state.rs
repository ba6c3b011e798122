//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use deskbot_chat::ChatOrchestrator;
use deskbot_core::config::DeskbotConfig;

/// Shared application state, cheaply cloned into each handler task.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<DeskbotConfig>,
    /// The conversation core.
    pub orchestrator: Arc<ChatOrchestrator>,
    /// Server start time for uptime reporting.
    pub start_time: Instant,
}

impl AppState {
    /// Create a new AppState around an orchestrator.
    pub fn new(config: DeskbotConfig, orchestrator: ChatOrchestrator) -> Self {
        Self {
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
            start_time: Instant::now(),
        }
    }
}
