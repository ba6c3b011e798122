//! Route handler functions for the chat API.
//!
//! Each handler extracts its input via axum extractors, calls into the
//! orchestrator on AppState, and returns JSON. Status semantics follow the
//! transport contract: 200 for every completed chat exchange (including
//! not-found decisions), 204 for a successful clear, 404 for clearing an
//! unknown session, 400 for validation failures.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use deskbot_core::types::Turn;

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request / response types
// =============================================================================

/// Body of `POST /api/chat`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub query: String,
    /// Absent on a client's first message; the server coins an id and
    /// returns it.
    pub session_id: Option<String>,
}

/// Body of a successful `POST /api/chat`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponseBody {
    pub response: String,
    pub session_id: String,
}

/// Body of `GET /api/chat/{session_id}/history`.
#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub session_id: String,
    pub turns: Vec<Turn>,
}

/// Body of `GET /health`.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

// =============================================================================
// Handler functions
// =============================================================================

/// POST /api/chat - submit a message, get the assistant's response.
pub async fn chat(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponseBody>, ApiError> {
    let (response, session_id) = state
        .orchestrator
        .handle_message(&body.query, body.session_id)
        .await?;

    Ok(Json(ChatResponseBody {
        response,
        session_id,
    }))
}

/// GET /api/chat/:session_id/history - the session's turn sequence.
///
/// Unknown sessions yield an empty list, mirroring the store contract.
pub async fn get_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let turns = state.orchestrator.history(&session_id)?;
    Ok(Json(HistoryResponse { session_id, turns }))
}

/// DELETE /api/chat/:session_id/history - clear a session.
pub async fn clear_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.orchestrator.clear_history(&session_id)?;
    info!(session_id = %session_id, "History cleared");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /health - health check.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}
