//! Route handler functions for all API endpoints.
//!
//! Each handler extracts path/body parameters via axum extractors,
//! interacts with AppState services, and returns JSON responses.

use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cambium_chat::SessionSummary;
use cambium_core::types::Turn;

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    /// The user's message text.
    pub message: String,
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub indexed_documents: u64,
    pub sessions: u64,
    pub index_building: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub id: Uuid,
    pub transcript: Vec<Turn>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionSummary>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    /// The assistant turn generated for this message.
    pub reply: Turn,
    /// The full transcript after the exchange.
    pub transcript: Vec<Turn>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

// =============================================================================
// Handler functions
// =============================================================================

/// GET /health - service status, index size, and session count.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = state.start_time.elapsed().as_secs();

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: uptime,
        indexed_documents: state.index.len() as u64,
        sessions: state.engine.store().list_sessions().len() as u64,
        index_building: state.index_building(),
    })
}

/// GET /ui - serve the self-contained chat page.
pub async fn ui() -> impl IntoResponse {
    Html(crate::ui::CHAT_HTML)
}

/// POST /sessions - create a session seeded with the greeting.
pub async fn create_session(
    State(state): State<AppState>,
) -> Result<Json<SessionResponse>, ApiError> {
    let id = state.engine.store().create_session();
    let transcript = state.engine.store().transcript(id)?;
    Ok(Json(SessionResponse {
        id,
        transcript: transcript.turns().to_vec(),
    }))
}

/// GET /sessions - list live sessions.
pub async fn list_sessions(State(state): State<AppState>) -> Json<SessionListResponse> {
    Json(SessionListResponse {
        sessions: state.engine.store().list_sessions(),
    })
}

/// GET /sessions/{id} - fetch a session's transcript.
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, ApiError> {
    let transcript = state.engine.store().transcript(id)?;
    Ok(Json(SessionResponse {
        id,
        transcript: transcript.turns().to_vec(),
    }))
}

/// DELETE /sessions/{id} - delete a session and its transcript.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, ApiError> {
    state.engine.store().delete_session(id)?;
    Ok(Json(DeleteResponse { deleted: true }))
}

/// POST /sessions/{id}/messages - submit a user message and generate the
/// reply. One call appends the user turn and at most one assistant turn.
pub async fn post_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let reply = state
        .engine
        .on_user_submit(id, &req.message, &state.index)
        .await?;
    let transcript = state.engine.store().transcript(id)?;
    Ok(Json(MessageResponse {
        reply,
        transcript: transcript.turns().to_vec(),
    }))
}
