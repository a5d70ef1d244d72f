//! Session history lookup.
//!
//! GET /messages/sessions/{sessionId}

use axum::Json;
use axum::extract::{Path, State};

use docagent_core::conversation::ConversationStore;
use docagent_types::message::ChatMessage;

use crate::http::error::AppError;
use crate::state::AppState;

/// Every stored message of a session, oldest first. Unknown or expired
/// sessions return an empty array.
pub async fn get_session_messages(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<ChatMessage>>, AppError> {
    let messages = state.store.read_all(&session_id).await?;
    tracing::debug!(session_id = %session_id, count = messages.len(), "Read session messages");
    Ok(Json(messages))
}
