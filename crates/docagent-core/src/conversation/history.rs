//! Rebuild generation history from the conversation store.
//!
//! The history always starts with an instruction turn. The chat pipeline
//! replaces that turn with the real prompt template before generating; the
//! placeholder only matters to callers that use the history as-is.

use docagent_types::error::ConversationError;
use docagent_types::generation::{Part, Turn};
use docagent_types::message::{ChatMessage, MessageContent, MessageRole};

use super::store::ConversationStore;

/// Text of the leading instruction turn.
pub const HISTORY_PLACEHOLDER_INSTRUCTION: &str = "Answer questions, fetch answers from the internet, and answer questions relating to the files if given. Be interactive.";

/// Load a session and turn it into generation turns.
///
/// The result has one more entry than the session has (decodable) messages:
/// `turn[0]` is always the placeholder instruction with role `user`.
pub async fn build_history<S: ConversationStore + ?Sized>(
    store: &S,
    session_id: &str,
) -> Result<Vec<Turn>, ConversationError> {
    let messages = store.read_all(session_id).await?;

    let mut turns = Vec::with_capacity(messages.len() + 1);
    turns.push(Turn::new(
        MessageRole::User,
        vec![Part::text(HISTORY_PLACEHOLDER_INSTRUCTION)],
    ));
    turns.extend(messages.iter().map(message_to_turn));

    tracing::debug!(session_id, turns = turns.len(), "Rebuilt conversation history");
    Ok(turns)
}

/// One stored message as a single-part turn with the same role.
pub fn message_to_turn(message: &ChatMessage) -> Turn {
    let part = match &message.content {
        MessageContent::FileRef(uri) => Part::file(uri.clone(), None),
        MessageContent::Text(text) => Part::text(text.clone()),
        MessageContent::Structured(value) => Part::text(value.to_string()),
    };
    Turn::new(message.role, vec![part])
}
