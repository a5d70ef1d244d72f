//! ConversationStore trait definition.
//!
//! An append-only, per-session message log with whole-session expiry.
//! Each append pushes the session's expiry out to `now + retention`; once a
//! session expires its entire sequence is gone. Implementations live in
//! docagent-infra (e.g., `SqliteConversationStore`).

use docagent_types::error::ConversationError;
use docagent_types::message::ChatMessage;

/// Trait for the session-scoped conversation log.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
pub trait ConversationStore: Send + Sync {
    /// Append a message at the tail of a session, creating the session if
    /// needed and refreshing its expiry.
    fn append(
        &self,
        session_id: &str,
        message: &ChatMessage,
    ) -> impl std::future::Future<Output = Result<(), ConversationError>> + Send;

    /// All messages of a live session, oldest first.
    ///
    /// Missing or expired sessions yield an empty vec. Records that fail to
    /// decode are skipped.
    fn read_all(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<ChatMessage>, ConversationError>> + Send;

    /// Delete every expired session. Returns the number of sessions removed.
    fn purge_expired(
        &self,
    ) -> impl std::future::Future<Output = Result<u64, ConversationError>> + Send;
}
