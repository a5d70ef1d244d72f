//! SQLite conversation log.
//!
//! Implements `ConversationStore` from `docagent-core`. Each session is a row
//! in `conversation_sessions` carrying its expiry; messages are JSON payloads in
//! `conversation_messages`, ordered by their autoincrement id. Expired
//! sessions are invisible to reads, replaced on the next append, and removed
//! for good by `purge_expired`.

use std::sync::Arc;
use std::time::Duration;

use sqlx::Row;

use docagent_core::clock::{Clock, SystemClock};
use docagent_core::conversation::ConversationStore;
use docagent_types::error::ConversationError;
use docagent_types::message::ChatMessage;

use super::pool::DatabasePool;

/// Default session retention: 48 hours after the last append.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(48 * 60 * 60);

/// SQLite-backed implementation of `ConversationStore`.
pub struct SqliteConversationStore {
    pool: DatabasePool,
    retention: Duration,
    clock: Arc<dyn Clock>,
}

impl SqliteConversationStore {
    pub fn new(pool: DatabasePool, retention: Duration) -> Self {
        Self::with_clock(pool, retention, Arc::new(SystemClock))
    }

    pub fn with_clock(pool: DatabasePool, retention: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            pool,
            retention,
            clock,
        }
    }

    fn now_ms(&self) -> i64 {
        self.clock.now().timestamp_millis()
    }
}

/// `messages:{session_id}`
fn session_key(session_id: &str) -> String {
    format!("messages:{session_id}")
}

fn unavailable(e: sqlx::Error) -> ConversationError {
    ConversationError::StoreUnavailable(e.to_string())
}

impl ConversationStore for SqliteConversationStore {
    async fn append(&self, session_id: &str, message: &ChatMessage) -> Result<(), ConversationError> {
        let key = session_key(session_id);
        let payload = serde_json::to_string(message)
            .map_err(|e| ConversationError::Serialization(e.to_string()))?;
        let now = self.now_ms();
        let expires_at = now.saturating_add(self.retention.as_millis() as i64);

        let mut tx = self.pool.writer.begin().await.map_err(unavailable)?;

        // An expired sequence is gone, so this append starts a fresh one.
        let previous: Option<i64> =
            sqlx::query_scalar("SELECT expires_at_ms FROM conversation_sessions WHERE session_key = ?")
                .bind(&key)
                .fetch_optional(&mut *tx)
                .await
                .map_err(unavailable)?;
        if previous.is_some_and(|expires| expires <= now) {
            sqlx::query("DELETE FROM conversation_messages WHERE session_key = ?")
                .bind(&key)
                .execute(&mut *tx)
                .await
                .map_err(unavailable)?;
        }

        sqlx::query(
            r#"INSERT INTO conversation_sessions (session_key, expires_at_ms) VALUES (?, ?)
               ON CONFLICT (session_key) DO UPDATE SET expires_at_ms = excluded.expires_at_ms"#,
        )
        .bind(&key)
        .bind(expires_at)
        .execute(&mut *tx)
        .await
        .map_err(unavailable)?;

        sqlx::query("INSERT INTO conversation_messages (session_key, payload) VALUES (?, ?)")
            .bind(&key)
            .bind(&payload)
            .execute(&mut *tx)
            .await
            .map_err(unavailable)?;

        tx.commit().await.map_err(unavailable)?;
        Ok(())
    }

    async fn read_all(&self, session_id: &str) -> Result<Vec<ChatMessage>, ConversationError> {
        let key = session_key(session_id);
        let rows = sqlx::query(
            r#"SELECT m.id, m.payload
               FROM conversation_messages m
               JOIN conversation_sessions s ON s.session_key = m.session_key
               WHERE m.session_key = ? AND s.expires_at_ms > ?
               ORDER BY m.id"#,
        )
        .bind(&key)
        .bind(self.now_ms())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(unavailable)?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in &rows {
            let id: i64 = row.try_get("id").map_err(unavailable)?;
            let payload: String = row.try_get("payload").map_err(unavailable)?;
            match serde_json::from_str::<ChatMessage>(&payload) {
                Ok(message) => messages.push(message),
                Err(e) => {
                    tracing::warn!(session_id, record_id = id, error = %e, "Skipping malformed conversation record");
                }
            }
        }

        Ok(messages)
    }

    async fn purge_expired(&self) -> Result<u64, ConversationError> {
        let result = sqlx::query("DELETE FROM conversation_sessions WHERE expires_at_ms <= ?")
            .bind(self.now_ms())
            .execute(&self.pool.writer)
            .await
            .map_err(unavailable)?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::{DatabasePool, database_url};
    use chrono::{DateTime, TimeDelta, Utc};
    use docagent_types::message::{MessageContent, MessageRole};
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct ManualClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl ManualClock {
        fn new() -> Self {
            Self {
                now: Mutex::new(Utc::now()),
            }
        }

        fn advance(&self, by: TimeDelta) {
            let mut now = self.now.lock().unwrap();
            *now += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }

    async fn test_pool() -> (DatabasePool, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let url = database_url(&dir.path().join("test.db"));
        let pool = DatabasePool::new(&url).await.unwrap();
        (pool, dir)
    }

    /// The `TempDir` must outlive the store.
    async fn store_with_clock() -> (SqliteConversationStore, Arc<ManualClock>, DatabasePool, TempDir) {
        let (pool, dir) = test_pool().await;
        let clock = Arc::new(ManualClock::new());
        let store = SqliteConversationStore::with_clock(pool.clone(), DEFAULT_RETENTION, clock.clone());
        (store, clock, pool, dir)
    }

    fn text(role: MessageRole, body: &str) -> ChatMessage {
        ChatMessage::new(role, MessageContent::Text(body.to_string()), Utc::now())
    }

    #[tokio::test]
    async fn test_append_then_read_preserves_order() {
        let (store, _clock, _pool, _dir) = store_with_clock().await;

        for i in 0..5 {
            store
                .append("s1", &text(MessageRole::User, &format!("message {i}")))
                .await
                .unwrap();
        }

        let messages = store.read_all("s1").await.unwrap();
        let bodies: Vec<&str> = messages.iter().filter_map(|m| m.content.as_text()).collect();
        assert_eq!(
            bodies,
            vec!["message 0", "message 1", "message 2", "message 3", "message 4"]
        );
    }

    #[tokio::test]
    async fn test_read_missing_session_is_empty() {
        let (store, _clock, _pool, _dir) = store_with_clock().await;
        assert!(store.read_all("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let (store, _clock, _pool, _dir) = store_with_clock().await;
        store.append("a", &text(MessageRole::User, "for a")).await.unwrap();
        store.append("b", &text(MessageRole::User, "for b")).await.unwrap();

        let a = store.read_all("a").await.unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].content.as_text(), Some("for a"));
    }

    #[tokio::test]
    async fn test_session_expires_after_retention() {
        let (store, clock, _pool, _dir) = store_with_clock().await;
        store.append("s1", &text(MessageRole::User, "Hello")).await.unwrap();

        clock.advance(TimeDelta::hours(47));
        assert_eq!(store.read_all("s1").await.unwrap().len(), 1);

        clock.advance(TimeDelta::hours(2));
        assert!(store.read_all("s1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_refreshes_expiry() {
        let (store, clock, _pool, _dir) = store_with_clock().await;
        store.append("s1", &text(MessageRole::User, "first")).await.unwrap();

        clock.advance(TimeDelta::hours(40));
        store.append("s1", &text(MessageRole::Model, "second")).await.unwrap();

        clock.advance(TimeDelta::hours(40));
        let messages = store.read_all("s1").await.unwrap();
        assert_eq!(messages.len(), 2);
    }

    #[tokio::test]
    async fn test_append_after_expiry_starts_fresh_sequence() {
        let (store, clock, _pool, _dir) = store_with_clock().await;
        store.append("s1", &text(MessageRole::User, "old")).await.unwrap();

        clock.advance(TimeDelta::hours(49));
        store.append("s1", &text(MessageRole::User, "new")).await.unwrap();

        let messages = store.read_all("s1").await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content.as_text(), Some("new"));
    }

    #[tokio::test]
    async fn test_malformed_record_is_skipped() {
        let (store, _clock, pool, _dir) = store_with_clock().await;
        store.append("s1", &text(MessageRole::User, "before")).await.unwrap();
        sqlx::query("INSERT INTO conversation_messages (session_key, payload) VALUES (?, ?)")
            .bind(session_key("s1"))
            .bind("{not json")
            .execute(&pool.writer)
            .await
            .unwrap();
        store.append("s1", &text(MessageRole::Model, "after")).await.unwrap();

        let messages = store.read_all("s1").await.unwrap();
        let bodies: Vec<&str> = messages.iter().filter_map(|m| m.content.as_text()).collect();
        assert_eq!(bodies, vec!["before", "after"]);
    }

    #[tokio::test]
    async fn test_file_ref_survives_storage() {
        let (store, _clock, _pool, _dir) = store_with_clock().await;
        let uri = "https://provider.example/files/abc";
        store
            .append(
                "s1",
                &ChatMessage::new(MessageRole::User, MessageContent::FileRef(uri.to_string()), Utc::now()),
            )
            .await
            .unwrap();

        let messages = store.read_all("s1").await.unwrap();
        assert_eq!(messages[0].content, MessageContent::FileRef(uri.to_string()));
    }

    #[tokio::test]
    async fn test_purge_expired_removes_sessions_and_messages() {
        let (store, clock, pool, _dir) = store_with_clock().await;
        store.append("old", &text(MessageRole::User, "stale")).await.unwrap();
        clock.advance(TimeDelta::hours(30));
        store.append("fresh", &text(MessageRole::User, "live")).await.unwrap();
        clock.advance(TimeDelta::hours(20));

        let purged = store.purge_expired().await.unwrap();
        assert_eq!(purged, 1);

        let remaining: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM conversation_messages")
            .fetch_one(&pool.reader)
            .await
            .unwrap();
        assert_eq!(remaining.0, 1);
        assert_eq!(store.read_all("fresh").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_closed_pool_reports_store_unavailable() {
        let (store, _clock, pool, _dir) = store_with_clock().await;
        store.append("s1", &text(MessageRole::User, "Hello")).await.unwrap();
        pool.reader.close().await;
        pool.writer.close().await;

        let read = store.read_all("s1").await.unwrap_err();
        assert!(matches!(read, ConversationError::StoreUnavailable(_)));

        let append = store
            .append("s1", &text(MessageRole::User, "again"))
            .await
            .unwrap_err();
        assert!(matches!(append, ConversationError::StoreUnavailable(_)));

        let purge = store.purge_expired().await.unwrap_err();
        assert!(matches!(purge, ConversationError::StoreUnavailable(_)));
    }
}
