//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and REST API.
//! The chat pipeline is generic over store/repository/filesystem traits, but
//! AppState pins it to the concrete infra implementations.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use docagent_core::chat::{ChatOrchestrator, PromptTemplates};
use docagent_core::generation::BoxGenerativeBackend;
use docagent_core::remote_file::{FileLayout, PollPolicy, RemoteFileManager};
use docagent_infra::config::{API_KEY_ENV, resolve_path};
use docagent_infra::filesystem::LocalFileSystem;
use docagent_infra::gemini::GeminiBackend;
use docagent_infra::prompt::load_prompt_template;
use docagent_infra::sqlite::conversation::SqliteConversationStore;
use docagent_infra::sqlite::document::SqliteDocumentRepository;
use docagent_infra::sqlite::pool::{DatabasePool, database_url};
use docagent_types::config::{AppConfig, RemoteFilesConfig};

/// Concrete type alias for the chat pipeline pinned to infra implementations.
pub type ConcreteChatOrchestrator =
    ChatOrchestrator<SqliteConversationStore, SqliteDocumentRepository, LocalFileSystem>;

/// Shared application state.
///
/// Used by both CLI commands and REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ConcreteChatOrchestrator>,
    pub store: Arc<SqliteConversationStore>,
    pub max_upload_bytes: usize,
    pub purge_interval: Duration,
}

impl AppState {
    /// Initialize the application state: connect to DB, build the Gemini
    /// backend, load both prompt templates, wire the chat pipeline.
    pub async fn init(data_dir: PathBuf, mut config: AppConfig) -> anyhow::Result<Self> {
        let api_key = config.gemini.api_key.take().with_context(|| {
            format!("no Gemini API key configured; set {API_KEY_ENV} or [gemini].api_key")
        })?;

        let backend = GeminiBackend::new(
            api_key,
            Duration::from_secs(config.gemini.request_timeout_secs),
        )
        .context("failed to build Gemini HTTP client")?
        .with_base_url(config.gemini.base_url.clone());

        let templates = PromptTemplates {
            chat: load_prompt_template(&resolve_path(&data_dir, &config.prompt.chat_template_path))
                .await,
            docs: load_prompt_template(&resolve_path(&data_dir, &config.prompt.docs_template_path))
                .await,
        };

        Self::assemble(data_dir, &config, BoxGenerativeBackend::new(backend), templates).await
    }

    /// Wire the services around an already-built backend.
    pub async fn assemble(
        data_dir: PathBuf,
        config: &AppConfig,
        backend: BoxGenerativeBackend,
        templates: PromptTemplates,
    ) -> anyhow::Result<Self> {
        let db_pool = open_database(&data_dir, config).await?;

        let layout = FileLayout {
            files_dir: resolve_path(&data_dir, &config.storage.files_dir),
            documents_dir: resolve_path(&data_dir, &config.storage.documents_dir),
        };
        for dir in [&layout.files_dir, &layout.documents_dir] {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }

        let backend = Arc::new(backend);
        let store = Arc::new(SqliteConversationStore::new(
            db_pool.clone(),
            config.conversation.retention(),
        ));

        let files = RemoteFileManager::new(
            backend.clone(),
            Arc::new(SqliteDocumentRepository::new(db_pool.clone())),
            Arc::new(LocalFileSystem::new()),
            layout,
            poll_policy(&config.remote_files),
        );

        let chat = ChatOrchestrator::new(
            store.clone(),
            Arc::new(files),
            backend,
            config.gemini.model.clone(),
            templates,
        );

        tracing::info!(
            data_dir = %data_dir.display(),
            model = %config.gemini.model,
            "Application state ready"
        );

        Ok(Self {
            chat: Arc::new(chat),
            store,
            max_upload_bytes: config.server.max_upload_bytes,
            purge_interval: config.conversation.purge_interval(),
        })
    }
}

/// Open the SQLite database named by `[storage].database_file`.
pub async fn open_database(data_dir: &Path, config: &AppConfig) -> anyhow::Result<DatabasePool> {
    let path = resolve_path(data_dir, &config.storage.database_file);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    DatabasePool::new(&database_url(&path))
        .await
        .with_context(|| format!("failed to open database {}", path.display()))
}

/// A `max_wait_secs` of zero means no cap.
pub fn poll_policy(config: &RemoteFilesConfig) -> PollPolicy {
    PollPolicy {
        interval: Duration::from_secs(config.poll_interval_secs),
        max_wait: (config.max_wait_secs > 0).then(|| Duration::from_secs(config.max_wait_secs)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_policy_from_defaults() {
        let policy = poll_policy(&RemoteFilesConfig::default());
        assert_eq!(policy.interval, Duration::from_secs(3));
        assert_eq!(policy.max_wait, Some(Duration::from_secs(86_400)));
    }

    #[test]
    fn test_zero_max_wait_disables_cap() {
        let config = RemoteFilesConfig {
            poll_interval_secs: 1,
            max_wait_secs: 0,
        };
        assert!(poll_policy(&config).max_wait.is_none());
    }

    #[tokio::test]
    async fn test_init_without_api_key_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppState::init(dir.path().to_path_buf(), AppConfig::default())
            .await
            .err()
            .unwrap();
        assert!(err.to_string().contains(API_KEY_ENV));
    }

    #[tokio::test]
    async fn test_open_database_creates_nested_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.storage.database_file = PathBuf::from("db/nested.db");
        open_database(dir.path(), &config).await.unwrap();
        assert!(dir.path().join("db/nested.db").exists());
    }
}
