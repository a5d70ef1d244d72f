//! Service configuration types.
//!
//! `AppConfig` mirrors `{data_dir}/config.toml`. Every section and every key
//! is optional; absent values take the defaults below. Environment and CLI
//! overrides are applied by the loader in docagent-infra.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

/// One gibibyte, the default request body cap.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 1 << 30;

/// Top-level configuration for the service.
#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub conversation: ConversationConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub remote_files: RemoteFilesConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4000
}

fn default_max_upload_bytes() -> usize {
    DEFAULT_MAX_UPLOAD_BYTES
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// Paths are relative to the data directory unless absolute.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_database_file")]
    pub database_file: PathBuf,
    /// Working directory for chat attachments while they are uploaded.
    #[serde(default = "default_files_dir")]
    pub files_dir: PathBuf,
    /// Where reference document bytes live.
    #[serde(default = "default_documents_dir")]
    pub documents_dir: PathBuf,
}

fn default_database_file() -> PathBuf {
    PathBuf::from("docagent.db")
}

fn default_files_dir() -> PathBuf {
    PathBuf::from("files")
}

fn default_documents_dir() -> PathBuf {
    PathBuf::from("documents")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_file: default_database_file(),
            files_dir: default_files_dir(),
            documents_dir: default_documents_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConversationConfig {
    /// A session expires this long after its last append.
    #[serde(default = "default_retention_hours")]
    pub retention_hours: u64,
    #[serde(default = "default_purge_interval_secs")]
    pub purge_interval_secs: u64,
}

fn default_retention_hours() -> u64 {
    48
}

fn default_purge_interval_secs() -> u64 {
    600
}

impl ConversationConfig {
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_hours * 3600)
    }

    pub fn purge_interval(&self) -> Duration {
        Duration::from_secs(self.purge_interval_secs)
    }
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            retention_hours: default_retention_hours(),
            purge_interval_secs: default_purge_interval_secs(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GeminiConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Usually supplied through `GEMINI_API_KEY` rather than the file.
    #[serde(default, deserialize_with = "deserialize_secret")]
    pub api_key: Option<SecretString>,
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_request_timeout_secs() -> u64 {
    300
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|key| !key.is_empty()).map(SecretString::from))
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteFilesConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Zero disables the cap.
    #[serde(default = "default_max_wait_secs")]
    pub max_wait_secs: u64,
}

fn default_poll_interval_secs() -> u64 {
    3
}

fn default_max_wait_secs() -> u64 {
    86_400
}

impl Default for RemoteFilesConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            max_wait_secs: default_max_wait_secs(),
        }
    }
}

/// Template files, one per chat endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct PromptConfig {
    /// Used by `/ai-chat`.
    #[serde(default = "default_chat_template_path")]
    pub chat_template_path: PathBuf,
    /// Used by `/ai-chat-docs`, where a parent document leads the first turn.
    #[serde(default = "default_docs_template_path")]
    pub docs_template_path: PathBuf,
}

fn default_chat_template_path() -> PathBuf {
    PathBuf::from("prompts/chat.md")
}

fn default_docs_template_path() -> PathBuf {
    PathBuf::from("prompts/chat_docs.md")
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            chat_template_path: default_chat_template_path(),
            docs_template_path: default_docs_template_path(),
        }
    }
}
