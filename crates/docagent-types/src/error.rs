use thiserror::Error;

use crate::remote_file::FileState;

/// Errors from repository operations (used by trait definitions in docagent-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors from the conversation store.
#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("conversation store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("failed to serialize message: {0}")]
    Serialization(String),
}

/// Errors from making a local file available at the provider.
#[derive(Debug, Error)]
pub enum RemoteFileError {
    #[error("remote file not found")]
    NotFound,

    #[error("remote file lookup failed: {0}")]
    Lookup(String),

    #[error("remote file upload failed: {0}")]
    Upload(String),

    #[error("remote file '{name}' finished processing in state '{state}'")]
    ProcessingFailed { name: String, state: FileState },

    #[error("remote file '{name}' still processing after {waited_secs}s")]
    Timeout { name: String, waited_secs: u64 },

    #[error("local file missing: {path}")]
    LocalFileMissing { path: String },

    #[error("local file error: {0}")]
    LocalIo(String),

    #[error("document '{0}' not found")]
    DocumentNotFound(String),

    #[error("document lookup failed: {0}")]
    DocumentLookup(String),
}

/// Errors from the generative backend.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Fatal outcomes of a chat turn.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("attachment I/O error: {0}")]
    AttachmentIo(String),

    #[error("conversation store unavailable: {0}")]
    StoreUnavailable(String),

    #[error(transparent)]
    Remote(#[from] RemoteFileError),

    #[error("failed to generate content: {0}")]
    Generation(#[from] GenerationError),

    #[error("no response from the generative backend")]
    EmptyGenerationResponse,
}

impl From<ConversationError> for ChatError {
    fn from(e: ConversationError) -> Self {
        ChatError::StoreUnavailable(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }

    #[test]
    fn test_processing_failed_display() {
        let err = RemoteFileError::ProcessingFailed {
            name: "files/abc".to_string(),
            state: FileState::Failed,
        };
        assert_eq!(
            err.to_string(),
            "remote file 'files/abc' finished processing in state 'failed'"
        );
    }

    #[test]
    fn test_chat_error_wraps_remote_transparently() {
        let err: ChatError = RemoteFileError::DocumentNotFound("doc-1".to_string()).into();
        assert_eq!(err.to_string(), "document 'doc-1' not found");
    }

    #[test]
    fn test_conversation_error_maps_to_store_unavailable() {
        let err: ChatError = ConversationError::StoreUnavailable("disk I/O".to_string()).into();
        assert!(matches!(err, ChatError::StoreUnavailable(_)));
        assert!(err.to_string().contains("disk I/O"));
    }
}
