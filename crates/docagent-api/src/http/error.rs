//! Application error type mapping to HTTP status codes.
//!
//! Error bodies are `{"code": "...", "message": "..."}`.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use docagent_types::error::{ChatError, ConversationError, RemoteFileError};

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// A chat turn failed.
    Chat(ChatError),
    /// The conversation store could not be read.
    Conversation(ConversationError),
    /// The multipart body could not be read.
    Multipart(String),
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

impl From<ConversationError> for AppError {
    fn from(e: ConversationError) -> Self {
        AppError::Conversation(e)
    }
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        AppError::Multipart(e.body_text())
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Chat(ChatError::InvalidInput(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Chat(ChatError::Remote(e @ RemoteFileError::DocumentNotFound(_))) => {
                (StatusCode::NOT_FOUND, "DOCUMENT_NOT_FOUND", e.to_string())
            }
            AppError::Chat(ChatError::Remote(e @ RemoteFileError::LocalFileMissing { .. })) => {
                (StatusCode::NOT_FOUND, "FILE_NOT_FOUND", e.to_string())
            }
            AppError::Chat(ChatError::Remote(e)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "REMOTE_FILE_ERROR", e.to_string())
            }
            AppError::Chat(e @ (ChatError::Generation(_) | ChatError::EmptyGenerationResponse)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "GENERATION_ERROR", e.to_string())
            }
            AppError::Chat(e) => (StatusCode::INTERNAL_SERVER_ERROR, "CHAT_ERROR", e.to_string()),
            AppError::Conversation(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "STORE_UNAVAILABLE", e.to_string())
            }
            AppError::Multipart(msg) => (StatusCode::BAD_REQUEST, "INVALID_MULTIPART", msg.clone()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        if status.is_server_error() {
            tracing::error!(code, error = %message, "Request failed");
        } else {
            tracing::debug!(code, error = %message, "Request rejected");
        }

        let body = json!({
            "code": code,
            "message": message,
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docagent_types::error::GenerationError;

    #[test]
    fn test_invalid_input_is_bad_request() {
        let (status, code, message) =
            AppError::from(ChatError::InvalidInput("sessionId is required".into())).parts();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, "VALIDATION_ERROR");
        assert_eq!(message, "sessionId is required");
    }

    #[test]
    fn test_missing_document_is_not_found() {
        let err = AppError::from(ChatError::Remote(RemoteFileError::DocumentNotFound(
            "doc-9".into(),
        )));
        let (status, code, _) = err.parts();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(code, "DOCUMENT_NOT_FOUND");
    }

    #[test]
    fn test_missing_local_file_is_not_found() {
        let err = AppError::from(ChatError::Remote(RemoteFileError::LocalFileMissing {
            path: "/data/files/x.pdf".into(),
        }));
        assert_eq!(err.parts().0, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_generation_failure_is_server_error() {
        let err = AppError::from(ChatError::Generation(GenerationError::AuthenticationFailed));
        let (status, code, _) = err.parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "GENERATION_ERROR");
    }

    #[test]
    fn test_processing_failure_is_server_error() {
        let err = AppError::from(ChatError::Remote(RemoteFileError::Upload("reset".into())));
        assert_eq!(err.parts().0, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
