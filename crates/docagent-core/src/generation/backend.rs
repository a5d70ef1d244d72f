//! GenerativeBackend trait definition.
//!
//! The provider owns two things the service depends on: a file store that
//! processes uploads asynchronously, and the content generation endpoint.
//! Implementations live in docagent-infra (e.g., `GeminiBackend`).

use docagent_types::error::{GenerationError, RemoteFileError};
use docagent_types::generation::{GenerationRequest, GenerationResponse, UploadRequest};
use docagent_types::remote_file::RemoteFile;

/// Trait for generative provider backends.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition). Wrap in
/// [`BoxGenerativeBackend`](super::BoxGenerativeBackend) for dynamic dispatch.
pub trait GenerativeBackend: Send + Sync {
    /// Human-readable provider name (e.g., "gemini").
    fn name(&self) -> &str;

    /// Upload bytes to the provider's file store as `files/{request.name}`.
    ///
    /// The returned file is typically still `Processing`.
    fn upload_file(
        &self,
        request: &UploadRequest,
    ) -> impl std::future::Future<Output = Result<RemoteFile, RemoteFileError>> + Send;

    /// Look up a file by its full resource name.
    ///
    /// Returns [`RemoteFileError::NotFound`] when the provider has no such file.
    fn get_file(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = Result<RemoteFile, RemoteFileError>> + Send;

    /// Generate the next turn for a conversation.
    fn generate(
        &self,
        request: &GenerationRequest,
    ) -> impl std::future::Future<Output = Result<GenerationResponse, GenerationError>> + Send;
}
