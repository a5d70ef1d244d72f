//! BoxGenerativeBackend -- object-safe dynamic dispatch wrapper for GenerativeBackend.
//!
//! 1. Define an object-safe `GenerativeBackendDyn` trait with boxed futures
//! 2. Blanket-impl `GenerativeBackendDyn` for all `T: GenerativeBackend`
//! 3. `BoxGenerativeBackend` wraps `Box<dyn GenerativeBackendDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use docagent_types::error::{GenerationError, RemoteFileError};
use docagent_types::generation::{GenerationRequest, GenerationResponse, UploadRequest};
use docagent_types::remote_file::RemoteFile;

use super::backend::GenerativeBackend;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Object-safe version of [`GenerativeBackend`] with boxed futures.
pub trait GenerativeBackendDyn: Send + Sync {
    fn name(&self) -> &str;

    fn upload_file_boxed<'a>(
        &'a self,
        request: &'a UploadRequest,
    ) -> BoxFuture<'a, Result<RemoteFile, RemoteFileError>>;

    fn get_file_boxed<'a>(&'a self, name: &'a str)
    -> BoxFuture<'a, Result<RemoteFile, RemoteFileError>>;

    fn generate_boxed<'a>(
        &'a self,
        request: &'a GenerationRequest,
    ) -> BoxFuture<'a, Result<GenerationResponse, GenerationError>>;
}

impl<T: GenerativeBackend> GenerativeBackendDyn for T {
    fn name(&self) -> &str {
        GenerativeBackend::name(self)
    }

    fn upload_file_boxed<'a>(
        &'a self,
        request: &'a UploadRequest,
    ) -> BoxFuture<'a, Result<RemoteFile, RemoteFileError>> {
        Box::pin(self.upload_file(request))
    }

    fn get_file_boxed<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, Result<RemoteFile, RemoteFileError>> {
        Box::pin(self.get_file(name))
    }

    fn generate_boxed<'a>(
        &'a self,
        request: &'a GenerationRequest,
    ) -> BoxFuture<'a, Result<GenerationResponse, GenerationError>> {
        Box::pin(self.generate(request))
    }
}

/// Type-erased generative backend.
///
/// Built once at startup and shared (behind an `Arc`) by the remote file
/// manager and the chat orchestrator. Tests substitute a stub.
pub struct BoxGenerativeBackend {
    inner: Box<dyn GenerativeBackendDyn>,
}

impl BoxGenerativeBackend {
    pub fn new<T: GenerativeBackend + 'static>(backend: T) -> Self {
        Self {
            inner: Box::new(backend),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub async fn upload_file(&self, request: &UploadRequest) -> Result<RemoteFile, RemoteFileError> {
        self.inner.upload_file_boxed(request).await
    }

    pub async fn get_file(&self, name: &str) -> Result<RemoteFile, RemoteFileError> {
        self.inner.get_file_boxed(name).await
    }

    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        self.inner.generate_boxed(request).await
    }
}
