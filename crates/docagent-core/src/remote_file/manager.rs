//! Remote file lifecycle: fetch-or-upload, poll until processed, clean up.
//!
//! A local file is identified by a local id (attachment UUID or document id).
//! Its provider-side name is derived deterministically from that id, so a
//! file uploaded once is found again by the fast-path lookup on later turns.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use docagent_types::error::RemoteFileError;
use docagent_types::generation::UploadRequest;
use docagent_types::remote_file::{
    FileState, RemoteFile, RemoteFileRef, normalize_identifier, remote_file_name,
};

use crate::document::repository::DocumentRepository;
use crate::fs::FileSystem;
use crate::generation::BoxGenerativeBackend;

use super::lock::KeyedLocks;

/// Where local files live on disk.
#[derive(Debug, Clone)]
pub struct FileLayout {
    pub files_dir: PathBuf,
    pub documents_dir: PathBuf,
}

impl FileLayout {
    /// `{files_dir}/{normalized}{extension}`; `extension` keeps its leading dot.
    pub fn attachment_path(&self, normalized: &str, extension: &str) -> PathBuf {
        self.files_dir.join(format!("{normalized}{extension}"))
    }

    /// `{documents_dir}/{normalized}.{doc_type}`.
    pub fn document_path(&self, normalized: &str, doc_type: &str) -> PathBuf {
        self.documents_dir.join(format!("{normalized}.{doc_type}"))
    }
}

/// How long to wait for the provider to finish processing an upload.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub interval: Duration,
    /// `None` polls for as long as the provider keeps reporting `Processing`.
    pub max_wait: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            max_wait: Some(Duration::from_secs(24 * 60 * 60)),
        }
    }
}

/// Where the bytes for a local id come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalSource {
    /// A chat attachment staged in the files directory.
    Attachment { extension: String },
    /// A reference document; its record supplies the file type.
    Document,
}

pub struct RemoteFileManager<D: DocumentRepository, F: FileSystem> {
    backend: Arc<BoxGenerativeBackend>,
    documents: Arc<D>,
    fs: Arc<F>,
    layout: FileLayout,
    poll: PollPolicy,
    locks: KeyedLocks,
}

impl<D: DocumentRepository, F: FileSystem> RemoteFileManager<D, F> {
    pub fn new(
        backend: Arc<BoxGenerativeBackend>,
        documents: Arc<D>,
        fs: Arc<F>,
        layout: FileLayout,
        poll: PollPolicy,
    ) -> Self {
        Self {
            backend,
            documents,
            fs,
            layout,
            poll,
            locks: KeyedLocks::new(),
        }
    }

    pub fn layout(&self) -> &FileLayout {
        &self.layout
    }

    pub fn fs(&self) -> &Arc<F> {
        &self.fs
    }

    /// Return a provider reference for `local_id`, uploading it if needed.
    ///
    /// Calls for the same id are serialized, so concurrent callers share one
    /// upload. Once the provider reports a terminal state the local file is
    /// deleted whether or not processing succeeded.
    pub async fn ensure_remote_file(
        &self,
        local_id: &str,
        source: &LocalSource,
    ) -> Result<RemoteFileRef, RemoteFileError> {
        let normalized = normalize_identifier(local_id);
        let name = remote_file_name(&normalized);
        let _guard = self.locks.lock(&normalized).await;

        match self.backend.get_file(&name).await {
            Ok(existing) => {
                debug!(remote_file = %name, state = %existing.state, "Remote file already present");
                return Ok(existing.to_ref());
            }
            Err(RemoteFileError::NotFound) => {}
            Err(err) => {
                warn!(remote_file = %name, error = %err, "Remote file lookup failed, uploading anew");
            }
        }

        let path = self.resolve_local_path(local_id, &normalized, source).await?;
        let bytes = match self.fs.read_bytes(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                if matches!(source, LocalSource::Document) {
                    self.documents
                        .delete(local_id)
                        .await
                        .map_err(|e| RemoteFileError::DocumentLookup(e.to_string()))?;
                    warn!(document_id = local_id, path = %path.display(), "Document file missing, record deleted");
                }
                return Err(RemoteFileError::LocalFileMissing {
                    path: path.display().to_string(),
                });
            }
            Err(err) => return Err(RemoteFileError::LocalIo(err.to_string())),
        };

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| normalized.clone());
        info!(remote_file = %name, bytes = bytes.len(), "Uploading file to provider");

        let uploaded = self
            .backend
            .upload_file(&UploadRequest {
                name: normalized,
                file_name,
                bytes,
            })
            .await
            .map_err(|err| match err {
                RemoteFileError::Upload(_) => err,
                other => RemoteFileError::Upload(other.to_string()),
            })?;

        let processed = self.wait_until_processed(uploaded).await?;
        self.remove_local(&path).await;

        if processed.state != FileState::Active {
            return Err(RemoteFileError::ProcessingFailed {
                name: processed.name,
                state: processed.state,
            });
        }

        info!(remote_file = %processed.name, "Remote file active");
        Ok(processed.to_ref())
    }

    async fn resolve_local_path(
        &self,
        local_id: &str,
        normalized: &str,
        source: &LocalSource,
    ) -> Result<PathBuf, RemoteFileError> {
        match source {
            LocalSource::Attachment { extension } => {
                Ok(self.layout.attachment_path(normalized, extension))
            }
            LocalSource::Document => {
                let document = self
                    .documents
                    .find_by_id(local_id)
                    .await
                    .map_err(|e| RemoteFileError::DocumentLookup(e.to_string()))?
                    .ok_or_else(|| RemoteFileError::DocumentNotFound(local_id.to_string()))?;
                Ok(self.layout.document_path(normalized, &document.doc_type))
            }
        }
    }

    async fn wait_until_processed(&self, mut file: RemoteFile) -> Result<RemoteFile, RemoteFileError> {
        let started = Instant::now();

        while !file.state.is_terminal() {
            if let Some(max_wait) = self.poll.max_wait {
                if started.elapsed() >= max_wait {
                    return Err(RemoteFileError::Timeout {
                        name: file.name,
                        waited_secs: started.elapsed().as_secs(),
                    });
                }
            }

            tokio::time::sleep(self.poll.interval).await;
            file = self.backend.get_file(&file.name).await.map_err(|err| match err {
                RemoteFileError::Lookup(_) => err,
                other => RemoteFileError::Lookup(other.to_string()),
            })?;
            debug!(remote_file = %file.name, state = %file.state, "Polled remote file");
        }

        Ok(file)
    }

    async fn remove_local(&self, path: &Path) {
        match self.fs.remove_file(path).await {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Failed to remove local file after upload");
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::generation::GenerativeBackend;
    use chrono::Utc;
    use docagent_types::document::Document;
    use docagent_types::error::{GenerationError, RepositoryError};
    use docagent_types::generation::{GenerationRequest, GenerationResponse};
    use std::collections::{HashMap, VecDeque};
    use std::future::Future;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // --- Stub backend ---

    /// Provider state held in memory. Each upload starts `Processing` and
    /// walks through `script` on subsequent lookups. `generate` answers with
    /// `reply`, or a provider error when it is unset.
    #[derive(Default)]
    pub(crate) struct StubProvider {
        pub files: Mutex<HashMap<String, RemoteFile>>,
        pub script: Mutex<VecDeque<FileState>>,
        pub uploads: AtomicUsize,
        pub lookup_error: Mutex<Option<String>>,
        pub upload_delay: Option<Duration>,
        pub reply: Mutex<Option<GenerationResponse>>,
        pub requests: Mutex<Vec<GenerationRequest>>,
    }

    pub(crate) struct StubBackend {
        pub state: Arc<StubProvider>,
    }

    impl StubBackend {
        pub fn new(state: Arc<StubProvider>) -> Self {
            Self { state }
        }
    }

    impl GenerativeBackend for StubBackend {
        fn name(&self) -> &str {
            "stub"
        }

        fn upload_file(
            &self,
            request: &UploadRequest,
        ) -> impl Future<Output = Result<RemoteFile, RemoteFileError>> + Send {
            let files = Arc::clone(&self.state);
            let name = remote_file_name(&request.name);
            async move {
                if let Some(delay) = files.upload_delay {
                    tokio::time::sleep(delay).await;
                }
                files.uploads.fetch_add(1, Ordering::SeqCst);
                let file = RemoteFile {
                    uri: format!("https://provider.example/{name}"),
                    name: name.clone(),
                    state: FileState::Processing,
                    mime_type: Some("application/pdf".to_string()),
                };
                files.files.lock().unwrap().insert(name, file.clone());
                Ok(file)
            }
        }

        fn get_file(
            &self,
            name: &str,
        ) -> impl Future<Output = Result<RemoteFile, RemoteFileError>> + Send {
            let files = Arc::clone(&self.state);
            let name = name.to_string();
            async move {
                if let Some(message) = files.lookup_error.lock().unwrap().clone() {
                    return Err(RemoteFileError::Lookup(message));
                }
                let mut stored = files.files.lock().unwrap();
                let file = stored.get_mut(&name).ok_or(RemoteFileError::NotFound)?;
                if file.state == FileState::Processing {
                    file.state = files
                        .script
                        .lock()
                        .unwrap()
                        .pop_front()
                        .unwrap_or(FileState::Active);
                }
                Ok(file.clone())
            }
        }

        fn generate(
            &self,
            request: &GenerationRequest,
        ) -> impl Future<Output = Result<GenerationResponse, GenerationError>> + Send {
            self.state.requests.lock().unwrap().push(request.clone());
            let reply = self.state.reply.lock().unwrap().clone();
            async move {
                reply.ok_or_else(|| GenerationError::Provider {
                    message: "stub has no reply".to_string(),
                })
            }
        }
    }

    // --- In-memory filesystem ---

    #[derive(Default)]
    pub(crate) struct MemoryFs {
        pub files: Mutex<HashMap<PathBuf, Vec<u8>>>,
    }

    impl MemoryFs {
        pub fn contains(&self, path: &Path) -> bool {
            self.files.lock().unwrap().contains_key(path)
        }

        pub fn put(&self, path: PathBuf, bytes: &[u8]) {
            self.files.lock().unwrap().insert(path, bytes.to_vec());
        }
    }

    impl FileSystem for MemoryFs {
        fn write_bytes(
            &self,
            path: &Path,
            content: &[u8],
        ) -> impl Future<Output = Result<(), std::io::Error>> + Send {
            self.put(path.to_path_buf(), content);
            async { Ok(()) }
        }

        fn read_bytes(
            &self,
            path: &Path,
        ) -> impl Future<Output = Result<Vec<u8>, std::io::Error>> + Send {
            let result = self
                .files
                .lock()
                .unwrap()
                .get(path)
                .cloned()
                .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::NotFound));
            async move { result }
        }

        fn remove_file(
            &self,
            path: &Path,
        ) -> impl Future<Output = Result<(), std::io::Error>> + Send {
            let result = self
                .files
                .lock()
                .unwrap()
                .remove(path)
                .map(|_| ())
                .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::NotFound));
            async move { result }
        }

        fn create_dir_all(
            &self,
            _path: &Path,
        ) -> impl Future<Output = Result<(), std::io::Error>> + Send {
            async { Ok(()) }
        }
    }

    // --- In-memory document repository ---

    #[derive(Default)]
    pub(crate) struct MemoryDocuments {
        pub documents: Mutex<HashMap<String, Document>>,
    }

    impl MemoryDocuments {
        pub fn with(document: Document) -> Self {
            let repo = Self::default();
            repo.documents
                .lock()
                .unwrap()
                .insert(document.document_id.clone(), document);
            repo
        }
    }

    impl DocumentRepository for MemoryDocuments {
        fn insert(
            &self,
            document: &Document,
        ) -> impl Future<Output = Result<(), RepositoryError>> + Send {
            self.documents
                .lock()
                .unwrap()
                .insert(document.document_id.clone(), document.clone());
            async { Ok(()) }
        }

        fn find_by_id(
            &self,
            document_id: &str,
        ) -> impl Future<Output = Result<Option<Document>, RepositoryError>> + Send {
            let found = self.documents.lock().unwrap().get(document_id).cloned();
            async move { Ok(found) }
        }

        fn delete(
            &self,
            document_id: &str,
        ) -> impl Future<Output = Result<(), RepositoryError>> + Send {
            self.documents.lock().unwrap().remove(document_id);
            async { Ok(()) }
        }
    }

    pub(crate) fn layout() -> FileLayout {
        FileLayout {
            files_dir: PathBuf::from("/data/files"),
            documents_dir: PathBuf::from("/data/documents"),
        }
    }

    pub(crate) fn fast_poll() -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(1),
            max_wait: Some(Duration::from_secs(5)),
        }
    }

    pub(crate) fn document(id: &str, doc_type: &str) -> Document {
        Document {
            document_id: id.to_string(),
            title: "Template".to_string(),
            url: String::new(),
            doc_type: doc_type.to_string(),
            user_id: "user-1".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    struct Fixture {
        files: Arc<StubProvider>,
        fs: Arc<MemoryFs>,
        documents: Arc<MemoryDocuments>,
        manager: RemoteFileManager<MemoryDocuments, MemoryFs>,
    }

    fn fixture(files: StubProvider, documents: MemoryDocuments, poll: PollPolicy) -> Fixture {
        let files = Arc::new(files);
        let fs = Arc::new(MemoryFs::default());
        let documents = Arc::new(documents);
        let backend = Arc::new(BoxGenerativeBackend::new(StubBackend::new(Arc::clone(&files))));
        let manager = RemoteFileManager::new(
            backend,
            Arc::clone(&documents),
            Arc::clone(&fs),
            layout(),
            poll,
        );
        Fixture {
            files,
            fs,
            documents,
            manager,
        }
    }

    fn pdf() -> LocalSource {
        LocalSource::Attachment {
            extension: ".pdf".to_string(),
        }
    }

    #[tokio::test]
    async fn uploads_polls_and_removes_local_file() {
        let stub = StubProvider::default();
        stub.script
            .lock()
            .unwrap()
            .extend([FileState::Processing, FileState::Processing, FileState::Active]);
        let fx = fixture(stub, MemoryDocuments::default(), fast_poll());
        let path = layout().attachment_path("abc", ".pdf");
        fx.fs.put(path.clone(), b"%PDF-1.7");

        let remote = fx.manager.ensure_remote_file("ABC", &pdf()).await.unwrap();

        assert_eq!(remote.name, "files/abc");
        assert_eq!(remote.uri, "https://provider.example/files/abc");
        assert_eq!(fx.files.uploads.load(Ordering::SeqCst), 1);
        assert!(!fx.fs.contains(&path));
    }

    #[tokio::test]
    async fn second_call_hits_fast_path() {
        let fx = fixture(StubProvider::default(), MemoryDocuments::default(), fast_poll());
        fx.fs.put(layout().attachment_path("abc", ".pdf"), b"bytes");

        let first = fx.manager.ensure_remote_file("abc", &pdf()).await.unwrap();
        let second = fx.manager.ensure_remote_file("abc", &pdf()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(fx.files.uploads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_calls_share_one_upload() {
        let stub = StubProvider {
            upload_delay: Some(Duration::from_millis(20)),
            ..Default::default()
        };
        let fx = fixture(stub, MemoryDocuments::default(), fast_poll());
        fx.fs.put(layout().attachment_path("abc", ".pdf"), b"bytes");

        let source = pdf();
        let (a, b) = tokio::join!(
            fx.manager.ensure_remote_file("abc", &source),
            fx.manager.ensure_remote_file("abc", &source),
        );

        assert_eq!(a.unwrap().name, b.unwrap().name);
        assert_eq!(fx.files.uploads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_processing_still_removes_local_file() {
        let stub = StubProvider::default();
        stub.script.lock().unwrap().push_back(FileState::Failed);
        let fx = fixture(stub, MemoryDocuments::default(), fast_poll());
        let path = layout().attachment_path("abc", ".pdf");
        fx.fs.put(path.clone(), b"bytes");

        let err = fx.manager.ensure_remote_file("abc", &pdf()).await.unwrap_err();

        assert!(matches!(
            err,
            RemoteFileError::ProcessingFailed { state: FileState::Failed, .. }
        ));
        assert!(!fx.fs.contains(&path));
    }

    #[tokio::test]
    async fn missing_attachment_fails_without_upload() {
        let fx = fixture(StubProvider::default(), MemoryDocuments::default(), fast_poll());

        let err = fx.manager.ensure_remote_file("abc", &pdf()).await.unwrap_err();

        assert!(matches!(err, RemoteFileError::LocalFileMissing { .. }));
        assert_eq!(fx.files.uploads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn document_uses_record_type_for_path() {
        let fx = fixture(
            StubProvider::default(),
            MemoryDocuments::with(document("doc-1", "docx")),
            fast_poll(),
        );
        let path = layout().document_path("doca1", "docx");
        assert_eq!(path, PathBuf::from("/data/documents/doca1.docx"));
        fx.fs.put(path.clone(), b"PK");

        let remote = fx
            .manager
            .ensure_remote_file("doc-1", &LocalSource::Document)
            .await
            .unwrap();

        assert_eq!(remote.name, "files/doca1");
        assert!(!fx.fs.contains(&path));
    }

    #[tokio::test]
    async fn missing_document_record_is_not_found() {
        let fx = fixture(StubProvider::default(), MemoryDocuments::default(), fast_poll());

        let err = fx
            .manager
            .ensure_remote_file("doc-404", &LocalSource::Document)
            .await
            .unwrap_err();

        assert!(matches!(err, RemoteFileError::DocumentNotFound(id) if id == "doc-404"));
    }

    #[tokio::test]
    async fn missing_document_file_deletes_record() {
        let fx = fixture(
            StubProvider::default(),
            MemoryDocuments::with(document("doc-1", "pdf")),
            fast_poll(),
        );

        let err = fx
            .manager
            .ensure_remote_file("doc-1", &LocalSource::Document)
            .await
            .unwrap_err();

        assert!(matches!(err, RemoteFileError::LocalFileMissing { .. }));
        assert!(fx.documents.find_by_id("doc-1").await.unwrap().is_none());
        assert_eq!(fx.files.uploads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn lookup_error_is_treated_as_absent() {
        let stub = StubProvider::default();
        *stub.lookup_error.lock().unwrap() = Some("transient".to_string());
        let fx = fixture(stub, MemoryDocuments::default(), fast_poll());
        fx.fs.put(layout().attachment_path("abc", ".pdf"), b"bytes");

        // The fast path falls through to an upload; the poll then sees the
        // same lookup error and surfaces it.
        let err = fx.manager.ensure_remote_file("abc", &pdf()).await.unwrap_err();

        assert_eq!(fx.files.uploads.load(Ordering::SeqCst), 1);
        assert!(matches!(err, RemoteFileError::Lookup(_)));
    }

    #[tokio::test]
    async fn polling_past_max_wait_times_out() {
        let stub = StubProvider::default();
        stub.script
            .lock()
            .unwrap()
            .extend(std::iter::repeat_n(FileState::Processing, 10_000));
        let poll = PollPolicy {
            interval: Duration::from_millis(5),
            max_wait: Some(Duration::from_millis(30)),
        };
        let fx = fixture(stub, MemoryDocuments::default(), poll);
        let path = layout().attachment_path("abc", ".pdf");
        fx.fs.put(path.clone(), b"bytes");

        let err = fx.manager.ensure_remote_file("abc", &pdf()).await.unwrap_err();

        assert!(matches!(err, RemoteFileError::Timeout { ref name, .. } if name == "files/abc"));
        // Not terminal, so the local copy stays for a later attempt.
        assert!(fx.fs.contains(&path));
    }
}
