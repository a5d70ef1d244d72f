//! DocumentRepository trait definition.
//!
//! Reference documents are looked up by id when a chat turn names a parent
//! document. Implementations live in docagent-infra (`SqliteDocumentRepository`).

use docagent_types::document::Document;
use docagent_types::error::RepositoryError;

/// Repository trait for document records.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait DocumentRepository: Send + Sync {
    /// Insert a new document record.
    fn insert(
        &self,
        document: &Document,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get a document by its id. Returns `None` if no record exists.
    fn find_by_id(
        &self,
        document_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Document>, RepositoryError>> + Send;

    /// Delete a document record. No-op if it does not exist.
    fn delete(
        &self,
        document_id: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
