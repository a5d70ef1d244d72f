//! SQLite document repository.
//!
//! Implements `DocumentRepository` from `docagent-core`. Only the record lives
//! here; the document bytes stay on disk under the documents directory.

use chrono::{DateTime, Utc};
use sqlx::Row;

use docagent_core::document::repository::DocumentRepository;
use docagent_types::document::Document;
use docagent_types::error::RepositoryError;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `DocumentRepository`.
pub struct SqliteDocumentRepository {
    pool: DatabasePool,
}

impl SqliteDocumentRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct DocumentRow {
    document_id: String,
    title: String,
    url: String,
    doc_type: String,
    user_id: String,
    created_at: String,
    updated_at: String,
}

impl DocumentRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            document_id: row.try_get("document_id")?,
            title: row.try_get("title")?,
            url: row.try_get("url")?,
            doc_type: row.try_get("type")?,
            user_id: row.try_get("user_id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_document(self) -> Result<Document, RepositoryError> {
        Ok(Document {
            document_id: self.document_id,
            title: self.title,
            url: self.url,
            doc_type: self.doc_type,
            user_id: self.user_id,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

impl DocumentRepository for SqliteDocumentRepository {
    async fn insert(&self, document: &Document) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"INSERT INTO documents (document_id, title, url, type, user_id, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&document.document_id)
        .bind(&document.title)
        .bind(&document.url)
        .bind(&document.doc_type)
        .bind(&document.user_id)
        .bind(format_datetime(&document.created_at))
        .bind(format_datetime(&document.updated_at))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE") => Err(
                RepositoryError::Conflict(format!("document '{}' already exists", document.document_id)),
            ),
            Err(e) => Err(RepositoryError::Query(e.to_string())),
        }
    }

    async fn find_by_id(&self, document_id: &str) -> Result<Option<Document>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM documents WHERE document_id = ?")
            .bind(document_id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let doc_row =
                    DocumentRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(doc_row.into_document()?))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, document_id: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM documents WHERE document_id = ?")
            .bind(document_id)
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() > 0 {
            tracing::info!(document_id, "Deleted document record");
        }
        Ok(())
    }
}
