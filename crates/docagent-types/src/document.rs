//! Reference document records.
//!
//! A document is a user-registered file whose format the agent reproduces.
//! The record lives in the relational store; its bytes live on local disk
//! under the documents directory until they have been handed to the provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub document_id: String,
    pub title: String,
    pub url: String,
    /// File extension without the leading dot (e.g. `docx`, `pdf`).
    #[serde(rename = "type")]
    pub doc_type: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
