//! Generation request/response types.
//!
//! Provider-agnostic shapes for a single `generate` call: an ordered list of
//! role-tagged turns in, a list of candidate turns out. The Gemini wire types
//! live in docagent-infra and convert to and from these.

use serde::{Deserialize, Serialize};

use crate::message::MessageRole;

/// One piece of content within a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Part {
    Text {
        text: String,
    },
    FileData {
        uri: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
    },
    /// A provider part with no typed counterpart here, kept as raw JSON.
    Opaque {
        value: serde_json::Value,
    },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn file(uri: impl Into<String>, mime_type: Option<String>) -> Self {
        Part::FileData {
            uri: uri.into(),
            mime_type,
        }
    }
}

/// A role-tagged entry in the conversation submitted for generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: MessageRole,
    pub parts: Vec<Part>,
}

impl Turn {
    pub fn new(role: MessageRole, parts: Vec<Part>) -> Self {
        Self { role, parts }
    }
}

/// A single generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub model: String,
    pub contents: Vec<Turn>,
}

/// One candidate answer from the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Absent when the provider blocked or truncated the candidate.
    pub content: Option<Turn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Response to a generation call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub candidates: Vec<Candidate>,
}

impl GenerationResponse {
    /// The first content part of the first candidate, with its role.
    pub fn first_part(&self) -> Option<(MessageRole, &Part)> {
        let content = self.candidates.first()?.content.as_ref()?;
        content.parts.first().map(|part| (content.role, part))
    }
}

/// Bytes to upload to the provider's file store.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Normalized identifier; the provider stores it as `files/{name}`.
    pub name: String,
    /// Local file name, used to guess the MIME type.
    pub file_name: String,
    pub bytes: Vec<u8>,
}
