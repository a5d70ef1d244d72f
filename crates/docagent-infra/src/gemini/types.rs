//! Generative Language API wire types.
//!
//! These are Gemini-specific request/response structures. They are NOT the
//! provider-agnostic generation types from docagent-types; the conversions
//! between the two live here.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use docagent_types::generation::{
    Candidate, GenerationRequest, GenerationResponse, Part, Turn,
};
use docagent_types::message::MessageRole;
use docagent_types::remote_file::{FileState, RemoteFile};

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

/// A file resource as returned by `files.get` and `media.upload`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiFile {
    pub name: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

impl GeminiFile {
    pub fn into_remote_file(self) -> RemoteFile {
        let state = self
            .state
            .as_deref()
            .and_then(|s| s.parse::<FileState>().ok())
            .unwrap_or(FileState::Unspecified);
        RemoteFile {
            name: self.name,
            state,
            uri: self.uri,
            mime_type: self.mime_type,
        }
    }
}

/// Envelope of the upload response.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadFileResponse {
    pub file: GeminiFile,
}

/// `metadata` part of the multipart upload.
#[derive(Debug, Clone, Serialize)]
pub struct UploadMetadata {
    pub file: UploadMetadataFile,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadMetadataFile {
    pub name: String,
    pub display_name: String,
}

// ---------------------------------------------------------------------------
// generateContent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<GeminiContent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeminiContent {
    pub role: String,
    pub parts: Vec<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiCandidate {
    #[serde(default)]
    pub content: Option<GeminiResponseContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiResponseContent {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: Option<u64>,
    #[serde(default)]
    pub candidates_token_count: Option<u64>,
}

/// `{"error": {"code", "message", "status"}}`
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiErrorEnvelope {
    pub error: GeminiErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn part_to_wire(part: &Part) -> Value {
    match part {
        Part::Text { text } => serde_json::json!({ "text": text }),
        Part::FileData { uri, mime_type } => {
            let mut file_data = serde_json::Map::new();
            file_data.insert("fileUri".to_string(), Value::String(uri.clone()));
            if let Some(mime_type) = mime_type {
                file_data.insert("mimeType".to_string(), Value::String(mime_type.clone()));
            }
            serde_json::json!({ "fileData": file_data })
        }
        Part::Opaque { value } => value.clone(),
    }
}

/// Text and file parts map to their typed variants; anything else is kept raw.
pub fn part_from_wire(value: Value) -> Part {
    if let Some(text) = value.get("text").and_then(Value::as_str) {
        return Part::text(text);
    }
    if let Some(file_data) = value.get("fileData") {
        if let Some(uri) = file_data.get("fileUri").and_then(Value::as_str) {
            let mime_type = file_data
                .get("mimeType")
                .and_then(Value::as_str)
                .map(str::to_string);
            return Part::file(uri, mime_type);
        }
    }
    Part::Opaque { value }
}

impl From<&GenerationRequest> for GenerateContentRequest {
    fn from(request: &GenerationRequest) -> Self {
        let contents = request
            .contents
            .iter()
            .map(|turn| GeminiContent {
                role: turn.role.to_string(),
                parts: turn.parts.iter().map(part_to_wire).collect(),
            })
            .collect();
        Self { contents }
    }
}

impl GenerateContentResponse {
    /// Candidates without a role are attributed to the model.
    pub fn into_generation_response(self) -> GenerationResponse {
        let candidates = self
            .candidates
            .into_iter()
            .map(|candidate| Candidate {
                content: candidate.content.map(|content| {
                    let role = content
                        .role
                        .as_deref()
                        .and_then(|r| r.parse::<MessageRole>().ok())
                        .unwrap_or(MessageRole::Model);
                    Turn::new(role, content.parts.into_iter().map(part_from_wire).collect())
                }),
                finish_reason: candidate.finish_reason,
            })
            .collect();
        GenerationResponse { candidates }
    }
}
