//! Provider-side file types.
//!
//! Attachments and reference documents are uploaded to the generative
//! provider's file store before they can be referenced in a generation
//! request. The provider processes each upload asynchronously; a file is only
//! usable once it reaches the `Active` state.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Prefix the provider puts in front of every file resource name.
pub const REMOTE_FILE_PREFIX: &str = "files/";

/// Processing state of a provider-side file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileState {
    Unspecified,
    Processing,
    Active,
    Failed,
}

impl FileState {
    /// No further transition happens from a terminal state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, FileState::Processing)
    }
}

impl fmt::Display for FileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileState::Unspecified => write!(f, "unspecified"),
            FileState::Processing => write!(f, "processing"),
            FileState::Active => write!(f, "active"),
            FileState::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for FileState {
    type Err = String;

    /// Accepts both the lowercase names and the provider's
    /// `STATE_UNSPECIFIED` / `PROCESSING` / `ACTIVE` / `FAILED` spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unspecified" | "state_unspecified" => Ok(FileState::Unspecified),
            "processing" => Ok(FileState::Processing),
            "active" => Ok(FileState::Active),
            "failed" => Ok(FileState::Failed),
            other => Err(format!("invalid file state: '{other}'")),
        }
    }
}

/// A file resource as reported by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteFile {
    /// Full resource name, e.g. `files/3f2a...`.
    pub name: String,
    pub state: FileState,
    /// Locator usable as a content reference in generation requests.
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl RemoteFile {
    pub fn to_ref(&self) -> RemoteFileRef {
        RemoteFileRef {
            name: self.name.clone(),
            uri: self.uri.clone(),
            mime_type: self.mime_type.clone(),
        }
    }
}

/// What callers get back once a file is available at the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteFileRef {
    pub name: String,
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Render a local identifier (UUID or document id) as a provider-safe name.
///
/// Lowercases, replaces hyphens with `a`, and trims any leading or trailing
/// hyphen. Deterministic: the same local id always maps to the same name.
pub fn normalize_identifier(local_id: &str) -> String {
    let lowered = local_id.to_lowercase().replace('-', "a");
    lowered.trim_matches('-').to_string()
}

/// Full provider resource name for a normalized identifier.
pub fn remote_file_name(normalized: &str) -> String {
    format!("{REMOTE_FILE_PREFIX}{normalized}")
}
