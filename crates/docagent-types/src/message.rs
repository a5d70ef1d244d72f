//! Chat message types for docagent.
//!
//! A conversation is an ordered log of `ChatMessage`s keyed by session id.
//! Message content is polymorphic: plain text, a reference to a file held by
//! the generative provider, or a structured fragment returned by the provider.
//! The `contentType` discriminator on the stored record decides which.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Role of a message author.
///
/// The provider answers as `model`; older records may carry `assistant` or
/// `ai`, which are read as [`MessageRole::Model`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    #[serde(alias = "assistant", alias = "ai")]
    Model,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Model => write!(f, "model"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(MessageRole::User),
            "model" | "assistant" | "ai" => Ok(MessageRole::Model),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// Discriminates how the `content` field of a stored record is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Text,
    File,
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentType::Text => write!(f, "text"),
            ContentType::File => write!(f, "file"),
        }
    }
}

/// The body of a message.
///
/// Serializes untagged: text and file references as JSON strings, structured
/// fragments as whatever JSON value they hold. The discriminator travels
/// separately as [`ContentType`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain text.
    Text(String),
    /// URI of a file stored at the generative provider.
    FileRef(String),
    /// Opaque structured fragment from the provider.
    Structured(serde_json::Value),
}

impl MessageContent {
    /// The content type recorded alongside this content.
    pub fn content_type(&self) -> ContentType {
        match self {
            MessageContent::FileRef(_) => ContentType::File,
            MessageContent::Text(_) | MessageContent::Structured(_) => ContentType::Text,
        }
    }

    /// Returns the text if this is a `Text` variant.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(text) => Some(text),
            _ => None,
        }
    }

    fn to_value(&self) -> serde_json::Value {
        match self {
            MessageContent::Text(text) | MessageContent::FileRef(text) => {
                serde_json::Value::String(text.clone())
            }
            MessageContent::Structured(value) => value.clone(),
        }
    }

    fn from_stored(content_type: ContentType, value: serde_json::Value) -> Result<Self, String> {
        match (content_type, value) {
            (ContentType::File, serde_json::Value::String(uri)) => Ok(MessageContent::FileRef(uri)),
            (ContentType::File, other) => Err(format!(
                "file message content must be a URI string, got {other}"
            )),
            (ContentType::Text, serde_json::Value::String(text)) => Ok(MessageContent::Text(text)),
            (ContentType::Text, other) => Ok(MessageContent::Structured(other)),
        }
    }
}

/// A single turn in a conversation, as persisted in the conversation store.
///
/// On the wire this is the record `{role, content, createdAt, contentType}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "StoredMessage", try_from = "StoredMessage")]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: MessageContent,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: MessageContent, created_at: DateTime<Utc>) -> Self {
        Self {
            role,
            content,
            created_at,
        }
    }

    pub fn content_type(&self) -> ContentType {
        self.content.content_type()
    }
}

/// Serialized form of [`ChatMessage`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredMessage {
    role: MessageRole,
    content: serde_json::Value,
    created_at: DateTime<Utc>,
    #[serde(default)]
    content_type: ContentType,
}

impl From<ChatMessage> for StoredMessage {
    fn from(message: ChatMessage) -> Self {
        Self {
            role: message.role,
            content: message.content.to_value(),
            created_at: message.created_at,
            content_type: message.content.content_type(),
        }
    }
}

impl TryFrom<StoredMessage> for ChatMessage {
    type Error = String;

    fn try_from(stored: StoredMessage) -> Result<Self, Self::Error> {
        Ok(Self {
            role: stored.role,
            content: MessageContent::from_stored(stored.content_type, stored.content)?,
            created_at: stored.created_at,
        })
    }
}

/// The reply returned to the caller of a chat turn.
///
/// Serializes as `{content, role, createdAt}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedTurn {
    pub content: MessageContent,
    pub role: MessageRole,
    pub created_at: DateTime<Utc>,
}
