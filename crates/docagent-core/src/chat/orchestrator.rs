//! One chat turn end to end.
//!
//! A turn stages and uploads the optional attachment, rebuilds history,
//! prepends the prompt template (and the parent document, when one is named),
//! makes a single generation call, then records the exchange. Recording is
//! best-effort: a failed append is logged and the reply is still returned.
//!
//! Turns that name a parent document use the document template; all others
//! use the chat template.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use docagent_types::error::ChatError;
use docagent_types::generation::{GenerationRequest, Part, Turn};
use docagent_types::message::{ChatMessage, GeneratedTurn, MessageContent, MessageRole};
use docagent_types::remote_file::normalize_identifier;

use crate::conversation::{ConversationStore, build_history};
use crate::document::repository::DocumentRepository;
use crate::fs::FileSystem;
use crate::generation::BoxGenerativeBackend;
use crate::remote_file::{LocalSource, RemoteFileManager};

/// A file sent along with a chat message.
#[derive(Debug, Clone)]
pub struct Attachment {
    /// Client-supplied name; only its extension is used.
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ChatTurnRequest {
    pub session_id: String,
    pub text: String,
    pub attachment: Option<Attachment>,
    /// Id of a reference document the reply should be based on.
    pub parent_document: Option<String>,
}

/// System instructions placed in the first turn of every request.
#[derive(Debug, Clone)]
pub struct PromptTemplates {
    /// Plain chat turns.
    pub chat: String,
    /// Turns built on a parent document.
    pub docs: String,
}

impl PromptTemplates {
    fn for_turn(&self, request: &ChatTurnRequest) -> &str {
        match request.parent_document {
            Some(_) => &self.docs,
            None => &self.chat,
        }
    }
}

/// An attachment written to the files directory for the duration of a turn.
///
/// Dropped without [`StagedAttachment::discard`], for instance when the turn
/// future is cancelled, it schedules its own removal on the runtime.
struct StagedAttachment<F: FileSystem + 'static> {
    file_id: String,
    extension: String,
    path: PathBuf,
    fs: Option<Arc<F>>,
}

impl<F: FileSystem + 'static> StagedAttachment<F> {
    async fn discard(mut self) {
        if let Some(fs) = self.fs.clone() {
            remove_staged(fs.as_ref(), &self.path).await;
            self.fs = None;
        }
    }
}

impl<F: FileSystem + 'static> Drop for StagedAttachment<F> {
    fn drop(&mut self) {
        let Some(fs) = self.fs.take() else {
            return;
        };
        let path = std::mem::take(&mut self.path);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move { remove_staged(fs.as_ref(), &path).await });
            }
            Err(_) => warn!(path = %path.display(), "No runtime left to remove abandoned attachment"),
        }
    }
}

/// The manager removes the file once the provider has processed it; this
/// covers every path where it never got that far.
async fn remove_staged<F: FileSystem>(fs: &F, path: &Path) {
    match fs.remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "Removed staged attachment"),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => warn!(path = %path.display(), error = %err, "Failed to remove staged attachment"),
    }
}

pub struct ChatOrchestrator<S, D, F>
where
    S: ConversationStore,
    D: DocumentRepository,
    F: FileSystem,
{
    store: Arc<S>,
    files: Arc<RemoteFileManager<D, F>>,
    backend: Arc<BoxGenerativeBackend>,
    model: String,
    templates: PromptTemplates,
}

impl<S, D, F> ChatOrchestrator<S, D, F>
where
    S: ConversationStore,
    D: DocumentRepository,
    F: FileSystem + 'static,
{
    pub fn new(
        store: Arc<S>,
        files: Arc<RemoteFileManager<D, F>>,
        backend: Arc<BoxGenerativeBackend>,
        model: String,
        templates: PromptTemplates,
    ) -> Self {
        Self {
            store,
            files,
            backend,
            model,
            templates,
        }
    }

    /// Run one turn and return the reply.
    ///
    /// Fails without touching the conversation log when anything before the
    /// generation call fails, or when the provider returns no content.
    #[tracing::instrument(
        name = "chat_turn",
        skip(self, request),
        fields(
            session_id = %request.session_id,
            has_attachment = request.attachment.is_some(),
            parent_document = ?request.parent_document,
        )
    )]
    pub async fn handle_turn(&self, request: ChatTurnRequest) -> Result<GeneratedTurn, ChatError> {
        if request.session_id.trim().is_empty() {
            return Err(ChatError::InvalidInput("sessionId is required".to_string()));
        }
        if request.text.trim().is_empty() && request.attachment.is_none() {
            return Err(ChatError::InvalidInput(
                "a message needs text or a file".to_string(),
            ));
        }

        let staged = match &request.attachment {
            Some(attachment) => Some(self.stage_attachment(attachment).await?),
            None => None,
        };

        let result = self.run_turn(&request, staged.as_ref()).await;

        if let Some(staged) = staged {
            staged.discard().await;
        }
        result
    }

    async fn run_turn(
        &self,
        request: &ChatTurnRequest,
        staged: Option<&StagedAttachment<F>>,
    ) -> Result<GeneratedTurn, ChatError> {
        let attachment_ref = match staged {
            Some(staged) => {
                debug!(stage = "attaching-file", file_id = %staged.file_id);
                let source = LocalSource::Attachment {
                    extension: staged.extension.clone(),
                };
                Some(self.files.ensure_remote_file(&staged.file_id, &source).await?)
            }
            None => None,
        };

        debug!(stage = "loading-history");
        let mut contents = build_history(self.store.as_ref(), &request.session_id).await?;

        let mut instruction = Vec::with_capacity(2);
        if let Some(parent) = &request.parent_document {
            let document = self
                .files
                .ensure_remote_file(parent, &LocalSource::Document)
                .await?;
            instruction.push(Part::file(document.uri, document.mime_type));
        }
        instruction.push(Part::text(self.templates.for_turn(request)));
        contents[0] = Turn::new(MessageRole::User, instruction);

        let mut user_parts = Vec::with_capacity(2);
        if let Some(remote) = &attachment_ref {
            user_parts.push(Part::file(remote.uri.clone(), remote.mime_type.clone()));
        }
        if !request.text.is_empty() {
            user_parts.push(Part::text(request.text.clone()));
        }
        contents.push(Turn::new(MessageRole::User, user_parts));

        let generation = GenerationRequest {
            model: self.model.clone(),
            contents,
        };
        let span = info_span!(
            "gen_ai.generate_content",
            gen_ai.system = self.backend.name(),
            gen_ai.request.model = %generation.model,
            gen_ai.request.turns = generation.contents.len(),
        );
        let response = self.backend.generate(&generation).instrument(span).await?;

        let (role, part) = response
            .first_part()
            .ok_or(ChatError::EmptyGenerationResponse)?;
        let content = reply_content(part);

        debug!(stage = "persisting");
        let session_id = request.session_id.as_str();
        if let Some(remote) = attachment_ref {
            let message =
                ChatMessage::new(MessageRole::User, MessageContent::FileRef(remote.uri), Utc::now());
            self.record(session_id, &message).await;
        }
        if !request.text.is_empty() {
            let message = ChatMessage::new(
                MessageRole::User,
                MessageContent::Text(request.text.clone()),
                Utc::now(),
            );
            self.record(session_id, &message).await;
        }
        let reply = ChatMessage::new(role, content, Utc::now());
        self.record(session_id, &reply).await;

        info!(session_id, role = %reply.role, content_type = %reply.content_type(), "Chat turn complete");
        Ok(GeneratedTurn {
            content: reply.content,
            role: reply.role,
            created_at: reply.created_at,
        })
    }

    async fn stage_attachment(
        &self,
        attachment: &Attachment,
    ) -> Result<StagedAttachment<F>, ChatError> {
        let file_id = Uuid::new_v4().to_string();
        let extension = extension_of(&attachment.file_name);
        let layout = self.files.layout();
        let path = layout.attachment_path(&normalize_identifier(&file_id), &extension);

        let fs = self.files.fs();
        fs.create_dir_all(&layout.files_dir)
            .await
            .map_err(|e| ChatError::AttachmentIo(e.to_string()))?;
        fs.write_bytes(&path, &attachment.bytes)
            .await
            .map_err(|e| ChatError::AttachmentIo(e.to_string()))?;

        debug!(path = %path.display(), bytes = attachment.bytes.len(), "Staged attachment");
        Ok(StagedAttachment {
            file_id,
            extension,
            path,
            fs: Some(Arc::clone(fs)),
        })
    }

    async fn record(&self, session_id: &str, message: &ChatMessage) {
        if let Err(err) = self.store.append(session_id, message).await {
            error!(
                session_id,
                role = %message.role,
                content_type = %message.content_type(),
                error = %err,
                "Failed to record chat message"
            );
        }
    }
}

/// `".pdf"` for `"report.pdf"`, empty when there is no extension.
fn extension_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

fn reply_content(part: &Part) -> MessageContent {
    match part {
        Part::Text { text } => MessageContent::Text(text.clone()),
        Part::FileData { uri, mime_type } => MessageContent::Structured(json!({
            "fileData": { "fileUri": uri, "mimeType": mime_type }
        })),
        Part::Opaque { value } => MessageContent::Structured(value.clone()),
    }
}
