//! Chat turn endpoints.
//!
//! POST /ai-chat       - chat turn
//! POST /ai-chat-docs  - chat turn based on the reference document named by `sessionId`
//!
//! Both take a multipart form with the fields `sessionId`, `text` and an
//! optional `file`, and answer with `{content, role, createdAt}`.

use axum::Json;
use axum::extract::{Multipart, State};

use docagent_core::chat::{Attachment, ChatTurnRequest};
use docagent_types::message::GeneratedTurn;

use crate::http::error::AppError;
use crate::state::AppState;

/// Fields read from the multipart body.
#[derive(Debug, Default)]
struct ChatForm {
    session_id: String,
    text: String,
    attachment: Option<Attachment>,
}

impl ChatForm {
    async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = ChatForm::default();

        while let Some(field) = multipart.next_field().await? {
            let field_name = field.name().map(str::to_string);
            match field_name.as_deref() {
                Some("sessionId") => form.session_id = field.text().await?,
                Some("text") => form.text = field.text().await?,
                Some("file") => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let bytes = field.bytes().await?;
                    // Browsers send an empty part when no file was picked.
                    if !bytes.is_empty() {
                        form.attachment = Some(Attachment {
                            file_name,
                            bytes: bytes.to_vec(),
                        });
                    }
                }
                other => {
                    tracing::debug!(field = ?other, "Ignoring unknown multipart field");
                }
            }
        }

        Ok(form)
    }

    fn into_request(self, parent_document: Option<String>) -> ChatTurnRequest {
        ChatTurnRequest {
            session_id: self.session_id,
            text: self.text,
            attachment: self.attachment,
            parent_document,
        }
    }
}

/// POST /ai-chat
pub async fn ai_chat(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<GeneratedTurn>, AppError> {
    let form = ChatForm::read(multipart).await?;
    let reply = state.chat.handle_turn(form.into_request(None)).await?;
    Ok(Json(reply))
}

/// POST /ai-chat-docs
///
/// The session id doubles as the id of the reference document, whose file is
/// sent ahead of the prompt template in the first turn.
pub async fn ai_chat_docs(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<GeneratedTurn>, AppError> {
    let form = ChatForm::read(multipart).await?;
    let parent = Some(form.session_id.clone()).filter(|id| !id.trim().is_empty());
    let reply = state.chat.handle_turn(form.into_request(parent)).await?;
    Ok(Json(reply))
}
