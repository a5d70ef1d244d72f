//! Prompt template loading.
//!
//! A template is sent as the first turn of every generation request. Each
//! endpoint has its own, read once at startup.

use std::path::Path;

use docagent_core::conversation::HISTORY_PLACEHOLDER_INSTRUCTION;

/// Read the prompt template, falling back to the placeholder instruction when
/// the file cannot be read or is empty.
pub async fn load_prompt_template(path: &Path) -> String {
    match tokio::fs::read_to_string(path).await {
        Ok(template) if !template.trim().is_empty() => {
            tracing::info!(path = %path.display(), chars = template.len(), "Loaded prompt template");
            template
        }
        Ok(_) => {
            tracing::warn!(path = %path.display(), "Prompt template is empty, using placeholder instruction");
            HISTORY_PLACEHOLDER_INSTRUCTION.to_string()
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "Prompt template unavailable, using placeholder instruction");
            HISTORY_PLACEHOLDER_INSTRUCTION.to_string()
        }
    }
}
