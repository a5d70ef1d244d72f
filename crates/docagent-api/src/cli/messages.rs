//! `docagent messages <session-id>`: print a session's stored history.

use anyhow::Result;
use console::style;

use docagent_core::conversation::ConversationStore;
use docagent_types::message::{ChatMessage, MessageContent, MessageRole};

/// Print every live message of a session, oldest first.
pub async fn show_messages<S: ConversationStore>(
    store: &S,
    session_id: &str,
    json: bool,
) -> Result<()> {
    let messages = store.read_all(session_id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&messages)?);
        return Ok(());
    }

    if messages.is_empty() {
        println!();
        println!(
            "  {} No messages for session '{}' (unknown or expired).",
            style("i").blue().bold(),
            style(session_id).cyan()
        );
        println!();
        return Ok(());
    }

    println!();
    for message in &messages {
        println!("{}", render_line(message));
    }
    println!();
    println!(
        "  {}",
        style(format!("{} message(s)", messages.len())).dim()
    );
    Ok(())
}

fn render_line(message: &ChatMessage) -> String {
    let role = match message.role {
        MessageRole::User => style("user ").green().bold(),
        MessageRole::Model => style("model").magenta().bold(),
    };
    let timestamp = message.created_at.format("%Y-%m-%d %H:%M:%S");
    format!(
        "  {} {} {}",
        style(timestamp).dim(),
        role,
        content_preview(&message.content)
    )
}

fn content_preview(content: &MessageContent) -> String {
    match content {
        MessageContent::Text(text) => text.clone(),
        MessageContent::FileRef(uri) => format!("[file] {uri}"),
        MessageContent::Structured(value) => format!("[structured] {value}"),
    }
}
