//! Transcript export — one-way, stateless transforms of the
//! conversation into portable download formats.

use chrono::Utc;
use serde::Serialize;

use chat_types::{
    message::{Message, Role},
    Result,
};

/// One exported record per message.
#[derive(Debug, Serialize)]
struct ExportRecord<'a> {
    role: Role,
    text: &'a str,
    timestamp: String,
}

/// Pretty-printed JSON transcript.
pub fn transcript_json(messages: &[Message]) -> Result<String> {
    let records: Vec<ExportRecord<'_>> = messages
        .iter()
        .map(|m| ExportRecord {
            role: m.role,
            text: &m.text,
            timestamp: m.timestamp.to_rfc3339(),
        })
        .collect();
    Ok(serde_json::to_string_pretty(&records)?)
}

/// Markdown transcript, one block per message separated by rules.
pub fn transcript_markdown(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| {
            let who = match m.role {
                Role::User => "**You**",
                Role::Assistant => "**AI Assistant**",
            };
            format!(
                "{} ({}):\n{}\n\n---\n",
                who,
                m.timestamp.format("%Y-%m-%d %H:%M:%S"),
                m.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Download filename, e.g. `chat-export-2026-08-29.json`.
pub fn export_filename(extension: &str) -> String {
    format!("chat-export-{}.{}", Utc::now().format("%Y-%m-%d"), extension)
}
