use crate::config::ChatConfig;
use crate::filter::Filter;
use crate::format::format_byte;
use crate::metadata::{Message, MetaData};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};
use serde::Serialize;
use std::fmt::Write;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedMessage {
    pub id: i64,
    pub media_type: String,
    pub file_name: String,
    pub file_size: i64,
}

/// Outcome of running one chat's filter over a batch of messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub chat_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    pub selected: Vec<SelectedMessage>,
    pub skipped: Vec<i64>,
    /// Diagnostic of a filter that could not be evaluated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub misconfigured: Option<String>,
}

/// Decide which messages of a chat should be downloaded
///
/// Messages without media are always skipped. A chat without a filter takes
/// every media message. A filter that fails to evaluate marks the chat as
/// misconfigured and nothing is selected.
pub fn select_messages(chat: &ChatConfig, messages: &[Message], debug: bool) -> Selection {
    let mut selection = Selection {
        chat_id: chat.chat_id,
        filter: chat.download_filter.clone(),
        selected: Vec::new(),
        skipped: Vec::new(),
        misconfigured: None,
    };

    let mut filter = Filter::new();
    filter.set_debug(debug);

    for message in messages {
        if message.media.is_none() {
            selection.skipped.push(message.id);
            continue;
        }

        let meta = MetaData::from_message(message);
        let keep = match chat.download_filter.as_deref() {
            None => true,
            Some(expr) => {
                filter.set_meta_data(meta.clone());
                match filter.exec(expr) {
                    Ok(keep) => keep,
                    Err(err) => {
                        warn!(
                            chat_id = chat.chat_id,
                            filter = expr,
                            error = %err,
                            "download filter is misconfigured, skipping chat"
                        );
                        selection.misconfigured = Some(err.to_string());
                        selection.selected.clear();
                        selection.skipped = messages.iter().map(|m| m.id).collect();
                        return selection;
                    }
                }
            }
        };

        debug!(chat_id = chat.chat_id, message_id = message.id, keep, "message filtered");
        if keep {
            selection.selected.push(SelectedMessage {
                id: meta.message_id,
                media_type: meta.media_type,
                file_name: meta.media_file_name,
                file_size: meta.media_file_size,
            });
        } else {
            selection.skipped.push(message.id);
        }
    }

    selection
}

pub fn format_selection_text(selection: &Selection) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Chat {}: {} selected, {} skipped",
        selection.chat_id,
        selection.selected.len(),
        selection.skipped.len()
    );
    if let Some(filter) = &selection.filter {
        let _ = writeln!(out, "Filter: {}", filter);
    }
    if let Some(message) = &selection.misconfigured {
        let _ = writeln!(out, "Misconfigured filter: {}", message);
        return out;
    }
    if selection.selected.is_empty() {
        let _ = writeln!(out, "\nNo messages selected.");
        return out;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["id", "type", "file", "size"]);
    for message in &selection.selected {
        table.add_row(vec![
            Cell::new(message.id),
            Cell::new(&message.media_type),
            Cell::new(&message.file_name),
            Cell::new(format_byte(message.file_size)),
        ]);
    }
    let _ = writeln!(out, "\n{table}");
    out
}

pub fn format_selection_json(selection: &Selection) -> String {
    serde_json::to_string_pretty(selection)
        .unwrap_or_else(|_| "{\"error\":\"failed to serialize selection\"}".into())
}
