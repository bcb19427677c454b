//! Bounded newest-first activity log.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::column::Column;
use crate::constants::{EVENT_LOG_LIMIT, EVENT_LOG_VALUE_MAX_CHARS};
use crate::id::create_id;
use crate::json_utils::null_as_default;
use crate::row::Row;

/// Label -> value view of a row, kept with destructive log entries.
pub type RowSnapshot = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Snapshot {
    Row(RowSnapshot),
    Rows(Vec<RowSnapshot>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventLogEntry {
    pub id: String,
    /// RFC 3339 timestamp with milliseconds
    pub at: String,
    pub action: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub detail: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tab_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<Snapshot>,
}

impl EventLogEntry {
    #[must_use]
    pub fn new(action: impl Into<String>, detail: impl Into<String>, tab_name: impl Into<String>) -> Self {
        Self::recorded_at(Utc::now(), action, detail, tab_name)
    }

    #[must_use]
    pub fn recorded_at(
        at: DateTime<Utc>,
        action: impl Into<String>,
        detail: impl Into<String>,
        tab_name: impl Into<String>,
    ) -> Self {
        Self {
            id: create_id(),
            at: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            action: action.into(),
            detail: detail.into(),
            tab_name: tab_name.into(),
            snapshot: None,
        }
    }

    #[must_use]
    pub fn with_snapshot(mut self, snapshot: Snapshot) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    /// Case-insensitive search over action, detail and tab name.
    pub fn matches(&self, query: &str) -> bool {
        let q = query.trim().to_lowercase();
        q.is_empty()
            || self.action.to_lowercase().contains(&q)
            || self.detail.to_lowercase().contains(&q)
            || self.tab_name.to_lowercase().contains(&q)
    }
}

/// Insert `entry` at the front, dropping the oldest beyond the limit.
pub fn push_entry(entries: &mut Vec<EventLogEntry>, entry: EventLogEntry) {
    entries.insert(0, entry);
    entries.truncate(EVENT_LOG_LIMIT);
}

/// Trimmed value for a log line: "empty" when blank, cut with "..." when long.
pub fn truncate_value(value: &str) -> String {
    let text = value.trim();
    if text.is_empty() {
        return "empty".to_owned();
    }
    if text.chars().count() <= EVENT_LOG_VALUE_MAX_CHARS {
        return text.to_owned();
    }
    let head: String = text.chars().take(EVENT_LOG_VALUE_MAX_CHARS - 3).collect();
    format!("{head}...")
}

/// Display name of a row: its Name cell, or "Untitled row".
pub fn row_display_name(row: &Row, columns: &[Column]) -> String {
    columns
        .iter()
        .find(|c| c.is_name_column())
        .map(|c| row.cell(&c.id).trim())
        .filter(|n| !n.is_empty())
        .unwrap_or("Untitled row")
        .to_owned()
}

/// "a, b, c +2 more"
pub fn format_row_name_list(rows: &[&Row], columns: &[Column]) -> String {
    let names: Vec<String> = rows.iter().map(|r| row_display_name(r, columns)).collect();
    if names.len() <= 3 {
        return names.join(", ");
    }
    format!("{} +{} more", names[..3].join(", "), names.len() - 3)
}

/// Label -> value map of a row's non-empty, non-photo cells plus its tags.
pub fn snapshot_row(row: &Row, columns: &[Column]) -> RowSnapshot {
    let mut snap: RowSnapshot = columns
        .iter()
        .filter(|c| !c.is_photo_column())
        .filter_map(|c| {
            let value = row.cell(&c.id);
            (!value.is_empty()).then(|| (c.label().to_owned(), value.to_owned()))
        })
        .collect();
    let tags = row.clean_tags();
    if !tags.is_empty() {
        snap.insert("Tags".to_owned(), tags.join(", "));
    }
    snap
}

/// `(action, detail)` describing a single cell edit, or `None` when the
/// visible value did not change.
pub fn describe_cell_change(
    row: &Row,
    column: &Column,
    columns: &[Column],
    previous: &str,
    next: &str,
) -> Option<(&'static str, String)> {
    let prev_text = truncate_value(previous);
    let next_text = truncate_value(next);
    if prev_text == next_text {
        return None;
    }
    if column.is_name_column() {
        if prev_text == "empty" {
            return Some(("Added row", next_text));
        }
        return Some(("Renamed row", format!("{prev_text} -> {next_text}")));
    }
    let name = row_display_name(row, columns);
    let label = column.label();
    if column.is_photo_column() {
        let change = match (previous.is_empty(), next.is_empty()) {
            (true, false) => "photo added",
            (false, true) => "photo removed",
            _ => "photo updated",
        };
        return Some(("Updated row", format!("{name} - {label}: {change}")));
    }
    Some(("Updated row", format!("{name} - {label}: {prev_text} -> {next_text}")))
}
