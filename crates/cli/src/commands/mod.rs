pub(crate) mod columns;
pub(crate) mod csv;
pub(crate) mod log;
pub(crate) mod mode;
pub(crate) mod rows;
pub(crate) mod serve;
pub(crate) mod share;
pub(crate) mod sync;
pub(crate) mod tabs;
pub(crate) mod tags;

use std::sync::Arc;

use anyhow::{Result, anyhow};
use serde::Serialize;
use shirt_tracker_cloud::{CloudBackend, CloudConfig, SupabaseClient};
use shirt_tracker_core::backup::format_timestamp;
use shirt_tracker_core::constants::PUBLIC_SHARE_BASE_URL;
use shirt_tracker_core::currency::format_currency;
use shirt_tracker_core::env_config::env_non_empty;
use shirt_tracker_core::stats::FooterStats;
use shirt_tracker_core::{Column, ColumnType, Row, SheetState};
use shirt_tracker_service::{SyncOutcome, SyncService, Workspace, switch_user};
use shirt_tracker_storage::Storage;

use crate::{ensure_db_dir, get_db_path};

/// Storage, the optional cloud backend and the sync service for one run.
pub(crate) struct AppContext {
    pub(crate) storage: Storage,
    pub(crate) cloud: Option<Arc<dyn CloudBackend>>,
    pub(crate) sync: SyncService,
    pub(crate) share_base_url: String,
}

impl AppContext {
    pub(crate) fn init() -> Result<Self> {
        let db_path = get_db_path();
        ensure_db_dir(&db_path)?;
        let storage = Storage::new(&db_path)?;

        let config = CloudConfig::from_env();
        let share_base_url = config
            .as_ref()
            .map(|c| c.share_base_url.clone())
            .or_else(|| env_non_empty("SHIRT_TRACKER_SHARE_BASE_URL"))
            .unwrap_or_else(|| PUBLIC_SHARE_BASE_URL.to_owned());
        let user_id = config.as_ref().filter(|c| c.is_signed_in()).and_then(|c| c.user_id.clone());
        let cloud = match config {
            Some(config) => Some(Arc::new(SupabaseClient::new(config)?) as Arc<dyn CloudBackend>),
            None => {
                tracing::debug!("SHIRT_TRACKER_SUPABASE_URL/KEY not set, running local-only");
                None
            },
        };

        if let Some(user_id) = &user_id {
            if switch_user(&storage, user_id)? {
                tracing::info!(user_id = %user_id, "Signed in as a different user; local data reset");
            }
        }

        let sync = SyncService::new(storage.clone(), cloud.clone(), user_id);
        Ok(Self { storage, cloud, sync, share_base_url })
    }

    /// The stored workspace, with edits scheduled for upload.
    pub(crate) fn workspace(&self) -> Result<Workspace> {
        Ok(Workspace::open(self.storage.clone())?.with_listener(Arc::new(self.sync.clone())))
    }

    /// Upload pending edits before the process exits. Failures only warn;
    /// local state is already saved.
    pub(crate) async fn finish(&self) {
        match self.sync.flush().await {
            Ok(SyncOutcome::Uploaded(at)) => {
                tracing::info!(at = %format_timestamp(at), "Changes saved to cloud");
            },
            Ok(_) => {},
            Err(e) => tracing::warn!("Cloud sync failed, changes kept locally: {}", e),
        }
    }
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Row id from an id or a 1-based position in display order.
pub(crate) fn resolve_row(sheet: &SheetState, raw: &str) -> Result<String> {
    let raw = raw.trim();
    if let Some(row) = sheet.row(raw) {
        return Ok(row.id.clone());
    }
    raw.parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| sheet.rows.get(i))
        .map(|r| r.id.clone())
        .ok_or_else(|| anyhow!("No row '{raw}' (use a row number from `rows list` or a row id)"))
}

pub(crate) fn resolve_column(workspace: &Workspace, raw: &str) -> Result<String> {
    workspace
        .resolve_column(raw)
        .map(|c| c.id.clone())
        .ok_or_else(|| anyhow!("No column '{raw}' in tab {}", workspace.active_tab_name()))
}

pub(crate) fn resolve_tab(workspace: &Workspace, raw: &str) -> Result<String> {
    workspace.resolve_tab(raw).map(|t| t.id.clone()).ok_or_else(|| anyhow!("No tab '{raw}'"))
}

/// Comma separated list, blanks dropped.
pub(crate) fn split_list(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_owned).collect()
}

fn display_cell(column: &Column, value: &str) -> String {
    match column.column_type {
        ColumnType::Number if !value.trim().is_empty() => format_currency(value),
        ColumnType::Photo if !value.is_empty() => "[photo]".to_owned(),
        _ => value.replace(['\t', '\n'], " "),
    }
}

/// Tab separated table: row number, visible columns, tags.
pub(crate) fn print_rows(sheet: &SheetState, rows: &[&Row], hidden_columns: &[String]) {
    let columns: Vec<&Column> = sheet.columns.iter().filter(|c| !hidden_columns.contains(&c.id)).collect();
    let mut header = vec!["#".to_owned()];
    header.extend(columns.iter().map(|c| c.label().to_owned()));
    header.push("Tags".to_owned());
    println!("{}", header.join("\t"));

    for row in rows {
        let number = sheet.rows.iter().position(|r| r.id == row.id).map_or(0, |i| i + 1);
        let mut line = vec![number.to_string()];
        line.extend(columns.iter().map(|c| display_cell(c, row.cell(&c.id))));
        line.push(row.clean_tags().join(", "));
        println!("{}", line.join("\t"));
    }
}

pub(crate) fn print_footer(stats: &FooterStats) {
    let mut parts = vec![format!("{} items", stats.total_items)];
    if let Some(price) = &stats.price {
        parts.push(price.total_display());
        parts.push(price.average_display());
    }
    println!("{}", parts.join("  "));
}

#[cfg(test)]
mod tests {
    use shirt_tracker_core::defaults::inventory_columns;

    use super::*;

    #[test]
    fn test_resolve_row_by_number_and_id() {
        let mut sheet = SheetState::blank_with_columns(&inventory_columns());
        sheet.rows.push(Row::blank());
        let second = sheet.rows[1].id.clone();
        assert_eq!(resolve_row(&sheet, "2").ok(), Some(second.clone()));
        assert_eq!(resolve_row(&sheet, &second).ok(), Some(second));
        assert!(resolve_row(&sheet, "0").is_err());
        assert!(resolve_row(&sheet, "3").is_err());
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list(" Floral, ,Movie ,"), ["Floral", "Movie"]);
    }

    #[test]
    fn test_display_cell_formats_numbers_and_photos() {
        let price = Column::new("Price", ColumnType::Number);
        let photo = Column::new("Preview", ColumnType::Photo);
        assert_eq!(display_cell(&price, "19.99"), "$19.99");
        assert_eq!(display_cell(&price, ""), "");
        assert_eq!(display_cell(&photo, "idb:abc"), "[photo]");
    }
}
