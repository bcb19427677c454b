//! The loaded state of one mode: its tabs, column schema and active sheet.
//!
//! Every mutating operation persists immediately through [`Storage`] and then
//! notifies the registered [`ChangeListener`] (the sync service), so storage
//! is always the source of truth for payload building.

mod columns;
mod io;
mod modes;
mod rows;
mod tabs;
#[cfg(test)]
mod tests;

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use shirt_tracker_core::column::Column;
use shirt_tracker_core::constants::LAST_CHANGE_KEY;
use shirt_tracker_core::defaults::columns_for;
use shirt_tracker_core::event_log::push_entry;
use shirt_tracker_core::photo::{PhotoRef, decode_data_url, local_ref};
use shirt_tracker_core::reconcile::{reconcile_sheet, to_global_columns};
use shirt_tracker_core::sort::sort_sheet;
use shirt_tracker_core::{
    AppMode, ColumnSchema, EventLogEntry, OverrideKind, Row, SheetState, Tab, TabsState,
};
use shirt_tracker_storage::Storage;

pub use io::ImportRequest;

use crate::error::{Result, ServiceError};

/// Notified after local state has been written.
pub trait ChangeListener: Send + Sync {
    fn state_saved(&self);
}

pub struct Workspace {
    storage: Storage,
    mode: AppMode,
    tabs: TabsState,
    schema: ColumnSchema,
    sheet: SheetState,
    event_log: Vec<EventLogEntry>,
    custom_tags: Vec<String>,
    /// Rows removed by the last clear-all, restorable once.
    clear_snapshot: Option<Vec<Row>>,
    listener: Option<Arc<dyn ChangeListener>>,
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("mode", &self.mode)
            .field("active_tab_id", &self.tabs.active_tab_id)
            .field("columns", &self.sheet.columns.len())
            .field("rows", &self.sheet.rows.len())
            .finish_non_exhaustive()
    }
}

impl Workspace {
    /// Load the stored mode, its tabs and the active sheet, creating fresh
    /// defaults where nothing is stored yet.
    pub fn open(storage: Storage) -> Result<Self> {
        let mode = storage.load_app_mode()?;
        let mut workspace = Self {
            storage,
            mode,
            tabs: TabsState::default(),
            schema: ColumnSchema::default(),
            sheet: SheetState::default(),
            event_log: Vec::new(),
            custom_tags: Vec::new(),
            clear_snapshot: None,
            listener: None,
        };
        workspace.reload()?;
        Ok(workspace)
    }

    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn ChangeListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Re-read everything from storage, e.g. after a cloud payload was applied.
    pub fn reload(&mut self) -> Result<()> {
        self.mode = self.storage.load_app_mode()?;
        self.schema = self.storage.load_schema(self.mode)?;
        self.tabs = self.load_tabs()?;
        self.event_log = self.storage.load_event_log()?;
        self.custom_tags = self.storage.load_custom_tags()?;
        self.clear_snapshot = None;
        self.load_active_sheet()?;
        self.reconcile();
        Ok(())
    }

    pub const fn storage(&self) -> &Storage {
        &self.storage
    }

    pub const fn mode(&self) -> AppMode {
        self.mode
    }

    pub const fn tabs(&self) -> &TabsState {
        &self.tabs
    }

    pub fn active_tab(&self) -> Option<&Tab> {
        self.tabs.active_tab()
    }

    pub fn active_tab_id(&self) -> Option<&str> {
        self.tabs.active_tab_id.as_deref()
    }

    pub fn active_tab_name(&self) -> &str {
        self.active_tab().map_or("", |t| t.name.as_str())
    }

    pub const fn sheet(&self) -> &SheetState {
        &self.sheet
    }

    pub const fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    pub fn event_log(&self) -> &[EventLogEntry] {
        &self.event_log
    }

    pub fn custom_tags(&self) -> &[String] {
        &self.custom_tags
    }

    pub const fn can_undo_clear(&self) -> bool {
        self.clear_snapshot.is_some()
    }

    /// Column ids hidden on the active tab.
    pub fn hidden_columns(&self) -> &[String] {
        self.active_tab_id().map_or(&[], |tab| self.schema.overrides.hidden_columns(tab))
    }

    fn load_tabs(&self) -> Result<TabsState> {
        let mut tabs = match self.storage.load_tabs(self.mode)? {
            Some(stored) if stored.is_legacy_seed() && !self.schema.has_stored_columns() => {
                tracing::info!(mode = %self.mode, "Replacing legacy tab seed with defaults");
                for tab in &stored.tabs {
                    self.storage.remove_sheet(self.mode, &tab.id)?;
                }
                let fresh = TabsState::with_default_tab();
                self.storage.save_tabs(self.mode, &fresh)?;
                fresh
            },
            Some(stored) if !stored.tabs.is_empty() => stored,
            _ => {
                let fresh = TabsState::with_default_tab();
                tracing::info!(mode = %self.mode, "Created default tab");
                self.storage.save_tabs(self.mode, &fresh)?;
                fresh
            },
        };
        tabs.sort();
        if tabs.ensure_active() {
            self.storage.save_tabs(self.mode, &tabs)?;
        }
        Ok(tabs)
    }

    /// Columns a brand-new sheet starts from: the stored schema, else the
    /// mode's defaults.
    fn base_columns(&self) -> Vec<Column> {
        match self.schema.global_columns.as_ref().filter(|g| !g.is_empty()) {
            Some(globals) => globals.clone(),
            None => columns_for(self.mode),
        }
    }

    /// A blank sheet shaped like the current one, for a tab without state.
    fn blank_sheet_from_current(&self) -> SheetState {
        let mut sheet = SheetState::blank_with_columns(&self.base_columns());
        sheet.column_widths.clone_from(&self.sheet.column_widths);
        sheet
    }

    fn load_active_sheet(&mut self) -> Result<()> {
        let tab_id = self.tabs.active_tab_id.clone();
        self.sheet = match self.storage.load_sheet(self.mode, tab_id.as_deref())? {
            Some(mut sheet) => {
                if sheet.columns.is_empty() {
                    sheet.columns = self.base_columns();
                }
                sheet.ensure_has_row();
                sheet
            },
            None => {
                let sheet = SheetState::blank_with_columns(&self.base_columns());
                self.storage.save_sheet(self.mode, tab_id.as_deref(), &sheet)?;
                sheet
            },
        };
        self.sheet.read_only = false;
        Ok(())
    }

    /// Bring the loaded sheet and schema in line with the mode's rules and
    /// persist whatever changed. Write failures are logged, not returned.
    fn reconcile(&mut self) {
        let active = self.tabs.active_tab_id.clone();
        let report = reconcile_sheet(&mut self.sheet, &mut self.schema, self.mode, active.as_deref());
        sort_sheet(&mut self.sheet);
        if report.schema_changed {
            if let Err(e) = self.storage.save_schema(self.mode, &self.schema) {
                tracing::warn!("Failed to persist reconciled schema: {}", e);
            }
        }
        if report.sheet_changed {
            if let Err(e) = self.storage.save_sheet(self.mode, active.as_deref(), &self.sheet) {
                tracing::warn!("Failed to persist reconciled sheet: {}", e);
            }
        }
        tracing::debug!(
            mode = %self.mode,
            sheet_changed = report.sheet_changed,
            schema_changed = report.schema_changed,
            "Reconciled sheet"
        );
        if let Err(e) = self.migrate_inline_photos() {
            tracing::warn!("Inline photo migration failed: {}", e);
        }
    }

    /// Move legacy `data:` photo cells of the loaded sheet into the local
    /// photo store. Returns how many cells were rewritten.
    pub fn migrate_inline_photos(&mut self) -> Result<usize> {
        let photo_columns: Vec<String> =
            self.sheet.columns.iter().filter(|c| c.is_photo_column()).map(|c| c.id.clone()).collect();
        let mut migrated = 0;
        for row in &mut self.sheet.rows {
            for column_id in &photo_columns {
                let Some(PhotoRef::Inline(url)) = PhotoRef::parse(row.cell(column_id)) else {
                    continue;
                };
                let blob = match decode_data_url(url) {
                    Ok(blob) => blob,
                    Err(e) => {
                        tracing::warn!(row_id = %row.id, "Skipping unreadable inline photo: {}", e);
                        continue;
                    },
                };
                let photo_id = self.storage.save_photo(&blob)?;
                row.set_cell(column_id, local_ref(&photo_id));
                migrated += 1;
            }
        }
        if migrated > 0 {
            tracing::info!(migrated, "Moved inline photos to the photo store");
            self.storage.save_sheet(self.mode, self.tabs.active_tab_id.as_deref(), &self.sheet)?;
        }
        Ok(migrated)
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.sheet.read_only {
            return Err(ServiceError::ReadOnly("shared sheets cannot be edited".into()));
        }
        Ok(())
    }

    fn notify(&self) {
        if let Some(listener) = &self.listener {
            listener.state_saved();
        }
    }

    fn save_sheet(&self) -> Result<()> {
        self.storage.save_sheet(self.mode, self.active_tab_id(), &self.sheet)?;
        self.notify();
        Ok(())
    }

    fn save_tabs(&self) -> Result<()> {
        self.storage.save_tabs(self.mode, &self.tabs)?;
        self.notify();
        Ok(())
    }

    fn save_schema(&self) -> Result<()> {
        self.storage.save_schema(self.mode, &self.schema)?;
        self.notify();
        Ok(())
    }

    fn save_custom_tags(&self) -> Result<()> {
        self.storage.save_custom_tags(&self.custom_tags)?;
        self.notify();
        Ok(())
    }

    /// Stamp the data as changed locally (drives the unsaved-changes status).
    fn touch(&self) -> Result<()> {
        let now = Utc::now();
        self.storage.set_shirt_update_date(&now.to_rfc3339_opts(SecondsFormat::Millis, true))?;
        self.storage.set_timestamp(LAST_CHANGE_KEY, now)?;
        Ok(())
    }

    fn log_event(&mut self, action: &str, detail: impl Into<String>) -> Result<()> {
        let entry = EventLogEntry::new(action, detail, self.active_tab_name());
        self.push_event(entry)
    }

    fn push_event(&mut self, entry: EventLogEntry) -> Result<()> {
        tracing::debug!(action = %entry.action, detail = %entry.detail, "Event");
        push_entry(&mut self.event_log, entry);
        self.storage.save_event_log(&self.event_log)?;
        Ok(())
    }

    /// Store the loaded columns as the mode's global schema.
    fn sync_global_columns(&mut self) -> Result<()> {
        self.schema.global_columns = Some(to_global_columns(&self.sheet.columns));
        self.save_schema()
    }

    /// Copy the loaded Fandom/Type/Brand options into the active tab's overrides.
    fn capture_tab_options(&mut self) {
        let Some(tab_id) = self.tabs.active_tab_id.clone() else {
            return;
        };
        for kind in OverrideKind::ALL {
            if let Some(column) = self.sheet.column_by_label(kind.label_key()) {
                let options = column.options.clone();
                self.schema.overrides.set_options(kind, &tab_id, options);
            }
        }
    }
}
