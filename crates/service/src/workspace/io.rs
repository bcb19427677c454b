use shirt_tracker_core::csv_io::{CsvPreview, ImportMode, ImportOutcome, apply_import, export_csv, parse_csv};
use shirt_tracker_core::sort::sort_sheet;
use shirt_tracker_core::tags::persist_new_tags;
use shirt_tracker_core::{CoreError, OverrideKind};

use super::Workspace;
use crate::error::Result;

/// A CSV import as chosen by the user.
#[derive(Debug, Clone, Default)]
pub struct ImportRequest {
    pub text: String,
    pub mode: ImportMode,
    /// Header labels to import; `None` imports every matched column.
    pub columns: Option<Vec<String>>,
}

impl Workspace {
    /// CSV text of the active sheet, photo columns excluded.
    pub fn export_csv(&self) -> Result<String> {
        Ok(export_csv(&self.sheet)?)
    }

    /// Match a CSV's header against the active sheet without changing it.
    pub fn preview_import(&self, text: &str) -> Result<CsvPreview> {
        Ok(parse_csv(text, &self.sheet.columns)?)
    }

    pub fn import_csv(&mut self, request: &ImportRequest) -> Result<ImportOutcome> {
        self.ensure_writable()?;
        let preview = parse_csv(&request.text, &self.sheet.columns)?;
        let selected = match &request.columns {
            None => preview.all_indices(),
            Some(labels) => preview.indices_for_labels(labels),
        };
        if selected.is_empty() {
            return Err(CoreError::CsvImport("Select at least one column to import.".into()).into());
        }
        let outcome = apply_import(&mut self.sheet, &preview, request.mode, &selected)?;

        let mut schema_changed = false;
        let tab_id = self.tabs.active_tab_id.clone();
        for (column_id, value) in &outcome.new_options {
            let kind = self.sheet.column(column_id).and_then(|c| OverrideKind::from_label_key(&c.label_key()));
            match (kind, tab_id.as_deref()) {
                (Some(kind), Some(tab_id)) => {
                    self.schema.overrides.add_option(kind, tab_id, value);
                    schema_changed = true;
                },
                _ => {
                    self.sync_global_columns()?;
                },
            }
        }
        if schema_changed {
            self.save_schema()?;
        }

        let imported_tags: Vec<String> = self.sheet.rows.iter().flat_map(|r| r.clean_tags()).collect();
        if persist_new_tags(&mut self.custom_tags, &imported_tags) {
            self.save_custom_tags()?;
        }

        self.log_event("Imported CSV", outcome.summary())?;
        self.touch()?;
        sort_sheet(&mut self.sheet);
        self.save_sheet()?;
        tracing::info!(mode = %outcome.mode, imported = outcome.imported, "Imported CSV");
        Ok(outcome)
    }
}
