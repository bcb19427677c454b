use std::collections::HashSet;

use shirt_tracker_core::column::ColumnType;
use shirt_tracker_core::currency::normalize_number_cell;
use shirt_tracker_core::event_log::{
    describe_cell_change, format_row_name_list, row_display_name, snapshot_row,
};
use shirt_tracker_core::photo::{ImageBlob, local_ref};
use shirt_tracker_core::sort::sort_sheet;
use shirt_tracker_core::tags;
use shirt_tracker_core::{EventLogEntry, OverrideKind, Row, Snapshot};

use super::Workspace;
use crate::error::{Result, ServiceError};

impl Workspace {
    fn row_index(&self, row_id: &str) -> Result<usize> {
        self.sheet
            .rows
            .iter()
            .position(|r| r.id == row_id)
            .ok_or_else(|| ServiceError::NotFound(format!("row {row_id}")))
    }

    /// Store an image in the local photo store and point the cell at it.
    ///
    /// Returns the cell's new `idb:` reference.
    pub fn attach_photo(&mut self, row_id: &str, column_id: &str, blob: &ImageBlob) -> Result<String> {
        self.ensure_writable()?;
        let is_photo = self.sheet.column(column_id).is_some_and(|c| c.is_photo_column());
        if !is_photo {
            return Err(ServiceError::InvalidInput(format!("column {column_id} is not a photo column")));
        }
        self.row_index(row_id)?;
        let photo_id = self.storage.save_photo(blob)?;
        let reference = local_ref(&photo_id);
        self.update_cell(row_id, column_id, &reference)?;
        Ok(reference)
    }

    /// Append a blank row; returns its id.
    pub fn add_row(&mut self) -> Result<String> {
        self.ensure_writable()?;
        let row = Row::blank();
        let id = row.id.clone();
        self.sheet.rows.push(row);
        self.sheet.ensure_row_cells();
        self.touch()?;
        self.save_sheet()?;
        sort_sheet(&mut self.sheet);
        Ok(id)
    }

    /// Set one cell. Number cells store the normalized amount; a select
    /// value outside the column's options is added as a new option.
    pub fn update_cell(&mut self, row_id: &str, column_id: &str, value: &str) -> Result<()> {
        self.ensure_writable()?;
        let column = self
            .sheet
            .column(column_id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("column {column_id}")))?;
        let index = self.row_index(row_id)?;

        let stored = match column.column_type {
            ColumnType::Number => normalize_number_cell(value.trim()),
            _ => value.to_owned(),
        };
        let previous = self.sheet.rows[index].cell(column_id).to_owned();
        let change = describe_cell_change(
            &self.sheet.rows[index],
            &column,
            &self.sheet.columns,
            &previous,
            &stored,
        );

        if column.column_type == ColumnType::Select {
            self.add_select_option(column_id, stored.trim())?;
        }
        self.sheet.rows[index].set_cell(column_id, stored);
        if let Some((action, detail)) = change {
            self.log_event(action, detail)?;
        }
        self.touch()?;
        self.save_sheet()?;
        if column.is_name_column() {
            sort_sheet(&mut self.sheet);
        }
        Ok(())
    }

    /// Register `value` as an option of a select column, per tab for
    /// Fandom/Type/Brand and in the global schema otherwise.
    pub(super) fn add_select_option(&mut self, column_id: &str, value: &str) -> Result<bool> {
        if value.is_empty() {
            return Ok(false);
        }
        let Some(column) = self.sheet.columns.iter_mut().find(|c| c.id == column_id) else {
            return Ok(false);
        };
        let lower = value.to_lowercase();
        if column.options.iter().any(|o| o.trim().to_lowercase() == lower) {
            return Ok(false);
        }
        column.options.push(value.to_owned());
        let kind = OverrideKind::from_label_key(&column.label_key());
        match (kind, self.tabs.active_tab_id.clone()) {
            (Some(kind), Some(tab_id)) => {
                self.schema.overrides.add_option(kind, &tab_id, value);
                self.save_schema()?;
            },
            _ => self.sync_global_columns()?,
        }
        Ok(true)
    }

    pub fn delete_row(&mut self, row_id: &str) -> Result<()> {
        self.ensure_writable()?;
        let index = self.row_index(row_id)?;
        let removed = self.sheet.rows.remove(index);
        self.sheet.ensure_has_row();
        let entry = EventLogEntry::new(
            "Deleted row",
            row_display_name(&removed, &self.sheet.columns),
            self.active_tab_name(),
        )
        .with_snapshot(Snapshot::Row(snapshot_row(&removed, &self.sheet.columns)));
        self.push_event(entry)?;
        self.touch()?;
        self.save_sheet()
    }

    /// Delete every row in `row_ids`; unknown ids are ignored. Returns how
    /// many rows were removed.
    pub fn delete_rows(&mut self, row_ids: &[String]) -> Result<usize> {
        self.ensure_writable()?;
        let ids: HashSet<&str> = row_ids.iter().map(String::as_str).collect();
        let (removed, kept): (Vec<Row>, Vec<Row>) =
            std::mem::take(&mut self.sheet.rows).into_iter().partition(|r| ids.contains(r.id.as_str()));
        self.sheet.rows = kept;
        if removed.is_empty() {
            return Ok(0);
        }
        self.sheet.ensure_has_row();
        let columns = &self.sheet.columns;
        let refs: Vec<&Row> = removed.iter().collect();
        let entry = EventLogEntry::new("Deleted rows", format_row_name_list(&refs, columns), self.active_tab_name())
            .with_snapshot(Snapshot::Rows(removed.iter().map(|r| snapshot_row(r, columns)).collect()));
        self.push_event(entry)?;
        self.touch()?;
        self.save_sheet()?;
        Ok(removed.len())
    }

    /// Replace all rows with one blank row, keeping the old rows for
    /// [`Workspace::undo_clear`].
    pub fn clear_all(&mut self) -> Result<usize> {
        self.ensure_writable()?;
        let removed = std::mem::replace(&mut self.sheet.rows, vec![Row::blank()]);
        self.sheet.ensure_row_cells();
        let columns = &self.sheet.columns;
        let entry = EventLogEntry::new("Cleared all rows", "", self.active_tab_name())
            .with_snapshot(Snapshot::Rows(removed.iter().map(|r| snapshot_row(r, columns)).collect()));
        self.push_event(entry)?;
        let count = removed.len();
        self.clear_snapshot = Some(removed);
        self.touch()?;
        self.save_sheet()?;
        Ok(count)
    }

    /// Restore the rows removed by the last clear-all.
    pub fn undo_clear(&mut self) -> Result<()> {
        self.ensure_writable()?;
        let Some(rows) = self.clear_snapshot.take() else {
            return Err(ServiceError::InvalidInput("nothing to undo".into()));
        };
        self.sheet.rows = rows;
        self.sheet.ensure_row_cells();
        self.log_event("Undid clear", "")?;
        self.touch()?;
        self.save_sheet()?;
        sort_sheet(&mut self.sheet);
        Ok(())
    }

    /// Replace a row's tags; new custom tags are remembered.
    pub fn set_row_tags(&mut self, row_id: &str, input: &[String]) -> Result<()> {
        self.ensure_writable()?;
        let index = self.row_index(row_id)?;
        if !tags::set_row_tags(&mut self.sheet.rows[index], input) {
            return Ok(());
        }
        let row = &self.sheet.rows[index];
        let detail = format!(
            "{}: {}",
            row_display_name(row, &self.sheet.columns),
            row.clean_tags().join(", ")
        );
        self.remember_tags(input)?;
        self.log_event("Updated tags", detail)?;
        self.touch()?;
        self.save_sheet()
    }

    /// Add `input` tags to every listed row. Returns how many rows changed.
    pub fn add_tags_to_rows(&mut self, row_ids: &[String], input: &[String]) -> Result<usize> {
        self.ensure_writable()?;
        let ids: HashSet<&str> = row_ids.iter().map(String::as_str).collect();
        let changed = self
            .sheet
            .rows
            .iter_mut()
            .filter(|r| ids.contains(r.id.as_str()))
            .map(|r| tags::add_tags(r, input))
            .filter(|changed| *changed)
            .count();
        self.remember_tags(input)?;
        if changed > 0 {
            self.log_event("Added tags", format!("{} on {changed} rows", input.join(", ")))?;
            self.touch()?;
            self.save_sheet()?;
        }
        Ok(changed)
    }

    pub fn remove_tags_from_rows(&mut self, row_ids: &[String], input: &[String]) -> Result<usize> {
        self.ensure_writable()?;
        let ids: HashSet<&str> = row_ids.iter().map(String::as_str).collect();
        let changed = self
            .sheet
            .rows
            .iter_mut()
            .filter(|r| ids.contains(r.id.as_str()))
            .map(|r| tags::remove_tags(r, input))
            .filter(|changed| *changed)
            .count();
        if changed > 0 {
            self.log_event("Removed tags", format!("{} from {changed} rows", input.join(", ")))?;
            self.touch()?;
            self.save_sheet()?;
        }
        Ok(changed)
    }

    /// Flip the "For Sale" tag; returns whether the row is now for sale.
    pub fn toggle_for_sale(&mut self, row_id: &str) -> Result<bool> {
        self.ensure_writable()?;
        let index = self.row_index(row_id)?;
        let for_sale = tags::toggle_for_sale(&mut self.sheet.rows[index]);
        let name = row_display_name(&self.sheet.rows[index], &self.sheet.columns);
        let action = if for_sale { "Marked for sale" } else { "Unmarked for sale" };
        self.log_event(action, name)?;
        self.touch()?;
        self.save_sheet()?;
        Ok(for_sale)
    }

    /// Rename a tag in the custom list and on every row of the loaded sheet.
    pub fn rename_tag(&mut self, old: &str, new: &str) -> Result<usize> {
        self.ensure_writable()?;
        let touched = tags::rename_tag(&mut self.custom_tags, &mut self.sheet.rows, old, new);
        self.save_custom_tags()?;
        self.log_event("Renamed tag", format!("{old} -> {}", new.trim()))?;
        if touched > 0 {
            self.touch()?;
            self.save_sheet()?;
        }
        Ok(touched)
    }

    pub fn delete_tag(&mut self, tag: &str) -> Result<usize> {
        self.ensure_writable()?;
        let touched = tags::delete_tag(&mut self.custom_tags, &mut self.sheet.rows, tag);
        self.save_custom_tags()?;
        self.log_event("Deleted tag", tag)?;
        if touched > 0 {
            self.touch()?;
            self.save_sheet()?;
        }
        Ok(touched)
    }

    /// Suggestions: base tags, custom tags and every tag in use.
    pub fn all_tags(&self) -> Vec<String> {
        tags::all_tags(&self.custom_tags, &self.sheet.rows)
    }

    fn remember_tags(&mut self, input: &[String]) -> Result<()> {
        if tags::persist_new_tags(&mut self.custom_tags, input) {
            self.save_custom_tags()?;
        }
        Ok(())
    }
}
