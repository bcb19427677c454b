use shirt_tracker_core::column::ColumnType;
use shirt_tracker_core::filter::filter_rows;
use shirt_tracker_core::reconcile::retarget_select_values;
use shirt_tracker_core::sort::sort_sheet;
use shirt_tracker_core::stats::{FooterStats, footer_stats};
use shirt_tracker_core::{Column, FilterState, FilterTarget, OverrideKind, Row, SortDirection, SortState};

use super::Workspace;
use crate::error::{Result, ServiceError};

/// Options only make sense on select columns; blanks are dropped.
fn clean_options(column_type: ColumnType, options: &[String]) -> Vec<String> {
    if column_type != ColumnType::Select {
        return Vec::new();
    }
    options.iter().map(|o| o.trim()).filter(|o| !o.is_empty()).map(str::to_owned).collect()
}

impl Workspace {
    fn column_index(&self, column_id: &str) -> Result<usize> {
        self.sheet
            .columns
            .iter()
            .position(|c| c.id == column_id)
            .ok_or_else(|| ServiceError::NotFound(format!("column {column_id}")))
    }

    /// Find a column by id, or by case-insensitive label.
    pub fn resolve_column(&self, id_or_label: &str) -> Option<&Column> {
        let wanted = id_or_label.trim();
        self.sheet
            .column(wanted)
            .or_else(|| self.sheet.column_by_label(&wanted.to_lowercase()))
    }

    /// Append a column to the sheet and the global schema; returns its id.
    pub fn add_column(&mut self, name: &str, column_type: ColumnType, options: &[String]) -> Result<String> {
        self.ensure_writable()?;
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::InvalidInput("column name is empty".into()));
        }
        let mut column = Column::new(name, column_type);
        column.options = clean_options(column_type, options);
        let id = column.id.clone();
        self.sheet.columns.push(column);
        self.sheet.ensure_row_cells();
        self.log_event("Added column", name)?;
        self.capture_tab_options();
        self.sync_global_columns()?;
        self.save_sheet()?;
        Ok(id)
    }

    /// Change a column's name, type and options.
    ///
    /// Select values are snapped to the new option spelling; Fandom, Type
    /// and Brand options are stored for the active tab only.
    pub fn edit_column(
        &mut self,
        column_id: &str,
        name: &str,
        column_type: ColumnType,
        options: &[String],
    ) -> Result<()> {
        self.ensure_writable()?;
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::InvalidInput("column name is empty".into()));
        }
        let index = self.column_index(column_id)?;
        let options = clean_options(column_type, options);
        let column = &mut self.sheet.columns[index];
        let previous_options = std::mem::replace(&mut column.options, options.clone());
        column.name = name.to_owned();
        column.column_type = column_type;
        let kind = OverrideKind::from_label_key(&column.label_key());

        if column_type == ColumnType::Select {
            retarget_select_values(&mut self.sheet.rows, column_id, &previous_options, &options);
        }
        if let (Some(kind), Some(tab_id)) = (kind, self.tabs.active_tab_id.clone()) {
            self.schema.overrides.set_options(kind, &tab_id, options);
        }
        self.log_event("Edited column", name)?;
        self.sheet.ensure_row_cells();
        self.sync_global_columns()?;
        self.save_sheet()
    }

    pub fn rename_column(&mut self, column_id: &str, name: &str) -> Result<()> {
        let column = self.sheet.columns[self.column_index(column_id)?].clone();
        self.edit_column(column_id, name, column.column_type, &column.options)
    }

    pub fn set_column_options(&mut self, column_id: &str, options: &[String]) -> Result<()> {
        let column = self.sheet.columns[self.column_index(column_id)?].clone();
        self.edit_column(column_id, &column.name, ColumnType::Select, options)
    }

    /// Remove a column, its cells, width, sort/filter and hidden flags.
    pub fn delete_column(&mut self, column_id: &str) -> Result<()> {
        self.ensure_writable()?;
        let index = self.column_index(column_id)?;
        let label = self.sheet.columns[index].label().to_owned();
        self.sheet.remove_column(column_id);
        self.schema.overrides.forget_column(column_id);
        self.log_event("Deleted column", label)?;
        self.sync_global_columns()?;
        self.save_sheet()
    }

    /// Move `from_id` to the position currently held by `to_id`.
    pub fn move_column(&mut self, from_id: &str, to_id: &str) -> Result<()> {
        self.ensure_writable()?;
        if from_id == to_id {
            return Ok(());
        }
        let from = self.column_index(from_id)?;
        let to = self.column_index(to_id)?;
        let moved = self.sheet.columns.remove(from);
        self.sheet.columns.insert(to, moved);
        self.sync_global_columns()?;
        self.save_sheet()
    }

    /// Hide or show a column on the active tab; returns the new hidden state.
    pub fn toggle_column_hidden(&mut self, column_id: &str) -> Result<bool> {
        self.column_index(column_id)?;
        let Some(tab_id) = self.tabs.active_tab_id.clone() else {
            return Err(ServiceError::NotFound("active tab".into()));
        };
        let hidden = self.schema.overrides.toggle_hidden(&tab_id, column_id);
        self.save_schema()?;
        Ok(hidden)
    }

    /// Columns shown on the active tab, in order.
    pub fn visible_columns(&self) -> Vec<&Column> {
        let hidden = self.hidden_columns();
        self.sheet.columns.iter().filter(|c| !hidden.contains(&c.id)).collect()
    }

    /// Sort by a column, or back to the Name default with `None`.
    pub fn set_sort(&mut self, column_id: Option<&str>, direction: SortDirection) -> Result<()> {
        if let Some(id) = column_id {
            self.column_index(id)?;
        }
        self.sheet.sort = SortState { column_id: column_id.map(str::to_owned), direction };
        sort_sheet(&mut self.sheet);
        if self.sheet.read_only {
            return Ok(());
        }
        self.save_sheet()
    }

    pub fn set_filter(&mut self, target: FilterTarget, query: &str) -> Result<()> {
        if let FilterTarget::Column(id) = &target {
            self.column_index(id)?;
        }
        self.sheet.filter = FilterState { column_id: target, query: query.to_owned() };
        if self.sheet.read_only {
            return Ok(());
        }
        self.save_sheet()
    }

    /// Rows matching the sheet's current filter, in display order.
    pub fn filtered_rows(&self) -> Vec<&Row> {
        filter_rows(&self.sheet, &self.sheet.filter)
    }

    /// Footer figures for the filtered rows.
    pub fn footer_stats(&self) -> FooterStats {
        footer_stats(&self.sheet, &self.filtered_rows(), self.hidden_columns())
    }
}
