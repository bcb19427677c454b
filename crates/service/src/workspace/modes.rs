use std::collections::HashMap;

use shirt_tracker_core::column::ColumnType;
use shirt_tracker_core::event_log::row_display_name;
use shirt_tracker_core::{AppMode, OverrideKind, Row};

use super::Workspace;
use crate::error::{Result, ServiceError};

impl Workspace {
    /// Save the current mode and load the other one's tabs, schema and
    /// active sheet.
    pub fn switch_mode(&mut self, mode: AppMode) -> Result<()> {
        if mode == self.mode {
            return Ok(());
        }
        if !self.sheet.read_only {
            self.save_sheet()?;
        }
        self.storage.save_app_mode(mode)?;
        self.reload()?;
        tracing::info!(mode = %mode, tab = self.active_tab_name(), "Switched mode");
        Ok(())
    }

    /// Move a wishlist row into an inventory tab.
    ///
    /// Cells are copied by column label; select values the target column
    /// lacks are added to its options and to that tab's Fandom/Type
    /// overrides. The row then leaves the wishlist.
    pub fn move_row_to_inventory(&mut self, row_id: &str, target_tab_id: &str) -> Result<()> {
        self.ensure_writable()?;
        if self.mode != AppMode::Wishlist {
            return Err(ServiceError::InvalidInput("only wishlist rows can move to inventory".into()));
        }
        let index = self
            .sheet
            .rows
            .iter()
            .position(|r| r.id == row_id)
            .ok_or_else(|| ServiceError::NotFound(format!("row {row_id}")))?;

        let inventory_tabs = self.storage.load_tabs(AppMode::Inventory)?.unwrap_or_default();
        let target_tab = inventory_tabs
            .find(target_tab_id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("inventory tab {target_tab_id}")))?;
        let mut target = self
            .storage
            .load_sheet(AppMode::Inventory, Some(target_tab_id))?
            .filter(|s| !s.columns.is_empty())
            .ok_or_else(|| ServiceError::NotFound(format!("inventory sheet for tab {}", target_tab.name)))?;
        let mut inventory_schema = self.storage.load_schema(AppMode::Inventory)?;

        let source = &self.sheet.rows[index];
        let values: HashMap<String, &str> = self
            .sheet
            .columns
            .iter()
            .filter_map(|c| {
                let value = source.cell(&c.id);
                (!value.is_empty()).then(|| (c.label_key(), value))
            })
            .collect();

        let mut moved = Row::blank();
        moved.tags.clone_from(&source.tags);
        for column in &mut target.columns {
            let key = column.label_key();
            let Some(value) = values.get(&key) else {
                moved.set_cell(&column.id, "");
                continue;
            };
            moved.set_cell(&column.id, *value);
            let trimmed = value.trim();
            if column.column_type != ColumnType::Select || trimmed.is_empty() {
                continue;
            }
            let lower = trimmed.to_lowercase();
            if column.options.iter().any(|o| o.to_lowercase() == lower) {
                continue;
            }
            column.options.push(trimmed.to_owned());
            if let Some(kind @ (OverrideKind::Fandom | OverrideKind::Type)) = OverrideKind::from_label_key(&key) {
                inventory_schema.overrides.set_options(kind, target_tab_id, column.options.clone());
            }
        }
        let name = row_display_name(source, &self.sheet.columns);
        target.rows.push(moved);
        target.ensure_row_cells();
        self.storage.save_sheet(AppMode::Inventory, Some(target_tab_id), &target)?;
        self.storage.save_schema(AppMode::Inventory, &inventory_schema)?;

        self.sheet.rows.remove(index);
        self.sheet.ensure_has_row();
        self.log_event("Moved to inventory", format!("{name} -> {}", target_tab.name))?;
        self.touch()?;
        self.save_sheet()?;
        tracing::info!(row_id, tab = %target_tab.name, "Moved wishlist row to inventory");
        Ok(())
    }
}
