use shirt_tracker_core::reconcile::reconcile_sheet;
use shirt_tracker_core::sort::sort_sheet;
use shirt_tracker_core::{SheetState, Tab};

use super::Workspace;
use crate::error::{Result, ServiceError};

const FALLBACK_TAB_NAME: &str = "New Tab";

impl Workspace {
    /// Create a tab seeded from the current schema and make it active.
    ///
    /// Returns the new tab's id.
    pub fn add_tab(&mut self, name: &str) -> Result<String> {
        self.ensure_writable()?;
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::InvalidInput("tab name is empty".into()));
        }
        self.save_sheet()?;
        let tab = Tab::new(name);
        let tab_id = tab.id.clone();
        let seed = self.blank_sheet_from_current();
        self.storage.save_sheet(self.mode, Some(&tab_id), &seed)?;

        self.tabs.tabs.push(tab);
        self.tabs.sort();
        self.tabs.active_tab_id = Some(tab_id.clone());
        self.save_tabs()?;
        self.log_event("Added tab", name)?;

        self.load_active_sheet()?;
        self.reconcile();
        tracing::info!(tab_id = %tab_id, name, "Added tab");
        Ok(tab_id)
    }

    pub fn rename_tab(&mut self, tab_id: &str, name: &str) -> Result<()> {
        self.ensure_writable()?;
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::InvalidInput("tab name is empty".into()));
        }
        let tab = self
            .tabs
            .tabs
            .iter_mut()
            .find(|t| t.id == tab_id)
            .ok_or_else(|| ServiceError::NotFound(format!("tab {tab_id}")))?;
        let previous = std::mem::replace(&mut tab.name, name.to_owned());
        self.tabs.sort();
        self.save_tabs()?;
        self.log_event("Renamed tab", format!("{previous} -> {name}"))
    }

    /// Remove a tab and its stored sheet; the first remaining tab becomes
    /// active. Deleting the last tab leaves a fresh "New Tab".
    pub fn delete_tab(&mut self, tab_id: &str) -> Result<()> {
        self.ensure_writable()?;
        let position = self
            .tabs
            .tabs
            .iter()
            .position(|t| t.id == tab_id)
            .ok_or_else(|| ServiceError::NotFound(format!("tab {tab_id}")))?;
        let removed = self.tabs.tabs.remove(position);
        self.tabs.sort();
        if self.tabs.tabs.is_empty() {
            self.tabs.tabs.push(Tab::new(FALLBACK_TAB_NAME));
        }
        self.tabs.active_tab_id = self.tabs.tabs.first().map(|t| t.id.clone());
        self.save_tabs()?;
        self.log_event("Deleted tab", removed.name.as_str())?;
        self.storage.remove_sheet(self.mode, &removed.id)?;
        self.schema.overrides.forget_tab(&removed.id);
        self.save_schema()?;

        let active = self.tabs.active_tab_id.clone();
        if self.storage.load_sheet(self.mode, active.as_deref())?.is_none() {
            let seed = self.blank_sheet_from_current();
            self.storage.save_sheet(self.mode, active.as_deref(), &seed)?;
        }
        self.load_active_sheet()?;
        self.reconcile();
        tracing::info!(tab_id, "Deleted tab");
        Ok(())
    }

    /// Save the current sheet, then load and reconcile `tab_id`.
    pub fn switch_tab(&mut self, tab_id: &str) -> Result<()> {
        if !self.tabs.contains(tab_id) {
            return Err(ServiceError::NotFound(format!("tab {tab_id}")));
        }
        if self.active_tab_id() == Some(tab_id) {
            return Ok(());
        }
        if !self.sheet.read_only {
            self.save_sheet()?;
        }
        self.tabs.active_tab_id = Some(tab_id.to_owned());
        self.save_tabs()?;
        if self.storage.load_sheet(self.mode, Some(tab_id))?.is_none() {
            let seed = self.blank_sheet_from_current();
            self.storage.save_sheet(self.mode, Some(tab_id), &seed)?;
        }
        self.load_active_sheet()?;
        self.reconcile();
        Ok(())
    }

    /// Find a tab by id, or by case-insensitive name.
    pub fn resolve_tab(&self, id_or_name: &str) -> Option<&Tab> {
        let wanted = id_or_name.trim();
        self.tabs.find(wanted).or_else(|| {
            let lower = wanted.to_lowercase();
            self.tabs.tabs.iter().find(|t| t.name.to_lowercase() == lower)
        })
    }

    /// Reconciled copy of a tab's sheet without switching to it or saving.
    pub fn tab_sheet(&self, tab_id: &str) -> Result<SheetState> {
        if !self.tabs.contains(tab_id) {
            return Err(ServiceError::NotFound(format!("tab {tab_id}")));
        }
        if self.active_tab_id() == Some(tab_id) {
            return Ok(self.sheet.clone());
        }
        let mut sheet = self
            .storage
            .load_sheet(self.mode, Some(tab_id))?
            .unwrap_or_else(|| self.blank_sheet_from_current());
        if sheet.columns.is_empty() {
            sheet.columns = self.base_columns();
        }
        sheet.ensure_has_row();
        let mut schema = self.schema.clone();
        reconcile_sheet(&mut sheet, &mut schema, self.mode, Some(tab_id));
        sort_sheet(&mut sheet);
        Ok(sheet)
    }
}
