//! Typed accessors over the app's storage keys.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::Value;
use shirt_tracker_core::backup::parse_timestamp;
use shirt_tracker_core::constants::{
    APP_MODE_KEY, CURRENT_USER_KEY, CUSTOM_TAGS_KEY, EVENT_LOG_KEY, PUBLIC_SHARE_ID_KEY,
    PUBLIC_SHARE_VISIBILITY_KEY, SHIRT_UPDATE_DATE_KEY, TAB_LOGOS_KEY, TYPE_ICON_MAP_KEY,
};
use shirt_tracker_core::{AppMode, ColumnSchema, EventLogEntry, ShareVisibility, SheetState, TabsState};

use super::Storage;
use crate::error::Result;

impl Storage {
    /// # Errors
    /// Returns error if the database query fails.
    pub fn load_tabs(&self, mode: AppMode) -> Result<Option<TabsState>> {
        self.get_json(mode.tabs_key())
    }

    /// # Errors
    /// Returns error if the database write fails.
    pub fn save_tabs(&self, mode: AppMode, tabs: &TabsState) -> Result<()> {
        self.set_json(mode.tabs_key(), tabs)
    }

    /// Stored schema of `mode`; empty when nothing is stored yet.
    ///
    /// # Errors
    /// Returns error if the database query fails.
    pub fn load_schema(&self, mode: AppMode) -> Result<ColumnSchema> {
        Ok(self.get_json(mode.columns_key())?.unwrap_or_default())
    }

    /// # Errors
    /// Returns error if the database write fails.
    pub fn save_schema(&self, mode: AppMode, schema: &ColumnSchema) -> Result<()> {
        self.set_json(mode.columns_key(), schema)
    }

    /// # Errors
    /// Returns error if the database query fails.
    pub fn load_sheet(&self, mode: AppMode, tab_id: Option<&str>) -> Result<Option<SheetState>> {
        self.get_json(&mode.sheet_key(tab_id))
    }

    /// # Errors
    /// Returns error if the database write fails.
    pub fn save_sheet(&self, mode: AppMode, tab_id: Option<&str>, sheet: &SheetState) -> Result<()> {
        self.set_json(&mode.sheet_key(tab_id), sheet)
    }

    /// # Errors
    /// Returns error if the database write fails.
    pub fn remove_sheet(&self, mode: AppMode, tab_id: &str) -> Result<bool> {
        self.remove(&mode.sheet_key(Some(tab_id)))
    }

    /// Tab ids that have a stored sheet in `mode`.
    ///
    /// # Errors
    /// Returns error if the database query fails.
    pub fn sheet_tab_ids(&self, mode: AppMode) -> Result<Vec<String>> {
        let prefix = format!("{}:", mode.data_prefix());
        Ok(self
            .keys_with_prefix(&prefix)?
            .into_iter()
            .filter_map(|k| k.strip_prefix(&prefix).map(str::to_owned))
            .collect())
    }

    /// # Errors
    /// Returns error if the database query fails.
    pub fn load_event_log(&self) -> Result<Vec<EventLogEntry>> {
        Ok(self.get_json(EVENT_LOG_KEY)?.unwrap_or_default())
    }

    /// # Errors
    /// Returns error if the database write fails.
    pub fn save_event_log(&self, entries: &[EventLogEntry]) -> Result<()> {
        self.set_json(EVENT_LOG_KEY, entries)
    }

    /// # Errors
    /// Returns error if the database query fails.
    pub fn load_custom_tags(&self) -> Result<Vec<String>> {
        Ok(self.get_json(CUSTOM_TAGS_KEY)?.unwrap_or_default())
    }

    /// # Errors
    /// Returns error if the database write fails.
    pub fn save_custom_tags(&self, tags: &[String]) -> Result<()> {
        self.set_json(CUSTOM_TAGS_KEY, tags)
    }

    /// Last selected mode; unknown values read as inventory.
    ///
    /// # Errors
    /// Returns error if the database query fails.
    pub fn load_app_mode(&self) -> Result<AppMode> {
        Ok(self.get_raw(APP_MODE_KEY)?.and_then(|raw| raw.parse().ok()).unwrap_or_default())
    }

    /// # Errors
    /// Returns error if the database write fails.
    pub fn save_app_mode(&self, mode: AppMode) -> Result<()> {
        self.set_raw(APP_MODE_KEY, mode.as_str())
    }

    /// # Errors
    /// Returns error if the database query fails.
    pub fn current_user(&self) -> Result<Option<String>> {
        Ok(self.get_raw(CURRENT_USER_KEY)?.filter(|u| !u.is_empty()))
    }

    /// # Errors
    /// Returns error if the database write fails.
    pub fn set_current_user(&self, user_id: &str) -> Result<()> {
        self.set_raw(CURRENT_USER_KEY, user_id)
    }

    /// Backup clock value (`shirts-last-sync` and friends).
    ///
    /// # Errors
    /// Returns error if the database query fails.
    pub fn get_timestamp(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self.get_raw(key)?.as_deref().and_then(parse_timestamp))
    }

    /// Stored as epoch milliseconds.
    ///
    /// # Errors
    /// Returns error if the database write fails.
    pub fn set_timestamp(&self, key: &str, at: DateTime<Utc>) -> Result<()> {
        self.set_raw(key, &at.timestamp_millis().to_string())
    }

    /// # Errors
    /// Returns error if the database query fails.
    pub fn public_share_id(&self) -> Result<Option<String>> {
        Ok(self.get_raw(PUBLIC_SHARE_ID_KEY)?.filter(|id| !id.is_empty()))
    }

    /// # Errors
    /// Returns error if the database write fails.
    pub fn set_public_share_id(&self, token: &str) -> Result<()> {
        self.set_raw(PUBLIC_SHARE_ID_KEY, token)
    }

    /// # Errors
    /// Returns error if the database query fails.
    pub fn load_share_visibility(&self) -> Result<ShareVisibility> {
        Ok(self
            .get_json::<ShareVisibility>(PUBLIC_SHARE_VISIBILITY_KEY)?
            .unwrap_or_default()
            .normalized())
    }

    /// # Errors
    /// Returns error if the database write fails.
    pub fn save_share_visibility(&self, visibility: &ShareVisibility) -> Result<()> {
        self.set_json(PUBLIC_SHARE_VISIBILITY_KEY, visibility)
    }

    /// Tab id -> logo reference.
    ///
    /// # Errors
    /// Returns error if the database query fails.
    pub fn load_tab_logos(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.get_json(TAB_LOGOS_KEY)?.unwrap_or_default())
    }

    /// # Errors
    /// Returns error if the database write fails.
    pub fn save_tab_logos(&self, logos: &BTreeMap<String, String>) -> Result<()> {
        self.set_json(TAB_LOGOS_KEY, logos)
    }

    /// # Errors
    /// Returns error if the database query fails.
    pub fn load_type_icon_map(&self) -> Result<BTreeMap<String, Value>> {
        Ok(self.get_json(TYPE_ICON_MAP_KEY)?.unwrap_or_default())
    }

    /// # Errors
    /// Returns error if the database write fails.
    pub fn save_type_icon_map(&self, icons: &BTreeMap<String, Value>) -> Result<()> {
        self.set_json(TYPE_ICON_MAP_KEY, icons)
    }

    /// # Errors
    /// Returns error if the database query fails.
    pub fn shirt_update_date(&self) -> Result<Option<String>> {
        Ok(self.get_raw(SHIRT_UPDATE_DATE_KEY)?.filter(|d| !d.is_empty()))
    }

    /// # Errors
    /// Returns error if the database write fails.
    pub fn set_shirt_update_date(&self, date: &str) -> Result<()> {
        self.set_raw(SHIRT_UPDATE_DATE_KEY, date)
    }
}
