use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_TAB_NAME, LEGACY_TAB_NAMES};
use crate::id::create_id;
use crate::json_utils::null_as_default;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tab {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

impl Tab {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { id: create_id(), name: name.into() }
    }
}

/// Tab list of one mode plus the active tab pointer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabsState {
    #[serde(default, deserialize_with = "null_as_default")]
    pub tabs: Vec<Tab>,
    #[serde(default)]
    pub active_tab_id: Option<String>,
}

impl TabsState {
    /// A single "Shirts" tab, active.
    #[must_use]
    pub fn with_default_tab() -> Self {
        let tab = Tab::new(DEFAULT_TAB_NAME);
        Self { active_tab_id: Some(tab.id.clone()), tabs: vec![tab] }
    }

    /// Keep tabs ordered by name, ignoring case.
    pub fn sort(&mut self) {
        self.tabs.sort_by(|a, b| {
            a.name.to_lowercase().cmp(&b.name.to_lowercase()).then_with(|| a.name.cmp(&b.name))
        });
    }

    pub fn find(&self, tab_id: &str) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == tab_id)
    }

    pub fn contains(&self, tab_id: &str) -> bool {
        self.find(tab_id).is_some()
    }

    pub fn active_tab(&self) -> Option<&Tab> {
        self.active_tab_id.as_deref().and_then(|id| self.find(id))
    }

    /// Repair the active pointer so exactly one existing tab is active.
    ///
    /// Returns true when the pointer had to move.
    pub fn ensure_active(&mut self) -> bool {
        if self.active_tab().is_some() {
            return false;
        }
        let next = self.tabs.first().map(|t| t.id.clone());
        let changed = next != self.active_tab_id;
        self.active_tab_id = next;
        changed
    }

    /// True for the untouched seed set shipped by very old versions.
    pub fn is_legacy_seed(&self) -> bool {
        self.tabs.len() == LEGACY_TAB_NAMES.len()
            && LEGACY_TAB_NAMES.iter().all(|name| self.tabs.iter().any(|t| t.name == *name))
    }
}
