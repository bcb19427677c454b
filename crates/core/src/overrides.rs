use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::column::Column;
use crate::constants::labels;
use crate::json_utils::null_as_default;

/// Columns whose dropdown options are kept per tab instead of globally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideKind {
    Fandom,
    Type,
    Brand,
}

impl OverrideKind {
    pub const ALL: [Self; 3] = [Self::Fandom, Self::Type, Self::Brand];

    pub fn label_key(&self) -> &'static str {
        match self {
            Self::Fandom => labels::FANDOM,
            Self::Type => labels::TYPE,
            Self::Brand => labels::BRAND,
        }
    }

    pub fn from_label_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.label_key() == key)
    }
}

type ByTab = BTreeMap<String, Vec<String>>;

/// Per-tab layers over the global schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnOverrides {
    #[serde(default, deserialize_with = "null_as_default")]
    pub fandom_options_by_tab: ByTab,
    #[serde(default, deserialize_with = "null_as_default")]
    pub type_options_by_tab: ByTab,
    #[serde(default, deserialize_with = "null_as_default")]
    pub hidden_columns_by_tab: ByTab,
    #[serde(default, deserialize_with = "null_as_default")]
    pub brand_options_by_tab: ByTab,
}

impl ColumnOverrides {
    fn options_map(&self, kind: OverrideKind) -> &ByTab {
        match kind {
            OverrideKind::Fandom => &self.fandom_options_by_tab,
            OverrideKind::Type => &self.type_options_by_tab,
            OverrideKind::Brand => &self.brand_options_by_tab,
        }
    }

    fn options_map_mut(&mut self, kind: OverrideKind) -> &mut ByTab {
        match kind {
            OverrideKind::Fandom => &mut self.fandom_options_by_tab,
            OverrideKind::Type => &mut self.type_options_by_tab,
            OverrideKind::Brand => &mut self.brand_options_by_tab,
        }
    }

    /// Options for `kind` on `tab_id`; tabs without an override get none.
    pub fn options(&self, kind: OverrideKind, tab_id: &str) -> Vec<String> {
        self.options_map(kind).get(tab_id).cloned().unwrap_or_default()
    }

    pub fn set_options(&mut self, kind: OverrideKind, tab_id: &str, options: Vec<String>) {
        self.options_map_mut(kind).insert(tab_id.to_owned(), options);
    }

    /// Append `value` to the tab's options unless present (case-insensitive).
    pub fn add_option(&mut self, kind: OverrideKind, tab_id: &str, value: &str) -> bool {
        let list = self.options_map_mut(kind).entry(tab_id.to_owned()).or_default();
        let wanted = value.to_lowercase();
        if list.iter().any(|o| o.to_lowercase() == wanted) {
            return false;
        }
        list.push(value.to_owned());
        true
    }

    pub fn hidden_columns(&self, tab_id: &str) -> &[String] {
        self.hidden_columns_by_tab.get(tab_id).map_or(&[], Vec::as_slice)
    }

    pub fn is_hidden(&self, tab_id: &str, column_id: &str) -> bool {
        self.hidden_columns(tab_id).iter().any(|c| c == column_id)
    }

    /// Flip a column's hidden flag on one tab; returns the new hidden state.
    pub fn toggle_hidden(&mut self, tab_id: &str, column_id: &str) -> bool {
        let list = self.hidden_columns_by_tab.entry(tab_id.to_owned()).or_default();
        if let Some(pos) = list.iter().position(|c| c == column_id) {
            list.remove(pos);
            false
        } else {
            list.push(column_id.to_owned());
            true
        }
    }

    pub fn forget_tab(&mut self, tab_id: &str) {
        for kind in OverrideKind::ALL {
            self.options_map_mut(kind).remove(tab_id);
        }
        self.hidden_columns_by_tab.remove(tab_id);
    }

    pub fn forget_column(&mut self, column_id: &str) {
        for list in self.hidden_columns_by_tab.values_mut() {
            list.retain(|c| c != column_id);
        }
    }
}

/// The stored column schema of one mode: per-tab overrides plus the
/// canonical global columns (absent until first established).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSchema {
    #[serde(flatten)]
    pub overrides: ColumnOverrides,
    #[serde(default)]
    pub global_columns: Option<Vec<Column>>,
}

impl ColumnSchema {
    pub fn has_stored_columns(&self) -> bool {
        self.global_columns.as_ref().is_some_and(|c| !c.is_empty())
    }
}
