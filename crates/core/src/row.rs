use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::FOR_SALE_TAG;
use crate::id::create_id;
use crate::json_utils::{deserialize_cells, deserialize_string_list, null_as_default};

/// One sheet row: cell values keyed by column id plus free-form tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_cells")]
    pub cells: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "deserialize_string_list")]
    pub tags: Vec<String>,
}

impl Default for Row {
    fn default() -> Self {
        Self::blank()
    }
}

impl Row {
    #[must_use]
    pub fn blank() -> Self {
        Self { id: create_id(), cells: BTreeMap::new(), tags: Vec::new() }
    }

    /// Cell value for `column_id`, empty when missing.
    pub fn cell(&self, column_id: &str) -> &str {
        self.cells.get(column_id).map_or("", String::as_str)
    }

    pub fn set_cell(&mut self, column_id: &str, value: impl Into<String>) {
        self.cells.insert(column_id.to_owned(), value.into());
    }

    /// Tags with blank entries removed.
    pub fn clean_tags(&self) -> Vec<String> {
        self.tags.iter().filter(|t| !t.trim().is_empty()).cloned().collect()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        let wanted = tag.to_lowercase();
        self.tags.iter().any(|t| !t.trim().is_empty() && t.to_lowercase() == wanted)
    }

    pub fn is_for_sale(&self) -> bool {
        self.has_tag(FOR_SALE_TAG)
    }

    /// Whether any cell holds a non-blank value or any tag is set.
    pub fn has_data(&self) -> bool {
        self.cells.values().any(|v| !v.trim().is_empty()) || !self.clean_tags().is_empty()
    }
}
