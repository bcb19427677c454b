use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::labels;
use crate::id::create_id;
use crate::json_utils::{deserialize_string_list, null_as_default};

/// Kind of data a column holds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Dropdown backed by `options`
    Select,
    /// Numeric amount, displayed as currency
    Number,
    Date,
    /// Long free text
    Notes,
    /// Photo reference (`idb:`, `supa:` or `data:`)
    Photo,
    /// Free text; also the fallback for unknown stored types
    #[default]
    #[serde(other)]
    Text,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Select => "select",
            Self::Number => "number",
            Self::Date => "date",
            Self::Notes => "notes",
            Self::Photo => "photo",
        }
    }
}

impl Display for ColumnType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "select" => Ok(Self::Select),
            "number" => Ok(Self::Number),
            "date" => Ok(Self::Date),
            "notes" => Ok(Self::Notes),
            "photo" => Ok(Self::Photo),
            other => Err(format!("Invalid column type: {other}")),
        }
    }
}

/// A sheet column. Identity is `id`; cross-schema matching uses [`Column::label_key`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "type", default)]
    pub column_type: ColumnType,
    #[serde(default, deserialize_with = "deserialize_string_list")]
    pub options: Vec<String>,
}

impl Column {
    #[must_use]
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self { id: create_id(), name: name.into(), column_type, options: Vec::new() }
    }

    #[must_use]
    pub fn select(name: impl Into<String>, options: &[&str]) -> Self {
        Self {
            id: create_id(),
            name: name.into(),
            column_type: ColumnType::Select,
            options: options.iter().map(|o| (*o).to_owned()).collect(),
        }
    }

    /// Display label; unnamed columns read as "Untitled".
    pub fn label(&self) -> &str {
        if self.name.is_empty() { "Untitled" } else { &self.name }
    }

    /// Trimmed lowercase label used to match columns across schemas.
    pub fn label_key(&self) -> String {
        label_key(self.label())
    }

    pub fn has_label(&self, key: &str) -> bool {
        self.label_key() == key
    }

    /// The Name (or legacy "Shirt Name") column drives default sort and row matching.
    pub fn is_name_column(&self) -> bool {
        let key = self.label_key();
        key == labels::NAME || key == labels::SHIRT_NAME
    }

    pub fn is_photo_column(&self) -> bool {
        self.column_type == ColumnType::Photo || self.has_label(labels::PREVIEW)
    }

    pub fn is_price_column(&self) -> bool {
        self.column_type == ColumnType::Number && self.has_label(labels::PRICE)
    }
}

/// Normalize a header or column name into a label key.
pub fn label_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Find the first column whose label key equals `key`.
pub fn find_by_label<'a>(columns: &'a [Column], key: &str) -> Option<&'a Column> {
    columns.iter().find(|c| c.has_label(key))
}

pub fn find_by_label_mut<'a>(columns: &'a mut [Column], key: &str) -> Option<&'a mut Column> {
    columns.iter_mut().find(|c| c.has_label(key))
}

pub fn name_column(columns: &[Column]) -> Option<&Column> {
    columns.iter().find(|c| c.is_name_column())
}
