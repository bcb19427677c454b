use std::collections::{BTreeMap, HashSet};
use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::column::{Column, find_by_label};
use crate::json_utils::null_as_default;
use crate::row::Row;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Desc,
    #[default]
    #[serde(other)]
    Asc,
}

/// Explicit sort; `column_id: None` means "sort by the Name column ascending".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortState {
    #[serde(default)]
    pub column_id: Option<String>,
    #[serde(default)]
    pub direction: SortDirection,
}

/// What the filter query is matched against
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FilterTarget {
    /// Every column plus tags
    #[default]
    All,
    Tags,
    /// "yes" / "no" against the For Sale tag
    ForSale,
    Column(String),
}

impl From<String> for FilterTarget {
    fn from(value: String) -> Self {
        match value.as_str() {
            "" | "all" => Self::All,
            "tags" => Self::Tags,
            "forSale" => Self::ForSale,
            _ => Self::Column(value),
        }
    }
}

impl From<FilterTarget> for String {
    fn from(value: FilterTarget) -> Self {
        value.to_string()
    }
}

impl Display for FilterTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::All => f.write_str("all"),
            Self::Tags => f.write_str("tags"),
            Self::ForSale => f.write_str("forSale"),
            Self::Column(id) => f.write_str(id),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    #[serde(default, deserialize_with = "null_as_default")]
    pub column_id: FilterTarget,
    #[serde(default, deserialize_with = "null_as_default")]
    pub query: String,
}

/// The persisted state of one tab: its columns, rows and view settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetState {
    #[serde(default, deserialize_with = "null_as_default")]
    pub columns: Vec<Column>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rows: Vec<Row>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub column_widths: BTreeMap<String, Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sort: SortState,
    #[serde(default, deserialize_with = "null_as_default")]
    pub filter: FilterState,
    #[serde(default)]
    pub read_only: bool,
}

impl Default for SheetState {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            rows: vec![Row::blank()],
            column_widths: BTreeMap::new(),
            sort: SortState::default(),
            filter: FilterState::default(),
            read_only: false,
        }
    }
}

impl SheetState {
    /// A fresh sheet over a copy of `columns` with one blank row.
    #[must_use]
    pub fn blank_with_columns(columns: &[Column]) -> Self {
        let mut state = Self { columns: columns.to_vec(), ..Self::default() };
        state.ensure_row_cells();
        state
    }

    pub fn column(&self, column_id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == column_id)
    }

    pub fn column_by_label(&self, key: &str) -> Option<&Column> {
        find_by_label(&self.columns, key)
    }

    pub fn row(&self, row_id: &str) -> Option<&Row> {
        self.rows.iter().find(|r| r.id == row_id)
    }

    pub fn row_mut(&mut self, row_id: &str) -> Option<&mut Row> {
        self.rows.iter_mut().find(|r| r.id == row_id)
    }

    /// Backfill row ids and an empty string for every column a row lacks.
    pub fn ensure_row_cells(&mut self) -> bool {
        let mut changed = false;
        for row in &mut self.rows {
            if row.id.is_empty() {
                row.id = crate::id::create_id();
                changed = true;
            }
            for column in &self.columns {
                if !row.cells.contains_key(&column.id) {
                    row.cells.insert(column.id.clone(), String::new());
                    changed = true;
                }
            }
        }
        changed
    }

    /// Drop cells of vanished columns and reset sort/filter pointing at them.
    pub fn prune_row_cells(&mut self) -> bool {
        let ids: HashSet<&str> = self.columns.iter().map(|c| c.id.as_str()).collect();
        let mut changed = false;
        for row in &mut self.rows {
            let before = row.cells.len();
            row.cells.retain(|k, _| ids.contains(k.as_str()));
            changed |= row.cells.len() != before;
        }
        if let Some(sort_id) = &self.sort.column_id {
            if !ids.contains(sort_id.as_str()) {
                self.sort = SortState::default();
                changed = true;
            }
        }
        if let FilterTarget::Column(filter_id) = &self.filter.column_id {
            if !ids.contains(filter_id.as_str()) {
                self.filter.column_id = FilterTarget::All;
                changed = true;
            }
        }
        changed
    }

    /// Remove a column with its cells, width and any sort/filter on it.
    pub fn remove_column(&mut self, column_id: &str) -> bool {
        let before = self.columns.len();
        self.columns.retain(|c| c.id != column_id);
        if self.columns.len() == before {
            return false;
        }
        for row in &mut self.rows {
            row.cells.remove(column_id);
        }
        if self.sort.column_id.as_deref() == Some(column_id) {
            self.sort = SortState::default();
        }
        if self.filter.column_id == FilterTarget::Column(column_id.to_owned()) {
            self.filter.column_id = FilterTarget::All;
        }
        self.column_widths.remove(column_id);
        true
    }

    pub fn remove_column_by_label(&mut self, key: &str) -> bool {
        match self.column_by_label(key).map(|c| c.id.clone()) {
            Some(id) => self.remove_column(&id),
            None => false,
        }
    }

    pub fn reset_filter(&mut self) -> bool {
        if self.filter == FilterState::default() {
            return false;
        }
        self.filter = FilterState::default();
        true
    }

    /// A sheet never persists with zero rows.
    pub fn ensure_has_row(&mut self) -> bool {
        if !self.rows.is_empty() {
            return false;
        }
        self.rows.push(Row::blank());
        self.ensure_row_cells();
        true
    }

    /// Whether any row carries data (used to tell empty tabs apart).
    pub fn has_data(&self) -> bool {
        self.rows.iter().any(Row::has_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnType;

    fn sheet() -> SheetState {
        SheetState::blank_with_columns(&[
            Column::new("Name", ColumnType::Text),
            Column::new("Price", ColumnType::Number),
        ])
    }

    #[test]
    fn test_sort_direction_serde() {
        let sort: SortState = serde_json::from_str(r#"{"columnId":"c1","direction":"desc"}"#).unwrap();
        assert_eq!(sort.direction, SortDirection::Desc);
        let sort: SortState = serde_json::from_str(r#"{"columnId":null,"direction":"sideways"}"#).unwrap();
        assert_eq!(sort.direction, SortDirection::Asc);

        let state = sheet();
        let json = serde_json::to_string(&state).unwrap();
        let back: SheetState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_blank_sheet_cells_cover_columns() {
        let state = sheet();
        assert_eq!(state.rows.len(), 1);
        assert_eq!(state.rows[0].cells.len(), 2);
    }

    #[test]
    fn test_prune_drops_unknown_cells_and_resets_view() {
        let mut state = sheet();
        state.rows[0].set_cell("gone", "x");
        state.sort.column_id = Some("gone".into());
        state.filter.column_id = FilterTarget::Column("gone".into());
        assert!(state.prune_row_cells());
        assert!(!state.rows[0].cells.contains_key("gone"));
        assert_eq!(state.sort, SortState::default());
        assert_eq!(state.filter.column_id, FilterTarget::All);
        assert!(!state.prune_row_cells());
    }

    #[test]
    fn test_prune_keeps_special_filters() {
        let mut state = sheet();
        state.filter.column_id = FilterTarget::ForSale;
        state.prune_row_cells();
        assert_eq!(state.filter.column_id, FilterTarget::ForSale);
    }

    #[test]
    fn test_remove_column_clears_width() {
        let mut state = sheet();
        let price = state.columns[1].id.clone();
        state.column_widths.insert(price.clone(), Value::from(120));
        assert!(state.remove_column(&price));
        assert!(state.column_widths.is_empty());
        assert!(!state.remove_column(&price));
    }

    #[test]
    fn test_filter_target_wire_format() {
        let state: SheetState = serde_json::from_str(
            r#"{"columns":[],"rows":[],"filter":{"columnId":"forSale","query":"yes"},"sort":{"columnId":null,"direction":"desc"}}"#,
        )
        .unwrap();
        assert_eq!(state.filter.column_id, FilterTarget::ForSale);
        assert_eq!(state.sort.direction, SortDirection::Desc);
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["filter"]["columnId"], "forSale");
        assert_eq!(json["readOnly"], false);
    }
}
