//! Response types (Serialize)

use std::collections::BTreeMap;

use serde::Serialize;
use shirt_tracker_core::stats::footer_stats;
use shirt_tracker_core::{AppMode, ColumnType, Row, SheetState, Tab};

#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct TabsResponse {
    pub mode: AppMode,
    pub active_tab_id: Option<String>,
    pub tabs: Vec<Tab>,
}

#[derive(Debug, Serialize)]
pub struct ColumnView {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct RowView {
    pub id: String,
    /// Visible cells keyed by column id; photo cells hold a displayable URL.
    pub cells: BTreeMap<String, String>,
    pub tags: Vec<String>,
    pub for_sale: bool,
}

#[derive(Debug, Serialize)]
pub struct StatsView {
    pub total_items: usize,
    /// Absent when Price is hidden or the sheet is read-only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SheetResponse {
    pub tab_id: String,
    pub tab_name: String,
    pub read_only: bool,
    pub columns: Vec<ColumnView>,
    pub rows: Vec<RowView>,
    pub stats: StatsView,
}

impl SheetResponse {
    /// Shape `rows` of `sheet` for display, leaving out hidden columns.
    pub fn build(tab: &Tab, sheet: &SheetState, rows: &[&Row], hidden_columns: &[String]) -> Self {
        let columns: Vec<ColumnView> = sheet
            .columns
            .iter()
            .filter(|c| !hidden_columns.contains(&c.id))
            .map(|c| ColumnView {
                id: c.id.clone(),
                name: c.label().to_owned(),
                column_type: c.column_type,
                options: c.options.clone(),
            })
            .collect();
        let row_views = rows
            .iter()
            .map(|row| RowView {
                id: row.id.clone(),
                cells: columns.iter().map(|c| (c.id.clone(), row.cell(&c.id).to_owned())).collect(),
                tags: row.clean_tags(),
                for_sale: row.is_for_sale(),
            })
            .collect();
        let stats = footer_stats(sheet, rows, hidden_columns);
        Self {
            tab_id: tab.id.clone(),
            tab_name: tab.name.clone(),
            read_only: sheet.read_only,
            columns,
            rows: row_views,
            stats: StatsView {
                total_items: stats.total_items,
                total: stats.price.as_ref().map(|p| p.total_display()),
                average: stats.price.as_ref().map(|p| p.average_display()),
            },
        }
    }

    /// Ids of the photo columns in the response.
    pub fn photo_columns(&self) -> Vec<String> {
        self.columns.iter().filter(|c| c.column_type == ColumnType::Photo).map(|c| c.id.clone()).collect()
    }
}
