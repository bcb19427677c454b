//! Request/query types (Deserialize)

use serde::Deserialize;
use shirt_tracker_core::column::label_key;
use shirt_tracker_core::{Column, FilterTarget, SheetState, SortDirection};

/// Max event log entries returned per request.
const MAX_EVENT_LIMIT: usize = 200;

const fn default_event_limit() -> usize {
    50
}

fn find_column<'a>(sheet: &'a SheetState, raw: &str) -> Option<&'a Column> {
    sheet.column(raw).or_else(|| sheet.column_by_label(&label_key(raw)))
}

#[derive(Debug, Default, Deserialize)]
pub struct TabQuery {
    /// Tab id or name; the active tab when absent.
    pub tab: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RowsQuery {
    pub tab: Option<String>,
    /// `all`, `tags`, `forSale`, or a column id/label.
    pub column: Option<String>,
    #[serde(default)]
    pub query: String,
    /// Column id or label to sort by.
    pub sort: Option<String>,
    /// `asc` or `desc`
    pub dir: Option<String>,
}

impl RowsQuery {
    pub fn filter_target(&self, sheet: &SheetState) -> Result<FilterTarget, String> {
        let raw = self.column.as_deref().map(str::trim).unwrap_or_default();
        match raw.to_lowercase().as_str() {
            "" | "all" => Ok(FilterTarget::All),
            "tags" => Ok(FilterTarget::Tags),
            "forsale" | "for-sale" => Ok(FilterTarget::ForSale),
            _ => find_column(sheet, raw)
                .map(|c| FilterTarget::Column(c.id.clone()))
                .ok_or_else(|| format!("unknown column '{raw}'")),
        }
    }

    pub fn direction(&self) -> Result<SortDirection, String> {
        match self.dir.as_deref().map(str::to_lowercase).as_deref() {
            None | Some("" | "asc") => Ok(SortDirection::Asc),
            Some("desc") => Ok(SortDirection::Desc),
            Some(other) => Err(format!("invalid sort direction '{other}'")),
        }
    }

    /// Column id to sort by; `None` keeps the Name default.
    pub fn sort_column(&self, sheet: &SheetState) -> Result<Option<String>, String> {
        let Some(raw) = self.sort.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(None);
        };
        find_column(sheet, raw).map(|c| Some(c.id.clone())).ok_or_else(|| format!("unknown column '{raw}'"))
    }

    pub fn wants_sort(&self) -> bool {
        self.sort.is_some() || self.dir.is_some()
    }
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default = "default_event_limit")]
    pub limit: usize,
}

impl EventsQuery {
    pub fn capped_limit(&self) -> usize {
        self.limit.min(MAX_EVENT_LIMIT)
    }
}
