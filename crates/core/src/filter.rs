//! Row filtering for the sheet view.

use crate::column::{Column, ColumnType};
use crate::row::Row;
use crate::sheet::{FilterState, FilterTarget, SheetState};

const PHOTO_TRUTHY: [&str; 4] = ["yes", "true", "photo", "1"];
const PHOTO_FALSY: [&str; 4] = ["no", "false", "none", "0"];

/// Whether `row` matches a lowercase query in `column`.
///
/// Photo columns only understand the yes/no vocabulary; any other query never
/// matches them.
pub fn matches_column(row: &Row, column: &Column, query_lower: &str) -> bool {
    let value = row.cell(&column.id);
    if column.column_type == ColumnType::Photo {
        let has_photo = !value.is_empty();
        if PHOTO_TRUTHY.contains(&query_lower) {
            return has_photo;
        }
        if PHOTO_FALSY.contains(&query_lower) {
            return !has_photo;
        }
        return false;
    }
    value.to_lowercase().contains(query_lower)
}

pub fn matches_tags(row: &Row, query_lower: &str) -> bool {
    row.clean_tags().iter().any(|t| t.to_lowercase().contains(query_lower))
}

/// Rows visible under `filter`, in their current order.
pub fn filter_rows<'a>(state: &'a SheetState, filter: &FilterState) -> Vec<&'a Row> {
    let query = filter.query.trim().to_lowercase();
    if query.is_empty() {
        return state.rows.iter().collect();
    }
    match &filter.column_id {
        FilterTarget::All => state
            .rows
            .iter()
            .filter(|row| {
                state.columns.iter().any(|c| matches_column(row, c, &query))
                    || matches_tags(row, &query)
            })
            .collect(),
        FilterTarget::Tags => state.rows.iter().filter(|row| matches_tags(row, &query)).collect(),
        FilterTarget::ForSale => match query.as_str() {
            "yes" => state.rows.iter().filter(|row| row.is_for_sale()).collect(),
            "no" => state.rows.iter().filter(|row| !row.is_for_sale()).collect(),
            _ => state.rows.iter().collect(),
        },
        FilterTarget::Column(id) => match state.column(id) {
            Some(column) => {
                state.rows.iter().filter(|row| matches_column(row, column, &query)).collect()
            },
            None => state.rows.iter().collect(),
        },
    }
}

/// Rows visible under the sheet's own stored filter.
pub fn visible_rows(state: &SheetState) -> Vec<&Row> {
    filter_rows(state, &state.filter)
}
