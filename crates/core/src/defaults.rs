//! Default column sets and fresh-start state per mode.

use crate::column::{Column, ColumnType};
use crate::constants::{CONDITION_OPTIONS, SIZE_OPTIONS};
use crate::mode::AppMode;

#[must_use]
pub fn inventory_columns() -> Vec<Column> {
    vec![
        Column::select("Condition", &CONDITION_OPTIONS),
        Column::new("Name", ColumnType::Text),
        Column::select("Size", &SIZE_OPTIONS),
        Column::select("Type", &[]),
        Column::select("Fandom", &[]),
        Column::new("Price", ColumnType::Number),
        Column::new("Preview", ColumnType::Photo),
        Column::new("Notes", ColumnType::Notes),
    ]
}

#[must_use]
pub fn wishlist_columns() -> Vec<Column> {
    vec![
        Column::select("Brand", &[]),
        Column::new("Name", ColumnType::Text),
        Column::select("Type", &[]),
        Column::select("Fandom", &[]),
        Column::select("Size", &SIZE_OPTIONS),
        Column::new("Preview", ColumnType::Photo),
        Column::new("Notes", ColumnType::Notes),
    ]
}

#[must_use]
pub fn columns_for(mode: AppMode) -> Vec<Column> {
    match mode {
        AppMode::Inventory => inventory_columns(),
        AppMode::Wishlist => wishlist_columns(),
    }
}
