//! Row ordering for the sheet view.

use std::cmp::Ordering;

use crate::column::{Column, ColumnType, name_column};
use crate::currency::parse_leading_float;
use crate::row::Row;
use crate::sheet::{SheetState, SortDirection, SortState};

/// Column that drives ordering: the explicit sort column, else Name.
fn sort_target<'a>(columns: &'a [Column], sort: &SortState) -> Option<(&'a Column, bool)> {
    let explicit = sort.column_id.as_deref().and_then(|id| columns.iter().find(|c| c.id == id));
    match explicit {
        Some(column) => Some((column, sort.direction == SortDirection::Desc)),
        None => name_column(columns).map(|c| (c, false)),
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

fn compare_numeric(a: &str, b: &str) -> Ordering {
    match (parse_leading_float(a), parse_leading_float(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Compare two cell values; empties always sort last regardless of direction.
fn compare_values(a: &str, b: &str, numeric: bool, descending: bool) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        (false, false) => {},
    }
    if numeric {
        // unparsable values stay after parsable ones in both directions
        match (parse_leading_float(a), parse_leading_float(b)) {
            (Some(_), None) => return Ordering::Less,
            (None, Some(_)) => return Ordering::Greater,
            _ => {},
        }
        let ord = compare_numeric(a, b);
        return if descending { ord.reverse() } else { ord };
    }
    let ord = compare_text(a, b);
    if descending { ord.reverse() } else { ord }
}

/// Stable sort of `rows` by `sort` over `columns`. No-op without a target.
pub fn sort_rows(rows: &mut [Row], columns: &[Column], sort: &SortState) {
    let Some((column, descending)) = sort_target(columns, sort) else {
        return;
    };
    let numeric = column.column_type == ColumnType::Number;
    let id = column.id.as_str();
    rows.sort_by(|a, b| compare_values(a.cell(id), b.cell(id), numeric, descending));
}

/// Sort the sheet's rows in place by its own sort state.
pub fn sort_sheet(state: &mut SheetState) {
    let SheetState { rows, columns, sort, .. } = state;
    sort_rows(rows, columns, sort);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(values: &[&str], column_type: ColumnType, label: &str) -> SheetState {
        let mut state = SheetState::blank_with_columns(&[Column::new(label, column_type)]);
        state.rows.clear();
        let id = state.columns[0].id.clone();
        for v in values {
            let mut row = Row::blank();
            row.set_cell(&id, *v);
            state.rows.push(row);
        }
        state
    }

    fn values(state: &SheetState) -> Vec<&str> {
        let id = &state.columns[0].id;
        state.rows.iter().map(|r| r.cell(id)).collect()
    }

    #[test]
    fn test_defaults_to_name_ascending() {
        let mut state = sheet(&["banana", "", "Apple"], ColumnType::Text, "Name");
        state.sort.direction = SortDirection::Desc;
        sort_sheet(&mut state);
        assert_eq!(values(&state), vec!["Apple", "banana", ""]);
    }

    #[test]
    fn test_no_target_leaves_order() {
        let mut state = sheet(&["b", "a"], ColumnType::Text, "Notes");
        sort_sheet(&mut state);
        assert_eq!(values(&state), vec!["b", "a"]);
    }

    #[test]
    fn test_numeric_desc_keeps_empty_and_unparsable_last() {
        let mut state = sheet(&["5", "", "n/a", "20", "3.5"], ColumnType::Number, "Price");
        state.sort = SortState {
            column_id: Some(state.columns[0].id.clone()),
            direction: SortDirection::Desc,
        };
        sort_sheet(&mut state);
        assert_eq!(values(&state), vec!["20", "5", "3.5", "n/a", ""]);
    }

    #[test]
    fn test_numeric_asc() {
        let mut state = sheet(&["10", "9", "100"], ColumnType::Number, "Price");
        state.sort.column_id = Some(state.columns[0].id.clone());
        sort_sheet(&mut state);
        assert_eq!(values(&state), vec!["9", "10", "100"]);
    }
}
