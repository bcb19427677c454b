//! Schema reconciliation between a tab's stored sheet and its mode's global
//! column schema.
//!
//! Every rule is idempotent and reports whether it changed anything, so
//! callers only persist when needed. [`reconcile_sheet`] runs the full
//! sequence used after a tab switch, a mode switch or a cloud payload.

use std::collections::HashMap;

use crate::column::{Column, ColumnType, find_by_label, find_by_label_mut};
use crate::constants::{CONDITION_OPTIONS, SIZE_OPTIONS, labels};
use crate::mode::AppMode;
use crate::overrides::{ColumnOverrides, ColumnSchema, OverrideKind};
use crate::row::Row;
use crate::sheet::SheetState;

/// What a reconciliation pass touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// The sheet (columns, rows, view state) must be saved.
    pub sheet_changed: bool,
    /// The mode's column schema must be saved.
    pub schema_changed: bool,
}

impl ReconcileReport {
    pub fn any(&self) -> bool {
        self.sheet_changed || self.schema_changed
    }
}

/// Rename legacy "Shirt Name" columns to "Name".
pub fn normalize_name_columns(columns: &mut [Column]) -> bool {
    let mut changed = false;
    for column in columns.iter_mut().filter(|c| c.has_label(labels::SHIRT_NAME)) {
        column.name = "Name".to_owned();
        changed = true;
    }
    changed
}

fn force_options(columns: &mut [Column], key: &str, defaults: &[&str]) -> bool {
    let Some(column) = find_by_label_mut(columns, key) else {
        return false;
    };
    if column.options.iter().map(String::as_str).eq(defaults.iter().copied()) {
        return false;
    }
    column.options = defaults.iter().map(|o| (*o).to_owned()).collect();
    true
}

/// Force every Size column to the fixed size list.
pub fn normalize_size_options(columns: &mut [Column]) -> bool {
    let mut changed = false;
    for column in columns.iter_mut().filter(|c| c.has_label(labels::SIZE)) {
        if !column.options.iter().map(String::as_str).eq(SIZE_OPTIONS.iter().copied()) {
            column.options = SIZE_OPTIONS.iter().map(|o| (*o).to_owned()).collect();
            changed = true;
        }
    }
    changed
}

/// Name and Size normalization for a sheet that is not currently loaded.
pub fn normalize_stored_columns(columns: &mut [Column]) -> bool {
    let renamed = normalize_name_columns(columns);
    normalize_size_options(columns) || renamed
}

/// Fixed dropdowns: Condition and Size in inventory, Size only in wishlist.
pub fn enforce_fixed_dropdown_defaults(columns: &mut [Column], mode: AppMode) -> bool {
    let size = force_options(columns, labels::SIZE, &SIZE_OPTIONS);
    match mode {
        AppMode::Inventory => force_options(columns, labels::CONDITION, &CONDITION_OPTIONS) || size,
        AppMode::Wishlist => size,
    }
}

/// Canonical form of a column list as stored in the global schema: Fandom,
/// Type and Brand are always selects whose options live in per-tab overrides.
#[must_use]
pub fn to_global_columns(columns: &[Column]) -> Vec<Column> {
    columns
        .iter()
        .map(|column| {
            let mut next = column.clone();
            if OverrideKind::from_label_key(&column.label_key()).is_some() {
                next.options.clear();
                next.column_type = ColumnType::Select;
            }
            next
        })
        .collect()
}

fn fandom_column() -> Column {
    Column::select("Fandom", &[])
}

/// Append a Fandom column to a global schema that lacks one.
pub fn ensure_fandom_in_global(globals: &mut Vec<Column>) -> bool {
    if find_by_label(globals, labels::FANDOM).is_some() {
        return false;
    }
    globals.push(fandom_column());
    *globals = to_global_columns(globals);
    true
}

/// Append a Fandom column to a sheet that lacks one, backfilling rows.
pub fn ensure_fandom_in_state(state: &mut SheetState) -> bool {
    if state.column_by_label(labels::FANDOM).is_some() {
        return false;
    }
    let column = fandom_column();
    for row in &mut state.rows {
        row.set_cell(&column.id, "");
    }
    state.columns.push(column);
    true
}

/// Move cells from `previous` column ids to `next` column ids by label key.
///
/// Cells whose column has no label counterpart in `next` are dropped.
pub fn remap_rows_to_columns(rows: &mut [Row], previous: &[Column], next: &[Column]) -> bool {
    let next_ids: HashMap<String, &str> =
        next.iter().map(|c| (c.label_key(), c.id.as_str())).collect();
    let id_map: HashMap<&str, &str> = previous
        .iter()
        .filter_map(|c| next_ids.get(&c.label_key()).map(|next_id| (c.id.as_str(), *next_id)))
        .collect();

    let mut changed = false;
    for row in rows {
        let remapped = row
            .cells
            .iter()
            .filter_map(|(k, v)| id_map.get(k.as_str()).map(|id| ((*id).to_owned(), v.clone())))
            .collect();
        if remapped != row.cells {
            row.cells = remapped;
            changed = true;
        }
    }
    changed
}

/// Drop the Brand column from an inventory sheet and its global schema.
///
/// Returns `(sheet_changed, schema_changed)`.
pub fn remove_brand_column(
    state: &mut SheetState,
    globals: Option<&mut Vec<Column>>,
) -> (bool, bool) {
    let Some(brand_id) = state.column_by_label(labels::BRAND).map(|c| c.id.clone()) else {
        return (false, false);
    };
    state.remove_column(&brand_id);
    let mut schema_changed = false;
    if let Some(globals) = globals {
        let before = globals.len();
        globals.retain(|c| c.id != brand_id);
        schema_changed = globals.len() != before;
    }
    (true, schema_changed)
}

/// Wishlist shape: no Condition or Price, Brand present and first.
///
/// Returns `(sheet_changed, schema_changed)`.
pub fn enforce_wishlist_columns(
    state: &mut SheetState,
    mut globals: Option<&mut Vec<Column>>,
) -> (bool, bool) {
    let mut sheet_changed = false;
    let mut schema_changed = false;
    for key in [labels::CONDITION, labels::PRICE] {
        sheet_changed |= state.remove_column_by_label(key);
        if let Some(globals) = globals.as_deref_mut() {
            if let Some(pos) = globals.iter().position(|c| c.has_label(key)) {
                globals.remove(pos);
                schema_changed = true;
            }
        }
    }

    match state.columns.iter().position(|c| c.has_label(labels::BRAND)) {
        None => {
            let brand = Column::select("Brand", &[]);
            for row in &mut state.rows {
                row.set_cell(&brand.id, "");
            }
            state.columns.insert(0, brand);
            sheet_changed = true;
        },
        Some(0) => {},
        Some(pos) => {
            let brand = state.columns.remove(pos);
            state.columns.insert(0, brand);
            sheet_changed = true;
        },
    }

    if let Some(globals) = globals {
        if let Some(pos) = globals.iter().position(|c| c.has_label(labels::BRAND)) {
            if pos > 0 {
                let brand = globals.remove(pos);
                globals.insert(0, brand);
                schema_changed = true;
            }
        }
    }
    (sheet_changed, schema_changed)
}

/// Load the active tab's Fandom/Type/Brand options from its overrides.
pub fn apply_tab_options(columns: &mut [Column], overrides: &ColumnOverrides, tab_id: &str) -> bool {
    let mut changed = false;
    for kind in OverrideKind::ALL {
        if let Some(column) = find_by_label_mut(columns, kind.label_key()) {
            let options = overrides.options(kind, tab_id);
            if column.options != options {
                column.options = options;
                changed = true;
            }
        }
    }
    changed
}

/// After a select column's options change, snap existing values to the new
/// spelling; values matching a previous option take the option at the same
/// position, anything else is cleared.
pub fn retarget_select_values(
    rows: &mut [Row],
    column_id: &str,
    previous_options: &[String],
    options: &[String],
) -> bool {
    let lower: Vec<String> = options.iter().map(|o| o.trim().to_lowercase()).collect();
    let previous_lower: Vec<String> =
        previous_options.iter().map(|o| o.trim().to_lowercase()).collect();
    let mut changed = false;
    for row in rows {
        let current = row.cell(column_id).trim().to_owned();
        if current.is_empty() {
            continue;
        }
        let key = current.to_lowercase();
        let next = if let Some(i) = lower.iter().position(|o| *o == key) {
            options[i].trim().to_owned()
        } else if let Some(i) = previous_lower.iter().position(|o| *o == key) {
            options.get(i).map(|o| o.trim().to_owned()).unwrap_or_default()
        } else {
            String::new()
        };
        if next != row.cell(column_id) {
            row.set_cell(column_id, next);
            changed = true;
        }
    }
    changed
}

/// Full reconciliation of the loaded sheet against its mode's schema.
///
/// Order matters: normalization first, then the mode's column rules, then
/// adoption of the global schema (remapping cells by label), per-tab options,
/// fixed dropdowns and finally the row/cell invariants.
pub fn reconcile_sheet(
    state: &mut SheetState,
    schema: &mut ColumnSchema,
    mode: AppMode,
    active_tab_id: Option<&str>,
) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    report.sheet_changed |= normalize_name_columns(&mut state.columns);
    report.sheet_changed |= normalize_size_options(&mut state.columns);
    if let Some(globals) = schema.global_columns.as_mut() {
        report.schema_changed |= normalize_name_columns(globals);
        report.schema_changed |= normalize_size_options(globals);
    }
    report.sheet_changed |= state.reset_filter();

    if mode == AppMode::Inventory {
        let (sheet, global) = remove_brand_column(state, schema.global_columns.as_mut());
        report.sheet_changed |= sheet;
        report.schema_changed |= global;
    }

    let columns_before = state.columns.clone();
    match schema.global_columns.as_mut().filter(|g| !g.is_empty()) {
        Some(globals) => {
            report.schema_changed |= ensure_fandom_in_global(globals);
            report.sheet_changed |= remap_rows_to_columns(&mut state.rows, &columns_before, globals);
            state.columns.clone_from(globals);
        },
        None => {
            report.sheet_changed |= ensure_fandom_in_state(state);
            schema.global_columns = Some(to_global_columns(&state.columns));
            report.schema_changed = true;
        },
    }
    if let Some(tab_id) = active_tab_id {
        apply_tab_options(&mut state.columns, &schema.overrides, tab_id);
    }
    report.sheet_changed |= columns_before != state.columns;

    let (mode_sheet, mode_schema) = match mode {
        AppMode::Wishlist => enforce_wishlist_columns(state, schema.global_columns.as_mut()),
        AppMode::Inventory => (false, false),
    };
    let fixed = enforce_fixed_dropdown_defaults(&mut state.columns, mode);
    if mode_sheet || fixed {
        schema.global_columns = Some(to_global_columns(&state.columns));
        report.sheet_changed = true;
        report.schema_changed = true;
    }
    report.schema_changed |= mode_schema;

    report.sheet_changed |= state.prune_row_cells();
    report.sheet_changed |= state.ensure_row_cells();
    report
}
