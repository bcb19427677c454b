use shirt_tracker_core::column::ColumnType;
use shirt_tracker_core::constants::{DEFAULT_TAB_NAME, LAST_CHANGE_KEY, LEGACY_TAB_NAMES};
use shirt_tracker_core::csv_io::ImportMode;
use shirt_tracker_core::currency::format_currency;
use shirt_tracker_core::{AppMode, FilterTarget, OverrideKind, SortDirection, Tab, TabsState};

use super::*;
use crate::tests::create_test_storage;

fn column_id(workspace: &Workspace, label: &str) -> String {
    workspace.resolve_column(label).unwrap().id.clone()
}

fn first_row(workspace: &Workspace) -> String {
    workspace.sheet().rows[0].id.clone()
}

#[test]
fn test_open_creates_default_tab_and_sheet() {
    let (storage, _dir) = create_test_storage();
    let workspace = Workspace::open(storage.clone()).unwrap();

    assert_eq!(workspace.mode(), AppMode::Inventory);
    assert_eq!(workspace.tabs().tabs.len(), 1);
    assert_eq!(workspace.active_tab_name(), DEFAULT_TAB_NAME);
    let labels: Vec<&str> = workspace.sheet().columns.iter().map(|c| c.label()).collect();
    assert_eq!(labels, ["Condition", "Name", "Size", "Type", "Fandom", "Price", "Preview", "Notes"]);
    assert_eq!(workspace.sheet().rows.len(), 1);
    assert!(storage.load_sheet(AppMode::Inventory, workspace.active_tab_id()).unwrap().is_some());
}

#[test]
fn test_legacy_tab_seed_is_replaced() {
    let (storage, _dir) = create_test_storage();
    let mut legacy = TabsState { tabs: LEGACY_TAB_NAMES.iter().map(|n| Tab::new(*n)).collect(), active_tab_id: None };
    legacy.ensure_active();
    storage.save_tabs(AppMode::Inventory, &legacy).unwrap();

    let workspace = Workspace::open(storage).unwrap();
    assert_eq!(workspace.tabs().tabs.len(), 1);
    assert_eq!(workspace.active_tab_name(), DEFAULT_TAB_NAME);
}

#[test]
fn test_update_cell_normalizes_price_and_logs() {
    let (storage, _dir) = create_test_storage();
    let mut workspace = Workspace::open(storage.clone()).unwrap();
    let row = first_row(&workspace);
    let name = column_id(&workspace, "Name");
    let price = column_id(&workspace, "Price");

    workspace.update_cell(&row, &name, "Blue Hoodie").unwrap();
    assert_eq!(workspace.event_log()[0].action, "Added row");
    workspace.update_cell(&row, &price, "$1,234.50").unwrap();

    assert_eq!(workspace.sheet().rows[0].cell(&price), "1234.5");
    let entry = &workspace.event_log()[0];
    assert_eq!(entry.action, "Updated row");
    assert_eq!(entry.detail, "Blue Hoodie - Price: empty -> 1234.5");
    assert_eq!(entry.tab_name, DEFAULT_TAB_NAME);
    assert!(storage.get_timestamp(LAST_CHANGE_KEY).unwrap().is_some());

    let reopened = Workspace::open(storage).unwrap();
    assert_eq!(reopened.sheet().rows[0].cell(&price), "1234.5");
    assert_eq!(reopened.event_log().len(), 2);
}

#[test]
fn test_select_value_becomes_tab_option() {
    let (storage, _dir) = create_test_storage();
    let mut workspace = Workspace::open(storage).unwrap();
    let row = first_row(&workspace);
    let fandom = column_id(&workspace, "Fandom");
    let tab = workspace.active_tab_id().unwrap().to_owned();

    workspace.update_cell(&row, &fandom, "Star Wars").unwrap();
    assert!(workspace.sheet().column(&fandom).unwrap().options.contains(&"Star Wars".to_owned()));
    assert_eq!(workspace.schema().overrides.options(OverrideKind::Fandom, &tab), ["Star Wars"]);
}

#[test]
fn test_csv_round_trip_through_clear() {
    let (storage, _dir) = create_test_storage();
    let mut workspace = Workspace::open(storage).unwrap();
    let row = first_row(&workspace);
    let name = column_id(&workspace, "Name");
    let price = column_id(&workspace, "Price");
    workspace.update_cell(&row, &name, "Blue Hoodie").unwrap();
    workspace.update_cell(&row, &price, "19.99").unwrap();

    let csv = workspace.export_csv().unwrap();
    assert_eq!(workspace.clear_all().unwrap(), 1);
    let outcome = workspace
        .import_csv(&ImportRequest { text: csv, mode: ImportMode::Append, columns: None })
        .unwrap();

    assert_eq!(outcome.imported, 1);
    assert_eq!(workspace.sheet().rows.len(), 1);
    let imported = &workspace.sheet().rows[0];
    assert_eq!(imported.cell(&name), "Blue Hoodie");
    assert_eq!(format_currency(imported.cell(&price)), "$19.99");
    assert_eq!(workspace.event_log()[0].action, "Imported CSV");
}

#[test]
fn test_import_requires_a_column() {
    let (storage, _dir) = create_test_storage();
    let mut workspace = Workspace::open(storage).unwrap();
    let request = ImportRequest {
        text: "Name,Price\nTee,5\n".into(),
        mode: ImportMode::Append,
        columns: Some(Vec::new()),
    };
    let err = workspace.import_csv(&request).unwrap_err();
    assert_eq!(err.to_string(), "Select at least one column to import.");
}

#[test]
fn test_clear_all_and_undo() {
    let (storage, _dir) = create_test_storage();
    let mut workspace = Workspace::open(storage).unwrap();
    let name = column_id(&workspace, "Name");
    for shirt in ["Aloha", "Bowling"] {
        let id = workspace.add_row().unwrap();
        workspace.update_cell(&id, &name, shirt).unwrap();
    }
    let before = workspace.sheet().rows.len();

    workspace.clear_all().unwrap();
    assert_eq!(workspace.sheet().rows.len(), 1);
    assert!(workspace.can_undo_clear());
    workspace.undo_clear().unwrap();
    assert_eq!(workspace.sheet().rows.len(), before);
    assert!(!workspace.can_undo_clear());
    assert!(matches!(workspace.undo_clear(), Err(ServiceError::InvalidInput(_))));
}

#[test]
fn test_delete_rows_keeps_one_row() {
    let (storage, _dir) = create_test_storage();
    let mut workspace = Workspace::open(storage).unwrap();
    let second = workspace.add_row().unwrap();
    let ids = vec![first_row(&workspace), second];

    assert_eq!(workspace.delete_rows(&ids).unwrap(), 2);
    assert_eq!(workspace.sheet().rows.len(), 1);
    assert_eq!(workspace.event_log()[0].action, "Deleted rows");
    assert!(workspace.event_log()[0].snapshot.is_some());
}

#[test]
fn test_tabs_add_switch_delete() {
    let (storage, _dir) = create_test_storage();
    let mut workspace = Workspace::open(storage.clone()).unwrap();
    let shirts = workspace.active_tab_id().unwrap().to_owned();
    let name = column_id(&workspace, "Name");
    workspace.update_cell(&first_row(&workspace), &name, "Only In Shirts").unwrap();

    let aloha = workspace.add_tab("Aloha").unwrap();
    assert_eq!(workspace.active_tab_id(), Some(aloha.as_str()));
    assert_eq!(workspace.sheet().rows[0].cell(&name), "");
    assert_eq!(workspace.tabs().tabs[0].name, "Aloha");
    assert_eq!(workspace.tab_sheet(&shirts).unwrap().rows[0].cell(&name), "Only In Shirts");
    assert_eq!(workspace.active_tab_id(), Some(aloha.as_str()));

    workspace.switch_tab(&shirts).unwrap();
    assert_eq!(workspace.sheet().rows[0].cell(&name), "Only In Shirts");

    workspace.delete_tab(&shirts).unwrap();
    assert_eq!(workspace.active_tab_id(), Some(aloha.as_str()));
    assert!(storage.load_sheet(AppMode::Inventory, Some(&shirts)).unwrap().is_none());

    workspace.delete_tab(&aloha).unwrap();
    assert_eq!(workspace.tabs().tabs.len(), 1);
    assert_eq!(workspace.active_tab_name(), "New Tab");
    assert!(workspace.switch_tab("missing").unwrap_err().is_not_found());
}

#[test]
fn test_mode_switch_round_trip() {
    let (storage, _dir) = create_test_storage();
    let mut workspace = Workspace::open(storage.clone()).unwrap();
    let tab = workspace.active_tab_id().unwrap().to_owned();
    let name = column_id(&workspace, "Name");
    let price = column_id(&workspace, "Price");
    workspace.update_cell(&first_row(&workspace), &name, "Blue Hoodie").unwrap();
    workspace.update_cell(&first_row(&workspace), &price, "20").unwrap();
    let second = workspace.add_row().unwrap();
    workspace.update_cell(&second, &name, "Aloha").unwrap();
    workspace.set_row_tags(&second, &["Floral".into()]).unwrap();
    workspace.add_tab("Hoodies").unwrap();
    workspace.switch_tab(&tab).unwrap();
    workspace.set_filter(FilterTarget::Tags, "floral").unwrap();
    workspace.set_sort(Some(&price), SortDirection::Desc).unwrap();

    let tabs_before = workspace.tabs().clone();
    let sheet_before = workspace.sheet().clone();
    let schema_before = workspace.schema().clone();

    workspace.switch_mode(AppMode::Wishlist).unwrap();
    assert_eq!(workspace.sheet().columns[0].label(), "Brand");
    assert!(workspace.resolve_column("Price").is_none());
    let brand = column_id(&workspace, "Brand");
    workspace.update_cell(&first_row(&workspace), &brand, "Kavu").unwrap();

    workspace.switch_mode(AppMode::Inventory).unwrap();
    assert_eq!(workspace.active_tab_id(), Some(tab.as_str()));
    assert_eq!(workspace.tabs(), &tabs_before);
    assert_eq!(workspace.sheet(), &sheet_before);
    assert_eq!(workspace.schema(), &schema_before);
    assert_eq!(storage.load_app_mode().unwrap(), AppMode::Inventory);
}

#[test]
fn test_edit_column_retargets_select_values() {
    let (storage, _dir) = create_test_storage();
    let mut workspace = Workspace::open(storage).unwrap();
    let color = workspace.add_column("Color", ColumnType::Select, &["red".into(), "Blue".into()]).unwrap();
    let row = first_row(&workspace);
    workspace.update_cell(&row, &color, "red").unwrap();

    workspace
        .edit_column(&color, "Colour", ColumnType::Select, &["Crimson".into(), "Blue".into()])
        .unwrap();
    assert_eq!(workspace.sheet().rows[0].cell(&color), "Crimson");
    let globals = workspace.schema().global_columns.as_ref().unwrap();
    assert!(globals.iter().any(|c| c.id == color && c.name == "Colour"));

    workspace.delete_column(&color).unwrap();
    assert!(workspace.sheet().column(&color).is_none());
    assert!(!workspace.sheet().rows[0].cells.contains_key(&color));
}

#[test]
fn test_hidden_price_drops_totals() {
    let (storage, _dir) = create_test_storage();
    let mut workspace = Workspace::open(storage).unwrap();
    let price = column_id(&workspace, "Price");
    let row = first_row(&workspace);
    workspace.update_cell(&row, &price, "20").unwrap();
    let second = workspace.add_row().unwrap();
    workspace.update_cell(&second, &price, "10").unwrap();

    let stats = workspace.footer_stats();
    assert_eq!(stats.total_items, 2);
    assert!((stats.price.unwrap().total - 30.0).abs() < f64::EPSILON);

    assert!(workspace.toggle_column_hidden(&price).unwrap());
    assert!(workspace.footer_stats().price.is_none());
    assert!(!workspace.visible_columns().iter().any(|c| c.id == price));
}

#[test]
fn test_tags_and_for_sale_filter() {
    let (storage, _dir) = create_test_storage();
    let mut workspace = Workspace::open(storage).unwrap();
    let first = first_row(&workspace);
    let second = workspace.add_row().unwrap();

    let ids = vec![first.clone(), second];
    assert_eq!(workspace.add_tags_to_rows(&ids, &["Glow Print".into()]).unwrap(), 2);
    assert!(workspace.custom_tags().contains(&"Glow Print".to_owned()));
    assert!(workspace.toggle_for_sale(&first).unwrap());

    workspace.set_filter(FilterTarget::ForSale, "yes").unwrap();
    assert_eq!(workspace.filtered_rows().len(), 1);
    workspace.set_filter(FilterTarget::All, "").unwrap();

    let only_first = vec![first.clone()];
    assert_eq!(workspace.remove_tags_from_rows(&only_first, &["Glow Print".into()]).unwrap(), 1);
    assert_eq!(workspace.remove_tags_from_rows(&only_first, &["Glow Print".into()]).unwrap(), 0);
    assert_eq!(workspace.add_tags_to_rows(&ids, &["Glow Print".into()]).unwrap(), 1);

    assert_eq!(workspace.rename_tag("Glow Print", "Glow").unwrap(), 2);
    assert!(workspace.all_tags().contains(&"Glow".to_owned()));
    assert_eq!(workspace.delete_tag("Glow").unwrap(), 2);
    assert!(!workspace.all_tags().contains(&"Glow".to_owned()));
}

#[test]
fn test_sort_by_price_descending() {
    let (storage, _dir) = create_test_storage();
    let mut workspace = Workspace::open(storage).unwrap();
    let price = column_id(&workspace, "Price");
    for amount in ["5", "25", "15"] {
        let id = workspace.add_row().unwrap();
        workspace.update_cell(&id, &price, amount).unwrap();
    }
    workspace.set_sort(Some(&price), SortDirection::Desc).unwrap();
    assert_eq!(workspace.sheet().rows[0].cell(&price), "25");
}

#[test]
fn test_move_row_to_inventory() {
    let (storage, _dir) = create_test_storage();
    let mut workspace = Workspace::open(storage.clone()).unwrap();
    let inventory_tab = workspace.active_tab_id().unwrap().to_owned();

    workspace.switch_mode(AppMode::Wishlist).unwrap();
    let row = first_row(&workspace);
    let name = column_id(&workspace, "Name");
    let fandom = column_id(&workspace, "Fandom");
    workspace.update_cell(&row, &name, "X-Wing Tee").unwrap();
    workspace.update_cell(&row, &fandom, "Star Wars").unwrap();
    workspace.set_row_tags(&row, &["Gift".into()]).unwrap();

    workspace.move_row_to_inventory(&row, &inventory_tab).unwrap();
    assert_eq!(workspace.sheet().rows.len(), 1);
    assert!(workspace.sheet().rows[0].cells.values().all(String::is_empty));
    assert_eq!(workspace.event_log()[0].action, "Moved to inventory");

    let target = storage.load_sheet(AppMode::Inventory, Some(&inventory_tab)).unwrap().unwrap();
    let target_name = target.column_by_label("name").unwrap().id.clone();
    let moved = target.rows.iter().find(|r| r.cell(&target_name) == "X-Wing Tee").unwrap();
    let target_fandom = target.column_by_label("fandom").unwrap();
    assert_eq!(moved.cell(&target_fandom.id), "Star Wars");
    assert!(target_fandom.options.contains(&"Star Wars".to_owned()));
    assert_eq!(moved.clean_tags(), ["Gift"]);

    workspace.switch_mode(AppMode::Inventory).unwrap();
    assert!(matches!(
        workspace.move_row_to_inventory(&first_row(&workspace), &inventory_tab),
        Err(ServiceError::InvalidInput(_))
    ));
}

#[test]
fn test_read_only_sheet_rejects_edits() {
    let (storage, _dir) = create_test_storage();
    let mut workspace = Workspace::open(storage).unwrap();
    workspace.sheet.read_only = true;

    assert!(matches!(workspace.add_row(), Err(ServiceError::ReadOnly(_))));
    assert!(matches!(workspace.add_tab("Nope"), Err(ServiceError::ReadOnly(_))));
    workspace.set_sort(None, SortDirection::Asc).unwrap();
}

#[test]
fn test_inline_photos_move_to_photo_store() {
    let (storage, _dir) = create_test_storage();
    let mut workspace = Workspace::open(storage.clone()).unwrap();
    let preview = column_id(&workspace, "Preview");
    workspace.sheet.rows[0].set_cell(&preview, "data:image/png;base64,AQID");

    assert_eq!(workspace.migrate_inline_photos().unwrap(), 1);
    let cell = workspace.sheet().rows[0].cell(&preview).to_owned();
    let id = cell.strip_prefix("idb:").unwrap();
    assert_eq!(storage.require_photo(id).unwrap().blob.bytes, [1, 2, 3]);
}
