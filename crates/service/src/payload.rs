//! Building the cloud document from local storage and applying a fetched
//! document back onto it.
//!
//! Both directions read and write storage only; a loaded [`Workspace`]
//! picks the result up through [`Workspace::reload`].
//!
//! [`Workspace`]: crate::Workspace
//! [`Workspace::reload`]: crate::Workspace::reload

use std::collections::BTreeMap;

use shirt_tracker_core::payload::select_active_tab;
use shirt_tracker_core::reconcile::normalize_stored_columns;
use shirt_tracker_core::{AppMode, CloudPayload, ModeSnapshot, TabsState, create_id};
use shirt_tracker_storage::Storage;

use crate::error::Result;

/// The stored share token, created on first use.
pub fn ensure_share_id(storage: &Storage) -> Result<String> {
    if let Some(token) = storage.public_share_id()? {
        return Ok(token);
    }
    let token = create_id();
    storage.set_public_share_id(&token)?;
    tracing::info!("Created public share id");
    Ok(token)
}

fn snapshot_mode(storage: &Storage, mode: AppMode) -> Result<ModeSnapshot> {
    let tabs = storage.load_tabs(mode)?.unwrap_or_default();
    let schema = storage.load_schema(mode)?;
    let mut tab_states = BTreeMap::new();
    for tab in &tabs.tabs {
        if let Some(sheet) = storage.load_sheet(mode, Some(&tab.id))? {
            tab_states.insert(tab.id.clone(), sheet);
        }
    }
    Ok(ModeSnapshot {
        tabs: tabs.tabs,
        active_tab_id: tabs.active_tab_id,
        tab_states,
        column_overrides: Some(schema.overrides),
        global_columns: schema.global_columns,
    })
}

/// Assemble the full document for upload.
///
/// The wishlist namespace is only included once it has tabs.
pub fn build_payload(storage: &Storage) -> Result<CloudPayload> {
    let mut payload = CloudPayload::new(snapshot_mode(storage, AppMode::Inventory)?);
    let wishlist = snapshot_mode(storage, AppMode::Wishlist)?;
    if !wishlist.tabs.is_empty() {
        payload.wishlist = Some(wishlist);
    }
    payload.tab_logos = storage.load_tab_logos()?;
    payload.event_log = storage.load_event_log()?;
    payload.type_icon_map = storage.load_type_icon_map()?;
    payload.custom_tags = storage.load_custom_tags()?;
    payload.shirt_update_date = storage.shirt_update_date()?;
    payload.public_share_id = Some(ensure_share_id(storage)?);
    payload.public_share_visibility = Some(storage.load_share_visibility()?);
    Ok(payload)
}

fn apply_mode(storage: &Storage, mode: AppMode, snapshot: &ModeSnapshot) -> Result<()> {
    let local_active = storage.load_tabs(mode)?.and_then(|t| t.active_tab_id);
    let active_tab_id =
        select_active_tab(local_active.as_deref(), &snapshot.tabs, snapshot.active_tab_id.as_deref());
    let mut tabs = TabsState { tabs: snapshot.tabs.clone(), active_tab_id };
    tabs.sort();
    storage.save_tabs(mode, &tabs)?;

    let mut schema = storage.load_schema(mode)?;
    if let Some(overrides) = &snapshot.column_overrides {
        schema.overrides = overrides.clone();
    }
    if let Some(globals) = snapshot.global_columns.as_ref().filter(|g| !g.is_empty()) {
        let mut globals = globals.clone();
        normalize_stored_columns(&mut globals);
        schema.global_columns = Some(globals);
    }
    storage.save_schema(mode, &schema)?;

    for (tab_id, sheet) in &snapshot.tab_states {
        let mut sheet = sheet.clone();
        normalize_stored_columns(&mut sheet.columns);
        sheet.read_only = false;
        storage.save_sheet(mode, Some(tab_id), &sheet)?;
    }
    Ok(())
}

/// Write a fetched document into local storage.
///
/// The locally active tab survives when the document still has it. Applying
/// the same document twice leaves storage exactly as applying it once.
pub fn apply_payload(storage: &Storage, payload: &CloudPayload) -> Result<()> {
    apply_mode(storage, AppMode::Inventory, &payload.inventory)?;
    if let Some(wishlist) = &payload.wishlist {
        apply_mode(storage, AppMode::Wishlist, wishlist)?;
    }
    storage.save_tab_logos(&payload.tab_logos)?;
    storage.save_event_log(&payload.event_log)?;
    storage.save_type_icon_map(&payload.type_icon_map)?;
    storage.save_custom_tags(&payload.custom_tags)?;
    if let Some(token) = payload.public_share_id.as_deref().filter(|t| !t.is_empty()) {
        storage.set_public_share_id(token)?;
    }
    if let Some(visibility) = &payload.public_share_visibility {
        storage.save_share_visibility(visibility)?;
    }
    if let Some(date) = payload.shirt_update_date.as_deref() {
        storage.set_shirt_update_date(date)?;
    }
    tracing::info!(
        tabs = payload.inventory.tabs.len(),
        wishlist_tabs = payload.wishlist.as_ref().map_or(0, |w| w.tabs.len()),
        "Applied cloud payload"
    );
    Ok(())
}
