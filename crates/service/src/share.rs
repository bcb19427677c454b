//! Public share links and the read-only view a share token opens.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use shirt_tracker_cloud::CloudBackend;
use shirt_tracker_core::payload::select_active_tab;
use shirt_tracker_core::reconcile::reconcile_sheet;
use shirt_tracker_core::share::{redact_for_viewer, share_link};
use shirt_tracker_core::sort::sort_sheet;
use shirt_tracker_core::{AppMode, CloudPayload, ColumnSchema, SheetState, TabsState};
use shirt_tracker_storage::Storage;

use crate::error::{Result, ServiceError};
use crate::payload::ensure_share_id;

/// `<base>/?share=<token>` for the stored (or newly created) share id.
pub fn share_link_for(storage: &Storage, base_url: &str) -> Result<String> {
    let token = ensure_share_id(storage)?;
    Ok(share_link(base_url, &token))
}

/// Someone else's inventory as a share link shows it: reconciled,
/// redacted per the owner's visibility settings and read-only.
#[derive(Debug, Clone)]
pub struct SharedView {
    pub owner_id: String,
    pub updated_at: DateTime<Utc>,
    pub tabs: TabsState,
    /// Redacted sheet per tab id.
    pub sheets: BTreeMap<String, SheetState>,
    /// Totals must not be shown when the viewer cannot see prices.
    pub price_hidden: bool,
}

impl SharedView {
    /// Build the view from a fetched document. Never touches local storage.
    pub fn from_payload(owner_id: String, updated_at: DateTime<Utc>, payload: &CloudPayload) -> Self {
        let snapshot = &payload.inventory;
        let mut tabs = TabsState {
            tabs: snapshot.tabs.clone(),
            active_tab_id: select_active_tab(None, &snapshot.tabs, snapshot.active_tab_id.as_deref()),
        };
        tabs.sort();
        let visibility = payload.public_share_visibility.clone().unwrap_or_default().normalized();

        let mut price_hidden = false;
        let mut sheets = BTreeMap::new();
        for tab in &tabs.tabs {
            let mut schema = ColumnSchema {
                overrides: snapshot.column_overrides.clone().unwrap_or_default(),
                global_columns: snapshot.global_columns.clone(),
            };
            let mut sheet = snapshot.tab_states.get(&tab.id).cloned().unwrap_or_else(|| {
                SheetState::blank_with_columns(schema.global_columns.as_deref().unwrap_or_default())
            });
            reconcile_sheet(&mut sheet, &mut schema, AppMode::Inventory, Some(&tab.id));
            sort_sheet(&mut sheet);
            price_hidden |= redact_for_viewer(&mut sheet, schema.global_columns.as_mut(), &visibility);
            sheet.read_only = true;
            sheets.insert(tab.id.clone(), sheet);
        }
        Self { owner_id, updated_at, tabs, sheets, price_hidden }
    }

    /// Sheet of `tab_id`, or of the active tab.
    pub fn sheet(&self, tab_id: Option<&str>) -> Option<&SheetState> {
        let id = tab_id.or(self.tabs.active_tab_id.as_deref())?;
        self.sheets.get(id)
    }
}

/// Fetch the document published under `token` and build its view.
pub async fn load_shared_view(cloud: &dyn CloudBackend, token: &str) -> Result<SharedView> {
    let token = token.trim();
    let row = cloud
        .fetch_shared(token)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("shared sheet {token}")))?;
    tracing::info!(owner = %row.user_id, "Loaded shared sheet");
    Ok(SharedView::from_payload(row.user_id, row.updated_at, &row.data))
}
