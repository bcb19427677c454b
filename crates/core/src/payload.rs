//! The JSON document synced to the cloud, one per user.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::column::Column;
use crate::constants::PAYLOAD_VERSION;
use crate::event_log::EventLogEntry;
use crate::json_utils::{deserialize_string_list, null_as_default};
use crate::overrides::ColumnOverrides;
use crate::share::ShareVisibility;
use crate::sheet::SheetState;
use crate::tab::Tab;

/// Tabs, schema and sheets of one mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeSnapshot {
    #[serde(default, deserialize_with = "null_as_default")]
    pub tabs: Vec<Tab>,
    #[serde(default)]
    pub active_tab_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tab_states: BTreeMap<String, SheetState>,
    #[serde(default)]
    pub column_overrides: Option<ColumnOverrides>,
    #[serde(default)]
    pub global_columns: Option<Vec<Column>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudPayload {
    /// Inventory namespace, flattened into the top level.
    #[serde(flatten)]
    pub inventory: ModeSnapshot,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tab_logos: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub event_log: Vec<EventLogEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub type_icon_map: BTreeMap<String, Value>,
    #[serde(default, deserialize_with = "deserialize_string_list")]
    pub custom_tags: Vec<String>,
    #[serde(default)]
    pub shirt_update_date: Option<String>,
    #[serde(default)]
    pub public_share_id: Option<String>,
    #[serde(default)]
    pub public_share_visibility: Option<ShareVisibility>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub version: String,
    /// Only present once the user has created wishlist tabs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wishlist: Option<ModeSnapshot>,
}

impl CloudPayload {
    #[must_use]
    pub fn new(inventory: ModeSnapshot) -> Self {
        Self { inventory, version: PAYLOAD_VERSION.to_owned(), ..Self::default() }
    }
}

/// Active tab after taking `incoming` tabs from the cloud: the local choice
/// survives when it still exists, else the payload's, else the first tab.
pub fn select_active_tab(
    local_active: Option<&str>,
    incoming: &[Tab],
    incoming_active: Option<&str>,
) -> Option<String> {
    if let Some(local) = local_active {
        if incoming.iter().any(|t| t.id == local) {
            return Some(local.to_owned());
        }
    }
    incoming_active
        .filter(|id| !id.is_empty())
        .map(str::to_owned)
        .or_else(|| incoming.first().map(|t| t.id.clone()))
}
