//! Public read-only share links and what a viewer is allowed to see.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::column::Column;
use crate::constants::labels;
use crate::json_utils::{deserialize_string_list, null_as_default};
use crate::sheet::SheetState;

/// Share tokens are UUIDs; anything else is rejected before hitting the backend.
#[expect(clippy::unwrap_used, reason = "static regex pattern is compile-time validated")]
static SHARE_TOKEN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$").unwrap()
});

pub fn is_valid_share_token(token: &str) -> bool {
    SHARE_TOKEN_REGEX.is_match(token)
}

/// `<base>/?share=<token>`
pub fn share_link(base_url: &str, token: &str) -> String {
    if token.is_empty() {
        return String::new();
    }
    format!("{}/?share={token}", base_url.trim_end_matches('/'))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareMode {
    All,
    /// Only the listed columns
    Custom,
    /// Everything except Price
    #[default]
    #[serde(other)]
    Auto,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareVisibility {
    #[serde(default, deserialize_with = "null_as_default")]
    pub mode: ShareMode,
    #[serde(default, deserialize_with = "deserialize_string_list")]
    pub column_ids: Vec<String>,
}

impl ShareVisibility {
    /// Drop blank column ids.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.column_ids.retain(|id| !id.is_empty());
        self
    }
}

/// Strip what a viewer may not see from a loaded sheet and its schema.
///
/// Returns true when the Price column is not visible, so totals must be
/// hidden as well.
pub fn redact_for_viewer(
    state: &mut SheetState,
    globals: Option<&mut Vec<Column>>,
    visibility: &ShareVisibility,
) -> bool {
    let price_id = state.column_by_label(labels::PRICE).map(|c| c.id.clone());
    match visibility.mode {
        ShareMode::All => false,
        ShareMode::Custom => {
            let allowed: HashSet<&str> = visibility.column_ids.iter().map(String::as_str).collect();
            state.columns.retain(|c| allowed.contains(c.id.as_str()));
            for row in &mut state.rows {
                row.cells.retain(|k, _| allowed.contains(k.as_str()));
            }
            if let Some(globals) = globals {
                globals.retain(|c| allowed.contains(c.id.as_str()));
            }
            price_id.is_some_and(|id| !allowed.contains(id.as_str()))
        },
        ShareMode::Auto => {
            if let Some(id) = &price_id {
                state.columns.retain(|c| &c.id != id);
                for row in &mut state.rows {
                    row.cells.remove(id);
                }
            }
            if let Some(globals) = globals {
                globals.retain(|c| !c.has_label(labels::PRICE));
            }
            true
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::inventory_columns;

    #[test]
    fn test_token_validation() {
        assert!(is_valid_share_token("0F8FAD5B-D9CB-469F-A165-70867728950E"));
        assert!(!is_valid_share_token("0f8fad5b-d9cb-469f-a165"));
        assert!(!is_valid_share_token("x' or 1=1 --"));
    }

    #[test]
    fn test_share_link() {
        assert_eq!(share_link("https://shirt-tracker.com/", "abc"), "https://shirt-tracker.com/?share=abc");
        assert_eq!(share_link("https://a.b", ""), "");
    }

    #[test]
    fn test_unknown_mode_is_auto() {
        let v: ShareVisibility = serde_json::from_str(r#"{"mode":"friends","columnIds":["a",""]}"#).unwrap();
        let v = v.normalized();
        assert_eq!(v.mode, ShareMode::Auto);
        assert_eq!(v.column_ids, vec!["a"]);
    }

    #[test]
    fn test_mode_serializes_lowercase() {
        let v = ShareVisibility { mode: ShareMode::Custom, column_ids: vec!["c1".into()] };
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["mode"], "custom");
        let back: ShareVisibility = serde_json::from_value(json).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn test_auto_removes_price() {
        let mut state = SheetState::blank_with_columns(&inventory_columns());
        let mut globals = inventory_columns();
        let hidden = redact_for_viewer(&mut state, Some(&mut globals), &ShareVisibility::default());
        assert!(hidden);
        assert!(state.column_by_label(labels::PRICE).is_none());
        assert_eq!(state.rows[0].cells.len(), state.columns.len());
        assert_eq!(globals.len(), 7);
    }

    #[test]
    fn test_custom_keeps_listed_columns() {
        let mut state = SheetState::blank_with_columns(&inventory_columns());
        let keep = vec![state.columns[1].id.clone()];
        let visibility = ShareVisibility { mode: ShareMode::Custom, column_ids: keep.clone() };
        assert!(redact_for_viewer(&mut state, None, &visibility));
        assert_eq!(state.columns.len(), 1);
        assert_eq!(state.rows[0].cells.keys().cloned().collect::<Vec<_>>(), keep);
    }

    #[test]
    fn test_all_keeps_everything() {
        let mut state = SheetState::blank_with_columns(&inventory_columns());
        let visibility = ShareVisibility { mode: ShareMode::All, column_ids: vec![] };
        assert!(!redact_for_viewer(&mut state, None, &visibility));
        assert_eq!(state.columns.len(), 8);
    }
}
