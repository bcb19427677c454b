use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_TAB_KEY, INVENTORY_COLUMNS_KEY, INVENTORY_DATA_PREFIX, INVENTORY_TABS_KEY,
    WISHLIST_COLUMNS_KEY, WISHLIST_DATA_PREFIX, WISHLIST_TABS_KEY,
};

/// Which collection the workspace is showing. Each mode has its own tabs,
/// column schema and per-tab sheets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppMode {
    #[default]
    Inventory,
    Wishlist,
}

impl AppMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inventory => "inventory",
            Self::Wishlist => "wishlist",
        }
    }

    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Self::Inventory => Self::Wishlist,
            Self::Wishlist => Self::Inventory,
        }
    }

    pub fn data_prefix(&self) -> &'static str {
        match self {
            Self::Inventory => INVENTORY_DATA_PREFIX,
            Self::Wishlist => WISHLIST_DATA_PREFIX,
        }
    }

    pub fn tabs_key(&self) -> &'static str {
        match self {
            Self::Inventory => INVENTORY_TABS_KEY,
            Self::Wishlist => WISHLIST_TABS_KEY,
        }
    }

    pub fn columns_key(&self) -> &'static str {
        match self {
            Self::Inventory => INVENTORY_COLUMNS_KEY,
            Self::Wishlist => WISHLIST_COLUMNS_KEY,
        }
    }

    /// Storage key of a tab's sheet, e.g. `shirts-db-v3:<tab id>`.
    pub fn sheet_key(&self, tab_id: Option<&str>) -> String {
        format!("{}:{}", self.data_prefix(), tab_id.unwrap_or(DEFAULT_TAB_KEY))
    }
}

impl Display for AppMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inventory" => Ok(Self::Inventory),
            "wishlist" => Ok(Self::Wishlist),
            other => Err(format!("Invalid app mode: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_keys_per_mode() {
        assert_eq!(AppMode::Inventory.sheet_key(Some("t1")), "shirts-db-v3:t1");
        assert_eq!(AppMode::Wishlist.sheet_key(None), "wishlist-db-v1:default");
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!("Wishlist".parse::<AppMode>(), Ok(AppMode::Wishlist));
        assert!("closet".parse::<AppMode>().is_err());
    }
}
