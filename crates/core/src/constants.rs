//! Shared constants for shirt-tracker.
//!
//! Storage key names, backend names and fixed option lists live here so the
//! storage, sync and front-end crates agree on them.

/// Per-tab sheet state prefix for inventory mode (`shirts-db-v3:<tab id>`).
pub const INVENTORY_DATA_PREFIX: &str = "shirts-db-v3";

/// Tab list key for inventory mode.
pub const INVENTORY_TABS_KEY: &str = "shirts-tabs-v1";

/// Column schema (global columns + per-tab overrides) key for inventory mode.
pub const INVENTORY_COLUMNS_KEY: &str = "shirts-columns-v2";

/// Per-tab sheet state prefix for wishlist mode.
pub const WISHLIST_DATA_PREFIX: &str = "wishlist-db-v1";

pub const WISHLIST_TABS_KEY: &str = "wishlist-tabs-v1";

pub const WISHLIST_COLUMNS_KEY: &str = "wishlist-columns-v1";

pub const EVENT_LOG_KEY: &str = "shirts-event-log-v1";
pub const CUSTOM_TAGS_KEY: &str = "shirts-custom-tags-v1";
pub const APP_MODE_KEY: &str = "shirts-app-mode";
pub const CURRENT_USER_KEY: &str = "shirts-current-user";
pub const LAST_SYNC_KEY: &str = "shirts-last-sync";
pub const LAST_CHANGE_KEY: &str = "shirts-last-change";
pub const LAST_CLOUD_UPDATE_KEY: &str = "shirts-last-cloud-update";
pub const PUBLIC_SHARE_ID_KEY: &str = "shirts-public-share-id";
pub const PUBLIC_SHARE_VISIBILITY_KEY: &str = "shirts-public-share-visibility-v1";
pub const TAB_LOGOS_KEY: &str = "tab-logos-map";
pub const TYPE_ICON_MAP_KEY: &str = "shirts-type-icon-map";
pub const SHIRT_UPDATE_DATE_KEY: &str = "shirt-update-date";

/// Tab id used when a sheet is stored without an active tab.
pub const DEFAULT_TAB_KEY: &str = "default";

/// Name of the tab created for a fresh workspace.
pub const DEFAULT_TAB_NAME: &str = "Shirts";

/// Maximum number of event log entries kept (newest first).
pub const EVENT_LOG_LIMIT: usize = 200;

/// Maximum characters of a cell value quoted in an event log entry.
pub const EVENT_LOG_VALUE_MAX_CHARS: usize = 60;

/// Remote table holding one JSON document per user.
pub const STATE_TABLE: &str = "shirt_state";

/// Remote object storage bucket for photos and tab logos.
pub const PHOTO_BUCKET: &str = "shirt-photos";

/// Private bucket receiving full-table backups.
pub const BACKUP_BUCKET: &str = "shirt-tracker-backups";

/// Lifetime of signed photo URLs in seconds.
pub const SIGNED_URL_TTL_SECS: u64 = 3600;

/// Debounce window before a scheduled sync runs.
pub const SYNC_DEBOUNCE_MS: u64 = 1200;

/// Clock-skew tolerance when comparing local and cloud save times.
pub const BACKUP_TOLERANCE_SECS: i64 = 120;

pub const PUBLIC_SHARE_BASE_URL: &str = "https://shirt-tracker.com/";

/// Version stamped into every cloud payload.
pub const PAYLOAD_VERSION: &str = "2.0.5";

/// Tag that marks a row as for sale.
pub const FOR_SALE_TAG: &str = "For Sale";

pub const BASE_TAG_SUGGESTIONS: [&str; 9] = [
    "Floral",
    "Christmas",
    "Halloween",
    "Holiday",
    "Patriotic",
    "Movie",
    "Animation",
    "Original",
    "Dropzone",
];

pub const SIZE_OPTIONS: [&str; 10] = ["XS", "S", "M", "L", "XL", "2X", "3X", "4X", "5X", "NA"];

pub const CONDITION_OPTIONS: [&str; 4] = ["NWT", "NWOT", "EUC", "Other"];

/// Tab names of the original seed data set; a workspace holding exactly these
/// tabs without stored columns is replaced by fresh defaults.
pub const LEGACY_TAB_NAMES: [&str; 6] =
    ["7-Strong", "Dixxon", "Park Candy", "Project Good", "Reyn Spooner", "RSVLTS"];

/// Column label keys with special behavior.
pub mod labels {
    pub const NAME: &str = "name";
    pub const SHIRT_NAME: &str = "shirt name";
    pub const FANDOM: &str = "fandom";
    pub const TYPE: &str = "type";
    pub const BRAND: &str = "brand";
    pub const PRICE: &str = "price";
    pub const SIZE: &str = "size";
    pub const CONDITION: &str = "condition";
    pub const PREVIEW: &str = "preview";
    pub const TAGS: &str = "tags";
}
