//! Core types and rules for shirt-tracker
//!
//! Domain types shared across all other crates, plus the pure functions that
//! reconcile, filter, sort, import and export sheets.

pub mod backup;
pub mod column;
pub mod constants;
pub mod csv_io;
pub mod currency;
pub mod defaults;
pub mod env_config;
mod error;
pub mod event_log;
pub mod filter;
mod id;
pub mod json_utils;
mod mode;
pub mod overrides;
pub mod payload;
pub mod photo;
pub mod reconcile;
mod row;
pub mod share;
pub mod sheet;
pub mod sort;
pub mod stats;
mod tab;
pub mod tags;

pub use column::{Column, ColumnType};
pub use error::*;
pub use event_log::{EventLogEntry, Snapshot};
pub use id::create_id;
pub use mode::AppMode;
pub use overrides::{ColumnOverrides, ColumnSchema, OverrideKind};
pub use payload::{CloudPayload, ModeSnapshot};
pub use row::Row;
pub use share::{ShareMode, ShareVisibility};
pub use sheet::{FilterState, FilterTarget, SheetState, SortDirection, SortState};
pub use tab::{Tab, TabsState};
