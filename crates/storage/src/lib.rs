//! Storage layer for shirt-tracker
//!
//! SQLite-backed key/value store holding the app's JSON documents, plus a
//! blob table for photos kept on this device.

mod error;
mod migrations;
mod storage;
#[cfg(test)]
mod tests;

pub use error::{Result, StorageError};
pub use storage::{Storage, StoredPhoto};
