//! Service layer for shirt-tracker
//!
//! Centralizes the workspace operations, cloud payload handling and sync
//! between the front ends (CLI, HTTP viewer) and storage/cloud.

#![allow(missing_docs, reason = "Internal crate with self-explanatory API")]
#![allow(clippy::missing_errors_doc, reason = "Errors are self-explanatory from Result types")]
#![allow(missing_debug_implementations, reason = "Internal types")]
#![allow(clippy::missing_docs_in_private_items, reason = "Internal crate")]
#![allow(clippy::implicit_return, reason = "Implicit return is idiomatic Rust")]
#![allow(clippy::question_mark_used, reason = "? operator is idiomatic Rust")]
#![allow(clippy::min_ident_chars, reason = "Short error vars are idiomatic")]
#![allow(clippy::indexing_slicing, reason = "Indices come from position() on the same slice")]

mod account;
mod error;
mod payload;
mod photos;
mod share;
mod sync;
mod workspace;

#[cfg(test)]
mod tests;

pub use account::switch_user;
pub use error::{Result, ServiceError};
pub use payload::{apply_payload, build_payload, ensure_share_id};
pub use photos::{PhotoMigration, upload_device_photos};
pub use share::{SharedView, load_shared_view, share_link_for};
pub use sync::{BackupStatus, PullOutcome, SyncOutcome, SyncService};
pub use workspace::{ChangeListener, ImportRequest, Workspace};

/// Run synchronous storage work off the async runtime.
pub(crate) async fn blocking<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}
