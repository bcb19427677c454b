//! Read-only HTTP viewer for shirt-tracker.

#![allow(missing_docs, reason = "Internal crate with self-explanatory API")]
#![allow(unreachable_pub, reason = "pub items are re-exported")]
#![allow(clippy::absolute_paths, reason = "Explicit paths for clarity")]
#![allow(missing_debug_implementations, reason = "Internal types")]
#![allow(clippy::missing_docs_in_private_items, reason = "Internal crate")]
#![allow(clippy::implicit_return, reason = "Implicit return is idiomatic Rust")]
#![allow(clippy::question_mark_used, reason = "? operator is idiomatic Rust")]
#![allow(clippy::min_ident_chars, reason = "Short closure params are idiomatic")]
#![allow(clippy::shadow_reuse, reason = "Shadowing for Arc clones is idiomatic")]
#![allow(clippy::exhaustive_structs, reason = "HTTP types are stable")]
#![allow(clippy::single_call_fn, reason = "Helper functions improve readability")]

pub mod api_error;
mod blocking;
mod handlers;
mod query_types;
mod response_types;
mod viewer;

use std::sync::Arc;

use axum::http::Method;
use axum::routing::get;
use axum::{Json, Router};
use shirt_tracker_cloud::CloudBackend;
use shirt_tracker_storage::Storage;
use tower_http::cors::{Any, CorsLayer};

pub use query_types::{RowsQuery, TabQuery};
pub use response_types::{SheetResponse, TabsResponse, VersionResponse};

/// Shared state for all handlers.
pub struct AppState {
    pub storage: Storage,
    /// Present when Supabase is configured; needed for share links and
    /// remote photo URLs.
    pub cloud: Option<Arc<dyn CloudBackend>>,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new().allow_methods([Method::GET]).allow_origin(Any);
    Router::new()
        .route("/", get(viewer::serve_viewer))
        .route("/health", get(health))
        .route("/api/version", get(version))
        .route("/api/tabs", get(handlers::sheet::list_tabs))
        .route("/api/rows", get(handlers::sheet::list_rows))
        .route("/api/events", get(handlers::sheet::list_events))
        .route("/api/export.csv", get(handlers::sheet::export_csv))
        .route("/api/photos/{id}", get(handlers::photos::get_photo))
        .route("/share/{token}", get(handlers::share::shared_sheet))
        .layer(cors)
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn version() -> Json<VersionResponse> {
    Json(VersionResponse { version: env!("CARGO_PKG_VERSION") })
}
