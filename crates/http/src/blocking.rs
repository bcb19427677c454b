//! Helpers for running blocking storage work in async handlers.
//!
//! Spawns the closure on the blocking pool, maps join and service errors
//! to [`ApiError`] and optionally wraps the value in `Json`.

use axum::Json;
use serde::Serialize;
use shirt_tracker_service::ServiceError;
use tokio::task::spawn_blocking;

use crate::api_error::ApiError;

/// Runs a blocking closure and returns `Result<Json<T>, ApiError>`.
///
/// # Example
/// ```ignore
/// pub async fn list_tabs(State(state): State<Arc<AppState>>) -> Result<Json<TabsResponse>, ApiError> {
///     let storage = state.storage.clone();
///     blocking_json(move || TabsResponse::load(storage)).await
/// }
/// ```
pub async fn blocking_json<T, F>(f: F) -> Result<Json<T>, ApiError>
where
    F: FnOnce() -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static + Serialize,
{
    blocking_result(f).await.map(Json)
}

/// Runs a blocking closure and returns the raw value.
pub async fn blocking_result<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    spawn_blocking(f)
        .await
        .map_err(|e| {
            tracing::error!("Join error: {}", e);
            ApiError::Internal(e.into())
        })?
        .map_err(ApiError::from)
}
