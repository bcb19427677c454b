use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use shirt_tracker_core::share::is_valid_share_token;
use shirt_tracker_service::load_shared_view;

use super::photos::resolve_photo_urls;
use crate::AppState;
use crate::api_error::ApiError;
use crate::query_types::TabQuery;
use crate::response_types::SheetResponse;

/// Someone's published inventory: redacted per their visibility settings,
/// read-only, without totals when Price is hidden.
pub async fn shared_sheet(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    Query(query): Query<TabQuery>,
) -> Result<Json<SheetResponse>, ApiError> {
    let token = token.trim();
    if !is_valid_share_token(token) {
        return Err(ApiError::BadRequest("invalid share token".to_owned()));
    }
    let Some(cloud) = state.cloud.as_deref() else {
        return Err(ApiError::ServiceUnavailable("cloud sharing is not configured".to_owned()));
    };
    let view = load_shared_view(cloud, token).await?;

    let tab = match query.tab.as_deref() {
        Some(raw) => {
            let lower = raw.trim().to_lowercase();
            view.tabs.find(raw).or_else(|| view.tabs.tabs.iter().find(|t| t.name.to_lowercase() == lower))
        },
        None => view.tabs.active_tab(),
    }
    .ok_or_else(|| ApiError::NotFound("tab not found in shared sheet".to_owned()))?;
    let sheet = view
        .sheet(Some(&tab.id))
        .ok_or_else(|| ApiError::NotFound("tab not found in shared sheet".to_owned()))?;

    let rows: Vec<_> = sheet.rows.iter().collect();
    let mut response = SheetResponse::build(tab, sheet, &rows, &[]);
    resolve_photo_urls(Some(cloud), &mut response, false).await;
    tracing::debug!(tab = %tab.name, rows = rows.len(), "Served shared sheet");
    Ok(Json(response))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use shirt_tracker_storage::Storage;
    use tempfile::TempDir;

    use super::*;

    fn state(dir: &TempDir) -> Arc<AppState> {
        let storage = Storage::new(&dir.path().join("viewer.db")).unwrap();
        Arc::new(AppState { storage, cloud: None })
    }

    #[tokio::test]
    async fn test_invalid_token_is_bad_request() {
        let dir = TempDir::new().unwrap();
        let result = shared_sheet(State(state(&dir)), Path("not-a-token".into()), Query(TabQuery::default())).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_share_needs_cloud() {
        let dir = TempDir::new().unwrap();
        let token = "0f8fad5b-d9cb-469f-a165-70867728950e".to_owned();
        let result = shared_sheet(State(state(&dir)), Path(token), Query(TabQuery::default())).await;
        assert!(matches!(result, Err(ApiError::ServiceUnavailable(_))));
    }
}
