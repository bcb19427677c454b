use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use shirt_tracker_cloud::CloudBackend;
use shirt_tracker_core::photo::PhotoRef;
use shirt_tracker_service::ServiceError;

use crate::AppState;
use crate::api_error::ApiError;
use crate::blocking::blocking_result;
use crate::response_types::SheetResponse;

/// Serve a blob from the local photo store.
pub async fn get_photo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let storage = state.storage.clone();
    let photo = blocking_result(move || {
        storage.get_photo(&id)?.ok_or_else(|| ServiceError::NotFound(format!("photo {id}")))
    })
    .await?;
    Ok(([(header::CONTENT_TYPE, photo.blob.content_type)], photo.blob.bytes).into_response())
}

/// Replace photo references in the response with URLs a browser can load.
///
/// Local store references only resolve on the owner's own viewer
/// (`local`); remote objects need the cloud for a (signed) URL.
pub(crate) async fn resolve_photo_urls(
    cloud: Option<&dyn CloudBackend>,
    response: &mut SheetResponse,
    local: bool,
) {
    let photo_columns = response.photo_columns();
    for row in &mut response.rows {
        for column_id in &photo_columns {
            let Some(value) = row.cells.get_mut(column_id) else {
                continue;
            };
            let resolved = match PhotoRef::parse(value) {
                Some(PhotoRef::Local(id)) if local => format!("/api/photos/{id}"),
                Some(PhotoRef::Remote(path)) => match cloud {
                    Some(cloud) => match cloud.photo_url(path).await {
                        Ok(url) => url,
                        Err(e) => {
                            tracing::warn!(path, "Photo URL lookup failed: {}", e);
                            String::new()
                        },
                    },
                    None => String::new(),
                },
                Some(PhotoRef::Local(_)) => String::new(),
                Some(PhotoRef::Inline(_) | PhotoRef::External(_)) | None => continue,
            };
            *value = resolved;
        }
    }
}
