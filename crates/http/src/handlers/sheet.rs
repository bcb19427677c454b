use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use shirt_tracker_core::csv_io;
use shirt_tracker_core::filter::filter_rows;
use shirt_tracker_core::sort::sort_sheet;
use shirt_tracker_core::{EventLogEntry, FilterState, SheetState, SortState, Tab};
use shirt_tracker_service::{ServiceError, Workspace};
use shirt_tracker_storage::Storage;

use super::photos::resolve_photo_urls;
use crate::AppState;
use crate::api_error::ApiError;
use crate::blocking::{blocking_json, blocking_result};
use crate::query_types::{EventsQuery, RowsQuery, TabQuery};
use crate::response_types::{SheetResponse, TabsResponse};

const CSV_FILENAME: &str = "shirt-tracker.csv";

/// The stored mode's workspace plus the requested (or active) tab's sheet.
fn open_tab(storage: Storage, tab: Option<&str>) -> Result<(Workspace, Tab, SheetState), ServiceError> {
    let workspace = Workspace::open(storage)?;
    let tab = match tab {
        Some(raw) => workspace.resolve_tab(raw),
        None => workspace.active_tab(),
    }
    .cloned()
    .ok_or_else(|| ServiceError::NotFound(format!("tab {}", tab.unwrap_or("(active)"))))?;
    let sheet = workspace.tab_sheet(&tab.id)?;
    Ok((workspace, tab, sheet))
}

pub async fn list_tabs(State(state): State<Arc<AppState>>) -> Result<Json<TabsResponse>, ApiError> {
    let storage = state.storage.clone();
    blocking_json(move || {
        let workspace = Workspace::open(storage)?;
        Ok(TabsResponse {
            mode: workspace.mode(),
            active_tab_id: workspace.active_tab_id().map(str::to_owned),
            tabs: workspace.tabs().tabs.clone(),
        })
    })
    .await
}

/// Rows of a tab, filtered and sorted per the query without touching the
/// stored sort/filter.
pub async fn list_rows(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RowsQuery>,
) -> Result<Json<SheetResponse>, ApiError> {
    let storage = state.storage.clone();
    let mut response = blocking_result(move || {
        let (workspace, tab, mut sheet) = open_tab(storage, query.tab.as_deref())?;
        let target = query.filter_target(&sheet).map_err(ServiceError::InvalidInput)?;
        if query.wants_sort() {
            let column_id = query.sort_column(&sheet).map_err(ServiceError::InvalidInput)?;
            let direction = query.direction().map_err(ServiceError::InvalidInput)?;
            sheet.sort = SortState { column_id, direction };
            sort_sheet(&mut sheet);
        }
        let filter = FilterState { column_id: target, query: query.query.clone() };
        let rows = filter_rows(&sheet, &filter);
        let hidden = workspace.schema().overrides.hidden_columns(&tab.id);
        Ok(SheetResponse::build(&tab, &sheet, &rows, hidden))
    })
    .await?;
    resolve_photo_urls(state.cloud.as_deref(), &mut response, true).await;
    Ok(Json(response))
}

pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<Vec<EventLogEntry>>, ApiError> {
    let storage = state.storage.clone();
    blocking_json(move || {
        let entries = storage.load_event_log()?;
        Ok(entries.into_iter().filter(|e| e.matches(&query.q)).take(query.capped_limit()).collect())
    })
    .await
}

/// CSV download of a whole tab, photo columns excluded.
pub async fn export_csv(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TabQuery>,
) -> Result<Response, ApiError> {
    let storage = state.storage.clone();
    let text = blocking_result(move || {
        let (_, _, sheet) = open_tab(storage, query.tab.as_deref())?;
        Ok(csv_io::export_csv(&sheet)?)
    })
    .await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{CSV_FILENAME}\"")),
        ],
        text,
    )
        .into_response())
}
