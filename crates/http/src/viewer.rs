//! Embedded single-page viewer served at `/`.
//!
//! Lists the tabs, renders the selected sheet with filter and sort controls,
//! links the CSV export, and shows a shared sheet when opened with
//! `?share=<token>`.

use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};

pub const VIEWER_HTML: &str = include_str!("viewer.html");

pub async fn serve_viewer() -> Response {
    (StatusCode::OK, [(header::CONTENT_TYPE, "text/html; charset=utf-8")], Html(VIEWER_HTML)).into_response()
}
