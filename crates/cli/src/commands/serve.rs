use std::sync::Arc;

use anyhow::Result;
use shirt_tracker_http::{AppState, create_router};

use super::AppContext;

pub(crate) async fn run(ctx: AppContext, port: u16, host: String) -> Result<()> {
    let state = Arc::new(AppState { storage: ctx.storage, cloud: ctx.cloud });
    let router = create_router(state);
    let addr = format!("{host}:{port}");
    tracing::info!("Starting viewer on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}
