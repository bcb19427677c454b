//! Cloud backend abstraction trait
//!
//! The sync service talks to the cloud only through this trait so it can be
//! driven by an in-memory fake in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shirt_tracker_core::photo::ImageBlob;
use shirt_tracker_core::CloudPayload;

use crate::client::SupabaseClient;
use crate::error::Result;
use crate::types::StateRow;

#[async_trait]
pub trait CloudBackend: Send + Sync {
    /// Replace the user's document.
    async fn upsert_state(&self, user_id: &str, payload: &CloudPayload, updated_at: DateTime<Utc>) -> Result<()>;

    async fn fetch_state(&self, user_id: &str) -> Result<Option<StateRow>>;

    async fn fetch_updated_at(&self, user_id: &str) -> Result<Option<DateTime<Utc>>>;

    /// Look up a document by its public share token, without auth.
    async fn fetch_shared(&self, token: &str) -> Result<Option<StateRow>>;

    async fn upload_object(&self, path: &str, blob: &ImageBlob) -> Result<()>;

    /// Displayable URL for a stored object.
    async fn photo_url(&self, path: &str) -> Result<String>;
}

#[async_trait]
impl CloudBackend for SupabaseClient {
    async fn upsert_state(&self, user_id: &str, payload: &CloudPayload, updated_at: DateTime<Utc>) -> Result<()> {
        Self::upsert_state(self, user_id, payload, updated_at).await
    }

    async fn fetch_state(&self, user_id: &str) -> Result<Option<StateRow>> {
        Self::fetch_state(self, user_id).await
    }

    async fn fetch_updated_at(&self, user_id: &str) -> Result<Option<DateTime<Utc>>> {
        Self::fetch_updated_at(self, user_id).await
    }

    async fn fetch_shared(&self, token: &str) -> Result<Option<StateRow>> {
        Self::fetch_shared(self, token).await
    }

    async fn upload_object(&self, path: &str, blob: &ImageBlob) -> Result<()> {
        Self::upload_object(self, path, blob).await
    }

    async fn photo_url(&self, path: &str) -> Result<String> {
        Self::photo_url(self, path).await
    }
}
