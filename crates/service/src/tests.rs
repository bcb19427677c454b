use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shirt_tracker_cloud::{CloudBackend, CloudError, StateRow};
use shirt_tracker_core::photo::ImageBlob;
use shirt_tracker_core::CloudPayload;
use shirt_tracker_storage::Storage;
use tempfile::TempDir;

#[expect(clippy::unwrap_used, reason = "test code")]
pub(crate) fn create_test_storage() -> (Storage, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let storage = Storage::new(&db_path).unwrap();
    (storage, temp_dir)
}

#[derive(Default)]
struct FakeState {
    rows: BTreeMap<String, StateRow>,
    upserts: usize,
    uploaded: Vec<String>,
}

/// In-memory cloud: one document per user, uploads recorded by path.
#[derive(Default)]
pub(crate) struct FakeCloud {
    state: Mutex<FakeState>,
    fail_uploads: bool,
    upsert_delay: Option<Duration>,
}

impl FakeCloud {
    pub(crate) fn failing_uploads() -> Self {
        Self { fail_uploads: true, ..Self::default() }
    }

    /// Every document upsert takes `delay` before it lands.
    pub(crate) fn slow_upserts(delay: Duration) -> Self {
        Self { upsert_delay: Some(delay), ..Self::default() }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn put_row(&self, row: StateRow) {
        self.lock().rows.insert(row.user_id.clone(), row);
    }

    pub(crate) fn row(&self, user_id: &str) -> Option<StateRow> {
        self.lock().rows.get(user_id).cloned()
    }

    pub(crate) fn upsert_count(&self) -> usize {
        self.lock().upserts
    }

    pub(crate) fn uploaded_paths(&self) -> Vec<String> {
        self.lock().uploaded.clone()
    }
}

#[async_trait]
impl CloudBackend for FakeCloud {
    async fn upsert_state(
        &self,
        user_id: &str,
        payload: &CloudPayload,
        updated_at: DateTime<Utc>,
    ) -> shirt_tracker_cloud::Result<()> {
        if let Some(delay) = self.upsert_delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.lock();
        state.upserts += 1;
        state.rows.insert(
            user_id.to_owned(),
            StateRow { user_id: user_id.to_owned(), data: payload.clone(), updated_at },
        );
        Ok(())
    }

    async fn fetch_state(&self, user_id: &str) -> shirt_tracker_cloud::Result<Option<StateRow>> {
        Ok(self.row(user_id))
    }

    async fn fetch_updated_at(&self, user_id: &str) -> shirt_tracker_cloud::Result<Option<DateTime<Utc>>> {
        Ok(self.row(user_id).map(|r| r.updated_at))
    }

    async fn fetch_shared(&self, token: &str) -> shirt_tracker_cloud::Result<Option<StateRow>> {
        Ok(self
            .lock()
            .rows
            .values()
            .find(|r| r.data.public_share_id.as_deref() == Some(token))
            .cloned())
    }

    async fn upload_object(&self, path: &str, _blob: &ImageBlob) -> shirt_tracker_cloud::Result<()> {
        if self.fail_uploads {
            return Err(CloudError::HttpStatus { code: 503, body: "unavailable".into() });
        }
        self.lock().uploaded.push(path.to_owned());
        Ok(())
    }

    async fn photo_url(&self, path: &str) -> shirt_tracker_cloud::Result<String> {
        Ok(format!("https://storage.test/{path}"))
    }
}
