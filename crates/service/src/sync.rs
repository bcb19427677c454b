//! Debounced upload of local state to the cloud, pull on sign-in and the
//! backup status lines.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use shirt_tracker_cloud::CloudBackend;
use shirt_tracker_core::backup::{StatusLine, cloud_status, unsaved_status, verify_backup};
use shirt_tracker_core::constants::{
    CURRENT_USER_KEY, LAST_CHANGE_KEY, LAST_CLOUD_UPDATE_KEY, LAST_SYNC_KEY, SYNC_DEBOUNCE_MS,
};
use shirt_tracker_core::env_config::env_parse_with_default;
use shirt_tracker_storage::Storage;
use tokio::task::JoinHandle;

use crate::blocking;
use crate::error::Result;
use crate::payload::{apply_payload, build_payload};
use crate::photos::upload_device_photos;
use crate::workspace::{ChangeListener, Workspace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Uploaded(DateTime<Utc>),
    /// Nothing changed since the last upload.
    UpToDate,
    SignedOut,
    /// Another upload is running; the change is picked up after it.
    InProgress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    /// The cloud document was written into local storage.
    Applied { updated_at: DateTime<Utc> },
    /// No cloud document yet; local state was uploaded instead.
    UploadedLocal(SyncOutcome),
    /// Local data was replaced with defaults and uploaded.
    FreshStart(SyncOutcome),
    SignedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupStatus {
    pub unsaved: StatusLine,
    pub cloud: String,
}

struct SyncInner {
    storage: Storage,
    cloud: Option<Arc<dyn CloudBackend>>,
    user_id: Option<String>,
    debounce: Duration,
    is_syncing: AtomicBool,
    dirty: AtomicBool,
    pending: Mutex<Option<JoinHandle<()>>>,
}

/// Clears the in-flight flag however the upload ends.
struct SyncingGuard<'a>(&'a AtomicBool);

impl Drop for SyncingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Clone)]
pub struct SyncService {
    inner: Arc<SyncInner>,
}

impl std::fmt::Debug for SyncService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncService")
            .field("user_id", &self.inner.user_id)
            .field("debounce", &self.inner.debounce)
            .field("is_syncing", &self.inner.is_syncing.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl SyncService {
    /// Debounce comes from `SHIRT_TRACKER_SYNC_DEBOUNCE_MS`, default 1200 ms.
    pub fn new(storage: Storage, cloud: Option<Arc<dyn CloudBackend>>, user_id: Option<String>) -> Self {
        let debounce_ms = env_parse_with_default("SHIRT_TRACKER_SYNC_DEBOUNCE_MS", SYNC_DEBOUNCE_MS);
        Self::with_debounce(storage, cloud, user_id, Duration::from_millis(debounce_ms))
    }

    pub fn with_debounce(
        storage: Storage,
        cloud: Option<Arc<dyn CloudBackend>>,
        user_id: Option<String>,
        debounce: Duration,
    ) -> Self {
        let user_id = user_id.map(|u| u.trim().to_owned()).filter(|u| !u.is_empty());
        Self {
            inner: Arc::new(SyncInner {
                storage,
                cloud,
                user_id,
                debounce,
                is_syncing: AtomicBool::new(false),
                dirty: AtomicBool::new(false),
                pending: Mutex::new(None),
            }),
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.signed_in().is_some()
    }

    fn signed_in(&self) -> Option<(Arc<dyn CloudBackend>, String)> {
        match (&self.inner.cloud, &self.inner.user_id) {
            (Some(cloud), Some(user)) => Some((Arc::clone(cloud), user.clone())),
            _ => None,
        }
    }

    fn take_pending(&self) -> Option<JoinHandle<()>> {
        self.inner.pending.lock().unwrap_or_else(PoisonError::into_inner).take()
    }

    /// Queue an upload after the debounce delay; a newer call replaces a
    /// timer that has not fired yet.
    pub fn schedule(&self) {
        if !self.is_signed_in() {
            return;
        }
        self.inner.dirty.store(true, Ordering::Release);
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("No async runtime; upload deferred to the next flush");
            return;
        };
        let service = self.clone();
        let delay = self.inner.debounce;
        let task = handle.spawn(async move {
            loop {
                tokio::time::sleep(delay).await;
                match service.sync_now().await {
                    Ok(SyncOutcome::InProgress) => continue,
                    Ok(_) => break,
                    Err(e) => {
                        tracing::warn!("Cloud sync failed: {}", e);
                        break;
                    },
                }
            }
        });
        let previous = self.inner.pending.lock().unwrap_or_else(PoisonError::into_inner).replace(task);
        if let Some(previous) = previous {
            if !self.inner.is_syncing.load(Ordering::Acquire) {
                previous.abort();
            }
        }
    }

    /// Upload now if anything is waiting, without the debounce delay.
    pub async fn flush(&self) -> Result<SyncOutcome> {
        if let Some(task) = self.take_pending() {
            if self.inner.is_syncing.load(Ordering::Acquire) {
                if let Err(e) = task.await {
                    tracing::debug!("Pending sync task ended: {}", e);
                }
            } else {
                task.abort();
            }
        }
        if !self.is_signed_in() {
            return Ok(SyncOutcome::SignedOut);
        }
        while self.inner.is_syncing.load(Ordering::Acquire) {
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        if !self.inner.dirty.load(Ordering::Acquire) {
            return Ok(SyncOutcome::UpToDate);
        }
        self.sync_now().await
    }

    /// Build the payload from storage and replace the cloud document.
    ///
    /// Device-only photos are uploaded first so the document never carries
    /// `idb:` or `data:` references; already uploaded photos are not sent
    /// again.
    pub async fn sync_now(&self) -> Result<SyncOutcome> {
        let Some((cloud, user_id)) = self.signed_in() else {
            return Ok(SyncOutcome::SignedOut);
        };
        if self.inner.is_syncing.swap(true, Ordering::AcqRel) {
            return Ok(SyncOutcome::InProgress);
        }
        let _guard = SyncingGuard(&self.inner.is_syncing);
        self.inner.dirty.store(false, Ordering::Release);

        if let Err(e) = upload_device_photos(&self.inner.storage, cloud.as_ref(), &user_id).await {
            tracing::warn!("Photo migration failed: {}", e);
        }

        let storage = self.inner.storage.clone();
        let payload = blocking(move || build_payload(&storage)).await?;
        let now = Utc::now();
        if let Err(e) = cloud.upsert_state(&user_id, &payload, now).await {
            self.inner.dirty.store(true, Ordering::Release);
            return Err(e.into());
        }

        let storage = self.inner.storage.clone();
        blocking(move || {
            storage.set_timestamp(LAST_SYNC_KEY, now)?;
            storage.set_timestamp(LAST_CLOUD_UPDATE_KEY, now)?;
            Ok(())
        })
        .await?;
        tracing::info!(user_id = %user_id, tabs = payload.inventory.tabs.len(), "Synced state to cloud");
        Ok(SyncOutcome::Uploaded(now))
    }

    /// Load the signed-in user's cloud document into local storage.
    ///
    /// `fresh` wipes local data, starts from defaults and uploads those.
    /// Without a cloud document the local state is uploaded as is. A loaded
    /// [`Workspace`] must be reloaded afterwards.
    pub async fn pull(&self, fresh: bool) -> Result<PullOutcome> {
        let Some((cloud, user_id)) = self.signed_in() else {
            return Ok(PullOutcome::SignedOut);
        };

        if fresh {
            let storage = self.inner.storage.clone();
            blocking(move || {
                let removed = storage.clear_except(&[CURRENT_USER_KEY])?;
                tracing::info!(removed, "Fresh start requested; cleared local data");
                Workspace::open(storage)?;
                Ok(())
            })
            .await?;
            self.inner.dirty.store(true, Ordering::Release);
            return Ok(PullOutcome::FreshStart(self.sync_now().await?));
        }

        match cloud.fetch_state(&user_id).await? {
            Some(row) => {
                let storage = self.inner.storage.clone();
                let updated_at = row.updated_at;
                blocking(move || {
                    storage.set_timestamp(LAST_CLOUD_UPDATE_KEY, updated_at)?;
                    apply_payload(&storage, &row.data)
                })
                .await?;
                Ok(PullOutcome::Applied { updated_at })
            },
            None => {
                tracing::info!(user_id = %user_id, "No cloud state yet; uploading local state");
                let storage = self.inner.storage.clone();
                blocking(move || Workspace::open(storage).map(drop)).await?;
                self.inner.dirty.store(true, Ordering::Release);
                Ok(PullOutcome::UploadedLocal(self.sync_now().await?))
            },
        }
    }

    /// Ask the cloud for its last update and compare it with the last
    /// local sync. The cloud time is remembered for [`SyncService::status`].
    pub async fn verify_backup(&self) -> Result<StatusLine> {
        let Some((cloud, user_id)) = self.signed_in() else {
            return Ok(StatusLine::alert("Sign in to check cloud backup."));
        };
        let cloud_at = cloud.fetch_updated_at(&user_id).await?;
        let storage = self.inner.storage.clone();
        let local_sync = blocking(move || {
            if let Some(at) = cloud_at {
                storage.set_timestamp(LAST_CLOUD_UPDATE_KEY, at)?;
            }
            Ok(storage.get_timestamp(LAST_SYNC_KEY)?)
        })
        .await?;
        Ok(verify_backup(cloud_at, local_sync))
    }

    /// Status lines from stored timestamps only.
    pub fn status(&self) -> Result<BackupStatus> {
        let storage = &self.inner.storage;
        let unsaved = unsaved_status(
            self.is_signed_in(),
            storage.get_timestamp(LAST_CHANGE_KEY)?,
            storage.get_timestamp(LAST_SYNC_KEY)?,
        );
        let cloud = cloud_status(storage.get_timestamp(LAST_CLOUD_UPDATE_KEY)?);
        Ok(BackupStatus { unsaved, cloud })
    }
}

impl ChangeListener for SyncService {
    fn state_saved(&self) {
        self.schedule();
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration as ChronoDuration;
    use shirt_tracker_cloud::StateRow;
    use shirt_tracker_core::backup::StatusLevel;
    use shirt_tracker_core::photo::ImageBlob;
    use shirt_tracker_core::AppMode;

    use super::*;
    use crate::tests::{FakeCloud, create_test_storage};

    fn signed_in(storage: &Storage, cloud: &Arc<FakeCloud>) -> SyncService {
        let backend: Arc<dyn CloudBackend> = Arc::clone(cloud) as Arc<dyn CloudBackend>;
        SyncService::with_debounce(storage.clone(), Some(backend), Some("user-1".into()), Duration::from_millis(40))
    }

    #[tokio::test]
    async fn test_rapid_changes_upload_once() {
        let (storage, _dir) = create_test_storage();
        let cloud = Arc::new(FakeCloud::default());
        let sync = signed_in(&storage, &cloud);
        let mut workspace = Workspace::open(storage.clone()).unwrap().with_listener(Arc::new(sync.clone()));

        let row_id = workspace.sheet().rows[0].id.clone();
        let name_id = workspace.resolve_column("Name").unwrap().id.clone();
        for name in ["B", "Bl", "Blue"] {
            workspace.update_cell(&row_id, &name_id, name).unwrap();
        }
        tokio::time::sleep(Duration::from_millis(400)).await;

        assert_eq!(cloud.upsert_count(), 1);
        let row = cloud.row("user-1").unwrap();
        let sheet = &row.data.inventory.tab_states[workspace.active_tab_id().unwrap()];
        assert_eq!(sheet.rows[0].cell(&name_id), "Blue");
        assert!(storage.get_timestamp(LAST_SYNC_KEY).unwrap().is_some());
        assert_eq!(sync.flush().await.unwrap(), SyncOutcome::UpToDate);
    }

    #[tokio::test]
    async fn test_flush_uploads_without_waiting() {
        let (storage, _dir) = create_test_storage();
        let cloud = Arc::new(FakeCloud::default());
        let sync = signed_in(&storage, &cloud);
        let mut workspace = Workspace::open(storage.clone()).unwrap().with_listener(Arc::new(sync.clone()));
        workspace.add_row().unwrap();

        assert!(matches!(sync.flush().await.unwrap(), SyncOutcome::Uploaded(_)));
        assert_eq!(cloud.upsert_count(), 1);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(cloud.upsert_count(), 1);
    }

    #[tokio::test]
    async fn test_second_upload_reports_in_progress() {
        let (storage, _dir) = create_test_storage();
        let cloud = Arc::new(FakeCloud::slow_upserts(Duration::from_millis(200)));
        let sync = signed_in(&storage, &cloud);
        Workspace::open(storage.clone()).unwrap();

        let running = sync.clone();
        let first = tokio::spawn(async move { running.sync_now().await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(sync.sync_now().await.unwrap(), SyncOutcome::InProgress);

        assert!(matches!(first.await.unwrap().unwrap(), SyncOutcome::Uploaded(_)));
        assert_eq!(cloud.upsert_count(), 1);
    }

    #[tokio::test]
    async fn test_debounced_change_waits_for_running_upload() {
        let (storage, _dir) = create_test_storage();
        let cloud = Arc::new(FakeCloud::slow_upserts(Duration::from_millis(150)));
        let sync = signed_in(&storage, &cloud);
        let mut workspace = Workspace::open(storage.clone()).unwrap().with_listener(Arc::new(sync.clone()));
        let row_id = workspace.sheet().rows[0].id.clone();
        let name_id = workspace.resolve_column("Name").unwrap().id.clone();

        let running = sync.clone();
        let first = tokio::spawn(async move { running.sync_now().await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        workspace.update_cell(&row_id, &name_id, "Late Edit").unwrap();

        assert!(matches!(first.await.unwrap().unwrap(), SyncOutcome::Uploaded(_)));
        tokio::time::sleep(Duration::from_millis(600)).await;

        assert_eq!(cloud.upsert_count(), 2);
        let row = cloud.row("user-1").unwrap();
        let sheet = &row.data.inventory.tab_states[workspace.active_tab_id().unwrap()];
        assert_eq!(sheet.rows[0].cell(&name_id), "Late Edit");
        assert_eq!(sync.flush().await.unwrap(), SyncOutcome::UpToDate);
    }

    #[tokio::test]
    async fn test_edit_after_sync_keeps_uploaded_photo() {
        let (storage, _dir) = create_test_storage();
        let cloud = Arc::new(FakeCloud::default());
        let sync = signed_in(&storage, &cloud);
        let mut workspace = Workspace::open(storage.clone()).unwrap().with_listener(Arc::new(sync.clone()));
        let row_id = workspace.sheet().rows[0].id.clone();
        let name_id = workspace.resolve_column("Name").unwrap().id.clone();
        let preview = workspace.resolve_column("Preview").unwrap().id.clone();
        let blob = ImageBlob { content_type: "image/png".into(), bytes: vec![1, 2, 3] };
        workspace.attach_photo(&row_id, &preview, &blob).unwrap();

        let tab = workspace.active_tab_id().unwrap().to_owned();
        let cloud_cell = || {
            let row = cloud.row("user-1").unwrap();
            row.data.inventory.tab_states[tab.as_str()].rows[0].cell(&preview).to_owned()
        };

        assert!(matches!(sync.flush().await.unwrap(), SyncOutcome::Uploaded(_)));
        let first = cloud_cell();
        assert!(first.starts_with("supa:user-1/"));

        workspace.update_cell(&row_id, &name_id, "Blue Hoodie").unwrap();
        assert!(matches!(sync.flush().await.unwrap(), SyncOutcome::Uploaded(_)));
        assert_eq!(cloud_cell(), first);
        assert_eq!(cloud.uploaded_paths().len(), 1);
    }

    #[tokio::test]
    async fn test_signed_out_never_uploads() {
        let (storage, _dir) = create_test_storage();
        let sync = SyncService::with_debounce(storage.clone(), None, None, Duration::from_millis(10));
        let mut workspace = Workspace::open(storage.clone()).unwrap().with_listener(Arc::new(sync.clone()));
        workspace.add_row().unwrap();

        assert_eq!(sync.flush().await.unwrap(), SyncOutcome::SignedOut);
        assert_eq!(sync.pull(false).await.unwrap(), PullOutcome::SignedOut);
        let status = sync.status().unwrap();
        assert_eq!(status.unsaved.message, "Sign in to save and sync.");
        assert_eq!(sync.verify_backup().await.unwrap().level, StatusLevel::Alert);
    }

    #[tokio::test]
    async fn test_pull_applies_cloud_state() {
        let (source, _a) = create_test_storage();
        let mut workspace = Workspace::open(source.clone()).unwrap();
        workspace.add_tab("Hoodies").unwrap();
        let payload = crate::payload::build_payload(&source).unwrap();
        let hour_ago = Utc::now() - ChronoDuration::hours(1);
        let updated_at = DateTime::from_timestamp_millis(hour_ago.timestamp_millis()).unwrap();
        let cloud = Arc::new(FakeCloud::default());
        cloud.put_row(StateRow { user_id: "user-1".into(), data: payload, updated_at });

        let (storage, _b) = create_test_storage();
        let sync = signed_in(&storage, &cloud);
        assert_eq!(sync.pull(false).await.unwrap(), PullOutcome::Applied { updated_at });
        let pulled = Workspace::open(storage.clone()).unwrap();
        assert_eq!(pulled.tabs().tabs.len(), 2);
        assert!(pulled.tabs().tabs.iter().any(|t| t.name == "Hoodies"));
        assert_eq!(storage.get_timestamp(LAST_CLOUD_UPDATE_KEY).unwrap(), Some(updated_at));
        assert_eq!(cloud.upsert_count(), 0);
    }

    #[tokio::test]
    async fn test_pull_without_cloud_state_uploads_local() {
        let (storage, _dir) = create_test_storage();
        let mut workspace = Workspace::open(storage.clone()).unwrap();
        workspace.add_tab("Keep Me").unwrap();
        let cloud = Arc::new(FakeCloud::default());
        let sync = signed_in(&storage, &cloud);

        let outcome = sync.pull(false).await.unwrap();
        assert!(matches!(outcome, PullOutcome::UploadedLocal(SyncOutcome::Uploaded(_))));
        let row = cloud.row("user-1").unwrap();
        assert!(row.data.inventory.tabs.iter().any(|t| t.name == "Keep Me"));
    }

    #[tokio::test]
    async fn test_fresh_start_replaces_local_data() {
        let (storage, _dir) = create_test_storage();
        storage.set_current_user("user-1").unwrap();
        let mut workspace = Workspace::open(storage.clone()).unwrap();
        workspace.add_tab("Old").unwrap();
        workspace.switch_mode(AppMode::Wishlist).unwrap();
        let cloud = Arc::new(FakeCloud::default());
        let sync = signed_in(&storage, &cloud);

        let outcome = sync.pull(true).await.unwrap();
        assert!(matches!(outcome, PullOutcome::FreshStart(SyncOutcome::Uploaded(_))));
        let fresh = Workspace::open(storage.clone()).unwrap();
        assert_eq!(fresh.mode(), AppMode::Inventory);
        assert_eq!(fresh.tabs().tabs.len(), 1);
        assert_eq!(storage.current_user().unwrap().as_deref(), Some("user-1"));
        assert!(cloud.row("user-1").unwrap().data.wishlist.is_none());
    }

    #[tokio::test]
    async fn test_verify_backup_tolerance() {
        let (storage, _dir) = create_test_storage();
        let cloud = Arc::new(FakeCloud::default());
        let sync = signed_in(&storage, &cloud);
        assert_eq!(sync.verify_backup().await.unwrap().message, "No cloud backup found yet.");

        Workspace::open(storage.clone()).unwrap();
        let SyncOutcome::Uploaded(at) = sync.sync_now().await.unwrap() else {
            panic!("expected an upload");
        };
        let line = sync.verify_backup().await.unwrap();
        assert_eq!(line.level, StatusLevel::Ok);
        assert!(line.message.starts_with("Cloud backup OK."));

        storage.set_timestamp(LAST_SYNC_KEY, at + ChronoDuration::minutes(5)).unwrap();
        let line = sync.verify_backup().await.unwrap();
        assert_eq!(line.level, StatusLevel::Alert);
        assert!(line.message.starts_with("Local changes not in cloud yet."));
    }

    #[tokio::test]
    async fn test_status_reports_unsaved_changes() {
        let (storage, _dir) = create_test_storage();
        let cloud = Arc::new(FakeCloud::default());
        let sync = signed_in(&storage, &cloud);
        let now = Utc::now();
        storage.set_timestamp(LAST_SYNC_KEY, now - ChronoDuration::minutes(10)).unwrap();
        storage.set_timestamp(LAST_CHANGE_KEY, now).unwrap();

        let status = sync.status().unwrap();
        assert_eq!(status.unsaved.level, StatusLevel::Alert);
        assert_eq!(status.cloud, "Cloud backup not checked yet.");
    }
}
