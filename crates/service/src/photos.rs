//! Uploading device-only photos (`idb:` and inline `data:` cells, tab logos)
//! to the remote bucket once a user is signed in.
//!
//! Runs before every upload: a loaded `Workspace` may write `idb:` cells
//! back after a pass, and those must not reach the cloud document.

use std::collections::BTreeMap;

use shirt_tracker_cloud::CloudBackend;
use shirt_tracker_core::photo::{
    ImageBlob, PhotoRef, decode_data_url, extension_for, logo_object_path, photo_object_path,
    remote_ref,
};
use shirt_tracker_core::{AppMode, SheetState};
use shirt_tracker_storage::Storage;

use crate::blocking;
use crate::error::Result;

/// Counts from one migration pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhotoMigration {
    pub uploaded: usize,
    /// Photos left device-only because reading or uploading them failed.
    pub failed: usize,
}

fn device_blob(storage: &Storage, reference: PhotoRef<'_>) -> Result<Option<ImageBlob>> {
    match reference {
        PhotoRef::Local(id) => Ok(storage.get_photo(id)?.map(|p| p.blob)),
        PhotoRef::Inline(url) => Ok(Some(decode_data_url(url)?)),
        PhotoRef::Remote(_) | PhotoRef::External(_) => Ok(None),
    }
}

/// Upload one device-only reference; returns the `supa:` reference, or
/// `None` when the value is not device-only or its blob is gone.
///
/// A stored photo is uploaded once; later passes reuse its recorded path.
async fn upload_reference(
    storage: &Storage,
    cloud: &dyn CloudBackend,
    value: &str,
    object_path: impl FnOnce(&str) -> String,
) -> Result<Option<String>> {
    let Some(reference) = PhotoRef::parse(value).filter(PhotoRef::is_device_only) else {
        return Ok(None);
    };
    let local_id = match reference {
        PhotoRef::Local(id) => Some(id.to_owned()),
        _ => None,
    };
    if let Some(id) = local_id.clone() {
        let lookup = storage.clone();
        if let Some(path) = blocking(move || Ok(lookup.photo_remote_path(&id)?)).await? {
            return Ok(Some(remote_ref(&path)));
        }
    }

    let lookup = storage.clone();
    let owned = value.to_owned();
    let blob = blocking(move || match PhotoRef::parse(&owned) {
        Some(reference) => device_blob(&lookup, reference),
        None => Ok(None),
    })
    .await?;
    let Some(blob) = blob else {
        tracing::warn!(reference = ?reference, "Photo blob missing from the local store");
        return Ok(None);
    };
    let path = object_path(extension_for(&blob.content_type));
    cloud.upload_object(&path, &blob).await?;
    if let Some(id) = local_id {
        let writer = storage.clone();
        let recorded = path.clone();
        blocking(move || Ok(writer.set_photo_remote_path(&id, &recorded)?)).await?;
    }
    Ok(Some(remote_ref(&path)))
}

async fn migrate_sheet(
    storage: &Storage,
    cloud: &dyn CloudBackend,
    user_id: &str,
    sheet: &mut SheetState,
    stats: &mut PhotoMigration,
) -> bool {
    let photo_columns: Vec<String> =
        sheet.columns.iter().filter(|c| c.is_photo_column()).map(|c| c.id.clone()).collect();
    let mut changed = false;
    for row in &mut sheet.rows {
        for column_id in &photo_columns {
            let value = row.cell(column_id).to_owned();
            match upload_reference(storage, cloud, &value, |ext| photo_object_path(user_id, ext)).await {
                Ok(Some(remote)) => {
                    row.set_cell(column_id, remote);
                    stats.uploaded += 1;
                    changed = true;
                },
                Ok(None) => {},
                Err(e) => {
                    tracing::warn!(row_id = %row.id, "Photo upload failed: {}", e);
                    stats.failed += 1;
                },
            }
        }
    }
    changed
}

/// Upload every device-only photo in every stored sheet of both modes, plus
/// tab logos, rewriting the cells to `supa:` references.
///
/// Individual failures are logged and counted; the photo stays local and
/// is retried on the next pass.
pub async fn upload_device_photos(
    storage: &Storage,
    cloud: &dyn CloudBackend,
    user_id: &str,
) -> Result<PhotoMigration> {
    let mut stats = PhotoMigration::default();

    for mode in [AppMode::Inventory, AppMode::Wishlist] {
        let reader = storage.clone();
        let tab_ids = blocking(move || Ok(reader.sheet_tab_ids(mode)?)).await?;
        for tab_id in tab_ids {
            let reader = storage.clone();
            let key = tab_id.clone();
            let Some(mut sheet) = blocking(move || Ok(reader.load_sheet(mode, Some(&key))?)).await? else {
                continue;
            };
            if migrate_sheet(storage, cloud, user_id, &mut sheet, &mut stats).await {
                let writer = storage.clone();
                blocking(move || Ok(writer.save_sheet(mode, Some(&tab_id), &sheet)?)).await?;
            }
        }
    }

    let reader = storage.clone();
    let mut logos: BTreeMap<String, String> = blocking(move || Ok(reader.load_tab_logos()?)).await?;
    let mut logos_changed = false;
    for (tab_id, value) in &mut logos {
        match upload_reference(storage, cloud, value, |ext| logo_object_path(user_id, ext)).await {
            Ok(Some(remote)) => {
                *value = remote;
                stats.uploaded += 1;
                logos_changed = true;
            },
            Ok(None) => {},
            Err(e) => {
                tracing::warn!(tab_id = %tab_id, "Logo upload failed: {}", e);
                stats.failed += 1;
            },
        }
    }
    if logos_changed {
        let writer = storage.clone();
        blocking(move || Ok(writer.save_tab_logos(&logos)?)).await?;
    }

    if stats.uploaded > 0 || stats.failed > 0 {
        tracing::info!(uploaded = stats.uploaded, failed = stats.failed, "Photo migration finished");
    }
    Ok(stats)
}
