use chrono::Utc;
use rusqlite::{OptionalExtension as _, params};
use shirt_tracker_core::create_id;
use shirt_tracker_core::photo::ImageBlob;

use super::{Storage, get_conn, log_row_error};
use crate::error::{Result, StorageError};

/// A photo blob held on this device, referenced from cells as `idb:<id>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPhoto {
    pub id: String,
    pub blob: ImageBlob,
}

impl Storage {
    /// Store an image and return its new id.
    ///
    /// # Errors
    /// Returns error if the database write fails.
    pub fn save_photo(&self, blob: &ImageBlob) -> Result<String> {
        let id = create_id();
        let conn = get_conn(&self.pool)?;
        conn.execute(
            "INSERT INTO photos (id, content_type, bytes, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![id, blob.content_type, blob.bytes, Utc::now().to_rfc3339()],
        )?;
        tracing::debug!(photo_id = %id, size = blob.bytes.len(), "Saved photo");
        Ok(id)
    }

    /// # Errors
    /// Returns error if the database query fails.
    pub fn get_photo(&self, id: &str) -> Result<Option<StoredPhoto>> {
        let conn = get_conn(&self.pool)?;
        let photo = conn
            .query_row(
                "SELECT content_type, bytes FROM photos WHERE id = ?1",
                params![id],
                |row| {
                    Ok(StoredPhoto {
                        id: id.to_owned(),
                        blob: ImageBlob { content_type: row.get(0)?, bytes: row.get(1)? },
                    })
                },
            )
            .optional()?;
        Ok(photo)
    }

    /// Like [`Storage::get_photo`], but a missing photo is an error.
    ///
    /// # Errors
    /// Returns `NotFound` when no photo has this id.
    pub fn require_photo(&self, id: &str) -> Result<StoredPhoto> {
        self.get_photo(id)?.ok_or_else(|| StorageError::NotFound { entity: "photo", id: id.to_owned() })
    }

    /// # Errors
    /// Returns error if the database write fails.
    pub fn delete_photo(&self, id: &str) -> Result<bool> {
        let conn = get_conn(&self.pool)?;
        Ok(conn.execute("DELETE FROM photos WHERE id = ?1", params![id])? > 0)
    }

    /// Remember the bucket path a photo was uploaded to.
    ///
    /// # Errors
    /// Returns error if the database write fails.
    pub fn set_photo_remote_path(&self, id: &str, path: &str) -> Result<bool> {
        let conn = get_conn(&self.pool)?;
        Ok(conn.execute("UPDATE photos SET remote_path = ?2 WHERE id = ?1", params![id, path])? > 0)
    }

    /// Bucket path of an already uploaded photo.
    ///
    /// # Errors
    /// Returns error if the database query fails.
    pub fn photo_remote_path(&self, id: &str) -> Result<Option<String>> {
        let conn = get_conn(&self.pool)?;
        let path: Option<Option<String>> = conn
            .query_row("SELECT remote_path FROM photos WHERE id = ?1", params![id], |row| row.get(0))
            .optional()?;
        Ok(path.flatten())
    }

    /// # Errors
    /// Returns error if the database query fails.
    pub fn photo_ids(&self) -> Result<Vec<String>> {
        let conn = get_conn(&self.pool)?;
        let mut stmt = conn.prepare("SELECT id FROM photos ORDER BY created_at")?;
        let ids = stmt.query_map([], |row| row.get(0))?.filter_map(log_row_error).collect();
        Ok(ids)
    }
}
