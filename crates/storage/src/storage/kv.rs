use chrono::Utc;
use rusqlite::{OptionalExtension as _, params};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{Storage, get_conn, log_row_error};
use crate::error::Result;

impl Storage {
    /// Raw string stored under `key`.
    ///
    /// # Errors
    /// Returns error if the database query fails.
    pub fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let conn = get_conn(&self.pool)?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    /// # Errors
    /// Returns error if the database write fails.
    pub fn set_raw(&self, key: &str, value: &str) -> Result<()> {
        let conn = get_conn(&self.pool)?;
        conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Returns whether the key existed.
    ///
    /// # Errors
    /// Returns error if the database write fails.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let conn = get_conn(&self.pool)?;
        let removed = conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(removed > 0)
    }

    /// Every stored key starting with `prefix`, sorted.
    ///
    /// # Errors
    /// Returns error if the database query fails.
    pub fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let conn = get_conn(&self.pool)?;
        let mut stmt = conn.prepare("SELECT key FROM kv WHERE substr(key, 1, ?2) = ?1 ORDER BY key")?;
        let keys = stmt
            .query_map(params![prefix, prefix.chars().count()], |row| row.get(0))?
            .filter_map(log_row_error)
            .collect();
        Ok(keys)
    }

    /// Delete every key except those listed. Returns the number removed.
    ///
    /// # Errors
    /// Returns error if the database write fails.
    pub fn clear_except(&self, keep: &[&str]) -> Result<usize> {
        let mut conn = get_conn(&self.pool)?;
        let tx = conn.transaction()?;
        let keys: Vec<String> = {
            let mut stmt = tx.prepare("SELECT key FROM kv")?;
            stmt.query_map([], |row| row.get(0))?.filter_map(log_row_error).collect()
        };
        let mut removed = 0;
        for key in keys.iter().filter(|k| !keep.contains(&k.as_str())) {
            removed += tx.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        }
        tx.commit()?;
        Ok(removed)
    }

    /// Decode the JSON stored under `key`.
    ///
    /// A value that no longer parses is logged and treated as missing so a
    /// damaged key falls back to defaults instead of blocking startup.
    ///
    /// # Errors
    /// Returns error if the database query fails.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.get_raw(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(key, error = %e, "Ignoring unreadable stored value");
                Ok(None)
            },
        }
    }

    /// # Errors
    /// Returns error if serialization or the database write fails.
    pub fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.set_raw(key, &raw)
    }
}

#[cfg(test)]
mod tests {
    use crate::tests::create_test_storage;

    #[test]
    fn test_raw_roundtrip_and_overwrite() {
        let (storage, _dir) = create_test_storage();
        assert_eq!(storage.get_raw("k").unwrap(), None);
        storage.set_raw("k", "one").unwrap();
        storage.set_raw("k", "two").unwrap();
        assert_eq!(storage.get_raw("k").unwrap().as_deref(), Some("two"));
        assert!(storage.remove("k").unwrap());
        assert!(!storage.remove("k").unwrap());
    }

    #[test]
    fn test_unreadable_json_is_missing() {
        let (storage, _dir) = create_test_storage();
        storage.set_raw("tabs", "{not json").unwrap();
        let value: Option<Vec<String>> = storage.get_json("tabs").unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn test_prefix_listing_is_literal() {
        let (storage, _dir) = create_test_storage();
        storage.set_raw("shirts-db-v3:a", "{}").unwrap();
        storage.set_raw("shirts-db-v3:b", "{}").unwrap();
        storage.set_raw("shirts_db_v3:c", "{}").unwrap();
        storage.set_raw("wishlist-db-v1:a", "{}").unwrap();
        let keys = storage.keys_with_prefix("shirts-db-v3:").unwrap();
        assert_eq!(keys, vec!["shirts-db-v3:a", "shirts-db-v3:b"]);
    }

    #[test]
    fn test_clear_except_keeps_listed() {
        let (storage, _dir) = create_test_storage();
        storage.set_raw("shirts-current-user", "u1").unwrap();
        storage.set_raw("shirts-tabs-v1", "{}").unwrap();
        storage.set_raw("shirts-event-log-v1", "[]").unwrap();
        assert_eq!(storage.clear_except(&["shirts-current-user"]).unwrap(), 2);
        assert_eq!(storage.get_raw("shirts-current-user").unwrap().as_deref(), Some("u1"));
        assert_eq!(storage.get_raw("shirts-tabs-v1").unwrap(), None);
    }
}
