//! Test utilities for storage tests.

use tempfile::TempDir;

use crate::Storage;

#[expect(clippy::unwrap_used, reason = "test code")]
pub fn create_test_storage() -> (Storage, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let storage = Storage::new(&db_path).unwrap();
    (storage, temp_dir)
}

#[test]
#[expect(clippy::unwrap_used, reason = "test code")]
fn reopening_keeps_data_and_schema_version() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("nested").join("state.db");
    {
        let storage = Storage::new(&db_path).unwrap();
        storage.set_raw("shirts-app-mode", "wishlist").unwrap();
    }
    let storage = Storage::new(&db_path).unwrap();
    assert_eq!(storage.get_raw("shirts-app-mode").unwrap().as_deref(), Some("wishlist"));
}
