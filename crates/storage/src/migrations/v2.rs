//! Migration v2: photo blobs

pub(super) const SQL: &str = "
CREATE TABLE IF NOT EXISTS photos (
    id TEXT PRIMARY KEY,
    content_type TEXT NOT NULL DEFAULT 'image/jpeg',
    bytes BLOB NOT NULL,
    created_at TEXT NOT NULL
);
";
