#![allow(
    clippy::redundant_pub_crate,
    reason = "migrations module is private, pub(crate) is intentional"
)]

mod column_helpers;
mod v1;
mod v2;

use column_helpers::add_column_if_not_exists;
use rusqlite::Connection;

pub const SCHEMA_VERSION: i32 = 4;

pub fn run_migrations(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "busy_timeout", 5000i32)?;

    let current_version: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    tracing::info!("Database schema version: {} (target: {})", current_version, SCHEMA_VERSION);

    if current_version < 1i32 {
        tracing::info!("Running migration v1: key/value table");
        conn.execute_batch(v1::SQL)?;
    }

    if current_version < 2i32 {
        tracing::info!("Running migration v2: photos table");
        conn.execute_batch(v2::SQL)?;
    }

    if current_version < 3i32 {
        tracing::info!("Running migration v3: updated_at on kv");
        add_column_if_not_exists(conn, "kv", "updated_at", "TEXT")?;
    }

    if current_version < 4i32 {
        tracing::info!("Running migration v4: remote_path on photos");
        add_column_if_not_exists(conn, "photos", "remote_path", "TEXT")?;
    }

    conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    tracing::info!("Database schema up to date (version {})", SCHEMA_VERSION);

    Ok(())
}
