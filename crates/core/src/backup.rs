//! Local-save and cloud-backup status lines.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::BACKUP_TOLERANCE_SECS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    Ok,
    Alert,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusLine {
    pub level: StatusLevel,
    pub message: String,
}

impl StatusLine {
    pub fn ok(message: impl Into<String>) -> Self {
        Self { level: StatusLevel::Ok, message: message.into() }
    }

    pub fn alert(message: impl Into<String>) -> Self {
        Self { level: StatusLevel::Alert, message: message.into() }
    }
}

fn tolerance() -> Duration {
    Duration::seconds(BACKUP_TOLERANCE_SECS)
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}

/// Parse a stored backup timestamp: epoch milliseconds or RFC 3339.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(millis) = raw.parse::<i64>() {
        return DateTime::from_timestamp_millis(millis);
    }
    DateTime::parse_from_rfc3339(raw).ok().map(|d| d.with_timezone(&Utc))
}

/// Whether local edits have been saved since the last change.
pub fn unsaved_status(
    signed_in: bool,
    last_change: Option<DateTime<Utc>>,
    last_sync: Option<DateTime<Utc>>,
) -> StatusLine {
    if !signed_in {
        return StatusLine::ok("Sign in to save and sync.");
    }
    let Some(last_sync) = last_sync else {
        return StatusLine::ok("No local save yet.");
    };
    if last_change.is_some_and(|change| change > last_sync + tolerance()) {
        return StatusLine::alert("Unsaved local changes (not synced yet).");
    }
    StatusLine::ok(format!("Last saved locally: {}", format_timestamp(last_sync)))
}

/// Status from the last known cloud update without asking the backend.
pub fn cloud_status(last_cloud_update: Option<DateTime<Utc>>) -> String {
    match last_cloud_update {
        Some(at) => format!("Last synced to cloud: {}", format_timestamp(at)),
        None => "Cloud backup not checked yet.".to_owned(),
    }
}

/// Compare the cloud's `updated_at` with the last local sync.
pub fn verify_backup(cloud_updated_at: Option<DateTime<Utc>>, local_sync: Option<DateTime<Utc>>) -> StatusLine {
    let Some(cloud) = cloud_updated_at else {
        return StatusLine::alert("No cloud backup found yet.");
    };
    let cloud_text = format_timestamp(cloud);
    match local_sync {
        Some(local) if cloud + tolerance() < local => {
            StatusLine::alert(format!("Local changes not in cloud yet. Last cloud update: {cloud_text}"))
        },
        _ => StatusLine::ok(format!(
            "Cloud backup OK. Last cloud update: {cloud_text} (May lag local changes)"
        )),
    }
}

/// Every row of the state table at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableBackup {
    pub generated_at: String,
    pub row_count: usize,
    pub rows: Vec<Value>,
}

impl TableBackup {
    pub fn new(rows: Vec<Value>, at: DateTime<Utc>) -> Self {
        Self { generated_at: at.to_rfc3339_opts(SecondsFormat::Millis, true), row_count: rows.len(), rows }
    }
}

/// `backups/2024-05-01T01-00-00-000Z.json`
pub fn backup_object_path(at: DateTime<Utc>) -> String {
    let stamp = at.to_rfc3339_opts(SecondsFormat::Millis, true).replace([':', '.'], "-");
    format!("backups/{stamp}.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_unsaved_status() {
        assert_eq!(unsaved_status(false, None, None).message, "Sign in to save and sync.");
        assert_eq!(unsaved_status(true, Some(at(0)), None).message, "No local save yet.");
        assert_eq!(unsaved_status(true, Some(at(200)), Some(at(0))).level, StatusLevel::Alert);
        let within = unsaved_status(true, Some(at(100)), Some(at(0)));
        assert_eq!(within.level, StatusLevel::Ok);
        assert!(within.message.starts_with("Last saved locally: "));
    }

    #[test]
    fn test_verify_tolerates_two_minutes() {
        assert_eq!(verify_backup(Some(at(0)), Some(at(120))).level, StatusLevel::Ok);
        let behind = verify_backup(Some(at(0)), Some(at(121)));
        assert_eq!(behind.level, StatusLevel::Alert);
        assert!(behind.message.starts_with("Local changes not in cloud yet."));
        assert_eq!(verify_backup(Some(at(0)), None).level, StatusLevel::Ok);
        assert_eq!(verify_backup(None, Some(at(0))).message, "No cloud backup found yet.");
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("1700000000000"), Some(at(0)));
        assert_eq!(parse_timestamp("2023-11-14T22:13:20Z"), Some(at(0)));
        assert_eq!(parse_timestamp("soon"), None);
    }

    #[test]
    fn test_table_backup_document() {
        let stamp = DateTime::from_timestamp_millis(1_714_525_200_250).unwrap();
        assert_eq!(backup_object_path(stamp), "backups/2024-05-01T01-00-00-250Z.json");

        let backup = TableBackup::new(vec![serde_json::json!({"user_id": "u1"})], stamp);
        let json = serde_json::to_value(&backup).unwrap();
        assert_eq!(json["generatedAt"], "2024-05-01T01:00:00.250Z");
        assert_eq!(json["rowCount"], 1);
        assert_eq!(json["rows"][0]["user_id"], "u1");
    }
}
