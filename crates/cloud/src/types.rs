use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shirt_tracker_core::CloudPayload;

/// One row of the `shirt_state` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateRow {
    pub user_id: String,
    pub data: CloudPayload,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UpdatedAtRow {
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SignRequest {
    #[serde(rename = "expiresIn")]
    pub expires_in: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SignResponse {
    #[serde(rename = "signedURL", alias = "signedUrl")]
    pub signed_url: Option<String>,
}
