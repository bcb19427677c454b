use chrono::{DateTime, Utc};
use reqwest::{RequestBuilder, Response};
use shirt_tracker_core::backup::{TableBackup, backup_object_path};
use shirt_tracker_core::constants::{SIGNED_URL_TTL_SECS, STATE_TABLE};
use shirt_tracker_core::photo::ImageBlob;
use shirt_tracker_core::share::is_valid_share_token;
use shirt_tracker_core::CloudPayload;

use crate::config::CloudConfig;
use crate::error::{CloudError, Result};
use crate::types::{SignRequest, SignResponse, StateRow, UpdatedAtRow};

const MAX_RETRIES: usize = 3;
const RETRY_DELAYS: [u64; 4] = [0, 1, 2, 4];

/// Client for the Supabase REST (`PostgREST`) and storage endpoints.
pub struct SupabaseClient {
    pub(crate) client: reqwest::Client,
    pub(crate) config: CloudConfig,
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient").field("config", &self.config).finish()
    }
}

impl SupabaseClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built (TLS backend failure).
    pub fn new(config: CloudConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| CloudError::ClientInit(e.to_string()))?;
        Ok(Self { client, config })
    }

    #[must_use]
    pub const fn config(&self) -> &CloudConfig {
        &self.config
    }

    fn bearer(&self) -> &str {
        self.config.access_token.as_deref().unwrap_or(&self.config.anon_key)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.config.anon_key)
            .header("Authorization", format!("Bearer {}", self.bearer()))
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{STATE_TABLE}", self.config.url)
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.config.url, self.config.bucket, path.trim_start_matches('/'))
    }

    /// Send a request, retrying connection errors and transient statuses.
    ///
    /// `build` is called once per attempt so bodies can be re-sent.
    async fn send_with_retry<F>(&self, what: &str, build: F) -> Result<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut last_error: Option<CloudError> = None;

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let delay_secs = RETRY_DELAYS.get(attempt).copied().unwrap_or(4);
                let delay = std::time::Duration::from_secs(delay_secs);
                tokio::time::sleep(delay).await;
                tracing::warn!("{what}: retry attempt {attempt}/{MAX_RETRIES} after {delay:?}");
            }

            let response = match self.authorized(build()).send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(CloudError::HttpRequest(e));
                    continue;
                },
            };

            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }

            let body =
                response.text().await.unwrap_or_else(|_| "Could not read error body".to_owned());
            let err = CloudError::HttpStatus { code: status.as_u16(), body };
            if err.is_transient() {
                last_error = Some(err);
                continue;
            }
            return Err(err);
        }

        Err(CloudError::RetriesExhausted(Box::new(
            last_error.unwrap_or_else(|| CloudError::MissingField("response".to_owned())),
        )))
    }

    async fn read_json<T: serde::de::DeserializeOwned>(response: Response, context: &str) -> Result<T> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|source| CloudError::JsonParse {
            context: format!("{context} (body: {})", truncate(&body, 200)),
            source,
        })
    }

    /// Upsert the user's whole state document.
    ///
    /// # Errors
    /// Returns an error if the request fails after retries.
    pub async fn upsert_state(
        &self,
        user_id: &str,
        payload: &CloudPayload,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        let row = serde_json::json!([{
            "user_id": user_id,
            "data": payload,
            "updated_at": updated_at.to_rfc3339(),
        }]);
        self.send_with_retry("upsert state", || {
            self.client
                .post(self.table_url())
                .query(&[("on_conflict", "user_id")])
                .header("Prefer", "resolution=merge-duplicates,return=minimal")
                .json(&row)
        })
        .await?;
        tracing::info!(user_id, "Uploaded state to cloud");
        Ok(())
    }

    /// # Errors
    /// Returns an error if the request fails or the row cannot be parsed.
    pub async fn fetch_state(&self, user_id: &str) -> Result<Option<StateRow>> {
        let filter = format!("eq.{user_id}");
        let response = self
            .send_with_retry("fetch state", || {
                self.client
                    .get(self.table_url())
                    .query(&[("select", "data,updated_at,user_id"), ("user_id", filter.as_str())])
            })
            .await?;
        let rows: Vec<StateRow> = Self::read_json(response, "state rows").await?;
        Ok(rows.into_iter().next())
    }

    /// Server-side `updated_at` of the user's document, if any.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn fetch_updated_at(&self, user_id: &str) -> Result<Option<DateTime<Utc>>> {
        let filter = format!("eq.{user_id}");
        let response = self
            .send_with_retry("fetch updated_at", || {
                self.client
                    .get(self.table_url())
                    .query(&[("select", "updated_at"), ("user_id", filter.as_str())])
            })
            .await?;
        let rows: Vec<UpdatedAtRow> = Self::read_json(response, "updated_at rows").await?;
        Ok(rows.into_iter().next().and_then(|r| r.updated_at))
    }

    /// Newest document whose payload carries `token` as its public share id.
    ///
    /// # Errors
    /// Returns `InvalidShareToken` before any request when `token` is not a UUID.
    pub async fn fetch_shared(&self, token: &str) -> Result<Option<StateRow>> {
        if !is_valid_share_token(token) {
            return Err(CloudError::InvalidShareToken(token.to_owned()));
        }
        let filter = format!("eq.{token}");
        let response = self
            .send_with_retry("fetch shared state", || {
                self.client.get(self.table_url()).query(&[
                    ("select", "data,updated_at,user_id"),
                    ("data->>publicShareId", filter.as_str()),
                    ("order", "updated_at.desc"),
                    ("limit", "1"),
                ])
            })
            .await?;
        let rows: Vec<StateRow> = Self::read_json(response, "shared state rows").await?;
        Ok(rows.into_iter().next())
    }

    /// Upload (or replace) an object in the photo bucket.
    ///
    /// # Errors
    /// Returns an error if the upload fails after retries.
    pub async fn upload_object(&self, path: &str, blob: &ImageBlob) -> Result<()> {
        self.send_with_retry("upload object", || {
            self.client
                .post(self.object_url(path))
                .header("x-upsert", "true")
                .header("Content-Type", &blob.content_type)
                .body(blob.bytes.clone())
        })
        .await?;
        tracing::debug!(path, size = blob.bytes.len(), "Uploaded object");
        Ok(())
    }

    /// Create a storage bucket; one that already exists (409) is fine.
    ///
    /// # Errors
    /// Returns an error for any other failure.
    pub async fn ensure_bucket(&self, name: &str, public: bool) -> Result<()> {
        let url = format!("{}/storage/v1/bucket", self.config.url);
        let body = serde_json::json!({ "name": name, "public": public });
        match self.send_with_retry("create bucket", || self.client.post(&url).json(&body)).await {
            Ok(_) => {
                tracing::info!(bucket = name, "Created bucket");
                Ok(())
            },
            Err(CloudError::HttpStatus { code: 409, .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Every row of the state table, columns as stored.
    ///
    /// Needs a service-role config; row-level security hides other users'
    /// rows from a session token.
    ///
    /// # Errors
    /// Returns an error if the request fails or the body is not a JSON array.
    pub async fn fetch_all_states(&self) -> Result<Vec<serde_json::Value>> {
        let response = self
            .send_with_retry("fetch all states", || {
                self.client.get(self.table_url()).query(&[("select", "*")]).header("Accept", "application/json")
            })
            .await?;
        Self::read_json(response, "state table").await
    }

    /// Copy the whole state table to `backups/<timestamp>.json` in the backup
    /// bucket, creating the bucket first. Returns the object path and row count.
    ///
    /// # Errors
    /// Returns an error if any of the three requests fails.
    pub async fn backup_state_table(&self, now: DateTime<Utc>) -> Result<(String, usize)> {
        let bucket = self.config.backup_bucket.clone();
        self.ensure_bucket(&bucket, false).await?;
        let backup = TableBackup::new(self.fetch_all_states().await?, now);
        let object_path = backup_object_path(now);
        let url = format!("{}/storage/v1/object/{bucket}/{object_path}", self.config.url);
        self.send_with_retry("upload backup", || {
            self.client.post(&url).query(&[("upsert", "true")]).json(&backup)
        })
        .await?;
        tracing::info!(path = %object_path, rows = backup.row_count, "Saved state table backup");
        Ok((object_path, backup.row_count))
    }

    /// Time-limited URL for a private object.
    ///
    /// # Errors
    /// Returns an error if signing fails or the response lacks a URL.
    pub async fn signed_url(&self, path: &str, ttl_secs: u64) -> Result<String> {
        let url = format!(
            "{}/storage/v1/object/sign/{}/{}",
            self.config.url,
            self.config.bucket,
            path.trim_start_matches('/')
        );
        let request = SignRequest { expires_in: ttl_secs };
        let response = self
            .send_with_retry("sign object url", || self.client.post(&url).json(&request))
            .await?;
        let signed: SignResponse = Self::read_json(response, "signed url").await?;
        let relative = signed.signed_url.ok_or_else(|| CloudError::MissingField("signedURL".to_owned()))?;
        Ok(format!("{}/storage/v1{relative}", self.config.url))
    }

    /// URL of an object through the bucket's public endpoint.
    #[must_use]
    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.config.url,
            self.config.bucket,
            path.trim_start_matches('/')
        )
    }

    /// Signed URL for signed-in users, public URL otherwise.
    ///
    /// # Errors
    /// Returns an error if signing fails.
    pub async fn photo_url(&self, path: &str) -> Result<String> {
        if self.config.is_signed_in() {
            return self.signed_url(path, SIGNED_URL_TTL_SECS).await;
        }
        Ok(self.public_url(path))
    }
}

/// Truncates a string to the given maximum length at a char boundary.
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        s
    } else {
        let mut end = max_len;
        while end > 0 && !s.is_char_boundary(end) {
            end = end.saturating_sub(1);
        }
        s.get(..end).unwrap_or("")
    }
}
