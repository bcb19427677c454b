use shirt_tracker_core::constants::{BACKUP_BUCKET, PHOTO_BUCKET, PUBLIC_SHARE_BASE_URL};
use shirt_tracker_core::env_config::env_non_empty;

/// Connection settings for the Supabase project.
#[derive(Clone, PartialEq, Eq)]
pub struct CloudConfig {
    pub url: String,
    /// Anon / publishable key, sent as `apikey` on every request.
    pub anon_key: String,
    /// Session token of the signed-in user; anon requests use the key.
    pub access_token: Option<String>,
    pub user_id: Option<String>,
    pub bucket: String,
    pub share_base_url: String,
    /// Service-role key; only full-table backups use it.
    pub service_role_key: Option<String>,
    pub backup_bucket: String,
}

impl std::fmt::Debug for CloudConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudConfig")
            .field("url", &self.url)
            .field("anon_key", &"***")
            .field("access_token", &self.access_token.as_ref().map(|_| "***"))
            .field("user_id", &self.user_id)
            .field("bucket", &self.bucket)
            .field("share_base_url", &self.share_base_url)
            .field("service_role_key", &self.service_role_key.as_ref().map(|_| "***"))
            .field("backup_bucket", &self.backup_bucket)
            .finish()
    }
}

impl CloudConfig {
    #[must_use]
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_owned(),
            anon_key: anon_key.into(),
            access_token: None,
            user_id: None,
            bucket: PHOTO_BUCKET.to_owned(),
            share_base_url: PUBLIC_SHARE_BASE_URL.to_owned(),
            service_role_key: None,
            backup_bucket: BACKUP_BUCKET.to_owned(),
        }
    }

    #[must_use]
    pub fn with_session(mut self, user_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self.access_token = Some(access_token.into());
        self
    }

    /// Read `SHIRT_TRACKER_SUPABASE_*` and friends; `None` when the project
    /// URL or key is missing, which keeps the app local-only.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let url = env_non_empty("SHIRT_TRACKER_SUPABASE_URL")?;
        let key = env_non_empty("SHIRT_TRACKER_SUPABASE_KEY")?;
        let mut config = Self::new(url, key);
        config.user_id = env_non_empty("SHIRT_TRACKER_USER_ID");
        config.access_token = env_non_empty("SHIRT_TRACKER_ACCESS_TOKEN");
        if let Some(bucket) = env_non_empty("SHIRT_TRACKER_BUCKET") {
            config.bucket = bucket;
        }
        if let Some(base) = env_non_empty("SHIRT_TRACKER_SHARE_BASE_URL") {
            config.share_base_url = base;
        }
        config.service_role_key = env_non_empty("SHIRT_TRACKER_SERVICE_ROLE_KEY");
        if let Some(bucket) = env_non_empty("SHIRT_TRACKER_BACKUP_BUCKET") {
            config.backup_bucket = bucket;
        }
        Some(config)
    }

    /// The same project authenticated with the service-role key, for jobs
    /// that read every user's row. `None` without that key.
    #[must_use]
    pub fn service_role(&self) -> Option<Self> {
        let key = self.service_role_key.clone()?;
        Some(Self { anon_key: key, access_token: None, user_id: None, ..self.clone() })
    }

    /// Both a user id and a session token are present.
    pub fn is_signed_in(&self) -> bool {
        self.user_id.is_some() && self.access_token.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_secrets() {
        let config = CloudConfig::new("https://x.supabase.co/", "anon-secret").with_session("u1", "jwt-secret");
        let text = format!("{config:?}");
        assert!(!text.contains("anon-secret"));
        assert!(!text.contains("jwt-secret"));
        assert!(config.service_role().is_none());
        assert_eq!(config.url, "https://x.supabase.co");
        assert!(config.is_signed_in());
    }

    #[test]
    fn test_service_role_config() {
        let mut config = CloudConfig::new("https://x.supabase.co", "anon").with_session("u1", "jwt");
        config.service_role_key = Some("service-secret".into());
        let service = config.service_role().unwrap();
        assert_eq!(service.anon_key, "service-secret");
        assert!(service.access_token.is_none());
        assert!(!service.is_signed_in());
        assert_eq!(service.backup_bucket, "shirt-tracker-backups");
        assert!(!format!("{config:?}").contains("service-secret"));
    }

    #[test]
    fn test_from_env_requires_url_and_key() {
        // SAFETY: no other test in this crate reads this variable
        unsafe {
            std::env::remove_var("SHIRT_TRACKER_SUPABASE_URL");
        }
        assert!(CloudConfig::from_env().is_none());
    }
}
