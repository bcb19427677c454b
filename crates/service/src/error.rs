//! Typed error enum for the service layer.
//!
//! Unifies storage, cloud and domain failures into a single error type so
//! front ends can match on the failure instead of formatting opaque errors.

use shirt_tracker_cloud::CloudError;
use shirt_tracker_core::CoreError;
use shirt_tracker_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Local database failed (pool, SQL, corrupt blob).
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    /// Supabase request failed.
    #[error("cloud: {0}")]
    Cloud(#[from] CloudError),

    /// Domain-level failure; CSV import messages are user-facing as-is.
    #[error("{0}")]
    Core(#[from] CoreError),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// The loaded sheet is a shared read-only view.
    #[error("read-only: {0}")]
    ReadOnly(String),

    /// Cloud URL/key or a signed-in session is missing.
    #[error("not configured: {0}")]
    NotConfigured(String),

    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A blocking storage task panicked or was cancelled.
    #[error("background task: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ServiceError {
    /// Whether this error is likely transient (worth retrying).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Storage(e) => e.is_transient(),
            Self::Cloud(e) => e.is_transient(),
            _ => false,
        }
    }

    /// Whether this error represents a not-found condition.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Storage(e) => e.is_not_found(),
            Self::Core(CoreError::NotFound(_)) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
