//! Supabase client for shirt-tracker cloud sync, sharing and photo storage.

mod backend;
mod client;
mod config;
mod error;
#[cfg(test)]
mod tests;
mod types;

pub use backend::CloudBackend;
pub use client::{SupabaseClient, truncate};
pub use config::CloudConfig;
pub use error::{CloudError, Result};
pub use types::StateRow;
