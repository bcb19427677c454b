use anyhow::{Result, anyhow, bail};
use chrono::Utc;
use shirt_tracker_cloud::{CloudConfig, SupabaseClient};
use shirt_tracker_core::backup::format_timestamp;
use shirt_tracker_service::{PullOutcome, SyncOutcome, Workspace};

use super::AppContext;

const SIGN_IN_HINT: &str =
    "Sign in to save and sync: set SHIRT_TRACKER_SUPABASE_URL, SHIRT_TRACKER_SUPABASE_KEY, SHIRT_TRACKER_USER_ID and SHIRT_TRACKER_ACCESS_TOKEN";

fn describe(outcome: SyncOutcome) -> String {
    match outcome {
        SyncOutcome::Uploaded(at) => format!("Saved to cloud at {}", format_timestamp(at)),
        SyncOutcome::UpToDate => "Cloud is up to date".to_owned(),
        SyncOutcome::SignedOut => "Not signed in; nothing uploaded".to_owned(),
        SyncOutcome::InProgress => "Another upload is running".to_owned(),
    }
}

pub(crate) async fn sync_now(ctx: &AppContext) -> Result<()> {
    if !ctx.sync.is_signed_in() {
        bail!(SIGN_IN_HINT);
    }
    println!("{}", describe(ctx.sync.sync_now().await?));
    Ok(())
}

pub(crate) async fn pull(ctx: &AppContext, fresh: bool) -> Result<()> {
    match ctx.sync.pull(fresh).await? {
        PullOutcome::Applied { updated_at } => {
            println!("Loaded cloud state from {}", format_timestamp(updated_at));
        },
        PullOutcome::UploadedLocal(outcome) => {
            println!("No cloud state yet. {}", describe(outcome));
        },
        PullOutcome::FreshStart(outcome) => {
            println!("Started fresh. {}", describe(outcome));
        },
        PullOutcome::SignedOut => bail!(SIGN_IN_HINT),
    }
    Ok(())
}

pub(crate) async fn verify(ctx: &AppContext) -> Result<()> {
    println!("{}", ctx.sync.verify_backup().await?.message);
    Ok(())
}

pub(crate) fn status(ctx: &AppContext) -> Result<()> {
    let status = ctx.sync.status()?;
    println!("{}", status.unsaved.message);
    println!("{}", status.cloud);
    Ok(())
}

/// Snapshot the whole state table into the backup bucket.
pub(crate) async fn backup() -> Result<()> {
    let config = CloudConfig::from_env()
        .and_then(|c| c.service_role())
        .ok_or_else(|| {
            anyhow!("Backups need SHIRT_TRACKER_SUPABASE_URL, SHIRT_TRACKER_SUPABASE_KEY and SHIRT_TRACKER_SERVICE_ROLE_KEY")
        })?;
    let client = SupabaseClient::new(config)?;
    let (path, rows) = client.backup_state_table(Utc::now()).await?;
    println!("Backup saved to {path} ({rows} rows)");
    Ok(())
}

/// Wipe every stored key and photo, then recreate the defaults.
pub(crate) fn reset(ctx: &AppContext, yes: bool) -> Result<()> {
    if !yes {
        bail!("Reset deletes every tab, row and photo stored on this device; pass --yes to confirm");
    }
    let removed = ctx.storage.clear_except(&[])?;
    let mut photos = 0;
    for id in ctx.storage.photo_ids()? {
        if ctx.storage.delete_photo(&id)? {
            photos += 1;
        }
    }
    tracing::info!(removed, photos, "Local data reset");
    let workspace = Workspace::open(ctx.storage.clone())?;
    println!("Local data reset; active tab is {}", workspace.active_tab_name());
    Ok(())
}
