use anyhow::{Result, anyhow, bail};
use clap::{Subcommand, ValueEnum};
use shirt_tracker_core::share::is_valid_share_token;
use shirt_tracker_core::stats::footer_stats;
use shirt_tracker_core::{Row, ShareMode, ShareVisibility};
use shirt_tracker_http::SheetResponse;
use shirt_tracker_service::{load_shared_view, share_link_for};

use super::{AppContext, print_footer, print_json, print_rows, resolve_column, split_list};

#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum ShareModeArg {
    /// Everything except Price
    Auto,
    All,
    /// Only the columns given with --columns
    Custom,
}

impl From<ShareModeArg> for ShareMode {
    fn from(value: ShareModeArg) -> Self {
        match value {
            ShareModeArg::Auto => Self::Auto,
            ShareModeArg::All => Self::All,
            ShareModeArg::Custom => Self::Custom,
        }
    }
}

#[derive(Subcommand)]
pub(crate) enum ShareAction {
    /// Print the public link to this inventory
    Link,
    /// Show or set which columns the public link reveals
    Visibility {
        mode: Option<ShareModeArg>,
        /// Comma separated columns for `custom`
        #[arg(short, long, default_value = "")]
        columns: String,
    },
    /// Open someone's shared inventory
    View {
        token: String,
        #[arg(short, long)]
        tab: Option<String>,
        #[arg(long)]
        json: bool,
    },
}

pub(crate) async fn run(ctx: &AppContext, action: ShareAction) -> Result<()> {
    match action {
        ShareAction::Link => {
            println!("{}", share_link_for(&ctx.storage, &ctx.share_base_url)?);
            if !ctx.sync.is_signed_in() {
                eprintln!("Sign in and sync so the link shows your inventory");
            }
            ctx.sync.schedule();
        },
        ShareAction::Visibility { mode, columns } => {
            let Some(mode) = mode else {
                let current = ctx.storage.load_share_visibility()?;
                return print_json(&current);
            };
            let workspace = ctx.workspace()?;
            let column_ids =
                split_list(&columns).iter().map(|c| resolve_column(&workspace, c)).collect::<Result<Vec<_>>>()?;
            let mode = ShareMode::from(mode);
            if mode == ShareMode::Custom && column_ids.is_empty() {
                bail!("Custom visibility needs --columns");
            }
            let visibility = ShareVisibility { mode, column_ids }.normalized();
            ctx.storage.save_share_visibility(&visibility)?;
            ctx.sync.schedule();
            print_json(&visibility)?;
        },
        ShareAction::View { token, tab, json } => view(ctx, &token, tab.as_deref(), json).await?,
    }
    Ok(())
}

/// Print a shared sheet: redacted, read-only, no price totals.
pub(crate) async fn view(ctx: &AppContext, token: &str, tab: Option<&str>, json: bool) -> Result<()> {
    let token = token.trim();
    if !is_valid_share_token(token) {
        bail!("Invalid share link");
    }
    let cloud = ctx.cloud.as_deref().ok_or_else(|| {
        anyhow!("Shared sheets need SHIRT_TRACKER_SUPABASE_URL and SHIRT_TRACKER_SUPABASE_KEY")
    })?;
    let view = load_shared_view(cloud, token).await?;

    let tab = match tab {
        Some(raw) => {
            let lower = raw.trim().to_lowercase();
            view.tabs.find(raw).or_else(|| view.tabs.tabs.iter().find(|t| t.name.to_lowercase() == lower))
        },
        None => view.tabs.active_tab(),
    }
    .ok_or_else(|| anyhow!("Tab not found in shared sheet"))?;
    let sheet = view.sheet(Some(&tab.id)).ok_or_else(|| anyhow!("Tab not found in shared sheet"))?;
    let rows: Vec<&Row> = sheet.rows.iter().collect();

    if json {
        return print_json(&SheetResponse::build(tab, sheet, &rows, &[]));
    }
    let names: Vec<&str> = view.tabs.tabs.iter().map(|t| t.name.as_str()).collect();
    println!("Shared sheet (read-only), tabs: {}", names.join(", "));
    print_rows(sheet, &rows, &[]);
    print_footer(&footer_stats(sheet, &rows, &[]));
    Ok(())
}
