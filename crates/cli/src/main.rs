mod commands;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use shirt_tracker_core::env_config::env_non_empty;
use tracing_subscriber::EnvFilter;

use commands::AppContext;
use commands::columns::ColumnsAction;
use commands::csv::CsvAction;
use commands::mode::ModeArg;
use commands::rows::{ListArgs, RowsAction};
use commands::share::ShareAction;
use commands::tabs::TabsAction;
use commands::tags::TagsAction;

#[derive(Parser)]
#[command(name = "shirt-tracker")]
#[command(about = "Track a shirt collection and wishlist in local sheets", long_about = None)]
#[command(version)]
struct Cli {
    /// Open someone's shared sheet by its share token
    #[arg(long, value_name = "TOKEN")]
    share: Option<String>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the read-only web viewer
    Serve {
        #[arg(short, long, default_value = "37780")]
        port: u16,
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,
    },
    /// List and manage tabs
    Tabs {
        #[command(subcommand)]
        action: Option<TabsAction>,
    },
    /// List and edit rows of the active tab
    Rows {
        #[command(subcommand)]
        action: Option<RowsAction>,
    },
    /// List and edit columns of the active tab
    Columns {
        #[command(subcommand)]
        action: Option<ColumnsAction>,
    },
    /// Tag suggestions and row tags
    Tags {
        #[command(subcommand)]
        action: Option<TagsAction>,
    },
    /// CSV import and export
    Csv {
        #[command(subcommand)]
        action: CsvAction,
    },
    /// Show or switch between inventory and wishlist
    Mode { mode: Option<ModeArg> },
    /// Item count and price totals of the filtered rows
    Stats,
    /// Upload local state to the cloud now
    Sync,
    /// Load the cloud state into local storage
    Pull {
        /// Wipe local data, start from defaults and upload them
        #[arg(long)]
        fresh: bool,
    },
    /// Compare the cloud backup with the last local sync
    Verify,
    /// Local save and cloud backup status
    Status,
    /// Copy every user's cloud row into the backup bucket (service-role key)
    Backup,
    /// Public share link and what it shows
    Share {
        #[command(subcommand)]
        action: ShareAction,
    },
    /// Search the change log
    Log {
        #[arg(short, long, default_value = "")]
        query: String,
        #[arg(short, long, default_value = "20")]
        limit: usize,
        #[arg(long)]
        json: bool,
    },
    /// Wipe all local data
    Reset {
        #[arg(long)]
        yes: bool,
    },
}

/// `SHIRT_TRACKER_DB`, or `<data dir>/shirt-tracker/state.db`.
pub(crate) fn get_db_path() -> PathBuf {
    if let Some(path) = env_non_empty("SHIRT_TRACKER_DB") {
        return PathBuf::from(path);
    }
    dirs::data_local_dir().unwrap_or_else(|| PathBuf::from(".")).join("shirt-tracker").join("state.db")
}

pub(crate) fn ensure_db_dir(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let ctx = AppContext::init()?;

    if let Some(token) = cli.share {
        return commands::share::view(&ctx, &token, None, false).await;
    }
    let Some(command) = cli.command else {
        anyhow::bail!("No command given. Run `shirt-tracker --help` for usage.");
    };

    match command {
        Commands::Serve { port, host } => return commands::serve::run(ctx, port, host).await,
        Commands::Tabs { action } => commands::tabs::run(&ctx, action.unwrap_or(TabsAction::List))?,
        Commands::Rows { action } => {
            commands::rows::run(&ctx, action.unwrap_or(RowsAction::List(ListArgs::default())))?;
        },
        Commands::Columns { action } => {
            commands::columns::run(&ctx, action.unwrap_or(ColumnsAction::List { json: false }))?;
        },
        Commands::Tags { action } => commands::tags::run(&ctx, action.unwrap_or(TagsAction::List))?,
        Commands::Csv { action } => commands::csv::run(&ctx, action)?,
        Commands::Mode { mode } => commands::mode::run(&ctx, mode)?,
        Commands::Stats => commands::rows::stats(&ctx)?,
        Commands::Sync => return commands::sync::sync_now(&ctx).await,
        Commands::Pull { fresh } => commands::sync::pull(&ctx, fresh).await?,
        Commands::Verify => commands::sync::verify(&ctx).await?,
        Commands::Status => commands::sync::status(&ctx)?,
        Commands::Backup => return commands::sync::backup().await,
        Commands::Share { action } => commands::share::run(&ctx, action).await?,
        Commands::Log { query, limit, json } => commands::log::run(&ctx, &query, limit, json)?,
        Commands::Reset { yes } => commands::sync::reset(&ctx, yes)?,
    }

    ctx.finish().await;
    Ok(())
}
