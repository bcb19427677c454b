use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow, bail};
use clap::{Args, Subcommand};
use shirt_tracker_core::filter::filter_rows;
use shirt_tracker_core::photo::ImageBlob;
use shirt_tracker_core::stats::footer_stats;
use shirt_tracker_core::{AppMode, FilterTarget, SortDirection};
use shirt_tracker_http::SheetResponse;
use shirt_tracker_service::Workspace;

use super::{AppContext, print_footer, print_json, print_rows, resolve_column, resolve_row, resolve_tab};

#[derive(Args, Default)]
pub(crate) struct ListArgs {
    /// Tab id or name; the active tab when omitted
    #[arg(short, long)]
    tab: Option<String>,
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
pub(crate) enum RowsAction {
    /// Rows matching the tab's filter, in sort order
    List(ListArgs),
    /// Add a row, optionally filling cells with COLUMN=VALUE
    Add {
        #[arg(short, long = "set", value_name = "COLUMN=VALUE")]
        set: Vec<String>,
    },
    /// Set one cell
    Set { row: String, column: String, value: String },
    /// Delete rows by number or id
    #[command(alias = "rm")]
    Delete {
        #[arg(required = true)]
        rows: Vec<String>,
    },
    /// Remove every row of the active tab
    Clear {
        #[arg(long)]
        yes: bool,
    },
    /// Store an image file in a photo cell
    Photo { row: String, column: String, file: PathBuf },
    /// Sort by a column, or back to Name when omitted
    Sort {
        column: Option<String>,
        #[arg(long)]
        desc: bool,
    },
    /// Filter rows: `all`, `tags`, `for-sale` or a column
    Filter {
        #[arg(short, long, default_value = "all")]
        column: String,
        #[arg(default_value = "")]
        query: String,
    },
    /// Move a wishlist row into an inventory tab
    Move {
        row: String,
        #[arg(long = "to", value_name = "TAB")]
        to: String,
    },
}

pub(crate) fn run(ctx: &AppContext, action: RowsAction) -> Result<()> {
    let mut workspace = ctx.workspace()?;
    match action {
        RowsAction::List(args) => list(&workspace, &args)?,
        RowsAction::Add { set } => {
            let assignments = set
                .iter()
                .map(|pair| {
                    let (column, value) =
                        pair.split_once('=').ok_or_else(|| anyhow!("Expected COLUMN=VALUE, got '{pair}'"))?;
                    Ok((resolve_column(&workspace, column)?, value.to_owned()))
                })
                .collect::<Result<Vec<_>>>()?;
            let row_id = workspace.add_row()?;
            for (column_id, value) in &assignments {
                workspace.update_cell(&row_id, column_id, value)?;
            }
            println!("Added row {row_id}");
        },
        RowsAction::Set { row, column, value } => {
            let row_id = resolve_row(workspace.sheet(), &row)?;
            let column_id = resolve_column(&workspace, &column)?;
            workspace.update_cell(&row_id, &column_id, &value)?;
            println!("Updated row {row_id}");
        },
        RowsAction::Delete { rows } => {
            let ids = rows.iter().map(|r| resolve_row(workspace.sheet(), r)).collect::<Result<Vec<_>>>()?;
            let removed = workspace.delete_rows(&ids)?;
            println!("Deleted {removed} rows");
        },
        RowsAction::Clear { yes } => {
            if !yes {
                bail!("Clearing removes every row of {}; pass --yes to confirm", workspace.active_tab_name());
            }
            let removed = workspace.clear_all()?;
            println!("Cleared {removed} rows (a snapshot is kept in the change log)");
        },
        RowsAction::Photo { row, column, file } => {
            let row_id = resolve_row(workspace.sheet(), &row)?;
            let column_id = resolve_column(&workspace, &column)?;
            let bytes = std::fs::read(&file).map_err(|e| anyhow!("Failed to read {}: {e}", file.display()))?;
            let blob = ImageBlob { content_type: content_type_for(&file).to_owned(), bytes };
            let reference = workspace.attach_photo(&row_id, &column_id, &blob)?;
            println!("Stored photo as {reference}");
        },
        RowsAction::Sort { column, desc } => {
            let column_id = column.as_deref().map(|c| resolve_column(&workspace, c)).transpose()?;
            let direction = if desc { SortDirection::Desc } else { SortDirection::Asc };
            workspace.set_sort(column_id.as_deref(), direction)?;
            let label = column_id
                .as_deref()
                .and_then(|id| workspace.sheet().column(id))
                .map_or("Name", |c| c.label());
            println!("Sorted by {label} ({})", if desc { "descending" } else { "ascending" });
        },
        RowsAction::Filter { column, query } => {
            let target = filter_target(&workspace, &column)?;
            workspace.set_filter(target, &query)?;
            println!("{} rows match", workspace.filtered_rows().len());
        },
        RowsAction::Move { row, to } => {
            if workspace.mode() != AppMode::Wishlist {
                bail!("Switch to the wishlist (`shirt-tracker mode wishlist`) to move rows into inventory");
            }
            let row_id = resolve_row(workspace.sheet(), &row)?;
            let target = inventory_tab_id(ctx, &to)?;
            workspace.move_row_to_inventory(&row_id, &target)?;
            println!("Moved row to inventory tab {to}");
        },
    }
    Ok(())
}

fn list(workspace: &Workspace, args: &ListArgs) -> Result<()> {
    let (tab, sheet) = match args.tab.as_deref() {
        Some(raw) => {
            let id = resolve_tab(workspace, raw)?;
            let tab = workspace.resolve_tab(&id).cloned().ok_or_else(|| anyhow!("No tab '{raw}'"))?;
            (tab, workspace.tab_sheet(&id)?)
        },
        None => {
            let tab = workspace.active_tab().cloned().ok_or_else(|| anyhow!("No active tab"))?;
            (tab, workspace.sheet().clone())
        },
    };
    let hidden = workspace.schema().overrides.hidden_columns(&tab.id);
    let rows = filter_rows(&sheet, &sheet.filter);
    if args.json {
        return print_json(&SheetResponse::build(&tab, &sheet, &rows, hidden));
    }
    print_rows(&sheet, &rows, hidden);
    print_footer(&footer_stats(&sheet, &rows, hidden));
    Ok(())
}

pub(crate) fn stats(ctx: &AppContext) -> Result<()> {
    let workspace = ctx.workspace()?;
    let stats = workspace.footer_stats();
    println!("Tab: {}", workspace.active_tab_name());
    print_footer(&stats);
    Ok(())
}

fn filter_target(workspace: &Workspace, raw: &str) -> Result<FilterTarget> {
    match raw.trim().to_lowercase().as_str() {
        "" | "all" => Ok(FilterTarget::All),
        "tags" => Ok(FilterTarget::Tags),
        "forsale" | "for-sale" => Ok(FilterTarget::ForSale),
        _ => Ok(FilterTarget::Column(resolve_column(workspace, raw)?)),
    }
}

fn inventory_tab_id(ctx: &AppContext, raw: &str) -> Result<String> {
    let tabs = ctx.storage.load_tabs(AppMode::Inventory)?.unwrap_or_default();
    let wanted = raw.trim();
    let lower = wanted.to_lowercase();
    tabs.find(wanted)
        .or_else(|| tabs.tabs.iter().find(|t| t.name.to_lowercase() == lower))
        .map(|t| t.id.clone())
        .ok_or_else(|| anyhow!("No inventory tab '{raw}'"))
}

fn content_type_for(path: &Path) -> &'static str {
    let extension = path.extension().and_then(|e| e.to_str()).map(str::to_lowercase);
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "image/jpeg",
    }
}
