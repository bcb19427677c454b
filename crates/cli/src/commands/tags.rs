use anyhow::Result;
use clap::Subcommand;
use shirt_tracker_core::tags::normalize_tags_input;

use super::{AppContext, resolve_row};

#[derive(Subcommand)]
pub(crate) enum TagsAction {
    /// Base, custom and in-use tags
    List,
    /// Replace a row's tags with a comma separated list
    Set { row: String, tags: String },
    /// Add tags to several rows
    Add {
        #[arg(short, long, required = true, num_args = 1..)]
        rows: Vec<String>,
        tags: String,
    },
    /// Remove tags from several rows
    Remove {
        #[arg(short, long, required = true, num_args = 1..)]
        rows: Vec<String>,
        tags: String,
    },
    /// Rename a tag on every row
    Rename { old: String, new: String },
    /// Delete a tag from every row and the suggestions
    Delete { tag: String },
    /// Toggle the For Sale tag of a row
    ForSale { row: String },
}

pub(crate) fn run(ctx: &AppContext, action: TagsAction) -> Result<()> {
    let mut workspace = ctx.workspace()?;
    match action {
        TagsAction::List => {
            for tag in workspace.all_tags() {
                println!("{tag}");
            }
        },
        TagsAction::Set { row, tags } => {
            let row_id = resolve_row(workspace.sheet(), &row)?;
            workspace.set_row_tags(&row_id, &normalize_tags_input(&tags))?;
            let current = workspace.sheet().row(&row_id).map(|r| r.clean_tags().join(", ")).unwrap_or_default();
            println!("Tags: {current}");
        },
        TagsAction::Add { rows, tags } => {
            let ids = rows.iter().map(|r| resolve_row(workspace.sheet(), r)).collect::<Result<Vec<_>>>()?;
            let touched = workspace.add_tags_to_rows(&ids, &normalize_tags_input(&tags))?;
            println!("Tagged {touched} rows");
        },
        TagsAction::Remove { rows, tags } => {
            let ids = rows.iter().map(|r| resolve_row(workspace.sheet(), r)).collect::<Result<Vec<_>>>()?;
            let touched = workspace.remove_tags_from_rows(&ids, &normalize_tags_input(&tags))?;
            println!("Untagged {touched} rows");
        },
        TagsAction::Rename { old, new } => {
            let touched = workspace.rename_tag(&old, &new)?;
            println!("Renamed {} to {} on {touched} rows", old.trim(), new.trim());
        },
        TagsAction::Delete { tag } => {
            let touched = workspace.delete_tag(&tag)?;
            println!("Removed {} from {touched} rows", tag.trim());
        },
        TagsAction::ForSale { row } => {
            let row_id = resolve_row(workspace.sheet(), &row)?;
            let for_sale = workspace.toggle_for_sale(&row_id)?;
            println!("{}", if for_sale { "Marked for sale" } else { "No longer for sale" });
        },
    }
    Ok(())
}
