use anyhow::Result;
use clap::Subcommand;

use super::{AppContext, resolve_tab};

#[derive(Subcommand)]
pub(crate) enum TabsAction {
    /// List tabs of the current mode; the active one is starred
    List,
    /// Add a tab seeded with the current columns and switch to it
    Add { name: String },
    Rename { tab: String, name: String },
    /// Delete a tab and its rows
    Delete { tab: String },
    /// Make a tab the active one
    Switch { tab: String },
}

pub(crate) fn run(ctx: &AppContext, action: TabsAction) -> Result<()> {
    let mut workspace = ctx.workspace()?;
    match action {
        TabsAction::List => {
            let active = workspace.active_tab_id();
            for tab in &workspace.tabs().tabs {
                let marker = if Some(tab.id.as_str()) == active { "*" } else { " " };
                println!("{marker} {}\t{}", tab.name, tab.id);
            }
        },
        TabsAction::Add { name } => {
            let id = workspace.add_tab(&name)?;
            println!("Added tab {} ({id})", workspace.active_tab_name());
        },
        TabsAction::Rename { tab, name } => {
            let id = resolve_tab(&workspace, &tab)?;
            workspace.rename_tab(&id, &name)?;
            println!("Renamed tab to {}", name.trim());
        },
        TabsAction::Delete { tab } => {
            let id = resolve_tab(&workspace, &tab)?;
            workspace.delete_tab(&id)?;
            println!("Deleted tab; active tab is now {}", workspace.active_tab_name());
        },
        TabsAction::Switch { tab } => {
            let id = resolve_tab(&workspace, &tab)?;
            workspace.switch_tab(&id)?;
            println!("Switched to {}", workspace.active_tab_name());
        },
    }
    Ok(())
}
