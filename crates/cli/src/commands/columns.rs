use anyhow::{Result, anyhow};
use clap::Subcommand;
use serde::Serialize;
use shirt_tracker_core::ColumnType;

use super::{AppContext, print_json, resolve_column, split_list};

#[derive(Subcommand)]
pub(crate) enum ColumnsAction {
    /// Columns of the active tab in display order
    List {
        #[arg(long)]
        json: bool,
    },
    Add {
        name: String,
        /// text, select, number, date, notes or photo
        #[arg(short = 't', long = "type", default_value = "text")]
        column_type: ColumnType,
        /// Comma separated options for select columns
        #[arg(short, long, default_value = "")]
        options: String,
    },
    /// Change a column's name, type or options
    Edit {
        column: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short = 't', long = "type")]
        column_type: Option<ColumnType>,
        #[arg(short, long)]
        options: Option<String>,
    },
    /// Delete a column and its cells
    Delete { column: String },
    /// Move a column to another column's position
    Move { column: String, to: String },
    /// Hide or show a column on the active tab
    Hide { column: String },
}

#[derive(Serialize)]
struct ColumnLine<'a> {
    id: &'a str,
    name: &'a str,
    #[serde(rename = "type")]
    column_type: ColumnType,
    options: &'a [String],
    hidden: bool,
}

pub(crate) fn run(ctx: &AppContext, action: ColumnsAction) -> Result<()> {
    let mut workspace = ctx.workspace()?;
    match action {
        ColumnsAction::List { json } => {
            let hidden = workspace.hidden_columns();
            let lines: Vec<ColumnLine<'_>> = workspace
                .sheet()
                .columns
                .iter()
                .map(|c| ColumnLine {
                    id: &c.id,
                    name: c.label(),
                    column_type: c.column_type,
                    options: &c.options,
                    hidden: hidden.contains(&c.id),
                })
                .collect();
            if json {
                return print_json(&lines);
            }
            for line in &lines {
                let flag = if line.hidden { " (hidden)" } else { "" };
                let options =
                    if line.options.is_empty() { String::new() } else { format!("\t[{}]", line.options.join(", ")) };
                println!("{}\t{}{flag}\t{}{options}", line.name, line.column_type, line.id);
            }
        },
        ColumnsAction::Add { name, column_type, options } => {
            let id = workspace.add_column(&name, column_type, &split_list(&options))?;
            println!("Added column {} ({id})", name.trim());
        },
        ColumnsAction::Edit { column, name, column_type, options } => {
            let id = resolve_column(&workspace, &column)?;
            let current = workspace.sheet().column(&id).cloned().ok_or_else(|| anyhow!("No column '{column}'"))?;
            let options = options.as_deref().map_or_else(|| current.options.clone(), split_list);
            let name = name.unwrap_or_else(|| current.name.clone());
            workspace.edit_column(&id, &name, column_type.unwrap_or(current.column_type), &options)?;
            println!("Updated column {}", name.trim());
        },
        ColumnsAction::Delete { column } => {
            let id = resolve_column(&workspace, &column)?;
            workspace.delete_column(&id)?;
            println!("Deleted column {column}");
        },
        ColumnsAction::Move { column, to } => {
            let from = resolve_column(&workspace, &column)?;
            let to = resolve_column(&workspace, &to)?;
            workspace.move_column(&from, &to)?;
            let order: Vec<&str> = workspace.sheet().columns.iter().map(|c| c.label()).collect();
            println!("{}", order.join(", "));
        },
        ColumnsAction::Hide { column } => {
            let id = resolve_column(&workspace, &column)?;
            let hidden = workspace.toggle_column_hidden(&id)?;
            println!("{column} is now {}", if hidden { "hidden" } else { "shown" });
        },
    }
    Ok(())
}
