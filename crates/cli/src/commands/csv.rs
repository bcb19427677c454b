use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use clap::Subcommand;
use shirt_tracker_core::csv_io::{ImportMode, export_csv};
use shirt_tracker_service::ImportRequest;

use super::{AppContext, resolve_tab, split_list};

#[derive(Subcommand)]
pub(crate) enum CsvAction {
    /// Write a tab as CSV (photo columns left out, tags last)
    Export {
        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long)]
        tab: Option<String>,
    },
    /// Import rows from a CSV file into the active tab
    Import {
        file: PathBuf,
        /// append, overwrite or fill-empty
        #[arg(short, long, default_value = "append")]
        mode: ImportMode,
        /// Comma separated CSV headers to import; all matched ones by default
        #[arg(short, long)]
        columns: Option<String>,
    },
    /// Show which CSV headers match the active tab's columns
    Preview { file: PathBuf },
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| anyhow!("Failed to read {}: {e}", path.display()))
}

pub(crate) fn run(ctx: &AppContext, action: CsvAction) -> Result<()> {
    let mut workspace = ctx.workspace()?;
    match action {
        CsvAction::Export { output, tab } => {
            let text = match tab.as_deref() {
                Some(raw) => export_csv(&workspace.tab_sheet(&resolve_tab(&workspace, raw)?)?)?,
                None => workspace.export_csv()?,
            };
            match output {
                Some(path) => {
                    std::fs::write(&path, text)?;
                    eprintln!("Exported to {}", path.display());
                },
                None => print!("{text}"),
            }
        },
        CsvAction::Import { file, mode, columns } => {
            let request = ImportRequest {
                text: read_file(&file)?,
                mode,
                columns: columns.as_deref().map(split_list),
            };
            let outcome = workspace.import_csv(&request)?;
            println!("{}", outcome.summary());
            for (column_id, value) in &outcome.new_options {
                let label = workspace.sheet().column(column_id).map_or(column_id.as_str(), |c| c.label());
                println!("New {label} option: {value}");
            }
        },
        CsvAction::Preview { file } => {
            let preview = workspace.preview_import(&read_file(&file)?)?;
            let delimiter = match preview.delimiter {
                b'\t' => "tab".to_owned(),
                other => char::from(other).to_string(),
            };
            println!("Delimiter: {delimiter}");
            println!("Rows: {}", preview.records.len());
            let labels: Vec<&str> = preview.selectable.iter().map(|s| s.label.as_str()).collect();
            println!("Columns: {}", labels.join(", "));
            if preview.tags_index.is_some() {
                println!("Tags column found");
            }
        },
    }
    Ok(())
}
