//! CSV export and header-matched import.
//!
//! Export writes every non-photo column plus a trailing `Tags` column.
//! Import is split in two steps so a front end can offer a column picker:
//! [`parse_csv`] matches headers to the current columns, [`apply_import`]
//! writes the selected columns in one of three [`ImportMode`]s.

use std::collections::HashSet;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::column::{Column, ColumnType, label_key};
use crate::constants::labels;
use crate::currency::normalize_number_cell;
use crate::error::{CoreError, Result};
use crate::row::Row;
use crate::sheet::SheetState;
use crate::tags::normalize_tags_input;

const DELIMITERS: [u8; 3] = [b',', b'\t', b';'];

/// Serialize a sheet to CSV text.
pub fn export_csv(state: &SheetState) -> Result<String> {
    let columns: Vec<&Column> = state.columns.iter().filter(|c| !c.is_photo_column()).collect();
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    let mut header: Vec<&str> = columns.iter().map(|c| c.label()).collect();
    header.push("Tags");
    writer.write_record(&header)?;

    for row in &state.rows {
        let mut record: Vec<String> = columns.iter().map(|c| row.cell(&c.id).to_owned()).collect();
        record.push(row.clean_tags().join(", "));
        writer.write_record(&record)?;
    }

    let bytes = writer.into_inner().map_err(|e| CoreError::InvalidInput(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| CoreError::InvalidInput(e.to_string()))
}

/// Pick the most frequent of comma, tab and semicolon in the header line.
pub fn detect_delimiter(line: &str) -> u8 {
    let mut best = b',';
    let mut best_count = 0;
    for delimiter in DELIMITERS {
        let count = line.bytes().filter(|b| *b == delimiter).count();
        if count > best_count {
            best = delimiter;
            best_count = count;
        }
    }
    best
}

/// A CSV column the user may choose to import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectableColumn {
    pub index: usize,
    pub label: String,
}

/// Parsed CSV with its header matched against the sheet's columns.
#[derive(Debug, Clone)]
pub struct CsvPreview {
    pub delimiter: u8,
    /// Column id per CSV index; `None` for unmatched, photo and Tags headers.
    pub column_map: Vec<Option<String>>,
    pub tags_index: Option<usize>,
    pub selectable: Vec<SelectableColumn>,
    pub records: Vec<Vec<String>>,
}

impl CsvPreview {
    /// Every selectable CSV index, the default selection.
    pub fn all_indices(&self) -> HashSet<usize> {
        self.selectable.iter().map(|s| s.index).collect()
    }

    /// CSV indices whose header matches any of `labels` (case-insensitive).
    pub fn indices_for_labels(&self, wanted: &[String]) -> HashSet<usize> {
        let keys: HashSet<String> = wanted.iter().map(|l| label_key(l)).collect();
        self.selectable
            .iter()
            .filter(|s| keys.contains(&label_key(&s.label)))
            .map(|s| s.index)
            .collect()
    }
}

fn is_blank_record(record: &csv::StringRecord) -> bool {
    record.iter().all(|f| f.trim().is_empty())
}

/// Parse CSV text and map its header onto `columns`.
pub fn parse_csv(text: &str, columns: &[Column]) -> Result<CsvPreview> {
    let first_line = text.lines().find(|l| !l.trim().is_empty()).unwrap_or_default();
    let delimiter = detect_delimiter(first_line);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record?;
        if is_blank_record(&record) {
            continue;
        }
        records.push(record.iter().map(str::to_owned).collect::<Vec<_>>());
    }
    if records.len() < 2 {
        return Err(CoreError::CsvImport("CSV file is empty or has no data rows.".into()));
    }
    let header = records.remove(0);

    let mut column_map = Vec::with_capacity(header.len());
    let mut tags_index = None;
    let mut selectable = Vec::new();
    for (index, name) in header.iter().enumerate() {
        let key = label_key(name);
        if key == labels::TAGS {
            tags_index = Some(index);
            column_map.push(None);
            selectable.push(SelectableColumn { index, label: "Tags".into() });
            continue;
        }
        match columns.iter().find(|c| c.label_key() == key) {
            Some(column) if !column.is_photo_column() => {
                selectable.push(SelectableColumn { index, label: column.label().to_owned() });
                column_map.push(Some(column.id.clone()));
            },
            _ => column_map.push(None),
        }
    }
    if tags_index.is_none() && column_map.iter().all(Option::is_none) {
        return Err(CoreError::CsvImport(
            "No CSV columns matched your current columns. Check that the CSV header names match."
                .into(),
        ));
    }
    Ok(CsvPreview { delimiter, column_map, tags_index, selectable, records })
}

/// How imported values combine with existing rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImportMode {
    /// Every CSV line becomes a new row
    #[default]
    Append,
    /// Matched rows take every non-empty CSV value
    Overwrite,
    /// Matched rows only take values for their empty cells
    FillEmpty,
}

impl Display for ImportMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Append => f.write_str("append"),
            Self::Overwrite => f.write_str("overwrite"),
            Self::FillEmpty => f.write_str("fill-empty"),
        }
    }
}

impl FromStr for ImportMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "append" => Ok(Self::Append),
            "overwrite" => Ok(Self::Overwrite),
            "fill-empty" | "fill_empty" | "fill" => Ok(Self::FillEmpty),
            other => Err(format!("Invalid import mode: {other}")),
        }
    }
}

/// Result of a successful import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportOutcome {
    pub mode: ImportMode,
    pub imported: usize,
    /// Select options introduced by the import, as `(column id, value)`.
    pub new_options: Vec<(String, String)>,
}

impl ImportOutcome {
    /// Event log detail, e.g. "Imported 3 rows".
    pub fn summary(&self) -> String {
        let verb = if self.mode == ImportMode::Append { "Imported" } else { "Updated" };
        format!("{verb} {} rows", self.imported)
    }
}

fn row_name(row: &Row, name_id: &str) -> String {
    row.cell(name_id).trim().to_lowercase()
}

/// Index of the existing row a CSV line should update, if any.
fn match_row(
    rows: &[Row],
    name_id: &str,
    csv_name: &str,
    position: usize,
    by_position_only: bool,
) -> Option<usize> {
    if by_position_only {
        return (position < rows.len()).then_some(position);
    }
    let wanted = csv_name.trim().to_lowercase();
    if !wanted.is_empty() {
        if let Some(i) = rows.iter().position(|r| row_name(r, name_id) == wanted) {
            return Some(i);
        }
    }
    rows.get(position).filter(|r| row_name(r, name_id).is_empty()).map(|_| position)
}

/// Write the selected CSV columns into `state`.
///
/// Non-append modes match rows on the Name column; when Name is the only
/// selected data column rows are matched purely by position. Lines that carry
/// no data, or find no row to update, are skipped.
pub fn apply_import(
    state: &mut SheetState,
    preview: &CsvPreview,
    mode: ImportMode,
    selected: &HashSet<usize>,
) -> Result<ImportOutcome> {
    let include_tags = preview.tags_index.is_some_and(|i| selected.contains(&i));

    let mut name_target: Option<(String, usize)> = None;
    let mut by_position_only = false;
    if mode != ImportMode::Append {
        let name_id = state
            .columns
            .iter()
            .find(|c| c.is_name_column())
            .map(|c| c.id.clone())
            .ok_or_else(|| {
                CoreError::CsvImport(
                    "No Name column exists to match rows for overwrite or fill-empty.".into(),
                )
            })?;
        let name_index = preview
            .column_map
            .iter()
            .position(|c| c.as_deref() == Some(name_id.as_str()))
            .ok_or_else(|| {
                CoreError::CsvImport(
                    "CSV must include a Name column to match rows for overwrite or fill-empty."
                        .into(),
                )
            })?;
        let selected_data = selected
            .iter()
            .filter(|i| Some(**i) != preview.tags_index)
            .filter(|i| preview.column_map.get(**i).is_some_and(Option::is_some))
            .count();
        by_position_only = selected_data == 1 && selected.contains(&name_index);
        name_target = Some((name_id, name_index));
    }

    let mut outcome = ImportOutcome { mode, ..ImportOutcome::default() };
    let mut appended = Vec::new();
    for (position, record) in preview.records.iter().enumerate() {
        let (existing, mut row) = match &name_target {
            None => (None, Row::blank()),
            Some((name_id, name_index)) => {
                let csv_name = record.get(*name_index).map_or("", String::as_str);
                match match_row(&state.rows, name_id, csv_name, position, by_position_only) {
                    Some(i) => (Some(i), state.rows[i].clone()),
                    None => continue,
                }
            },
        };

        let mut has_data = false;
        if include_tags {
            let tags = preview
                .tags_index
                .and_then(|i| record.get(i))
                .map(|v| normalize_tags_input(v))
                .unwrap_or_default();
            if !tags.is_empty() && (mode == ImportMode::Overwrite || row.clean_tags().is_empty()) {
                row.tags = tags;
                has_data = true;
            }
        }

        for (index, value) in record.iter().enumerate() {
            if !selected.contains(&index) || Some(index) == preview.tags_index {
                continue;
            }
            let Some(column_id) = preview.column_map.get(index).and_then(Option::as_ref) else {
                continue;
            };
            let Some(column) = state.columns.iter_mut().find(|c| &c.id == column_id) else {
                continue;
            };
            let trimmed = value.trim();
            if trimmed.is_empty() {
                continue;
            }
            let stored = if column.column_type == ColumnType::Number {
                normalize_number_cell(trimmed)
            } else {
                trimmed.to_owned()
            };
            if mode != ImportMode::FillEmpty || row.cell(column_id).trim().is_empty() {
                row.set_cell(column_id, stored);
                has_data = true;
            }

            if column.column_type == ColumnType::Select {
                let lower = trimmed.to_lowercase();
                if !column.options.iter().any(|o| o.to_lowercase() == lower) {
                    column.options.push(trimmed.to_owned());
                    outcome.new_options.push((column.id.clone(), trimmed.to_owned()));
                }
            }
        }

        if !has_data {
            continue;
        }
        outcome.imported += 1;
        match existing {
            Some(i) => state.rows[i] = row,
            None => appended.push(row),
        }
    }

    if outcome.imported == 0 {
        return Err(CoreError::CsvImport(
            "No rows were imported. The CSV may be empty or have no matching data.".into(),
        ));
    }
    if !appended.is_empty() {
        // a lone placeholder row is replaced rather than kept above the import
        if state.rows.len() == 1 && !state.rows[0].has_data() {
            state.rows.clear();
        }
        state.rows.extend(appended);
    }
    state.ensure_row_cells();
    Ok(outcome)
}
