//! Spreadsheet decoding into the in-memory workbook model.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use calamine::{open_workbook_auto, Data, Reader};
use tracing::debug;

use sheetinv_core::{CellValue, Row, Sheet, Workbook};

/// File extensions the CLI can read.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods", "csv"];

/// Whether `path` has a readable spreadsheet extension.
pub fn is_supported(path: &Path) -> bool {
    extension(path).is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Read a spreadsheet file. The first row of every sheet is its header row.
pub fn load_workbook(path: &Path) -> anyhow::Result<Workbook> {
    if !path.exists() {
        anyhow::bail!("Input file not found: {}", path.display());
    }

    let workbook = match extension(path).as_deref() {
        Some("csv") => load_csv(path)?,
        Some(ext) if SUPPORTED_EXTENSIONS.contains(&ext) => load_spreadsheet(path)?,
        Some(ext) => anyhow::bail!("Unsupported file format: {}", ext),
        None => anyhow::bail!("Unsupported file format: {}", path.display()),
    };

    debug!(
        "Loaded {} sheet(s) from {}",
        workbook.sheets.len(),
        path.display()
    );
    Ok(workbook)
}

fn load_spreadsheet(path: &Path) -> anyhow::Result<Workbook> {
    let mut source = open_workbook_auto(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut sheets = Vec::new();
    for name in source.sheet_names() {
        let range = source
            .worksheet_range(&name)
            .with_context(|| format!("Failed to read sheet '{}'", name))?;

        let mut rows = range.rows();
        let Some(header_row) = rows.next() else {
            debug!("Sheet '{}' is empty", name);
            sheets.push(Sheet::new(name, Vec::new()));
            continue;
        };

        let headers = unique_headers(header_row.iter().map(cell_text));
        let mut sheet = Sheet::new(name, headers.clone());
        for cells in rows {
            sheet.rows.push(Row::from_pairs(
                headers
                    .iter()
                    .cloned()
                    .zip(cells.iter().map(cell_value).chain(std::iter::repeat(CellValue::Empty))),
            ));
        }
        sheets.push(sheet);
    }

    Ok(Workbook::new(sheets))
}

fn load_csv(path: &Path) -> anyhow::Result<Workbook> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let headers = unique_headers(reader.headers()?.iter().map(str::to_string));
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Sheet1")
        .to_string();

    let mut sheet = Sheet::new(name, headers.clone());
    for record in reader.records() {
        let record = record?;
        sheet.rows.push(Row::from_pairs(
            headers.iter().cloned().zip(
                record
                    .iter()
                    .map(CellValue::from)
                    .chain(std::iter::repeat(CellValue::Empty)),
            ),
        ));
    }

    Ok(Workbook::new(vec![sheet]))
}

/// Trimmed headers with blanks named by position and repeats suffixed
/// `_1`, `_2`...
fn unique_headers<I: IntoIterator<Item = String>>(raw: I) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();

    raw.into_iter()
        .enumerate()
        .map(|(i, header)| {
            let header = match header.trim() {
                "" => format!("Column {}", i + 1),
                h => h.to_string(),
            };
            let count = counts.entry(header.clone()).or_insert(0);
            let unique = if *count == 0 {
                header
            } else {
                format!("{}_{}", header, count)
            };
            *count += 1;
            unique
        })
        .collect()
}

fn cell_text(cell: &Data) -> String {
    cell_value(cell).to_text()
}

/// Dates are handed over as Excel serials; the core converts them for date
/// fields.
fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
    }
}
