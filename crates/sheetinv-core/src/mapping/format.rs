//! Workbook shape detection.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::config::DetectionConfig;
use crate::models::sheet::Row;
use crate::rules::patterns::{SHEET_CUSTOMERS, SHEET_INVOICES, SHEET_ITEMS};

use super::{ColumnMapping, Field};

/// How invoices are laid out in a workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetFormat {
    /// Each row is a whole invoice.
    #[default]
    FlatSingleRow,
    /// Rows sharing an invoice number form one invoice.
    FlatMultiRow,
    /// Customers, invoices and items on separate sheets.
    MultiSheet,
}

impl SheetFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SheetFormat::FlatSingleRow => "flat_single_row",
            SheetFormat::FlatMultiRow => "flat_multi_row",
            SheetFormat::MultiSheet => "multi_sheet",
        }
    }
}

impl fmt::Display for SheetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SheetFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "flat_single_row" | "single" | "single_row" => Ok(SheetFormat::FlatSingleRow),
            "flat_multi_row" | "multi_row" | "grouped" => Ok(SheetFormat::FlatMultiRow),
            "multi_sheet" | "relational" => Ok(SheetFormat::MultiSheet),
            other => Err(format!("unknown sheet format: {}", other)),
        }
    }
}

/// Heuristic workbook shape classifier.
#[derive(Debug, Clone)]
pub struct FormatDetector {
    /// Distinct invoice numbers below this share of rows means grouped rows.
    multi_row_ratio: f64,
    /// Rows inspected for repeating invoice numbers.
    sample_rows: usize,
}

impl FormatDetector {
    pub fn new() -> Self {
        Self::from_config(&DetectionConfig::default())
    }

    pub fn from_config(config: &DetectionConfig) -> Self {
        Self {
            multi_row_ratio: config.multi_row_ratio,
            sample_rows: config.format_sample_rows,
        }
    }

    /// Classify a workbook from its sheet names and the main sheet's mappings
    /// and rows.
    pub fn detect(&self, sheet_names: &[String], mappings: &[ColumnMapping], rows: &[Row]) -> SheetFormat {
        let has_customers = sheet_names.iter().any(|s| SHEET_CUSTOMERS.is_match(s));
        let has_invoices = sheet_names.iter().any(|s| SHEET_INVOICES.is_match(s));
        let has_items = sheet_names.iter().any(|s| SHEET_ITEMS.is_match(s));

        if sheet_names.len() >= 2 && (has_customers || (has_invoices && has_items)) {
            return SheetFormat::MultiSheet;
        }

        let number_column = mappings
            .iter()
            .find(|m| m.target_field == Some(Field::InvoiceNumber))
            .map(|m| m.source_column.as_str());

        let sample = &rows[..rows.len().min(self.sample_rows)];
        if let Some(column) = number_column {
            if sample.len() >= 2 {
                // Blank numbers count as one value; absent cells do not
                let distinct: HashSet<String> = sample
                    .iter()
                    .filter_map(|row| row.get(column))
                    .map(|cell| cell.to_text())
                    .collect();

                if (distinct.len() as f64) < sample.len() as f64 * self.multi_row_ratio {
                    return SheetFormat::FlatMultiRow;
                }
            }
        }

        SheetFormat::FlatSingleRow
    }
}

impl Default for FormatDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Classify with default thresholds.
pub fn detect_format(sheet_names: &[String], mappings: &[ColumnMapping], rows: &[Row]) -> SheetFormat {
    FormatDetector::new().detect(sheet_names, mappings, rows)
}
