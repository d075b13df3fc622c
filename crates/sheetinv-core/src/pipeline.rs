//! End-to-end conversion: map columns, detect the workbook shape, transform
//! rows into invoices and validate them.

use std::time::Instant;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Result, SheetinvError, SourceError};
use crate::mapping::format::FormatDetector;
use crate::mapping::relationships::RelationshipDetector;
use crate::mapping::{
    missing_required_fields, ColumnMapper, ColumnMapping, Field, MappingSubmission, SheetFormat,
    SheetMode, SheetRelationship,
};
use crate::models::config::SheetinvConfig;
use crate::models::invoice::{Invoice, InvoiceStatus};
use crate::models::sheet::{Sheet, Workbook};
use crate::transform::DataTransformer;
use crate::validate::{InvoiceValidator, ValidationResult};

/// Column mappings of one sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetMappings {
    pub sheet_name: String,
    pub row_count: usize,
    pub mappings: Vec<ColumnMapping>,
}

/// What the pipeline makes of a workbook before converting anything.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Inspection {
    pub sheets: Vec<SheetMappings>,
    pub format: SheetFormat,
    /// Only populated for relational workbooks.
    pub relationships: Vec<SheetRelationship>,
    /// Required fields no sheet maps.
    pub missing_required: Vec<Field>,
}

impl Inspection {
    /// All mappings, each tagged with its sheet.
    pub fn mappings(&self) -> Vec<ColumnMapping> {
        self.sheets
            .iter()
            .flat_map(|s| s.mappings.iter().cloned())
            .collect()
    }

    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.sheet_name.clone()).collect()
    }
}

/// Result of a full conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionReport {
    pub inspection: Inspection,
    /// Every invoice produced, status annotated.
    pub invoices: Vec<Invoice>,
    pub validation: ValidationResult,
    /// Warnings raised while transforming rows.
    pub warnings: Vec<String>,
    pub processing_time_ms: u64,
}

impl ConversionReport {
    /// Invoices that can go on to rendering.
    pub fn deliverable(&self) -> impl Iterator<Item = &Invoice> {
        self.invoices
            .iter()
            .filter(|i| i.status != InvoiceStatus::Error)
    }
}

/// Runs the conversion stages over an in-memory workbook.
#[derive(Debug, Clone)]
pub struct Pipeline {
    mapper: ColumnMapper,
    detector: FormatDetector,
    relationships: RelationshipDetector,
    transformer: DataTransformer,
    validator: InvoiceValidator,
}

impl Pipeline {
    /// Create a pipeline with default settings.
    pub fn new() -> Self {
        Self::from_config(&SheetinvConfig::default())
    }

    pub fn from_config(config: &SheetinvConfig) -> Self {
        Self {
            mapper: ColumnMapper::from_config(&config.mapping),
            detector: FormatDetector::from_config(&config.detection),
            relationships: RelationshipDetector::from_config(&config.detection),
            transformer: DataTransformer::from_config(config),
            validator: InvoiceValidator::new(),
        }
    }

    /// Pin "today" for missing issue dates and the future-date check.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.transformer = self.transformer.with_today(today);
        self.validator = self.validator.with_reference_date(today);
        self
    }

    /// Map and classify a workbook.
    ///
    /// `submission` replaces detection for the sheets it covers and may
    /// narrow the workbook to its selected sheets. `format` overrides
    /// detection.
    pub fn inspect(
        &self,
        workbook: &Workbook,
        submission: Option<&MappingSubmission>,
        format: Option<SheetFormat>,
    ) -> Result<Inspection> {
        let sheets = scope(workbook, submission)?;
        let confirmed = submission.map(|s| s.column_mappings()).unwrap_or_default();

        let mapped: Vec<SheetMappings> = sheets
            .iter()
            .enumerate()
            .map(|(i, sheet)| SheetMappings {
                sheet_name: sheet.name.clone(),
                row_count: sheet.rows.len(),
                mappings: self.sheet_mappings(sheet, i == 0, &confirmed),
            })
            .collect();

        let names: Vec<String> = sheets.iter().map(|s| s.name.clone()).collect();
        let format = match format {
            Some(format) => format,
            None if sheets.len() >= 2
                && submission.is_some_and(|s| s.sheet_mode == SheetMode::Multi) =>
            {
                SheetFormat::MultiSheet
            }
            None => match (sheets.first(), mapped.first()) {
                (Some(sheet), Some(primary)) => {
                    self.detector.detect(&names, &primary.mappings, &sheet.rows)
                }
                _ => SheetFormat::default(),
            },
        };

        let relationships = if format == SheetFormat::MultiSheet {
            self.relationships.detect(&sheets)
        } else {
            Vec::new()
        };

        let missing_required = missing_required_fields(mapped.iter().flat_map(|s| &s.mappings));

        info!(
            "Inspected {} sheet(s): format {}, {} relationship(s), {} required field(s) unmapped",
            sheets.len(),
            format,
            relationships.len(),
            missing_required.len()
        );

        Ok(Inspection {
            sheets: mapped,
            format,
            relationships,
            missing_required,
        })
    }

    /// Convert a workbook into validated invoices.
    pub fn run(
        &self,
        workbook: &Workbook,
        submission: Option<&MappingSubmission>,
        format: Option<SheetFormat>,
    ) -> Result<ConversionReport> {
        let start = Instant::now();

        let inspection = self.inspect(workbook, submission, format)?;
        let selected = inspection.sheet_names();
        let output = self.transformer.transform(
            workbook,
            &inspection.mappings(),
            inspection.format,
            Some(&selected),
        )?;

        for warning in &output.warnings {
            warn!("{}", warning);
        }

        let mut invoices = output.invoices;
        let mut validation = self.validator.validate(&mut invoices);
        validation.push_transform_warnings(&output.warnings);

        info!(
            "Converted {} invoice(s): {} valid, {} with warnings, {} with errors",
            validation.total_rows, validation.valid_rows, validation.warning_rows, validation.error_rows
        );

        Ok(ConversionReport {
            inspection,
            invoices,
            validation,
            warnings: output.warnings,
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Confirmed mappings for `sheet` when the submission covers it, else
    /// detected ones. Untagged confirmed mappings belong to the first sheet.
    fn sheet_mappings(
        &self,
        sheet: &Sheet,
        primary: bool,
        confirmed: &[ColumnMapping],
    ) -> Vec<ColumnMapping> {
        let tagged: Vec<ColumnMapping> = confirmed
            .iter()
            .filter(|m| m.sheet_name.as_deref() == Some(sheet.name.as_str()))
            .cloned()
            .collect();
        if !tagged.is_empty() {
            return tagged;
        }

        if primary {
            let untagged: Vec<ColumnMapping> = confirmed
                .iter()
                .filter(|m| m.sheet_name.is_none())
                .map(|m| m.clone().with_sheet(sheet.name.clone()))
                .collect();
            if !untagged.is_empty() {
                return untagged;
            }
        }

        debug!("Detecting mappings for sheet '{}'", sheet.name);
        self.mapper.map_sheet(sheet)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Sheets the run covers: the submission's selection, or the whole workbook.
fn scope<'a>(workbook: &'a Workbook, submission: Option<&MappingSubmission>) -> Result<Vec<&'a Sheet>> {
    match submission.and_then(|s| s.selected_sheets.as_deref()) {
        Some(selected) if !selected.is_empty() => selected
            .iter()
            .map(|name| {
                workbook
                    .sheet(name)
                    .ok_or_else(|| SheetinvError::from(SourceError::SheetNotFound(name.clone())))
            })
            .collect(),
        _ => Ok(workbook.sheets.iter().collect()),
    }
}

/// Convert with default settings.
pub fn convert_workbook(workbook: &Workbook) -> Result<ConversionReport> {
    Pipeline::new().run(workbook, None, None)
}
