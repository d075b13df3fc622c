//! Core library for turning spreadsheet invoice exports into invoices.
//!
//! This crate provides:
//! - Column mapping from arbitrary, multi-language headers onto canonical fields
//! - Workbook shape detection (single-row, grouped rows, relational sheets)
//! - Row to invoice transformation with amount, date and currency parsing
//! - Invoice validation with per-row error and warning reporting

pub mod error;
pub mod mapping;
pub mod models;
pub mod pipeline;
pub mod rules;
pub mod transform;
pub mod validate;

pub use error::{ExtractionError, Result, SheetinvError, SourceError};
pub use mapping::{
    detect_column_mappings, detect_format, detect_sheet_relationships, missing_required_fields,
    normalize, ColumnMapper, ColumnMapping, Field, MappingOverride, MappingSubmission, SheetFormat,
    SheetMode, SheetRelationship,
};
pub use models::config::SheetinvConfig;
pub use models::invoice::{Address, Customer, Discount, DiscountKind, Invoice, InvoiceStatus, LineItem};
pub use models::sheet::{CellValue, Row, Sheet, Workbook};
pub use pipeline::{convert_workbook, ConversionReport, Inspection, Pipeline, SheetMappings};
pub use transform::{transform_to_invoices, DataTransformer, TransformOutput};
pub use validate::{
    validate_invoices, InvoiceValidator, Severity, ValidationCode, ValidationIssue, ValidationResult,
};
