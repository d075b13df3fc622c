//! Invoice validation.
//!
//! Every invoice is checked against structural rules (errors) and data
//! quality rules (warnings) and its `status` and `validation_errors` are
//! updated in place. Duplicate numbers are detected in input order, so the
//! first occurrence stays clean and later ones are flagged.

use std::collections::HashSet;
use std::fmt;

use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::models::invoice::{Invoice, InvoiceStatus, PLACEHOLDER_DESCRIPTION, UNKNOWN_CUSTOMER};
use crate::rules::patterns::EMAIL;

/// Issue severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Machine-readable issue code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationCode {
    MissingInvoiceNumber,
    MissingCustomerName,
    MissingLineItems,
    DuplicateInvoiceNumber,
    MissingDescription,
    NegativeQuantity,
    NegativePrice,
    InvalidEmailFormat,
    FutureDate,
    TransformWarning,
}

impl ValidationCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationCode::MissingInvoiceNumber => "MISSING_INVOICE_NUMBER",
            ValidationCode::MissingCustomerName => "MISSING_CUSTOMER_NAME",
            ValidationCode::MissingLineItems => "MISSING_LINE_ITEMS",
            ValidationCode::DuplicateInvoiceNumber => "DUPLICATE_INVOICE_NUMBER",
            ValidationCode::MissingDescription => "MISSING_DESCRIPTION",
            ValidationCode::NegativeQuantity => "NEGATIVE_QUANTITY",
            ValidationCode::NegativePrice => "NEGATIVE_PRICE",
            ValidationCode::InvalidEmailFormat => "INVALID_EMAIL_FORMAT",
            ValidationCode::FutureDate => "FUTURE_DATE",
            ValidationCode::TransformWarning => "TRANSFORM_WARNING",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            ValidationCode::MissingInvoiceNumber
            | ValidationCode::MissingCustomerName
            | ValidationCode::MissingLineItems
            | ValidationCode::NegativeQuantity
            | ValidationCode::NegativePrice => Severity::Error,
            _ => Severity::Warning,
        }
    }

    /// Human-readable description, filled in with the offending value.
    pub fn message(&self, value: Option<&str>) -> String {
        match self {
            ValidationCode::MissingInvoiceNumber => "Invoice number is required".to_string(),
            ValidationCode::MissingCustomerName => "Customer name is required".to_string(),
            ValidationCode::MissingLineItems => "Invoice must have at least one line item".to_string(),
            ValidationCode::DuplicateInvoiceNumber => {
                format!("Duplicate invoice number: {}", value.unwrap_or_default())
            }
            ValidationCode::MissingDescription => "Description is required for line items".to_string(),
            ValidationCode::NegativeQuantity => "Quantity cannot be negative".to_string(),
            ValidationCode::NegativePrice => "Price cannot be negative".to_string(),
            ValidationCode::InvalidEmailFormat => "Invalid email address format".to_string(),
            ValidationCode::FutureDate => "Invoice date is in the future".to_string(),
            ValidationCode::TransformWarning => "Warning during data transformation".to_string(),
        }
    }

    /// Hint for fixing the source data.
    pub fn suggestion(&self) -> &'static str {
        match self {
            ValidationCode::MissingInvoiceNumber => "Fill in the invoice number or map the invoice number column",
            ValidationCode::MissingCustomerName => "Fill in the customer name or map the customer column",
            ValidationCode::MissingLineItems => "Add at least one line item row",
            ValidationCode::DuplicateInvoiceNumber => "Give each invoice a unique number",
            ValidationCode::MissingDescription => "Describe the item",
            ValidationCode::NegativeQuantity => "Use a quantity of zero or more",
            ValidationCode::NegativePrice => "Use a price of zero or more",
            ValidationCode::InvalidEmailFormat => "Use an address of the form name@example.com",
            ValidationCode::FutureDate => "Check the invoice date",
            ValidationCode::TransformWarning => "Review the source rows",
        }
    }
}

impl fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an issue was found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_number: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub code: ValidationCode,
    /// `Row {n}: {description}`.
    pub message: String,
    pub details: IssueDetails,
}

impl ValidationIssue {
    fn new(code: ValidationCode, row_number: Option<usize>, column: Option<&str>, value: Option<String>) -> Self {
        let row = row_number
            .map(|n| n.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        Self {
            severity: code.severity(),
            code,
            message: format!("Row {}: {}", row, code.message(value.as_deref())),
            details: IssueDetails {
                row_number,
                column_name: column.map(str::to_string),
                value,
            },
        }
    }

    /// Warning carried over from the transformer.
    pub fn transform_warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code: ValidationCode::TransformWarning,
            message: message.into(),
            details: IssueDetails::default(),
        }
    }
}

/// Findings for one invoice.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceValidation {
    pub invoice_number: String,
    pub is_valid: bool,
    pub status: InvoiceStatus,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

/// Aggregate outcome of a validation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// No invoice has errors.
    pub is_valid: bool,
    pub total_rows: usize,
    pub valid_rows: usize,
    pub warning_rows: usize,
    pub error_rows: usize,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub invoice_results: Vec<InvoiceValidation>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self {
            is_valid: true,
            total_rows: 0,
            valid_rows: 0,
            warning_rows: 0,
            error_rows: 0,
            errors: Vec::new(),
            warnings: Vec::new(),
            invoice_results: Vec::new(),
        }
    }
}

impl ValidationResult {
    /// Append transformer warnings as `TRANSFORM_WARNING` entries. Invoice
    /// counts are unaffected.
    pub fn push_transform_warnings<S: AsRef<str>>(&mut self, warnings: &[S]) {
        self.warnings.extend(
            warnings
                .iter()
                .map(|w| ValidationIssue::transform_warning(w.as_ref())),
        );
    }
}

/// Validates invoices and records their status.
#[derive(Debug, Clone, Default)]
pub struct InvoiceValidator {
    /// Issue dates after this day are flagged; today when unset.
    reference_date: Option<NaiveDate>,
}

impl InvoiceValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare issue dates against `date` instead of today.
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    /// Validate `invoices` in order, updating each one's status.
    pub fn validate(&self, invoices: &mut [Invoice]) -> ValidationResult {
        let reference = self
            .reference_date
            .unwrap_or_else(|| Local::now().date_naive());
        let mut seen: HashSet<String> = HashSet::new();
        let mut result = ValidationResult {
            total_rows: invoices.len(),
            ..Default::default()
        };

        for invoice in invoices.iter_mut() {
            let (errors, warnings) = self.check(invoice, &seen, reference);
            seen.insert(invoice.invoice_number.clone());

            if !errors.is_empty() {
                invoice.status = InvoiceStatus::Error;
                invoice.validation_errors = errors.iter().map(|e| e.message.clone()).collect();
                result.error_rows += 1;
            } else if !warnings.is_empty() {
                invoice.status = InvoiceStatus::Warning;
                invoice.validation_errors = warnings.iter().map(|w| w.message.clone()).collect();
                result.warning_rows += 1;
            } else {
                invoice.status = InvoiceStatus::Valid;
                invoice.validation_errors.clear();
                result.valid_rows += 1;
            }

            result.errors.extend(errors.iter().cloned());
            result.warnings.extend(warnings.iter().cloned());
            result.invoice_results.push(InvoiceValidation {
                invoice_number: invoice.invoice_number.clone(),
                is_valid: errors.is_empty(),
                status: invoice.status,
                errors,
                warnings,
            });
        }

        result.is_valid = result.error_rows == 0;

        debug!(
            "Validated {} invoices: {} valid, {} warnings, {} errors",
            result.total_rows, result.valid_rows, result.warning_rows, result.error_rows
        );

        result
    }

    fn check(
        &self,
        invoice: &Invoice,
        seen: &HashSet<String>,
        reference: NaiveDate,
    ) -> (Vec<ValidationIssue>, Vec<ValidationIssue>) {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let row = invoice.first_row();

        if invoice.invoice_number.trim().is_empty() {
            errors.push(ValidationIssue::new(ValidationCode::MissingInvoiceNumber, row, None, None));
        }

        let name = invoice.customer.name.trim();
        if name.is_empty() || name == UNKNOWN_CUSTOMER {
            errors.push(ValidationIssue::new(
                ValidationCode::MissingCustomerName,
                row,
                Some("customerName"),
                None,
            ));
        }

        if invoice.line_items.is_empty() {
            errors.push(ValidationIssue::new(ValidationCode::MissingLineItems, row, None, None));
        }

        if seen.contains(&invoice.invoice_number) {
            warnings.push(ValidationIssue::new(
                ValidationCode::DuplicateInvoiceNumber,
                row,
                Some("invoiceNumber"),
                Some(invoice.invoice_number.clone()),
            ));
        }

        for (i, item) in invoice.line_items.iter().enumerate() {
            let item_row = invoice.row_numbers.get(i).copied().or(row);

            let description = item.description.trim();
            if description.is_empty() || description == PLACEHOLDER_DESCRIPTION {
                warnings.push(ValidationIssue::new(
                    ValidationCode::MissingDescription,
                    item_row,
                    Some("description"),
                    None,
                ));
            }

            if item.quantity < Decimal::ZERO {
                errors.push(ValidationIssue::new(
                    ValidationCode::NegativeQuantity,
                    item_row,
                    Some("quantity"),
                    Some(item.quantity.normalize().to_string()),
                ));
            }

            if item.unit_price < Decimal::ZERO {
                errors.push(ValidationIssue::new(
                    ValidationCode::NegativePrice,
                    item_row,
                    Some("unitPrice"),
                    Some(item.unit_price.normalize().to_string()),
                ));
            }
        }

        if let Some(email) = invoice.customer.email.as_deref() {
            if !EMAIL.is_match(email) {
                warnings.push(ValidationIssue::new(
                    ValidationCode::InvalidEmailFormat,
                    row,
                    Some("customerEmail"),
                    Some(email.to_string()),
                ));
            }
        }

        if invoice.issue_date > reference {
            warnings.push(ValidationIssue::new(
                ValidationCode::FutureDate,
                row,
                Some("issueDate"),
                Some(invoice.issue_date.to_string()),
            ));
        }

        (errors, warnings)
    }
}

/// Validate with today as the reference date.
pub fn validate_invoices(invoices: &mut [Invoice]) -> ValidationResult {
    InvoiceValidator::new().validate(invoices)
}
