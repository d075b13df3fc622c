//! Row to invoice transformation.
//!
//! Flat sheets are grouped by invoice number, one line item per row.
//! Relational workbooks are joined across their customer, invoice and item
//! sheets (see [`multi_sheet`]). A group or row that fails to convert is
//! reported as a warning and left out; it never stops the rest of the batch.

pub mod extract;
pub mod multi_sheet;

use std::collections::HashMap;

use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{ExtractionError, Result, SourceError};
use crate::mapping::{ColumnMapper, ColumnMapping, Field, SheetFormat};
use crate::models::config::{SheetinvConfig, TransformConfig};
use crate::models::invoice::{Customer, Invoice, InvoiceStatus, LineItem};
use crate::models::sheet::{Row, Sheet, Workbook};
use crate::rules::{currency_code, format_amount, parse_date};

pub use extract::{
    amount_value, compute_totals, extract_customer, extract_line_item, field_map, get_field_value,
    optional_value, FieldMap, TotalOverrides, Totals,
};
pub use multi_sheet::{identify_sheet_roles, SheetRoles};

/// Invoices produced by a transform, with the warnings raised on the way.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransformOutput {
    pub invoices: Vec<Invoice>,
    pub warnings: Vec<String>,
}

/// Rows sharing one invoice number, with their 1-based sheet row numbers.
#[derive(Debug)]
struct RowGroup<'a> {
    number: String,
    rows: Vec<(usize, &'a Row)>,
}

/// Converts mapped sheet rows into invoices.
#[derive(Debug, Clone)]
pub struct DataTransformer {
    config: TransformConfig,
    /// Used for sheets that arrive without mappings of their own.
    mapper: ColumnMapper,
    /// Fallback issue date; today when unset.
    today: Option<NaiveDate>,
}

impl DataTransformer {
    /// Create a transformer with default settings.
    pub fn new() -> Self {
        Self::from_config(&SheetinvConfig::default())
    }

    pub fn from_config(config: &SheetinvConfig) -> Self {
        Self {
            config: config.transform.clone(),
            mapper: ColumnMapper::from_config(&config.mapping),
            today: None,
        }
    }

    /// Pin the date used when an issue date is missing or unreadable.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Transform a workbook using `mappings` and the detected `format`.
    ///
    /// Multi-sheet transforms need at least two sheets (selected, or all of
    /// the workbook); with fewer the first sheet is read as flat data. Fails
    /// only when a selected sheet does not exist.
    pub fn transform(
        &self,
        workbook: &Workbook,
        mappings: &[ColumnMapping],
        format: SheetFormat,
        selected_sheets: Option<&[String]>,
    ) -> Result<TransformOutput> {
        if format == SheetFormat::MultiSheet {
            let names = match selected_sheets {
                Some(selected) if !selected.is_empty() => selected.to_vec(),
                _ => workbook.sheet_names(),
            };

            if names.len() >= 2 {
                let sheets = names
                    .iter()
                    .map(|name| {
                        workbook
                            .sheet(name)
                            .ok_or_else(|| SourceError::SheetNotFound(name.clone()))
                    })
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                return Ok(self.transform_multi_sheet(&sheets, mappings));
            }
            debug!("Multi-sheet format with {} sheet(s), reading as flat", names.len());
        }

        let sheet = match selected_sheets.and_then(|s| s.first()) {
            Some(name) => workbook
                .sheet(name)
                .ok_or_else(|| SourceError::SheetNotFound(name.clone()))?,
            None => match workbook.sheets.first() {
                Some(sheet) => sheet,
                None => return Ok(TransformOutput::default()),
            },
        };

        Ok(self.transform_flat(sheet, mappings))
    }

    /// Transform a single flat sheet. Mappings tagged with another sheet's
    /// name are ignored.
    pub fn transform_flat(&self, sheet: &Sheet, mappings: &[ColumnMapping]) -> TransformOutput {
        let fields = field_map(
            mappings
                .iter()
                .filter(|m| m.sheet_name.as_deref().is_none_or(|s| s == sheet.name)),
        );

        let groups = group_rows(&sheet.rows, &fields);
        let mut output = TransformOutput::default();

        for group in &groups {
            match self.build_group(group, &fields) {
                Ok((invoice, warnings)) => {
                    output.invoices.push(invoice);
                    output.warnings.extend(warnings);
                }
                Err(e) => output
                    .warnings
                    .push(format!("Failed to process invoice {}: {}", group.number, e)),
            }
        }

        info!(
            "Transformed {} rows of '{}' into {} invoices ({} warnings)",
            sheet.rows.len(),
            sheet.name,
            output.invoices.len(),
            output.warnings.len()
        );

        output
    }

    fn build_group(
        &self,
        group: &RowGroup<'_>,
        fields: &FieldMap,
    ) -> std::result::Result<(Invoice, Vec<String>), ExtractionError> {
        let &(first_row, header) = group.rows.first().ok_or(ExtractionError::NoData)?;

        let customer = extract_customer(header, fields, first_row);
        let line_items = group
            .rows
            .iter()
            .map(|(_, row)| extract_line_item(row, fields, self.config.discount_mode))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let row_numbers = group.rows.iter().map(|(n, _)| *n).collect();

        self.assemble(group.number.clone(), customer, line_items, header, fields, row_numbers)
    }

    /// Build an invoice from its parts, reading invoice-level fields from
    /// `header`. Returns the invoice with any warnings it raised.
    fn assemble(
        &self,
        invoice_number: String,
        customer: Customer,
        line_items: Vec<LineItem>,
        header: &Row,
        fields: &FieldMap,
        row_numbers: Vec<usize>,
    ) -> std::result::Result<(Invoice, Vec<String>), ExtractionError> {
        let mut warnings = Vec::new();

        let issue_date = parse_date(&get_field_value(header, fields, Field::IssueDate))
            .unwrap_or_else(|| self.today());
        let due_date = parse_date(&get_field_value(header, fields, Field::DueDate));

        let raw_currency = get_field_value(header, fields, Field::Currency);
        let currency = match currency_code(&raw_currency) {
            Some(code) => code,
            None => {
                if !raw_currency.is_empty() {
                    warnings.push(format!(
                        "Invoice {}: unrecognised currency \"{}\", using {}",
                        invoice_number, raw_currency, self.config.default_currency
                    ));
                }
                self.config.default_currency.clone()
            }
        };

        let overrides = TotalOverrides::from_row(header, fields);
        let totals = compute_totals(&line_items, overrides)?;

        if self.config.warn_on_total_mismatch && overrides.total.is_some() {
            let mismatch = totals
                .grand_total
                .checked_sub(totals.computed_total)
                .is_none_or(|diff| diff.abs() > Decimal::new(1, 2));
            if mismatch {
                warnings.push(format!(
                    "Invoice {}: total {} does not match line items ({})",
                    invoice_number,
                    format_amount(totals.grand_total),
                    format_amount(totals.computed_total)
                ));
            }
        }

        let amount_paid = amount_value(header, fields, Field::AmountPaid).filter(|p| !p.is_zero());
        let balance_due = match amount_paid {
            Some(paid) => Some(
                totals
                    .grand_total
                    .checked_sub(paid)
                    .ok_or(ExtractionError::Overflow("balance due"))?,
            ),
            None => None,
        };

        debug!(
            "Invoice {}: {} line items, total {}",
            invoice_number,
            line_items.len(),
            totals.grand_total
        );

        let invoice = Invoice {
            invoice_number,
            customer,
            issue_date,
            due_date,
            line_items,
            currency,
            subtotal: totals.subtotal,
            total_tax: totals.total_tax,
            total_discount: totals.total_discount,
            grand_total: totals.grand_total,
            amount_paid,
            balance_due,
            notes: optional_value(header, fields, Field::Notes),
            terms: optional_value(header, fields, Field::Terms),
            po_number: optional_value(header, fields, Field::PoNumber),
            source_status: optional_value(header, fields, Field::Status),
            status: InvoiceStatus::Valid,
            validation_errors: Vec::new(),
            row_numbers,
        };

        Ok((invoice, warnings))
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }
}

impl Default for DataTransformer {
    fn default() -> Self {
        Self::new()
    }
}

/// Group non-blank rows by invoice number, in first-seen order.
///
/// A row with no invoice number cell (no mapped column, or the column absent
/// from the row) is its own `AUTO-n` group, `n` being its 1-based data row
/// index. Rows whose number cell is present but blank are never merged.
fn group_rows<'a>(rows: &'a [Row], fields: &FieldMap) -> Vec<RowGroup<'a>> {
    let number_column = fields.get(&Field::InvoiceNumber);
    let mut groups: Vec<RowGroup<'a>> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (i, row) in rows.iter().enumerate() {
        if row.is_blank() {
            continue;
        }
        // Row 1 is the header
        let row_number = i + 2;

        let number = match number_column.and_then(|column| row.get(column)) {
            Some(_) => get_field_value(row, fields, Field::InvoiceNumber),
            None => format!("AUTO-{}", i + 1),
        };

        if !number.is_empty() {
            if let Some(&g) = index.get(&number) {
                groups[g].rows.push((row_number, row));
                continue;
            }
            index.insert(number.clone(), groups.len());
        }

        groups.push(RowGroup {
            number,
            rows: vec![(row_number, row)],
        });
    }

    groups
}

/// Transform with default settings.
pub fn transform_to_invoices(
    workbook: &Workbook,
    mappings: &[ColumnMapping],
    format: SheetFormat,
    selected_sheets: Option<&[String]>,
) -> Result<TransformOutput> {
    DataTransformer::new().transform(workbook, mappings, format, selected_sheets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::DiscountMode;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn mappings(pairs: &[(&str, Field)]) -> Vec<ColumnMapping> {
        pairs
            .iter()
            .map(|(c, f)| ColumnMapping::confirmed(*c, *f))
            .collect()
    }

    fn transformer() -> DataTransformer {
        DataTransformer::new().with_today(date(2024, 6, 1))
    }

    fn standard_mappings() -> Vec<ColumnMapping> {
        mappings(&[
            ("inv", Field::InvoiceNumber),
            ("desc", Field::Description),
            ("qty", Field::Quantity),
            ("price", Field::UnitPrice),
        ])
    }

    #[test]
    fn test_groups_rows_by_invoice_number() {
        let sheet = Sheet::from_records(
            "Sheet1",
            ["inv", "desc", "qty", "price"],
            vec![
                vec!["A", "x", "1", "10"],
                vec!["B", "z", "1", "7"],
                vec!["A", "y", "2", "5"],
            ],
        );

        let output = transformer().transform_flat(&sheet, &standard_mappings());
        assert!(output.warnings.is_empty());
        assert_eq!(output.invoices.len(), 2);

        let a = &output.invoices[0];
        assert_eq!(a.invoice_number, "A");
        assert_eq!(a.line_items.len(), 2);
        assert_eq!(a.subtotal, dec("20"));
        assert_eq!(a.grand_total, dec("20"));
        assert_eq!(a.row_numbers, vec![2, 4]);
        assert_eq!(output.invoices[1].invoice_number, "B");
    }

    #[test]
    fn test_rows_without_number_column_stand_alone() {
        let sheet = Sheet::from_records(
            "Sheet1",
            ["desc", "price"],
            vec![vec!["x", "1"], vec!["", ""], vec!["y", "2"]],
        );
        let maps = mappings(&[("desc", Field::Description), ("price", Field::UnitPrice)]);

        let output = transformer().transform_flat(&sheet, &maps);
        let numbers: Vec<&str> = output.invoices.iter().map(|i| i.invoice_number.as_str()).collect();
        assert_eq!(numbers, vec!["AUTO-1", "AUTO-3"]);
    }

    #[test]
    fn test_blank_numbers_are_not_merged() {
        let sheet = Sheet::from_records(
            "Sheet1",
            ["inv", "desc"],
            vec![vec!["", "x"], vec!["", "y"]],
        );

        let output = transformer().transform_flat(&sheet, &standard_mappings());
        assert_eq!(output.invoices.len(), 2);
        assert!(output.invoices.iter().all(|i| i.invoice_number.is_empty()));
    }

    #[test]
    fn test_row_missing_number_cell_gets_auto_id() {
        let sheet = Sheet::new("Sheet1", vec!["inv".into(), "desc".into(), "price".into()])
            .with_row(Row::new().with("desc", "Widget").with("price", 5.0))
            .with_row(Row::new().with("inv", "INV-2").with("desc", "Gadget"))
            .with_row(Row::new().with("inv", "").with("desc", "Bolt"));

        let output = transformer().transform_flat(&sheet, &standard_mappings());
        let numbers: Vec<&str> = output.invoices.iter().map(|i| i.invoice_number.as_str()).collect();
        assert_eq!(numbers, vec!["AUTO-1", "INV-2", ""]);
        assert_eq!(output.invoices[0].row_numbers, vec![2]);
    }

    #[test]
    fn test_zero_quantity_line_is_kept() {
        let sheet = Sheet::from_records(
            "Sheet1",
            ["inv", "desc", "qty", "price"],
            vec![vec!["A", "x", "0", "10"], vec!["A", "y", "2", "5"]],
        );

        let output = transformer().transform_flat(&sheet, &standard_mappings());
        let invoice = &output.invoices[0];
        assert_eq!(invoice.line_items.len(), 2);
        assert_eq!(invoice.line_items[0].quantity, Decimal::ZERO);
        assert_eq!(invoice.line_items[0].line_total, Decimal::ZERO);
        assert_eq!(invoice.subtotal, dec("10"));
    }

    #[test]
    fn test_first_row_supplies_invoice_fields() {
        let sheet = Sheet::from_records(
            "Sheet1",
            ["inv", "date", "due", "cur", "notes", "desc"],
            vec![
                vec!["A", "2024-01-15", "soon", "eur", "first", "x"],
                vec!["A", "2024-02-01", "2024-03-01", "USD", "second", "y"],
            ],
        );
        let maps = mappings(&[
            ("inv", Field::InvoiceNumber),
            ("date", Field::IssueDate),
            ("due", Field::DueDate),
            ("cur", Field::Currency),
            ("notes", Field::Notes),
            ("desc", Field::Description),
        ]);

        let output = transformer().transform_flat(&sheet, &maps);
        let invoice = &output.invoices[0];
        assert_eq!(invoice.issue_date, date(2024, 1, 15));
        assert_eq!(invoice.due_date, None);
        assert_eq!(invoice.currency, "EUR");
        assert_eq!(invoice.notes.as_deref(), Some("first"));
    }

    #[test]
    fn test_unreadable_issue_date_defaults_to_today() {
        let sheet = Sheet::from_records("Sheet1", ["inv", "date"], vec![vec!["A", "whenever"]]);
        let maps = mappings(&[("inv", Field::InvoiceNumber), ("date", Field::IssueDate)]);

        let output = transformer().transform_flat(&sheet, &maps);
        assert_eq!(output.invoices[0].issue_date, date(2024, 6, 1));
    }

    #[test]
    fn test_serial_issue_date() {
        let sheet = Sheet::new("Sheet1", vec!["inv".into(), "date".into()])
            .with_row(Row::new().with("inv", "A").with("date", 45306.0));
        let maps = mappings(&[("inv", Field::InvoiceNumber), ("date", Field::IssueDate)]);

        let output = transformer().transform_flat(&sheet, &maps);
        assert_eq!(output.invoices[0].issue_date, date(2024, 1, 15));
    }

    #[test]
    fn test_unknown_currency_warns() {
        let sheet = Sheet::from_records("Sheet1", ["inv", "cur"], vec![vec!["A", "dollars"]]);
        let maps = mappings(&[("inv", Field::InvoiceNumber), ("cur", Field::Currency)]);

        let output = transformer().transform_flat(&sheet, &maps);
        assert_eq!(output.invoices[0].currency, "USD");
        assert_eq!(output.warnings.len(), 1);
        assert!(output.warnings[0].contains("dollars"));
    }

    #[test]
    fn test_explicit_total_wins_and_can_warn() {
        let sheet = Sheet::from_records(
            "Sheet1",
            ["inv", "qty", "price", "total", "paid"],
            vec![vec!["A", "2", "10", "25", "25"]],
        );
        let maps = mappings(&[
            ("inv", Field::InvoiceNumber),
            ("qty", Field::Quantity),
            ("price", Field::UnitPrice),
            ("total", Field::InvoiceTotal),
            ("paid", Field::AmountPaid),
        ]);

        let output = transformer().transform_flat(&sheet, &maps);
        let invoice = &output.invoices[0];
        assert_eq!(invoice.subtotal, dec("20"));
        assert_eq!(invoice.grand_total, dec("25"));
        assert_eq!(invoice.balance_due, Some(Decimal::ZERO));
        assert!(invoice.is_paid());
        assert!(output.warnings.is_empty());

        let mut config = SheetinvConfig::default();
        config.transform.warn_on_total_mismatch = true;
        let output = DataTransformer::from_config(&config).transform_flat(&sheet, &maps);
        assert_eq!(output.invoices[0].grand_total, dec("25"));
        assert_eq!(output.warnings.len(), 1);
    }

    #[test]
    fn test_discount_mode_from_config() {
        let sheet = Sheet::from_records(
            "Sheet1",
            ["inv", "qty", "price", "disc"],
            vec![vec!["A", "1", "1000", "150"]],
        );
        let maps = mappings(&[
            ("inv", Field::InvoiceNumber),
            ("qty", Field::Quantity),
            ("price", Field::UnitPrice),
            ("disc", Field::Discount),
        ]);

        let output = transformer().transform_flat(&sheet, &maps);
        assert_eq!(output.invoices[0].total_discount, dec("150"));

        let mut config = SheetinvConfig::default();
        config.transform.discount_mode = DiscountMode::Percentage;
        let output = DataTransformer::from_config(&config).transform_flat(&sheet, &maps);
        assert_eq!(output.invoices[0].total_discount, dec("1500"));
    }

    #[test]
    fn test_failed_group_becomes_warning() {
        let huge = "70000000000000000000000000000";
        let sheet = Sheet::from_records(
            "Sheet1",
            ["inv", "qty", "price"],
            vec![vec!["BAD", huge, huge], vec!["OK", "1", "1"]],
        );

        let output = transformer().transform_flat(&sheet, &standard_mappings());
        assert_eq!(output.invoices.len(), 1);
        assert_eq!(output.invoices[0].invoice_number, "OK");
        assert_eq!(
            output.warnings,
            vec!["Failed to process invoice BAD: amount overflow while computing line total"]
        );
    }

    #[test]
    fn test_transform_is_repeatable() {
        let sheet = Sheet::from_records(
            "Sheet1",
            ["inv", "desc", "qty", "price"],
            vec![vec!["A", "x", "3", "9.99"], vec!["A", "y", "1", "0.01"]],
        );
        let t = transformer();

        let first = t.transform_flat(&sheet, &standard_mappings());
        let second = t.transform_flat(&sheet, &standard_mappings());
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_selected_sheet_is_an_error() {
        let workbook = Workbook::new(vec![Sheet::new("Sheet1", vec![])]);
        let selected = vec!["Nope".to_string()];

        let err = transformer()
            .transform(&workbook, &[], SheetFormat::FlatSingleRow, Some(&selected))
            .unwrap_err();
        assert!(matches!(
            err,
            crate::SheetinvError::Source(SourceError::SheetNotFound(ref name)) if name == "Nope"
        ));
    }

    #[test]
    fn test_empty_workbook() {
        let output = transformer()
            .transform(&Workbook::default(), &[], SheetFormat::MultiSheet, None)
            .unwrap();
        assert_eq!(output, TransformOutput::default());
    }

    #[test]
    fn test_mappings_for_other_sheets_ignored() {
        let sheet = Sheet::from_records("Sales", ["inv", "ref"], vec![vec!["A", "B"]]);
        let maps = vec![
            ColumnMapping::confirmed("inv", Field::InvoiceNumber).with_sheet("Sales"),
            ColumnMapping::confirmed("ref", Field::InvoiceNumber).with_sheet("Other"),
        ];

        let output = transformer().transform_flat(&sheet, &maps);
        assert_eq!(output.invoices[0].invoice_number, "A");
    }
}
