//! Process command - convert a single spreadsheet into invoices.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::NaiveDate;
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use sheetinv_core::rules::format_amount;
use sheetinv_core::{ConversionReport, Invoice, InvoiceStatus, Pipeline, SheetFormat};

use super::{load_config, load_submission};
use crate::workbook::load_workbook;

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input spreadsheet (xlsx, xls, ods, csv)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// JSON file with confirmed column mappings
    #[arg(short, long)]
    mappings: Option<PathBuf>,

    /// Force a layout instead of detecting it (flat_single_row, flat_multi_row, multi_sheet)
    #[arg(long)]
    layout: Option<SheetFormat>,

    /// Write an error report CSV for invoices that failed validation
    #[arg(long)]
    errors: Option<PathBuf>,

    /// Write one JSON file per deliverable invoice, split into paid/ and unpaid/
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Date used for missing issue dates and the future-date check (YYYY-MM-DD)
    #[arg(long)]
    today: Option<NaiveDate>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON report
    Json,
    /// One CSV row per invoice
    Csv,
    /// Plain text summary
    Text,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;
    let submission = load_submission(args.mappings.as_deref())?;

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {msg}")
            .unwrap()
            .progress_chars("##-"),
    );

    pb.set_message("Reading workbook...");
    pb.set_position(10);
    let workbook = load_workbook(&args.input)?;

    pb.set_message("Converting rows...");
    pb.set_position(40);
    let mut pipeline = Pipeline::from_config(&config);
    if let Some(today) = args.today {
        pipeline = pipeline.with_today(today);
    }
    let report = pipeline.run(&workbook, submission.as_ref(), args.layout)?;

    pb.set_position(90);
    pb.finish_and_clear();

    if let Some(path) = &args.errors {
        let count = write_error_report(path, &report)?;
        eprintln!(
            "{} Error report ({} issues) written to {}",
            style("✓").green(),
            count,
            path.display()
        );
    }

    if let Some(dir) = &args.output_dir {
        let (paid, unpaid) = write_invoice_files(dir, &report)?;
        eprintln!(
            "{} Wrote {} paid and {} unpaid invoices to {}",
            style("✓").green(),
            paid,
            unpaid,
            dir.display()
        );
    }

    let output = format_report(&report, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if !report.inspection.missing_required.is_empty() {
        let missing: Vec<&str> = report
            .inspection
            .missing_required
            .iter()
            .map(|f| f.as_str())
            .collect();
        eprintln!(
            "{} Required fields not mapped: {}",
            style("⚠").yellow(),
            missing.join(", ")
        );
    }

    let validation = &report.validation;
    eprintln!(
        "{} {} invoices: {} valid, {} with warnings, {} with errors",
        style("ℹ").blue(),
        validation.total_rows,
        style(validation.valid_rows).green(),
        style(validation.warning_rows).yellow(),
        style(validation.error_rows).red()
    );

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

pub fn format_report(report: &ConversionReport, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Csv => format_csv(&report.invoices),
        OutputFormat::Text => Ok(format_text(report)),
    }
}

fn format_csv(invoices: &[Invoice]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "invoice_number",
        "issue_date",
        "due_date",
        "customer_name",
        "customer_email",
        "currency",
        "line_items",
        "subtotal",
        "total_tax",
        "total_discount",
        "grand_total",
        "amount_paid",
        "balance_due",
        "paid",
        "status",
        "issues",
    ])?;

    for invoice in invoices {
        wtr.write_record([
            invoice.invoice_number.clone(),
            invoice.issue_date.to_string(),
            invoice.due_date.map(|d| d.to_string()).unwrap_or_default(),
            invoice.customer.name.clone(),
            invoice.customer.email.clone().unwrap_or_default(),
            invoice.currency.clone(),
            invoice.line_items.len().to_string(),
            format_amount(invoice.subtotal),
            format_amount(invoice.total_tax),
            format_amount(invoice.total_discount),
            format_amount(invoice.grand_total),
            invoice.amount_paid.map(format_amount).unwrap_or_default(),
            invoice.balance_due.map(format_amount).unwrap_or_default(),
            invoice.is_paid().to_string(),
            invoice.status.to_string(),
            invoice.validation_errors.join("; "),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(report: &ConversionReport) -> String {
    let mut output = String::new();

    output.push_str(&format!("Layout: {}\n", report.inspection.format));
    output.push_str(&format!("Invoices: {}\n", report.invoices.len()));

    for invoice in &report.invoices {
        output.push('\n');
        output.push_str(&format!(
            "Invoice {} [{}]\n",
            invoice.invoice_number, invoice.status
        ));
        output.push_str(&format!("  Customer: {}\n", invoice.customer.name));
        output.push_str(&format!("  Date: {}\n", invoice.issue_date));
        if let Some(due_date) = invoice.due_date {
            output.push_str(&format!("  Due: {}\n", due_date));
        }
        for item in &invoice.line_items {
            output.push_str(&format!(
                "  - {} x {} @ {} = {}\n",
                item.quantity.normalize(),
                item.description,
                format_amount(item.unit_price),
                format_amount(item.line_total)
            ));
        }
        output.push_str(&format!(
            "  Total: {} {}\n",
            format_amount(invoice.grand_total),
            invoice.currency
        ));
        for message in &invoice.validation_errors {
            output.push_str(&format!("  ! {}\n", message));
        }
    }

    if !report.warnings.is_empty() {
        output.push_str("\nWarnings:\n");
        for warning in &report.warnings {
            output.push_str(&format!("  - {}\n", warning));
        }
    }

    output
}

/// Write the error report CSV. Returns the number of issues written.
pub fn write_error_report(path: &Path, report: &ConversionReport) -> anyhow::Result<usize> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["Row", "Invoice Number", "Field", "Issue", "Value", "Suggestion"])?;

    let mut count = 0;
    for result in report
        .validation
        .invoice_results
        .iter()
        .filter(|r| r.status == InvoiceStatus::Error)
    {
        for issue in &result.errors {
            let details = &issue.details;
            wtr.write_record([
                details.row_number.map(|n| n.to_string()).unwrap_or_default(),
                result.invoice_number.clone(),
                details.column_name.clone().unwrap_or_default(),
                issue.code.message(details.value.as_deref()),
                details.value.clone().unwrap_or_default(),
                issue.code.suggestion().to_string(),
            ])?;
            count += 1;
        }
    }

    wtr.flush()?;
    Ok(count)
}

/// Write each deliverable invoice to `paid/` or `unpaid/` under `dir`.
pub fn write_invoice_files(dir: &Path, report: &ConversionReport) -> anyhow::Result<(usize, usize)> {
    let paid_dir = dir.join("paid");
    let unpaid_dir = dir.join("unpaid");
    fs::create_dir_all(&paid_dir)?;
    fs::create_dir_all(&unpaid_dir)?;

    let mut used = HashSet::new();
    let (mut paid, mut unpaid) = (0, 0);

    for invoice in report.deliverable() {
        let target = if invoice.is_paid() {
            paid += 1;
            &paid_dir
        } else {
            unpaid += 1;
            &unpaid_dir
        };

        let stem = file_stem(&invoice.invoice_number);
        let mut name = stem.clone();
        let mut n = 1;
        while !used.insert(name.clone()) {
            n += 1;
            name = format!("{}-{}", stem, n);
        }

        let path = target.join(format!("{}.json", name));
        fs::write(&path, serde_json::to_string_pretty(invoice)?)?;
        debug!("Wrote {}", path.display());
    }

    Ok((paid, unpaid))
}

/// Invoice number made safe for use as a file name.
fn file_stem(number: &str) -> String {
    let stem: String = number
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if stem.is_empty() {
        "invoice".to_string()
    } else {
        stem
    }
}
