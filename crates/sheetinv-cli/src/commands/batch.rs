//! Batch processing command for multiple spreadsheets.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::NaiveDate;
use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use sheetinv_core::{ConversionReport, Pipeline, SheetFormat};

use super::load_config;
use super::process::{format_report, write_error_report, write_invoice_files, OutputFormat};
use crate::workbook::{is_supported, load_workbook};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory for per-file reports
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Report format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Force a layout for every file instead of detecting it
    #[arg(long)]
    layout: Option<SheetFormat>,

    /// Summary CSV path (default: <output-dir>/summary.csv, or ./summary.csv)
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Also write error reports and paid/unpaid invoice files per input
    #[arg(long)]
    split: bool,

    /// Date used for missing issue dates and the future-date check (YYYY-MM-DD)
    #[arg(long)]
    today: Option<NaiveDate>,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Outcome for one input file.
struct FileResult {
    path: PathBuf,
    report: Option<ConversionReport>,
    error: Option<String>,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| is_supported(p))
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
            .unwrap()
            .progress_chars("=>-"),
    );

    let mut pipeline = Pipeline::from_config(&config);
    if let Some(today) = args.today {
        pipeline = pipeline.with_today(today);
    }
    let mut results = Vec::with_capacity(files.len());

    for path in files {
        let outcome = load_workbook(&path)
            .and_then(|workbook| Ok(pipeline.run(&workbook, None, args.layout)?))
            .and_then(|report| {
                if let Some(output_dir) = &args.output_dir {
                    write_outputs(output_dir, &path, &report, &args)?;
                }
                Ok(report)
            });

        match outcome {
            Ok(report) => {
                results.push(FileResult {
                    path,
                    report: Some(report),
                    error: None,
                });
            }
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    results.push(FileResult {
                        path,
                        report: None,
                        error: Some(error_msg),
                    });
                } else {
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    anyhow::bail!("Processing failed: {}", error_msg);
                }
            }
        }

        pb.inc(1);
    }

    pb.finish_with_message("Complete");

    let summary_path = args.summary.clone().unwrap_or_else(|| {
        args.output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"))
    });
    write_summary(&summary_path, &results)?;
    println!(
        "{} Summary written to {}",
        style("✓").green(),
        summary_path.display()
    );

    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(results.len() - failed.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn write_outputs(
    output_dir: &Path,
    input: &Path,
    report: &ConversionReport,
    args: &BatchArgs,
) -> anyhow::Result<()> {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("workbook");

    let extension = match args.format {
        OutputFormat::Json => "json",
        OutputFormat::Csv => "csv",
        OutputFormat::Text => "txt",
    };

    let report_path = output_dir.join(format!("{}.{}", stem, extension));
    fs::write(&report_path, format_report(report, args.format)?)?;
    debug!("Wrote output to {}", report_path.display());

    if args.split {
        let dir = output_dir.join(stem);
        fs::create_dir_all(&dir)?;
        write_error_report(&dir.join("errors.csv"), report)?;
        write_invoice_files(&dir, report)?;
    }

    Ok(())
}

fn write_summary(path: &Path, results: &[FileResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record(["file", "invoices", "valid", "warnings", "errors", "format", "failure"])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        match &result.report {
            Some(report) => {
                let v = &report.validation;
                wtr.write_record([
                    filename.to_string(),
                    v.total_rows.to_string(),
                    v.valid_rows.to_string(),
                    v.warning_rows.to_string(),
                    v.error_rows.to_string(),
                    report.inspection.format.to_string(),
                    String::new(),
                ])?;
            }
            None => {
                wtr.write_record([
                    filename.to_string(),
                    String::new(),
                    String::new(),
                    String::new(),
                    String::new(),
                    String::new(),
                    result.error.clone().unwrap_or_default(),
                ])?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}
