//! Inspect command - show how a workbook would be read.

use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use sheetinv_core::{Inspection, Pipeline, SheetFormat};

use super::{load_config, load_submission};
use crate::workbook::load_workbook;

/// Arguments for the inspect command.
#[derive(Args)]
pub struct InspectArgs {
    /// Input spreadsheet (xlsx, xls, ods, csv)
    #[arg(required = true)]
    input: PathBuf,

    /// JSON file with confirmed column mappings
    #[arg(short, long)]
    mappings: Option<PathBuf>,

    /// Force a layout instead of detecting it (flat_single_row, flat_multi_row, multi_sheet)
    #[arg(long)]
    layout: Option<SheetFormat>,

    /// Print the inspection as JSON
    #[arg(long)]
    json: bool,
}

pub async fn run(args: InspectArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let submission = load_submission(args.mappings.as_deref())?;
    let workbook = load_workbook(&args.input)?;

    info!("Inspecting {}", args.input.display());

    let inspection = Pipeline::from_config(&config).inspect(&workbook, submission.as_ref(), args.layout)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&inspection)?);
    } else {
        print!("{}", format_inspection(&inspection));
    }

    Ok(())
}

fn format_inspection(inspection: &Inspection) -> String {
    let mut output = String::new();

    output.push_str(&format!("Layout: {}\n", inspection.format));

    for sheet in &inspection.sheets {
        output.push_str(&format!("\nSheet '{}' ({} rows)\n", sheet.sheet_name, sheet.row_count));
        for mapping in &sheet.mappings {
            let target = match mapping.target_field {
                Some(field) => format!("{} ({}%)", field, mapping.confidence),
                None => style("unmapped").dim().to_string(),
            };
            output.push_str(&format!("  {:<28} -> {}", mapping.source_column, target));
            if !mapping.sample_values.is_empty() {
                output.push_str(&format!("  e.g. {}", mapping.sample_values.join(", ")));
            }
            output.push('\n');
        }
    }

    if !inspection.relationships.is_empty() {
        output.push_str("\nRelationships:\n");
        for r in &inspection.relationships {
            output.push_str(&format!(
                "  {}.{} -> {}.{} ({}%)\n",
                r.from_sheet, r.from_column, r.to_sheet, r.to_column, r.confidence
            ));
        }
    }

    if inspection.missing_required.is_empty() {
        output.push_str(&format!("\n{} All required fields mapped\n", style("✓").green()));
    } else {
        let missing: Vec<&str> = inspection.missing_required.iter().map(|f| f.as_str()).collect();
        output.push_str(&format!(
            "\n{} Required fields not mapped: {}\n",
            style("⚠").yellow(),
            missing.join(", ")
        ));
    }

    output
}
