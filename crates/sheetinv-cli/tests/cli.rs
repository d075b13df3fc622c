//! Command-line behaviour against CSV fixtures.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const INVOICES: &str = "\
Invoice Number,Customer,Invoice Date,Description,Qty,Unit Price,Status
INV-001,Acme,2024-01-15,Widget,3,10,Paid
INV-002,Globex,2024-01-20,Gadget,1,25,Unpaid
INV-003,,2024-01-21,Bolt,1,5,
";

fn fixture(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn sheetinv() -> Command {
    Command::cargo_bin("sheetinv").unwrap()
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn process_prints_json_report() {
    let dir = TempDir::new().unwrap();
    let input = fixture(&dir, "march.csv", INVOICES);

    sheetinv()
        .args(["process", arg(&input)])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"invoiceNumber\": \"INV-001\""))
        .stdout(predicate::str::contains("MISSING_CUSTOMER_NAME"));
}

#[test]
fn process_writes_error_report_and_routes_invoices() {
    let dir = TempDir::new().unwrap();
    let input = fixture(&dir, "march.csv", INVOICES);
    let errors = dir.path().join("errors.csv");
    let out = dir.path().join("out");

    sheetinv()
        .args([
            "process",
            arg(&input),
            "--format",
            "csv",
            "--errors",
            arg(&errors),
            "--output-dir",
            arg(&out),
        ])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("invoice_number,issue_date"));

    let report = fs::read_to_string(&errors).unwrap();
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(lines[0], "Row,Invoice Number,Field,Issue,Value,Suggestion");
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("4,INV-003,customerName,Customer name is required,"));

    assert!(out.join("paid").join("INV-001.json").exists());
    assert!(out.join("unpaid").join("INV-002.json").exists());
    assert!(!out.join("unpaid").join("INV-003.json").exists());
}

#[test]
fn inspect_shows_mappings() {
    let dir = TempDir::new().unwrap();
    let input = fixture(&dir, "march.csv", INVOICES);

    sheetinv()
        .args(["inspect", arg(&input)])
        .assert()
        .success()
        .stdout(predicate::str::contains("Layout: flat_single_row"))
        .stdout(predicate::str::contains("invoiceNumber (100%)"))
        .stdout(predicate::str::contains("All required fields mapped"));
}

#[test]
fn mappings_file_overrides_detection() {
    let dir = TempDir::new().unwrap();
    let input = fixture(&dir, "march.csv", INVOICES);
    let mappings = fixture(
        &dir,
        "mappings.json",
        r#"{"mappings": [
            {"sourceColumn": "Invoice Number", "targetField": "invoiceNumber"},
            {"sourceColumn": "Customer", "targetField": "notes"}
        ]}"#,
    );

    sheetinv()
        .args(["inspect", arg(&input), "--mappings", arg(&mappings), "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"targetField\": \"notes\""))
        .stdout(predicate::str::contains("\"customerName\""));
}

#[test]
fn batch_writes_summary() {
    let dir = TempDir::new().unwrap();
    fixture(&dir, "a.csv", INVOICES);
    fixture(&dir, "b.csv", "Invoice Number,Customer,Description,Unit Price\nX-1,Acme,Widget,5\n");
    let out = dir.path().join("reports");
    let pattern = format!("{}/*.csv", dir.path().display());

    sheetinv()
        .args(["batch", &pattern, "--output-dir", arg(&out)])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 successful, 0 failed"));

    let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
    assert!(summary.starts_with("file,invoices,valid,warnings,errors,format,failure"));
    assert!(summary.contains("a.csv,3,2,0,1,flat_single_row,"));
    assert!(summary.contains("b.csv,1,1,0,0,flat_single_row,"));
    assert!(out.join("a.json").exists());
}

#[test]
fn batch_output_failure_respects_continue_on_error() {
    let dir = TempDir::new().unwrap();
    let inputs = dir.path().join("in");
    fs::create_dir(&inputs).unwrap();
    fixture(&dir, "in/a.csv", INVOICES);
    fixture(&dir, "in/b.csv", INVOICES);
    let out = dir.path().join("reports");
    fs::create_dir(&out).unwrap();
    // A plain file where the split output directory for a.csv would go
    fs::write(out.join("a"), "").unwrap();
    let pattern = format!("{}/*.csv", inputs.display());

    sheetinv()
        .args(["batch", &pattern, "--output-dir", arg(&out), "--split"])
        .assert()
        .failure();

    sheetinv()
        .args([
            "batch",
            &pattern,
            "--output-dir",
            arg(&out),
            "--split",
            "--continue-on-error",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 successful, 1 failed"));

    let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
    assert!(summary.contains("b.csv,3,2,0,1,flat_single_row,"));
    assert!(summary.lines().any(|l| l.starts_with("a.csv,,,,,,") && l.len() > "a.csv,,,,,,".len()));
    assert!(out.join("b").join("errors.csv").exists());
}

#[test]
fn config_set_and_get() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.json");

    sheetinv()
        .args(["--config", arg(&config), "config", "set", "transform.default_currency", "EUR"])
        .assert()
        .success();

    sheetinv()
        .args(["--config", arg(&config), "config", "get", "transform.default_currency"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"EUR\""));

    sheetinv()
        .args(["--config", arg(&config), "config", "set", "mapping.min_confidence", "150"])
        .assert()
        .failure();
}

#[test]
fn unsupported_input_fails() {
    let dir = TempDir::new().unwrap();
    let input = fixture(&dir, "scan.pdf", "%PDF-1.4");

    sheetinv()
        .args(["process", arg(&input)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported file format"));
}
