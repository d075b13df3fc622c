//! Foreign-key discovery between sheets of a relational workbook.
//!
//! A column is a candidate key when its name looks like `customer id`,
//! `invoice id` and so on, and the sheet it would point at is named after
//! the same entity. The link is kept when enough of its values exist on the
//! other side.

use std::borrow::Borrow;
use std::collections::HashSet;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::config::DetectionConfig;
use crate::models::sheet::Sheet;
use crate::rules::patterns::{
    FK_CLIENT_ID, FK_CUSTOMER_ID, FK_INVOICE_ID, FK_INV_ID, FK_ORDER_ID, PRIMARY_KEY,
    SHEET_CUSTOMERS, SHEET_INVOICES, SHEET_ORDERS,
};

use super::normalize;

/// A detected link from a column of one sheet to a column of another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetRelationship {
    pub from_sheet: String,
    pub from_column: String,
    pub to_sheet: String,
    pub to_column: String,
    /// Percentage of distinct `from_column` values present in `to_column`.
    pub confidence: u8,
}

/// Key column patterns paired with the sheet names they refer to.
fn foreign_keys() -> [(&'static Regex, &'static Regex); 5] {
    [
        (&*FK_CUSTOMER_ID, &*SHEET_CUSTOMERS),
        (&*FK_CLIENT_ID, &*SHEET_CUSTOMERS),
        (&*FK_INVOICE_ID, &*SHEET_INVOICES),
        (&*FK_INV_ID, &*SHEET_INVOICES),
        (&*FK_ORDER_ID, &*SHEET_ORDERS),
    ]
}

/// Detects key relationships between sheets.
#[derive(Debug, Clone)]
pub struct RelationshipDetector {
    /// Minimum value overlap, in percent.
    min_confidence: u8,
}

impl RelationshipDetector {
    pub fn new() -> Self {
        Self::from_config(&DetectionConfig::default())
    }

    pub fn from_config(config: &DetectionConfig) -> Self {
        Self {
            min_confidence: config.relationship_min_confidence,
        }
    }

    /// Set the minimum overlap percentage.
    pub fn with_min_confidence(mut self, confidence: u8) -> Self {
        self.min_confidence = confidence;
        self
    }

    /// All relationships between distinct sheets, strongest first.
    pub fn detect<S: Borrow<Sheet>>(&self, sheets: &[S]) -> Vec<SheetRelationship> {
        let sheets: Vec<&Sheet> = sheets.iter().map(|s| s.borrow()).collect();
        let mut relationships = Vec::new();

        for &from in &sheets {
            for &to in &sheets {
                if std::ptr::eq(from, to) {
                    continue;
                }

                for from_column in &from.headers {
                    let normalized = normalize(from_column);

                    for (key, target) in foreign_keys() {
                        if !key.is_match(&normalized) || !target.is_match(&to.name) {
                            continue;
                        }

                        let Some(to_column) = to.headers.iter().find(|h| {
                            key.is_match(&normalize(h))
                                || PRIMARY_KEY.is_match(h.trim())
                                || h.eq_ignore_ascii_case(from_column)
                        }) else {
                            continue;
                        };

                        let Some(confidence) = overlap(from, from_column, to, to_column) else {
                            continue;
                        };

                        if confidence >= self.min_confidence {
                            relationships.push(SheetRelationship {
                                from_sheet: from.name.clone(),
                                from_column: from_column.clone(),
                                to_sheet: to.name.clone(),
                                to_column: to_column.clone(),
                                confidence,
                            });
                        }
                    }
                }
            }
        }

        let mut seen = HashSet::new();
        relationships.retain(|r| {
            seen.insert((
                r.from_sheet.clone(),
                r.from_column.clone(),
                r.to_sheet.clone(),
                r.to_column.clone(),
            ))
        });
        // Stable, so equal confidences keep discovery order
        relationships.sort_by(|a, b| b.confidence.cmp(&a.confidence));

        debug!("Detected {} sheet relationships", relationships.len());
        relationships
    }
}

impl Default for RelationshipDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Share of distinct non-empty `from` values found in `to`, in percent.
fn overlap(from: &Sheet, from_column: &str, to: &Sheet, to_column: &str) -> Option<u8> {
    let from_values = column_values(from, from_column);
    if from_values.is_empty() {
        return None;
    }
    let to_values = column_values(to, to_column);

    let found = from_values.iter().filter(|v| to_values.contains(*v)).count();
    Some(((found as f64 / from_values.len() as f64) * 100.0).round() as u8)
}

fn column_values(sheet: &Sheet, column: &str) -> HashSet<String> {
    sheet
        .rows
        .iter()
        .filter_map(|row| row.get(column))
        .map(|cell| cell.to_text())
        .filter(|v| !v.is_empty())
        .collect()
}

/// Detect relationships with the default overlap threshold.
pub fn detect_sheet_relationships<S: Borrow<Sheet>>(sheets: &[S]) -> Vec<SheetRelationship> {
    RelationshipDetector::new().detect(sheets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn customers() -> Sheet {
        Sheet::from_records(
            "Customers",
            ["cust_id", "name"],
            vec![vec!["C1", "Acme"], vec!["C2", "Globex"]],
        )
    }

    fn invoices(customer_ids: &[&str]) -> Sheet {
        Sheet::from_records(
            "Invoices",
            ["invoice_id", "customer_id"],
            customer_ids
                .iter()
                .enumerate()
                .map(|(i, c)| vec![format!("I{}", i + 1), c.to_string()])
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn test_customer_link_via_same_named_column() {
        let customers = Sheet::from_records(
            "Customers",
            ["customer_id", "name"],
            vec![vec!["C1", "Acme"], vec!["C2", "Globex"]],
        );
        let sheets = vec![invoices(&["C1", "C2"]), customers];

        let relationships = detect_sheet_relationships(&sheets);
        assert_eq!(
            relationships,
            vec![SheetRelationship {
                from_sheet: "Invoices".into(),
                from_column: "customer_id".into(),
                to_sheet: "Customers".into(),
                to_column: "customer_id".into(),
                confidence: 100,
            }]
        );
    }

    #[test]
    fn test_link_via_primary_key() {
        let customers = Sheet::from_records("Clients", ["ID", "name"], vec![vec!["C1", "Acme"]]);
        let sheets = vec![invoices(&["C1", "C9"]), customers];

        let relationships = detect_sheet_relationships(&sheets);
        assert_eq!(relationships.len(), 1);
        assert_eq!(relationships[0].to_column, "ID");
        assert_eq!(relationships[0].confidence, 50);
    }

    #[test]
    fn test_low_overlap_dropped() {
        let sheets = vec![invoices(&["C1", "X2", "X3"]), customers()];
        // cust_id is not a customer id pattern and there is no "id" column
        assert!(detect_sheet_relationships(&sheets).is_empty());

        let customers = Sheet::from_records("Customers", ["id"], vec![vec!["C1"]]);
        let sheets = vec![invoices(&["C1", "X2", "X3"]), customers];
        assert!(detect_sheet_relationships(&sheets).is_empty());
    }

    #[test]
    fn test_items_link_to_invoices() {
        let items = Sheet::from_records(
            "Items",
            ["invoice_id", "description"],
            vec![vec!["I1", "Widget"], vec!["I2", "Gadget"], vec!["I1", "Bolt"]],
        );
        let sheets = vec![invoices(&["C1", "C2"]), items];

        let relationships = detect_sheet_relationships(&sheets);
        assert_eq!(relationships.len(), 1);
        assert_eq!(relationships[0].from_sheet, "Items");
        assert_eq!(relationships[0].to_sheet, "Invoices");
        assert_eq!(relationships[0].to_column, "invoice_id");
    }

    #[test]
    fn test_sorted_by_confidence() {
        let customers = Sheet::from_records(
            "Customers",
            ["customer_id"],
            vec![vec!["C1"], vec!["C2"]],
        );
        let items = Sheet::from_records(
            "Items",
            ["invoice_id"],
            vec![vec!["I1"], vec!["I2"], vec!["I9"]],
        );
        let sheets = vec![invoices(&["C1", "C3"]), customers, items];

        let relationships = detect_sheet_relationships(&sheets);
        let confidences: Vec<u8> = relationships.iter().map(|r| r.confidence).collect();
        assert_eq!(confidences, vec![67, 50]);
    }

    #[test]
    fn test_empty_workbook() {
        assert!(detect_sheet_relationships::<Sheet>(&[]).is_empty());
        assert!(detect_sheet_relationships::<&Sheet>(&[]).is_empty());
    }
}
