//! Column mapping: from raw sheet headers to canonical invoice fields.
//!
//! Each header is first looked up verbatim (after [`normalize`]) in the
//! pattern index, then approximately against every pattern. A field can be
//! claimed by one header only; the first header to claim it keeps it.

pub mod fields;
pub mod format;
pub mod normalize;
pub mod relationships;

use std::collections::{HashMap, HashSet};

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::models::config::MappingConfig;
use crate::models::sheet::{Row, Sheet};

pub use fields::{all_field_definitions, optional_fields, required_fields, Field, FieldDefinition};
pub use format::{detect_format, SheetFormat};
pub use normalize::normalize;
pub use relationships::{detect_sheet_relationships, SheetRelationship};

/// Mapping of one source column onto a canonical field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMapping {
    /// Header exactly as it appears in the sheet.
    pub source_column: String,
    /// Canonical field, `None` when the column is unmapped.
    pub target_field: Option<Field>,
    /// 0-100; 100 for exact or user-confirmed matches.
    pub confidence: u8,
    /// Up to a handful of distinct non-empty values, in first-seen order.
    #[serde(default)]
    pub sample_values: Vec<String>,
    /// Owning sheet, set for multi-sheet workbooks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet_name: Option<String>,
}

impl ColumnMapping {
    /// Unmapped column.
    pub fn unmapped(source_column: impl Into<String>) -> Self {
        Self {
            source_column: source_column.into(),
            target_field: None,
            confidence: 0,
            sample_values: Vec::new(),
            sheet_name: None,
        }
    }

    /// User-confirmed mapping.
    pub fn confirmed(source_column: impl Into<String>, field: Field) -> Self {
        Self {
            source_column: source_column.into(),
            target_field: Some(field),
            confidence: 100,
            sample_values: Vec::new(),
            sheet_name: None,
        }
    }

    /// Tag with the owning sheet.
    pub fn with_sheet(mut self, sheet_name: impl Into<String>) -> Self {
        self.sheet_name = Some(sheet_name.into());
        self
    }

    pub fn is_mapped(&self) -> bool {
        self.target_field.is_some()
    }
}

/// One pattern from the field catalog, in normalized form.
#[derive(Debug)]
struct PatternEntry {
    pattern: String,
    field: Field,
    /// Position in the field's pattern list; lower is more specific.
    position: usize,
}

/// Pre-normalized view of the field catalog.
struct PatternIndex {
    entries: Vec<PatternEntry>,
    /// Normalized pattern to candidate fields, best first.
    exact: HashMap<String, Vec<Field>>,
}

impl PatternIndex {
    fn build() -> Self {
        let mut entries = Vec::new();
        let mut ranked: HashMap<String, Vec<(usize, Field)>> = HashMap::new();

        for def in all_field_definitions() {
            for (position, pattern) in def.patterns.iter().enumerate() {
                let pattern = normalize(pattern);
                if pattern.is_empty() {
                    continue;
                }

                let candidates = ranked.entry(pattern.clone()).or_default();
                match candidates.iter_mut().find(|(_, f)| *f == def.field) {
                    Some((best, _)) => *best = (*best).min(position),
                    None => candidates.push((position, def.field)),
                }

                entries.push(PatternEntry {
                    pattern,
                    field: def.field,
                    position,
                });
            }
        }

        let exact = ranked
            .into_iter()
            .map(|(pattern, mut candidates)| {
                // Earlier pattern position first, then catalog order
                candidates.sort();
                (pattern, candidates.into_iter().map(|(_, f)| f).collect())
            })
            .collect();

        Self { entries, exact }
    }
}

lazy_static! {
    static ref PATTERN_INDEX: PatternIndex = PatternIndex::build();
}

/// Header-to-field mapper.
#[derive(Debug, Clone)]
pub struct ColumnMapper {
    /// Minimum fuzzy confidence for accepting a match.
    min_confidence: u8,
    /// Rows inspected for sample values.
    sample_rows: usize,
    /// Distinct sample values kept per column.
    max_sample_values: usize,
}

impl ColumnMapper {
    /// Create a mapper with default settings.
    pub fn new() -> Self {
        Self::from_config(&MappingConfig::default())
    }

    /// Create a mapper from the `mapping` config section.
    pub fn from_config(config: &MappingConfig) -> Self {
        Self {
            min_confidence: config.min_confidence,
            sample_rows: config.sample_rows,
            max_sample_values: config.max_sample_values,
        }
    }

    /// Set the fuzzy confidence floor.
    pub fn with_min_confidence(mut self, confidence: u8) -> Self {
        self.min_confidence = confidence.min(100);
        self
    }

    /// Set how many rows are scanned for sample values.
    pub fn with_sample_rows(mut self, rows: usize) -> Self {
        self.sample_rows = rows;
        self
    }

    /// Map every header of `headers`, sampling values from `sample_rows`.
    ///
    /// Every header appears exactly once in the output: mapped headers in
    /// header order, followed by unmapped ones.
    pub fn detect_column_mappings(&self, headers: &[String], sample_rows: &[Row]) -> Vec<ColumnMapping> {
        let mut claimed: HashSet<Field> = HashSet::new();
        let mut mapped = Vec::new();
        let mut unmapped = Vec::new();

        for header in headers {
            let normalized = normalize(header);
            let matched = self
                .exact_match(&normalized, &claimed)
                .map(|field| (field, 100))
                .or_else(|| self.fuzzy_match(&normalized, &claimed));

            let mut mapping = match matched {
                Some((field, confidence)) => {
                    claimed.insert(field);
                    trace!("Mapped '{}' -> {} ({})", header, field, confidence);
                    ColumnMapping {
                        source_column: header.clone(),
                        target_field: Some(field),
                        confidence,
                        sample_values: Vec::new(),
                        sheet_name: None,
                    }
                }
                None => ColumnMapping::unmapped(header.clone()),
            };
            mapping.sample_values = self.sample_values(sample_rows, header);

            if mapping.is_mapped() {
                mapped.push(mapping);
            } else {
                unmapped.push(mapping);
            }
        }

        debug!(
            "Mapped {} of {} columns ({} unmapped)",
            mapped.len(),
            headers.len(),
            unmapped.len()
        );

        mapped.extend(unmapped);
        mapped
    }

    /// Map a sheet's headers, tagging each mapping with the sheet name.
    pub fn map_sheet(&self, sheet: &Sheet) -> Vec<ColumnMapping> {
        self.detect_column_mappings(&sheet.headers, sheet.sample(self.sample_rows))
            .into_iter()
            .map(|m| m.with_sheet(sheet.name.clone()))
            .collect()
    }

    fn exact_match(&self, normalized: &str, claimed: &HashSet<Field>) -> Option<Field> {
        PATTERN_INDEX
            .exact
            .get(normalized)?
            .iter()
            .copied()
            .find(|field| !claimed.contains(field))
    }

    fn fuzzy_match(&self, normalized: &str, claimed: &HashSet<Field>) -> Option<(Field, u8)> {
        if normalized.is_empty() {
            return None;
        }

        let mut candidates: Vec<(u8, &PatternEntry)> = PATTERN_INDEX
            .entries
            .iter()
            .filter_map(|entry| {
                let similarity = strsim::normalized_levenshtein(normalized, &entry.pattern);
                let confidence = (similarity * 100.0).round() as u8;
                (confidence >= self.min_confidence).then_some((confidence, entry))
            })
            .collect();

        // Best confidence first; ties go to the more specific pattern, then catalog order
        candidates.sort_by(|(ca, a), (cb, b)| {
            cb.cmp(ca)
                .then(a.position.cmp(&b.position))
                .then(a.field.cmp(&b.field))
        });

        candidates
            .into_iter()
            .find(|(_, entry)| !claimed.contains(&entry.field))
            .map(|(confidence, entry)| (entry.field, confidence))
    }

    fn sample_values(&self, rows: &[Row], column: &str) -> Vec<String> {
        let mut values: Vec<String> = Vec::new();

        for row in rows.iter().take(self.sample_rows) {
            if values.len() >= self.max_sample_values {
                break;
            }
            let Some(cell) = row.get(column) else {
                continue;
            };
            let text = cell.to_text();
            if !text.is_empty() && !values.contains(&text) {
                values.push(text);
            }
        }

        values
    }
}

impl Default for ColumnMapper {
    fn default() -> Self {
        Self::new()
    }
}

/// Map headers with the default mapper.
pub fn detect_column_mappings(headers: &[String], sample_rows: &[Row]) -> Vec<ColumnMapping> {
    ColumnMapper::new().detect_column_mappings(headers, sample_rows)
}

/// Required fields that no mapping targets.
pub fn missing_required_fields<'a, I>(mappings: I) -> Vec<Field>
where
    I: IntoIterator<Item = &'a ColumnMapping>,
{
    let mapped: HashSet<Field> = mappings.into_iter().filter_map(|m| m.target_field).collect();
    required_fields()
        .into_iter()
        .filter(|f| !mapped.contains(f))
        .collect()
}

/// Which sheets a submission covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetMode {
    /// One sheet holds everything.
    #[default]
    Single,
    /// Several related sheets.
    Multi,
}

/// A user-confirmed column assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingOverride {
    pub source_column: String,
    pub target_field: Option<Field>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet_name: Option<String>,
}

/// Mappings confirmed by the user, replacing detection for the sheets they cover.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingSubmission {
    pub mappings: Vec<MappingOverride>,
    #[serde(default)]
    pub sheet_mode: SheetMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_sheets: Option<Vec<String>>,
}

impl MappingSubmission {
    /// Parse a submission from JSON.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        serde_json::from_str(json).map_err(|e| crate::SheetinvError::Config(e.to_string()))
    }

    /// Confirmed mappings at confidence 100.
    ///
    /// Field claims stay unique per sheet: a later override targeting a field
    /// already claimed in the same sheet is kept as unmapped.
    pub fn column_mappings(&self) -> Vec<ColumnMapping> {
        let mut claimed: HashSet<(Option<&str>, Field)> = HashSet::new();

        self.mappings
            .iter()
            .map(|o| {
                let sheet = o.sheet_name.as_deref();
                let mapping = match o.target_field {
                    Some(field) if claimed.insert((sheet, field)) => {
                        ColumnMapping::confirmed(o.source_column.clone(), field)
                    }
                    Some(field) => {
                        warn!(
                            "Column '{}' targets {} which is already mapped; ignoring",
                            o.source_column, field
                        );
                        ColumnMapping::unmapped(o.source_column.clone())
                    }
                    None => ColumnMapping::unmapped(o.source_column.clone()),
                };
                match &o.sheet_name {
                    Some(name) => mapping.with_sheet(name.clone()),
                    None => mapping,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn target(mappings: &[ColumnMapping], column: &str) -> Option<Field> {
        mappings
            .iter()
            .find(|m| m.source_column == column)
            .and_then(|m| m.target_field)
    }

    #[test]
    fn test_exact_matches_ignore_case_and_punctuation() {
        let mappings = detect_column_mappings(
            &headers(&["INVOICE_NO", "Cust. Name", "Unit-Price", "Qty."]),
            &[],
        );

        assert_eq!(target(&mappings, "INVOICE_NO"), Some(Field::InvoiceNumber));
        assert_eq!(target(&mappings, "Cust. Name"), Some(Field::CustomerName));
        assert_eq!(target(&mappings, "Unit-Price"), Some(Field::UnitPrice));
        assert_eq!(target(&mappings, "Qty."), Some(Field::Quantity));
        assert!(mappings.iter().all(|m| m.confidence == 100));
    }

    #[test]
    fn test_shared_pattern_goes_to_most_specific_field() {
        let mappings = detect_column_mappings(&headers(&["Name", "Amount", "SKU", "Memo"]), &[]);

        assert_eq!(target(&mappings, "Name"), Some(Field::CustomerName));
        assert_eq!(target(&mappings, "Amount"), Some(Field::LineTotal));
        assert_eq!(target(&mappings, "SKU"), Some(Field::Sku));
        assert_eq!(target(&mappings, "Memo"), Some(Field::Notes));
    }

    #[test]
    fn test_exact_collision_falls_back_to_next_candidate() {
        // "name" is a customerName pattern first and a description pattern second
        let mappings = detect_column_mappings(&headers(&["Customer", "Name"]), &[]);

        assert_eq!(target(&mappings, "Customer"), Some(Field::CustomerName));
        assert_eq!(target(&mappings, "Name"), Some(Field::Description));
        assert_eq!(mappings[1].confidence, 100);
    }

    #[test]
    fn test_fuzzy_match_confidence() {
        let mappings = detect_column_mappings(&headers(&["Invoce Numbr"]), &[]);

        assert_eq!(target(&mappings, "Invoce Numbr"), Some(Field::InvoiceNumber));
        assert!(mappings[0].confidence >= 65 && mappings[0].confidence < 100);
    }

    #[test]
    fn test_first_claim_wins() {
        let mappings = detect_column_mappings(&headers(&["Invoice Number", "Invoice No"]), &[]);

        assert_eq!(target(&mappings, "Invoice Number"), Some(Field::InvoiceNumber));
        assert_ne!(target(&mappings, "Invoice No"), Some(Field::InvoiceNumber));
    }

    #[test]
    fn test_unmatched_headers_listed_last() {
        let mappings = detect_column_mappings(&headers(&["zzqqxx", "Description"]), &[]);

        assert_eq!(mappings.len(), 2);
        assert_eq!(mappings[0].source_column, "Description");
        assert_eq!(mappings[1].source_column, "zzqqxx");
        assert_eq!(mappings[1].target_field, None);
        assert_eq!(mappings[1].confidence, 0);
    }

    #[test]
    fn test_sample_values_distinct_and_capped() {
        let rows: Vec<Row> = ["a", "b", "a", "", "c", "d", "e", "f"]
            .iter()
            .map(|v| Row::new().with("Item", *v))
            .collect();

        let mappings = detect_column_mappings(&headers(&["Item"]), &rows);
        assert_eq!(mappings[0].sample_values, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_sample_values_use_first_rows_only() {
        let rows: Vec<Row> = (0..12)
            .map(|i| Row::new().with("Item", if i < 10 { "same" } else { "late" }))
            .collect();

        let mappings = detect_column_mappings(&headers(&["Item"]), &rows);
        assert_eq!(mappings[0].sample_values, vec!["same"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(detect_column_mappings(&[], &[]).is_empty());
        assert_eq!(
            missing_required_fields(&Vec::<ColumnMapping>::new()),
            required_fields()
        );
    }

    #[test]
    fn test_missing_required_fields() {
        let mappings = detect_column_mappings(
            &headers(&["Invoice Number", "Date", "Customer", "Description"]),
            &[],
        );

        assert_eq!(missing_required_fields(&mappings), vec![Field::UnitPrice]);
    }

    #[test]
    fn test_submission_from_json() {
        let json = r#"{
            "mappings": [
                {"sourceColumn": "Ref", "targetField": "invoiceNumber", "sheetName": "Invoices"},
                {"sourceColumn": "Other", "targetField": "invoiceNumber", "sheetName": "Invoices"},
                {"sourceColumn": "Junk", "targetField": null}
            ],
            "sheetMode": "multi",
            "selectedSheets": ["Invoices", "Items"]
        }"#;

        let submission = MappingSubmission::from_json(json).unwrap();
        assert_eq!(submission.sheet_mode, SheetMode::Multi);

        let mappings = submission.column_mappings();
        assert_eq!(mappings[0].target_field, Some(Field::InvoiceNumber));
        assert_eq!(mappings[0].confidence, 100);
        assert_eq!(mappings[0].sheet_name.as_deref(), Some("Invoices"));
        assert_eq!(mappings[1].target_field, None);
        assert_eq!(mappings[2].target_field, None);
    }

    #[test]
    fn test_mapping_serializes_camel_case() {
        let json = serde_json::to_value(ColumnMapping::confirmed("Qty", Field::Quantity)).unwrap();
        assert_eq!(json["sourceColumn"], "Qty");
        assert_eq!(json["targetField"], "quantity");
        assert!(json.get("sheetName").is_none());
    }
}
