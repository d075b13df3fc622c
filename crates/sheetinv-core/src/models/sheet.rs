//! In-memory workbook representation.
//!
//! Decoders (xlsx, ods, csv) produce a [`Workbook`]; everything downstream
//! only ever sees these types. Cells keep their native kind so that numeric
//! date serials can still be recognised after decoding.

use chrono::NaiveDateTime;

/// A single decoded cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// Missing or blank cell.
    #[default]
    Empty,
    /// Text cell.
    Text(String),
    /// Numeric cell, including raw spreadsheet date serials.
    Number(f64),
    /// Boolean cell.
    Bool(bool),
    /// Native date/time cell.
    Date(NaiveDateTime),
}

impl CellValue {
    /// True for blank cells and whitespace-only text.
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Trimmed textual form of the cell. Blank cells yield an empty string.
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Date(dt) => {
                if dt.time() == chrono::NaiveTime::MIN {
                    dt.date().format("%Y-%m-%d").to_string()
                } else {
                    dt.format("%Y-%m-%dT%H:%M:%S").to_string()
                }
            }
        }
    }

    /// Numeric payload, if the cell is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(dt: NaiveDateTime) -> Self {
        CellValue::Date(dt)
    }
}

/// One data row: column name to cell, in column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    cells: Vec<(String, CellValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self { cells: Vec::new() }
    }

    /// Build a row from `(column, value)` pairs.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<CellValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            cells: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Set a cell, replacing any previous value for the same column.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<CellValue>) {
        let column = column.into();
        let value = value.into();
        match self.cells.iter_mut().find(|(c, _)| *c == column) {
            Some((_, existing)) => *existing = value,
            None => self.cells.push((column, value)),
        }
    }

    /// Builder form of [`Row::set`].
    pub fn with(mut self, column: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.set(column, value);
        self
    }

    /// Look up a cell by exact column name.
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v)
    }

    /// Iterate cells in column order.
    pub fn cells(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.cells.iter().map(|(c, v)| (c.as_str(), v))
    }

    /// True when every cell is empty.
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|(_, v)| v.is_empty())
    }
}

/// A named sheet with its header row and data rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sheet {
    /// Sheet (tab) name.
    pub name: String,
    /// Column headers as authored.
    pub headers: Vec<String>,
    /// Data rows, header row excluded.
    pub rows: Vec<Row>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, headers: Vec<String>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows: Vec::new(),
        }
    }

    /// Build a sheet from positional records aligned with `headers`.
    ///
    /// Short records are padded with empty cells; extra values are dropped.
    pub fn from_records<H, R, V>(name: impl Into<String>, headers: H, records: R) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator<Item = Vec<V>>,
        V: Into<CellValue>,
    {
        let headers: Vec<String> = headers.into_iter().map(Into::into).collect();
        let rows = records
            .into_iter()
            .map(|record| {
                let mut values = record.into_iter().map(Into::into);
                Row {
                    cells: headers
                        .iter()
                        .map(|h| (h.clone(), values.next().unwrap_or_default()))
                        .collect(),
                }
            })
            .collect();

        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    /// Append a row.
    pub fn with_row(mut self, row: Row) -> Self {
        self.rows.push(row);
        self
    }

    /// The first `n` rows, used for header sampling and format detection.
    pub fn sample(&self, n: usize) -> &[Row] {
        &self.rows[..self.rows.len().min(n)]
    }
}

/// A decoded workbook: an ordered list of sheets.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    /// Find a sheet by name.
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Sheet names in workbook order.
    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_cell_text_forms() {
        assert_eq!(CellValue::from(3.0).to_text(), "3");
        assert_eq!(CellValue::from(2.5).to_text(), "2.5");
        assert_eq!(CellValue::from("  Acme  ").to_text(), "Acme");
        assert_eq!(CellValue::Empty.to_text(), "");

        let midnight = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(CellValue::from(midnight).to_text(), "2024-03-01");
    }

    #[test]
    fn test_whitespace_is_empty() {
        assert!(CellValue::from("   ").is_empty());
        assert!(!CellValue::from(0.0).is_empty());
    }

    #[test]
    fn test_from_records_pads_short_rows() {
        let sheet = Sheet::from_records("Data", ["a", "b", "c"], vec![vec!["1"]]);
        let row = &sheet.rows[0];

        assert_eq!(row.get("a"), Some(&CellValue::from("1")));
        assert_eq!(row.get("c"), Some(&CellValue::Empty));
        assert!(!row.is_blank());
    }

    #[test]
    fn test_row_set_replaces() {
        let row = Row::new().with("x", "1").with("x", "2");
        assert_eq!(row.cells().count(), 1);
        assert_eq!(row.get("x"), Some(&CellValue::from("2")));
    }

    #[test]
    fn test_workbook_lookup() {
        let wb = Workbook::new(vec![Sheet::new("Invoices", vec![]), Sheet::new("Items", vec![])]);
        assert!(wb.sheet("Items").is_some());
        assert!(wb.sheet("items").is_none());
        assert_eq!(wb.sheet_names(), vec!["Invoices", "Items"]);
    }
}
