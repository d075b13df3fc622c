//! Date parsing for spreadsheet cells.
//!
//! Accepted shapes, tried in order:
//! - ISO 8601 / RFC 3339 (`2024-01-15`, `2024-01-15T10:30:00Z`)
//! - `YYYY/MM/DD`, `YYYY.MM.DD`
//! - `MM/DD/YYYY` when the first number can be a month
//! - `DD/MM/YYYY`, `DD-MM-YYYY`, `DD.MM.YYYY`
//! - `25 Dec 2024`, `Dec 25, 2024` and their long-month variants

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use super::patterns::{DATE_DAY_MONTH, DATE_MONTH_DAY, DATE_NUMERIC, DATE_YMD};

/// Spreadsheet serial for 1970-01-01.
const EXCEL_UNIX_EPOCH: f64 = 25569.0;

const MS_PER_DAY: f64 = 86_400_000.0;

/// Parse a date from cell text. Returns `None` if no shape matches.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    parse_iso(value)
        .or_else(|| parse_ymd(value))
        .or_else(|| parse_numeric(value))
        .or_else(|| parse_named_month(value))
}

/// Convert a spreadsheet date serial to a timestamp.
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let millis = ((serial - EXCEL_UNIX_EPOCH) * MS_PER_DAY).round() as i64;
    DateTime::<Utc>::from_timestamp_millis(millis).map(|dt| dt.naive_utc())
}

/// Convert a spreadsheet date serial to an ISO 8601 UTC string.
pub fn excel_serial_to_iso(serial: f64) -> Option<String> {
    excel_serial_to_datetime(serial).map(|dt| dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
}

fn parse_iso(value: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc().date());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.date());
        }
    }
    None
}

fn parse_ymd(value: &str) -> Option<NaiveDate> {
    let caps = DATE_YMD.captures(value)?;
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_numeric(value: &str) -> Option<NaiveDate> {
    let caps = DATE_NUMERIC.captures(value)?;
    let first: u32 = caps[1].parse().ok()?;
    let second: u32 = caps[2].parse().ok()?;
    let year = parse_year(&caps[3]);

    // Month-first wins when both readings are valid
    NaiveDate::from_ymd_opt(year, first, second)
        .or_else(|| NaiveDate::from_ymd_opt(year, second, first))
}

fn parse_named_month(value: &str) -> Option<NaiveDate> {
    if let Some(caps) = DATE_DAY_MONTH.captures(value) {
        let day: u32 = caps[1].parse().ok()?;
        let month = month_to_number(&caps[2])?;
        let year: i32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    if let Some(caps) = DATE_MONTH_DAY.captures(value) {
        let month = month_to_number(&caps[1])?;
        let day: u32 = caps[2].parse().ok()?;
        let year: i32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    None
}

fn parse_year(s: &str) -> i32 {
    let year: i32 = s.parse().unwrap_or(0);
    if year < 100 {
        // Two-digit year: assume 2000s for 00-50, 1900s for 51-99
        if year <= 50 {
            2000 + year
        } else {
            1900 + year
        }
    } else {
        year
    }
}

fn month_to_number(month: &str) -> Option<u32> {
    let month = month.to_lowercase();
    let number = match month.as_str() {
        "jan" | "january" => 1,
        "feb" | "february" => 2,
        "mar" | "march" => 3,
        "apr" | "april" => 4,
        "may" => 5,
        "jun" | "june" => 6,
        "jul" | "july" => 7,
        "aug" | "august" => 8,
        "sep" | "sept" | "september" => 9,
        "oct" | "october" => 10,
        "nov" | "november" => 11,
        "dec" | "december" => 12,
        _ => return None,
    };
    Some(number)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_iso_forms() {
        assert_eq!(parse_date("2024-01-15"), Some(ymd(2024, 1, 15)));
        assert_eq!(parse_date("2024-01-15T10:30:00Z"), Some(ymd(2024, 1, 15)));
        assert_eq!(parse_date("2024-01-15T00:00:00.000Z"), Some(ymd(2024, 1, 15)));
        assert_eq!(parse_date("2024-01-15 08:00:00"), Some(ymd(2024, 1, 15)));
        assert_eq!(parse_date("2024/01/15"), Some(ymd(2024, 1, 15)));
    }

    #[test]
    fn test_month_first_then_day_first() {
        assert_eq!(parse_date("03/04/2024"), Some(ymd(2024, 3, 4)));
        assert_eq!(parse_date("15/03/2024"), Some(ymd(2024, 3, 15)));
        assert_eq!(parse_date("15-03-2024"), Some(ymd(2024, 3, 15)));
        assert_eq!(parse_date("15.03.2024"), Some(ymd(2024, 3, 15)));
    }

    #[test]
    fn test_two_digit_year() {
        assert_eq!(parse_date("01/15/24"), Some(ymd(2024, 1, 15)));
        assert_eq!(parse_date("01/15/99"), Some(ymd(1999, 1, 15)));
    }

    #[test]
    fn test_named_months() {
        assert_eq!(parse_date("25 Dec 2024"), Some(ymd(2024, 12, 25)));
        assert_eq!(parse_date("25-Dec-2024"), Some(ymd(2024, 12, 25)));
        assert_eq!(parse_date("5 September 2023"), Some(ymd(2023, 9, 5)));
        assert_eq!(parse_date("Dec 25, 2024"), Some(ymd(2024, 12, 25)));
        assert_eq!(parse_date("March 1st 2024"), Some(ymd(2024, 3, 1)));
    }

    #[test]
    fn test_unparseable() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("soon"), None);
        assert_eq!(parse_date("31/31/2024"), None);
        assert_eq!(parse_date("25 Smarch 2024"), None);
    }

    #[test]
    fn test_excel_serial() {
        assert_eq!(
            excel_serial_to_iso(25569.0).as_deref(),
            Some("1970-01-01T00:00:00.000Z")
        );
        assert_eq!(
            excel_serial_to_iso(45306.0).as_deref(),
            Some("2024-01-15T00:00:00.000Z")
        );
        assert_eq!(
            excel_serial_to_iso(45306.5).as_deref(),
            Some("2024-01-15T12:00:00.000Z")
        );
        assert_eq!(excel_serial_to_iso(f64::NAN), None);
    }
}
