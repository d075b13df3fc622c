//! Amount parsing for spreadsheet cells.

use rust_decimal::Decimal;
use std::str::FromStr;

use super::patterns::SCIENTIFIC;

/// Parse a monetary or numeric cell ("1,234.56", "1.234,56", "$ 99", "(12.50)").
///
/// Currency symbols, letters, spaces and apostrophes are ignored. A leading or
/// trailing minus and surrounding parentheses both mean negative. Returns
/// `None` when no digits remain or the value is out of range.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }

    if SCIENTIFIC.is_match(trimmed) {
        return Decimal::from_scientific(trimmed).ok();
    }

    let leading_minus = trimmed
        .chars()
        .find(|c| c.is_ascii_digit() || *c == '-')
        == Some('-');
    let negative = leading_minus
        || trimmed.ends_with('-')
        || (trimmed.starts_with('(') && trimmed.ends_with(')'));

    let cleaned: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();

    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let normalized = resolve_separators(&cleaned);
    let amount = Decimal::from_str(&normalized).ok()?;

    Some(if negative { -amount } else { amount })
}

/// Decide which of `,` and `.` is the decimal separator.
fn resolve_separators(cleaned: &str) -> String {
    let commas = cleaned.matches(',').count();
    let dots = cleaned.matches('.').count();

    match (commas, dots) {
        (0, 0) => cleaned.to_string(),
        // Only dots: several of them are grouping ("1.234.567")
        (0, d) if d > 1 => cleaned.replace('.', ""),
        (0, _) => cleaned.to_string(),
        // Only commas: "1,234" and "1,234,567" are grouping, "12,5" is decimal
        (c, 0) => {
            let digits_after = cleaned.len() - cleaned.rfind(',').map(|i| i + 1).unwrap_or(0);
            if c > 1 || digits_after == 3 {
                cleaned.replace(',', "")
            } else {
                cleaned.replace(',', ".")
            }
        }
        // Both: whichever comes last is the decimal separator
        _ => {
            let comma_pos = cleaned.rfind(',');
            let dot_pos = cleaned.rfind('.');
            match (comma_pos, dot_pos) {
                (Some(c), Some(d)) if c > d => cleaned.replace('.', "").replace(',', "."),
                _ => cleaned.replace(',', ""),
            }
        }
    }
}

/// Format an amount with two decimals and `,` thousands grouping.
pub fn format_amount(amount: Decimal) -> String {
    let s = format!("{:.2}", amount.abs());
    let (integer_part, decimal_part) = s.split_once('.').unwrap_or((s.as_str(), "00"));

    let chars: Vec<char> = integer_part.chars().collect();
    let mut formatted = String::new();
    if amount.is_sign_negative() && !amount.is_zero() {
        formatted.push('-');
    }

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            formatted.push(',');
        }
        formatted.push(*c);
    }

    format!("{}.{}", formatted, decimal_part)
}
