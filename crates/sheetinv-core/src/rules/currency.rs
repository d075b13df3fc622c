//! Currency code normalization.

/// Known currencies as `(code, symbol)`. Where several currencies share a
/// symbol the first entry wins when resolving a symbol.
const CURRENCIES: &[(&str, &str)] = &[
    ("USD", "$"),
    ("EUR", "\u{20AC}"),
    ("GBP", "\u{00A3}"),
    ("JPY", "\u{00A5}"),
    ("CNY", "\u{00A5}"),
    ("INR", "\u{20B9}"),
    ("AUD", "A$"),
    ("CAD", "C$"),
    ("CHF", "CHF"),
    ("HKD", "HK$"),
    ("SGD", "S$"),
    ("SEK", "kr"),
    ("KRW", "\u{20A9}"),
    ("MXN", "$"),
    ("NZD", "NZ$"),
    ("BRL", "R$"),
    ("ZAR", "R"),
    ("RUB", "\u{20BD}"),
    ("AED", "AED"),
    ("SAR", "SAR"),
    ("THB", "\u{0E3F}"),
    ("IDR", "Rp"),
    ("MYR", "RM"),
    ("PHP", "\u{20B1}"),
    ("PLN", "z\u{0142}"),
    ("TRY", "\u{20BA}"),
    ("CZK", "K\u{010D}"),
    ("ILS", "\u{20AA}"),
    ("CLP", "$"),
    ("COP", "$"),
    ("ARS", "$"),
    ("VND", "\u{20AB}"),
    ("EGP", "E\u{00A3}"),
    ("NGN", "\u{20A6}"),
    ("PKR", "Rs"),
    ("BDT", "\u{09F3}"),
    ("UAH", "\u{20B4}"),
    ("NOK", "kr"),
    ("DKK", "kr"),
    ("HUF", "Ft"),
];

/// Resolve a currency cell to an upper-case ISO 4217 code.
///
/// Accepts codes in any case (`usd`), symbols (`€`, `US$`) and codes with
/// trailing decoration (`EUR (Euro)`). Returns `None` for blank or
/// unrecognised input.
pub fn currency_code(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let upper = trimmed.to_uppercase();
    if let Some((code, _)) = CURRENCIES.iter().find(|(code, _)| *code == upper) {
        return Some((*code).to_string());
    }

    if upper == "US$" {
        return Some("USD".to_string());
    }

    if let Some((code, _)) = CURRENCIES
        .iter()
        .find(|(_, symbol)| symbol.eq_ignore_ascii_case(trimmed))
    {
        return Some((*code).to_string());
    }

    // Leading three letters of "EUR - Euro" or "usd (us dollar)"
    let prefix: String = upper.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    if prefix.len() == 3 && upper.len() > 3 {
        if let Some((code, _)) = CURRENCIES.iter().find(|(code, _)| *code == prefix) {
            return Some((*code).to_string());
        }
    }

    if trimmed.len() == 3 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        return Some(upper);
    }

    None
}

/// Display symbol for a currency code, falling back to the code itself.
pub fn currency_symbol(code: &str) -> &str {
    CURRENCIES
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(code))
        .map(|(_, symbol)| *symbol)
        .unwrap_or(code)
}
