//! Rule-based parsers for cell values.

pub mod amounts;
pub mod currency;
pub mod dates;
pub mod patterns;

pub use amounts::{format_amount, parse_amount};
pub use currency::{currency_code, currency_symbol};
pub use dates::{excel_serial_to_datetime, excel_serial_to_iso, parse_date};
