//! Common regex patterns for cell value parsing and sheet linking.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Email shape check: local@domain.tld
    pub static ref EMAIL: Regex = Regex::new(
        r"^[^\s@]+@[^\s@]+\.[^\s@]+$"
    ).unwrap();

    // Numeric dates, whole-cell matches only
    pub static ref DATE_YMD: Regex = Regex::new(
        r"^(\d{4})[./\-](\d{1,2})[./\-](\d{1,2})$"
    ).unwrap();

    pub static ref DATE_NUMERIC: Regex = Regex::new(
        r"^(\d{1,2})[./\-](\d{1,2})[./\-](\d{4}|\d{2})$"
    ).unwrap();

    // "25 Dec 2024", "25-Dec-2024", "25 December, 2024"
    pub static ref DATE_DAY_MONTH: Regex = Regex::new(
        r"^(\d{1,2})(?:st|nd|rd|th)?[\s\-]+([A-Za-z]+)\.?,?[\s\-]+(\d{4})$"
    ).unwrap();

    // "Dec 25, 2024", "December 25th 2024"
    pub static ref DATE_MONTH_DAY: Regex = Regex::new(
        r"^([A-Za-z]+)\.?\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})$"
    ).unwrap();

    // Plain or scientific notation number, after separators are resolved
    pub static ref SCIENTIFIC: Regex = Regex::new(
        r"^[+-]?\d+(?:\.\d+)?[eE][+-]?\d+$"
    ).unwrap();

    // Foreign key column names and the sheet names they point at
    pub static ref FK_CUSTOMER_ID: Regex = Regex::new(r"(?i)customer[_\s]?id").unwrap();
    pub static ref FK_CLIENT_ID: Regex = Regex::new(r"(?i)client[_\s]?id").unwrap();
    pub static ref FK_INVOICE_ID: Regex = Regex::new(r"(?i)invoice[_\s]?id").unwrap();
    pub static ref FK_INV_ID: Regex = Regex::new(r"(?i)inv[_\s]?id").unwrap();
    pub static ref FK_ORDER_ID: Regex = Regex::new(r"(?i)order[_\s]?id").unwrap();

    pub static ref SHEET_CUSTOMERS: Regex = Regex::new(r"(?i)customer|client|contact").unwrap();
    pub static ref SHEET_INVOICES: Regex = Regex::new(r"(?i)invoice|bill|header").unwrap();
    pub static ref SHEET_ORDERS: Regex = Regex::new(r"(?i)order|header").unwrap();
    pub static ref SHEET_ITEMS: Regex = Regex::new(r"(?i)item|line|detail").unwrap();

    // Sheets holding invoice headers when assigning roles; orders count too
    pub static ref SHEET_INVOICE_ROLE: Regex = Regex::new(r"(?i)invoice|bill|header|order").unwrap();

    pub static ref PRIMARY_KEY: Regex = Regex::new(r"(?i)^id$").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_shape() {
        assert!(EMAIL.is_match("ap@acme.com"));
        assert!(EMAIL.is_match("first.last+tag@mail.example.co.uk"));
        assert!(!EMAIL.is_match("acme.com"));
        assert!(!EMAIL.is_match("ap@acme"));
        assert!(!EMAIL.is_match("a p@acme.com"));
    }

    #[test]
    fn test_foreign_key_names() {
        assert!(FK_CUSTOMER_ID.is_match("Customer ID"));
        assert!(FK_CUSTOMER_ID.is_match("customer_id"));
        assert!(FK_CUSTOMER_ID.is_match("CustomerId"));
        assert!(!FK_CUSTOMER_ID.is_match("customer name"));
        assert!(FK_INV_ID.is_match("inv_id"));
    }

    #[test]
    fn test_sheet_roles() {
        assert!(SHEET_CUSTOMERS.is_match("Client List"));
        assert!(SHEET_ITEMS.is_match("Line Items"));
        assert!(SHEET_INVOICES.is_match("Invoice Headers"));
        assert!(!SHEET_INVOICES.is_match("Orders"));
        assert!(SHEET_INVOICE_ROLE.is_match("Orders"));
    }
}
