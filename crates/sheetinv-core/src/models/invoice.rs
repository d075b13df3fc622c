//! Canonical invoice data models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Customer name used when no source column supplies one.
///
/// The validator treats this value as a missing name.
pub const UNKNOWN_CUSTOMER: &str = "Unknown Customer";

/// Line item description used when no source column supplies one.
pub const PLACEHOLDER_DESCRIPTION: &str = "Item";

/// Currency used when neither the source nor the configuration names one.
pub const DEFAULT_CURRENCY: &str = "USD";

/// A complete invoice produced from spreadsheet rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    /// Invoice number as it appeared in the source.
    pub invoice_number: String,

    /// Billed customer.
    pub customer: Customer,

    /// Date the invoice was issued.
    pub issue_date: NaiveDate,

    /// Payment due date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,

    /// Line items on the invoice.
    pub line_items: Vec<LineItem>,

    /// ISO 4217 currency code.
    pub currency: String,

    /// Sum of line totals, or the explicit subtotal column.
    pub subtotal: Decimal,

    /// Sum of line tax, or the explicit tax column.
    pub total_tax: Decimal,

    /// Sum of line discounts. Never taken from the source directly.
    pub total_discount: Decimal,

    /// Explicit total, or `subtotal - total_discount + total_tax`.
    pub grand_total: Decimal,

    /// Amount already paid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_paid: Option<Decimal>,

    /// Remaining balance, known only when `amount_paid` is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance_due: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms: Option<String>,

    /// Purchase order reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub po_number: Option<String>,

    /// Payment status text from the source (e.g. "Paid", "Overdue").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_status: Option<String>,

    /// Validation status, written by the validator.
    #[serde(default)]
    pub status: InvoiceStatus,

    /// Messages explaining `status`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation_errors: Vec<String>,

    /// 1-based source row numbers (header row is row 1).
    #[serde(default)]
    pub row_numbers: Vec<usize>,
}

impl Invoice {
    /// Whether the invoice should be treated as settled.
    ///
    /// Checks, in order: an explicit status word from the source, amount paid
    /// against the grand total, then the remaining balance. Anything else is
    /// unpaid.
    pub fn is_paid(&self) -> bool {
        let status = self
            .source_status
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .unwrap_or_default();

        match status.as_str() {
            "paid" | "complete" | "completed" => return true,
            "unpaid" | "pending" | "overdue" | "draft" => return false,
            _ => {}
        }

        if let Some(paid) = self.amount_paid {
            if !paid.is_zero() && !self.grand_total.is_zero() {
                return paid >= self.grand_total;
            }
        }

        if let Some(balance) = self.balance_due {
            return balance <= Decimal::ZERO;
        }

        false
    }

    /// First source row, used as the anchor for invoice-level messages.
    pub fn first_row(&self) -> Option<usize> {
        self.row_numbers.first().copied()
    }
}

/// Validation outcome of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    #[default]
    Valid,
    Warning,
    Error,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Valid => "valid",
            InvoiceStatus::Warning => "warning",
            InvoiceStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The billed party.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    /// Source customer id, or a generated one.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Company name, when a separate column supplies it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Present only when at least one address part is non-empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,

    /// Tax registration number (VAT, GST, EIN...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
}

/// Postal address.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    /// Street line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line1: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    /// State, province or region.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl Address {
    /// Check if the address has any data.
    pub fn is_empty(&self) -> bool {
        self.line1.is_none()
            && self.city.is_none()
            && self.state.is_none()
            && self.postal_code.is_none()
            && self.country.is_none()
    }

    /// Format the address on a single line.
    pub fn format(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(line1) = &self.line1 {
            parts.push(line1);
        }
        if let Some(city) = &self.city {
            parts.push(city);
        }
        if let Some(state) = &self.state {
            parts.push(state);
        }
        if let Some(postal) = &self.postal_code {
            parts.push(postal);
        }
        if let Some(country) = &self.country {
            parts.push(country);
        }
        parts.join(", ")
    }
}

/// Single line on an invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub description: String,

    /// Quantity; defaults to 1 when the source has none.
    pub quantity: Decimal,

    pub unit_price: Decimal,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<Discount>,

    /// Tax rate in percent (18 means 18%).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_rate: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_amount: Option<Decimal>,

    /// Explicit line total, or `quantity * unit_price`.
    pub line_total: Decimal,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,

    /// HSN/SAC classification code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hsn_code: Option<String>,
}

impl LineItem {
    /// Placeholder line used when an invoice has no item data at all.
    pub fn placeholder() -> Self {
        Self {
            description: PLACEHOLDER_DESCRIPTION.to_string(),
            quantity: Decimal::ONE,
            unit_price: Decimal::ZERO,
            discount: None,
            tax_rate: None,
            tax_amount: None,
            line_total: Decimal::ZERO,
            sku: None,
            hsn_code: None,
        }
    }

    /// Discount value in currency units, `None` on overflow.
    pub fn discount_amount(&self) -> Option<Decimal> {
        match &self.discount {
            None => Some(Decimal::ZERO),
            Some(d) => match d.kind {
                DiscountKind::Fixed => Some(d.value),
                DiscountKind::Percentage => self
                    .unit_price
                    .checked_mul(self.quantity)?
                    .checked_mul(d.value)?
                    .checked_div(Decimal::ONE_HUNDRED),
            },
        }
    }
}

/// Discount applied to a line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discount {
    #[serde(rename = "type")]
    pub kind: DiscountKind,
    pub value: Decimal,
}

/// How a discount value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountKind {
    /// Percentage of `unit_price * quantity`.
    Percentage,
    /// Fixed currency amount.
    Fixed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn invoice() -> Invoice {
        Invoice {
            invoice_number: "INV-1".to_string(),
            customer: Customer {
                id: "C1".to_string(),
                name: "Acme".to_string(),
                ..Default::default()
            },
            issue_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            due_date: None,
            line_items: vec![LineItem::placeholder()],
            currency: "USD".to_string(),
            subtotal: dec("100"),
            total_tax: Decimal::ZERO,
            total_discount: Decimal::ZERO,
            grand_total: dec("100"),
            amount_paid: None,
            balance_due: None,
            notes: None,
            terms: None,
            po_number: None,
            source_status: None,
            status: InvoiceStatus::Valid,
            validation_errors: Vec::new(),
            row_numbers: vec![2],
        }
    }

    #[test]
    fn test_paid_by_status_word() {
        let mut inv = invoice();
        inv.source_status = Some(" Completed ".to_string());
        assert!(inv.is_paid());

        inv.source_status = Some("Overdue".to_string());
        inv.amount_paid = Some(dec("100"));
        assert!(!inv.is_paid());
    }

    #[test]
    fn test_paid_by_amount() {
        let mut inv = invoice();
        inv.amount_paid = Some(dec("99.99"));
        assert!(!inv.is_paid());

        inv.amount_paid = Some(dec("100"));
        assert!(inv.is_paid());
    }

    #[test]
    fn test_paid_by_balance() {
        let mut inv = invoice();
        inv.grand_total = Decimal::ZERO;
        inv.balance_due = Some(Decimal::ZERO);
        assert!(inv.is_paid());

        inv.balance_due = None;
        assert!(!inv.is_paid());
    }

    #[test]
    fn test_discount_amount() {
        let mut item = LineItem::placeholder();
        item.unit_price = dec("10");
        item.quantity = dec("3");
        item.discount = Some(Discount { kind: DiscountKind::Percentage, value: dec("10") });
        assert_eq!(item.discount_amount(), Some(dec("3")));

        item.discount = Some(Discount { kind: DiscountKind::Fixed, value: dec("150") });
        assert_eq!(item.discount_amount(), Some(dec("150")));
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(invoice()).unwrap();
        assert_eq!(json["invoiceNumber"], "INV-1");
        assert_eq!(json["status"], "valid");
        assert!(json.get("dueDate").is_none());
        assert_eq!(json["lineItems"][0]["description"], "Item");
    }
}
