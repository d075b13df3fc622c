//! Field extraction from mapped rows.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::error::ExtractionError;
use crate::mapping::{ColumnMapping, Field};
use crate::models::config::DiscountMode;
use crate::models::invoice::{
    Address, Customer, Discount, DiscountKind, LineItem, PLACEHOLDER_DESCRIPTION, UNKNOWN_CUSTOMER,
};
use crate::models::sheet::{CellValue, Row};
use crate::rules::{excel_serial_to_iso, parse_amount};

/// Canonical field to the source column holding it.
pub type FieldMap = HashMap<Field, String>;

/// Build a field map from mappings. Unmapped columns are skipped; if two
/// mappings claim the same field the first one is used.
pub fn field_map<'a, I>(mappings: I) -> FieldMap
where
    I: IntoIterator<Item = &'a ColumnMapping>,
{
    let mut map = FieldMap::new();
    for mapping in mappings {
        if let Some(field) = mapping.target_field {
            map.entry(field).or_insert_with(|| mapping.source_column.clone());
        }
    }
    map
}

/// Text value of `field` in `row`.
///
/// Empty when the field is unmapped or the cell is blank. Numeric cells in
/// date fields are read as spreadsheet serials and returned as ISO 8601.
pub fn get_field_value(row: &Row, fields: &FieldMap, field: Field) -> String {
    let Some(cell) = fields.get(&field).and_then(|column| row.get(column)) else {
        return String::new();
    };

    match cell {
        CellValue::Number(n) if field.is_date() => {
            excel_serial_to_iso(*n).unwrap_or_else(|| cell.to_text())
        }
        _ => cell.to_text(),
    }
}

/// Like [`get_field_value`] but `None` for empty values.
pub fn optional_value(row: &Row, fields: &FieldMap, field: Field) -> Option<String> {
    let value = get_field_value(row, fields, field);
    (!value.is_empty()).then_some(value)
}

/// Parsed amount of `field`, `None` when blank or unparseable.
pub fn amount_value(row: &Row, fields: &FieldMap, field: Field) -> Option<Decimal> {
    parse_amount(&get_field_value(row, fields, field))
}

/// Customer details from a single row.
///
/// Falls back to the company for the name and to a row-derived id.
pub fn extract_customer(row: &Row, fields: &FieldMap, row_number: usize) -> Customer {
    let address = Address {
        line1: optional_value(row, fields, Field::CustomerAddress),
        city: optional_value(row, fields, Field::CustomerCity),
        state: optional_value(row, fields, Field::CustomerState),
        postal_code: optional_value(row, fields, Field::CustomerPostalCode),
        country: optional_value(row, fields, Field::CustomerCountry),
    };

    let company = optional_value(row, fields, Field::CustomerCompany);
    let name = optional_value(row, fields, Field::CustomerName)
        .or_else(|| company.clone())
        .unwrap_or_else(|| UNKNOWN_CUSTOMER.to_string());

    Customer {
        id: optional_value(row, fields, Field::CustomerId)
            .unwrap_or_else(|| format!("CUST-{}", row_number)),
        name,
        company,
        email: optional_value(row, fields, Field::CustomerEmail),
        phone: optional_value(row, fields, Field::CustomerPhone),
        address: (!address.is_empty()).then_some(address),
        tax_id: optional_value(row, fields, Field::CustomerTaxId),
    }
}

/// One line item from a single row.
///
/// Missing or unreadable quantity counts as 1 and missing price as 0. A zero
/// line total is recomputed from quantity and price. Tax is taken as given
/// when positive, otherwise derived from the rate.
pub fn extract_line_item(
    row: &Row,
    fields: &FieldMap,
    discount_mode: DiscountMode,
) -> Result<LineItem, ExtractionError> {
    let quantity = amount_value(row, fields, Field::Quantity).unwrap_or(Decimal::ONE);
    let unit_price = amount_value(row, fields, Field::UnitPrice).unwrap_or(Decimal::ZERO);
    let tax_rate = amount_value(row, fields, Field::TaxRate).filter(|r| *r > Decimal::ZERO);

    let line_total = match amount_value(row, fields, Field::LineTotal) {
        Some(total) if !total.is_zero() => total,
        _ => quantity
            .checked_mul(unit_price)
            .ok_or(ExtractionError::Overflow("line total"))?,
    };

    let tax_amount = match amount_value(row, fields, Field::TaxAmount) {
        Some(tax) if tax > Decimal::ZERO => Some(tax),
        _ => match tax_rate {
            Some(rate) => Some(
                line_total
                    .checked_mul(rate)
                    .and_then(|t| t.checked_div(Decimal::ONE_HUNDRED))
                    .ok_or(ExtractionError::Overflow("line tax"))?,
            ),
            None => None,
        },
    }
    .filter(|t| *t > Decimal::ZERO);

    let discount = amount_value(row, fields, Field::Discount)
        .filter(|d| *d > Decimal::ZERO)
        .map(|value| Discount {
            kind: discount_kind(value, discount_mode),
            value,
        });

    Ok(LineItem {
        description: optional_value(row, fields, Field::Description)
            .unwrap_or_else(|| PLACEHOLDER_DESCRIPTION.to_string()),
        quantity,
        unit_price,
        discount,
        tax_rate,
        tax_amount,
        line_total,
        sku: optional_value(row, fields, Field::Sku),
        hsn_code: optional_value(row, fields, Field::HsnCode),
    })
}

fn discount_kind(value: Decimal, mode: DiscountMode) -> DiscountKind {
    match mode {
        DiscountMode::Percentage => DiscountKind::Percentage,
        DiscountMode::Fixed => DiscountKind::Fixed,
        DiscountMode::Heuristic if value > Decimal::ONE_HUNDRED => DiscountKind::Fixed,
        DiscountMode::Heuristic => DiscountKind::Percentage,
    }
}

/// Invoice-level totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Totals {
    pub subtotal: Decimal,
    pub total_tax: Decimal,
    pub total_discount: Decimal,
    pub grand_total: Decimal,
    /// `subtotal - discount + tax` regardless of any explicit grand total.
    pub computed_total: Decimal,
}

/// Explicit invoice-level amounts from the source; zero or absent means unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TotalOverrides {
    pub subtotal: Option<Decimal>,
    pub tax: Option<Decimal>,
    pub total: Option<Decimal>,
}

impl TotalOverrides {
    /// Read the invoice-level total columns of `row`.
    pub fn from_row(row: &Row, fields: &FieldMap) -> Self {
        let positive = |field| amount_value(row, fields, field).filter(|v| *v > Decimal::ZERO);
        Self {
            subtotal: positive(Field::InvoiceSubtotal),
            tax: positive(Field::InvoiceTax),
            total: positive(Field::InvoiceTotal),
        }
    }
}

/// Sum line items and apply explicit overrides.
///
/// Subtotal and tax overrides are independent; the discount is always the
/// sum of line discounts. An explicit grand total wins over the computed one.
pub fn compute_totals(items: &[LineItem], overrides: TotalOverrides) -> Result<Totals, ExtractionError> {
    let mut subtotal = Decimal::ZERO;
    let mut total_tax = Decimal::ZERO;
    let mut total_discount = Decimal::ZERO;

    for item in items {
        subtotal = subtotal
            .checked_add(item.line_total)
            .ok_or(ExtractionError::Overflow("subtotal"))?;
        total_tax = total_tax
            .checked_add(item.tax_amount.unwrap_or_default())
            .ok_or(ExtractionError::Overflow("tax total"))?;
        total_discount = item
            .discount_amount()
            .and_then(|d| total_discount.checked_add(d))
            .ok_or(ExtractionError::Overflow("discount total"))?;
    }

    let subtotal = overrides.subtotal.unwrap_or(subtotal);
    let total_tax = overrides.tax.unwrap_or(total_tax);
    let computed_total = subtotal
        .checked_sub(total_discount)
        .and_then(|t| t.checked_add(total_tax))
        .ok_or(ExtractionError::Overflow("grand total"))?;

    Ok(Totals {
        subtotal,
        total_tax,
        total_discount,
        grand_total: overrides.total.unwrap_or(computed_total),
        computed_total,
    })
}
