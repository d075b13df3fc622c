//! Relational workbooks: customers, invoices and line items on separate sheets.
//!
//! Sheet roles come from sheet names. Each invoice row is joined to its
//! customer by customer id and to its items by invoice id (or number). Ids
//! are matched trimmed and case-insensitively first, then trimmed as written.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::error::ExtractionError;
use crate::mapping::{ColumnMapping, Field};
use crate::models::invoice::{Customer, Invoice, LineItem, UNKNOWN_CUSTOMER};
use crate::models::sheet::{Row, Sheet};
use crate::rules::patterns::{SHEET_CUSTOMERS, SHEET_INVOICE_ROLE, SHEET_ITEMS};

use super::extract::{extract_customer, extract_line_item, field_map, get_field_value, FieldMap};
use super::{DataTransformer, TransformOutput};

/// Which sheet plays which part in a relational workbook.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetRoles {
    pub customers: Option<String>,
    pub invoices: Option<String>,
    pub items: Option<String>,
}

/// Assign roles from sheet names. Each sheet takes at most one role, checked
/// as customers, then items, then invoices. Without an invoice-like name the
/// first sheet with no other role holds the invoices.
pub fn identify_sheet_roles(names: &[String]) -> SheetRoles {
    let mut roles = SheetRoles::default();

    for name in names {
        if roles.customers.is_none() && SHEET_CUSTOMERS.is_match(name) {
            roles.customers = Some(name.clone());
        } else if roles.items.is_none() && SHEET_ITEMS.is_match(name) {
            roles.items = Some(name.clone());
        } else if roles.invoices.is_none() && SHEET_INVOICE_ROLE.is_match(name) {
            roles.invoices = Some(name.clone());
        }
    }

    if roles.invoices.is_none() {
        roles.invoices = names
            .iter()
            .find(|n| roles.customers.as_ref() != Some(*n) && roles.items.as_ref() != Some(*n))
            .cloned();
    }

    roles
}

/// Values addressed by id, reachable by the lower-cased and the as-written
/// form of the trimmed id.
#[derive(Debug)]
struct IdLookup<T> {
    values: Vec<T>,
    keys: HashMap<String, usize>,
}

impl<T> IdLookup<T> {
    fn new() -> Self {
        Self {
            values: Vec::new(),
            keys: HashMap::new(),
        }
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        let raw = id.trim();
        self.keys
            .get(&raw.to_lowercase())
            .or_else(|| self.keys.get(raw))
            .copied()
    }

    /// Insert, replacing whatever the id pointed at before.
    fn insert(&mut self, id: &str, value: T) {
        let raw = id.trim();
        let index = self.values.len();
        self.values.push(value);
        self.keys.insert(raw.to_lowercase(), index);
        self.keys.insert(raw.to_string(), index);
    }

    fn get(&self, id: &str) -> Option<&T> {
        self.index_of(id).map(|i| &self.values[i])
    }

    fn get_or_insert_default(&mut self, id: &str) -> &mut T
    where
        T: Default,
    {
        let index = match self.index_of(id) {
            Some(index) => index,
            None => {
                self.insert(id, T::default());
                self.values.len() - 1
            }
        };
        &mut self.values[index]
    }

    fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl DataTransformer {
    /// Join related sheets into invoices.
    ///
    /// Sheets take the mappings tagged with their name; a sheet with none is
    /// mapped automatically. Rows that fail to convert are reported as
    /// warnings keyed by sheet row number. A single sheet is read as flat
    /// data (mapped automatically when no mappings are given) and no sheets
    /// yield no invoices, both with a warning.
    pub fn transform_multi_sheet(&self, sheets: &[&Sheet], mappings: &[ColumnMapping]) -> TransformOutput {
        match sheets {
            [] => {
                return TransformOutput {
                    invoices: Vec::new(),
                    warnings: vec!["No sheets to join.".to_string()],
                };
            }
            [sheet] => {
                let detected;
                let mappings = if mappings.is_empty() {
                    detected = self.mapper.map_sheet(sheet);
                    detected.as_slice()
                } else {
                    mappings
                };
                let mut output = self.transform_flat(sheet, mappings);
                output.warnings.insert(
                    0,
                    format!("Only one sheet ('{}'), reading it as flat data.", sheet.name),
                );
                return output;
            }
            _ => {}
        }

        let mut output = TransformOutput::default();
        let names: Vec<String> = sheets.iter().map(|s| s.name.clone()).collect();
        let mut roles = identify_sheet_roles(&names);

        if roles.invoices.is_none() {
            output
                .warnings
                .push("No invoice sheet detected. Using first sheet as invoice data.".to_string());
            roles.invoices = Some(names[0].clone());
        }

        let Some(invoice_sheet) = sheet_named(sheets, roles.invoices.as_deref()) else {
            return output;
        };

        info!(
            "Relational transform: invoices '{}', customers {:?}, items {:?}",
            invoice_sheet.name, roles.customers, roles.items
        );

        let customers = match sheet_named(sheets, roles.customers.as_deref()) {
            Some(sheet) => self.customer_lookup(sheet, mappings),
            None => IdLookup::new(),
        };
        let items = match sheet_named(sheets, roles.items.as_deref()) {
            Some(sheet) => self.items_lookup(sheet, mappings, &mut output.warnings),
            None => IdLookup::new(),
        };

        let fields = self.sheet_fields(invoice_sheet, mappings);

        for (i, row) in invoice_sheet.rows.iter().enumerate() {
            if row.is_blank() {
                continue;
            }
            let row_number = i + 2;

            match self.join_invoice(i, row, &fields, &customers, &items) {
                Ok((invoice, warnings)) => {
                    output.invoices.push(invoice);
                    output.warnings.extend(warnings);
                }
                Err(e) => output
                    .warnings
                    .push(format!("Failed to process row {}: {}", row_number, e)),
            }
        }

        info!(
            "Joined {} invoices from {} sheets ({} warnings)",
            output.invoices.len(),
            sheets.len(),
            output.warnings.len()
        );

        output
    }

    fn join_invoice(
        &self,
        index: usize,
        row: &Row,
        fields: &FieldMap,
        customers: &IdLookup<Customer>,
        items: &IdLookup<Vec<LineItem>>,
    ) -> std::result::Result<(Invoice, Vec<String>), ExtractionError> {
        let row_number = index + 2;
        let mut warnings = Vec::new();

        let invoice_number = non_empty(get_field_value(row, fields, Field::InvoiceNumber))
            .unwrap_or_else(|| format!("AUTO-{}", index + 1));
        let invoice_id = non_empty(get_field_value(row, fields, Field::InvoiceId))
            .unwrap_or_else(|| invoice_number.clone());

        let customer_id = get_field_value(row, fields, Field::CustomerId);
        let customer = match customers.get(&customer_id).filter(|_| !customer_id.is_empty()) {
            Some(customer) => customer.clone(),
            None => {
                let customer = extract_customer(row, fields, row_number);
                if customer.name == UNKNOWN_CUSTOMER && !customer_id.is_empty() && !customers.is_empty() {
                    warnings.push(format!(
                        "Invoice {}: Customer ID \"{}\" not found in customers sheet.",
                        invoice_number, customer_id
                    ));
                }
                customer
            }
        };

        let line_items = match items
            .get(&invoice_id)
            .or_else(|| items.get(&invoice_number))
            .filter(|found| !found.is_empty())
        {
            Some(found) => found.clone(),
            None if !get_field_value(row, fields, Field::Description).is_empty() => {
                vec![extract_line_item(row, fields, self.config.discount_mode)?]
            }
            None => {
                warnings.push(format!("Invoice {} has no line items.", invoice_number));
                vec![LineItem::placeholder()]
            }
        };

        let (invoice, more) =
            self.assemble(invoice_number, customer, line_items, row, fields, vec![row_number])?;
        warnings.extend(more);
        Ok((invoice, warnings))
    }

    /// Field map for one sheet: its tagged mappings, else auto-detected ones.
    fn sheet_fields(&self, sheet: &Sheet, mappings: &[ColumnMapping]) -> FieldMap {
        let tagged: Vec<&ColumnMapping> = mappings
            .iter()
            .filter(|m| m.sheet_name.as_deref() == Some(sheet.name.as_str()))
            .collect();

        if tagged.is_empty() {
            debug!("No mappings for sheet '{}', detecting", sheet.name);
            field_map(&self.mapper.map_sheet(sheet))
        } else {
            field_map(tagged)
        }
    }

    fn customer_lookup(&self, sheet: &Sheet, mappings: &[ColumnMapping]) -> IdLookup<Customer> {
        let fields = self.sheet_fields(sheet, mappings);
        let mut lookup = IdLookup::new();

        for (i, row) in sheet.rows.iter().enumerate() {
            if row.is_blank() {
                continue;
            }
            let customer = extract_customer(row, &fields, i + 2);
            let id = customer.id.clone();
            lookup.insert(&id, customer);
        }

        debug!("Loaded {} customers from '{}'", lookup.values.len(), sheet.name);
        lookup
    }

    fn items_lookup(
        &self,
        sheet: &Sheet,
        mappings: &[ColumnMapping],
        warnings: &mut Vec<String>,
    ) -> IdLookup<Vec<LineItem>> {
        let fields = self.sheet_fields(sheet, mappings);
        let mut lookup: IdLookup<Vec<LineItem>> = IdLookup::new();

        for (i, row) in sheet.rows.iter().enumerate() {
            let Some(invoice_id) = non_empty(get_field_value(row, &fields, Field::InvoiceId))
                .or_else(|| non_empty(get_field_value(row, &fields, Field::InvoiceNumber)))
            else {
                continue;
            };

            match extract_line_item(row, &fields, self.config.discount_mode) {
                Ok(item) => lookup.get_or_insert_default(&invoice_id).push(item),
                Err(e) => warnings.push(format!(
                    "Failed to process row {} of '{}': {}",
                    i + 2,
                    sheet.name,
                    e
                )),
            }
        }

        debug!("Loaded items for {} invoices from '{}'", lookup.values.len(), sheet.name);
        lookup
    }
}

fn sheet_named<'a>(sheets: &[&'a Sheet], name: Option<&str>) -> Option<&'a Sheet> {
    let name = name?;
    sheets.iter().copied().find(|s| s.name == name)
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sheet::Workbook;
    use crate::mapping::SheetFormat;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn customers() -> Sheet {
        Sheet::from_records(
            "Customers",
            ["cust_id", "name", "email"],
            vec![
                vec!["C1", "Acme", "ap@acme.com"],
                vec!["c2", "Globex", ""],
            ],
        )
    }

    fn items() -> Sheet {
        Sheet::from_records(
            "Items",
            ["invoice_id", "description", "qty", "price"],
            vec![
                vec!["I1", "Widget", "2", "5"],
                vec!["i1", "Bolt", "10", "0.5"],
                vec!["INV-2", "Gadget", "1", "30"],
            ],
        )
    }

    fn invoices() -> Sheet {
        Sheet::from_records(
            "Invoices",
            ["invoice_id", "customer_id", "invoiceNumber"],
            vec![vec!["I1", "C1", "INV-1"], vec!["", "C2", "INV-2"]],
        )
    }

    #[test]
    fn test_roles_from_names() {
        assert_eq!(
            identify_sheet_roles(&names(&["Invoices", "Client List", "Line Items"])),
            SheetRoles {
                customers: Some("Client List".into()),
                invoices: Some("Invoices".into()),
                items: Some("Line Items".into()),
            }
        );
    }

    #[test]
    fn test_roles_fallback_and_orders() {
        let roles = identify_sheet_roles(&names(&["Customers", "Data", "Details"]));
        assert_eq!(roles.invoices.as_deref(), Some("Data"));

        let roles = identify_sheet_roles(&names(&["Orders", "Order Lines"]));
        assert_eq!(roles.invoices.as_deref(), Some("Orders"));
        assert_eq!(roles.items.as_deref(), Some("Order Lines"));

        let roles = identify_sheet_roles(&names(&["Customers", "Items"]));
        assert_eq!(roles.invoices, None);
    }

    #[test]
    fn test_joins_customers_and_items() {
        let (c, inv, it) = (customers(), invoices(), items());
        let output = DataTransformer::new()
            .transform_multi_sheet(&[&c, &inv, &it], &[]);

        assert_eq!(output.warnings, Vec::<String>::new());
        assert_eq!(output.invoices.len(), 2);

        let first = &output.invoices[0];
        assert_eq!(first.invoice_number, "INV-1");
        assert_eq!(first.customer.name, "Acme");
        assert_eq!(first.customer.email.as_deref(), Some("ap@acme.com"));
        assert_eq!(first.line_items.len(), 2);
        assert_eq!(first.subtotal, Decimal::new(15, 0));
        assert_eq!(first.row_numbers, vec![2]);

        // Joined by number when the invoice id is blank; customer id case differs
        let second = &output.invoices[1];
        assert_eq!(second.customer.name, "Globex");
        assert_eq!(second.line_items[0].description, "Gadget");
        assert_eq!(second.grand_total, Decimal::new(30, 0));
    }

    #[test]
    fn test_missing_customer_and_items_warn() {
        let invoices = Sheet::from_records(
            "Invoices",
            ["invoice_id", "customer_id", "invoiceNumber"],
            vec![vec!["I9", "C9", "INV-9"]],
        );
        let (c, it) = (customers(), items());
        let output = DataTransformer::new()
            .transform_multi_sheet(&[&c, &invoices, &it], &[]);

        let invoice = &output.invoices[0];
        assert_eq!(invoice.customer.name, UNKNOWN_CUSTOMER);
        assert_eq!(invoice.line_items, vec![LineItem::placeholder()]);
        assert_eq!(
            output.warnings,
            vec![
                "Invoice INV-9: Customer ID \"C9\" not found in customers sheet.",
                "Invoice INV-9 has no line items.",
            ]
        );
    }

    #[test]
    fn test_inline_data_without_customer_sheet() {
        let invoices = Sheet::from_records(
            "Invoices",
            ["Invoice Number", "Customer", "Description", "Unit Price"],
            vec![vec!["INV-1", "Initech", "Consulting", "100"]],
        );
        let details = Sheet::from_records("Details", ["invoice_id", "description"], Vec::<Vec<&str>>::new());

        let output = DataTransformer::new()
            .transform_multi_sheet(&[&invoices, &details], &[]);

        assert!(output.warnings.is_empty());
        let invoice = &output.invoices[0];
        assert_eq!(invoice.customer.name, "Initech");
        assert_eq!(invoice.line_items[0].description, "Consulting");
        assert_eq!(invoice.grand_total, Decimal::new(100, 0));
    }

    #[test]
    fn test_tagged_mappings_preferred() {
        let (c, inv, it) = (customers(), invoices(), items());
        let mappings = vec![
            ColumnMapping::confirmed("customer_id", Field::CustomerId).with_sheet("Invoices"),
            ColumnMapping::confirmed("invoice_id", Field::InvoiceNumber).with_sheet("Invoices"),
        ];

        let output = DataTransformer::new()
            .transform_multi_sheet(&[&c, &inv, &it], &mappings);

        let numbers: Vec<&str> = output.invoices.iter().map(|i| i.invoice_number.as_str()).collect();
        assert_eq!(numbers, vec!["I1", "AUTO-2"]);
    }

    #[test]
    fn test_no_invoice_sheet_uses_first() {
        let (c, it) = (customers(), items());
        let output = DataTransformer::new()
            .transform_multi_sheet(&[&c, &it], &[]);

        assert_eq!(
            output.warnings[0],
            "No invoice sheet detected. Using first sheet as invoice data."
        );
        assert_eq!(output.invoices.len(), 2);
    }

    #[test]
    fn test_fewer_than_two_sheets() {
        let output = DataTransformer::new().transform_multi_sheet(&[], &[]);
        assert!(output.invoices.is_empty());
        assert_eq!(output.warnings, vec!["No sheets to join."]);

        let invoices = Sheet::from_records(
            "Invoices",
            ["Invoice Number", "Description", "Unit Price"],
            vec![vec!["INV-1", "Widget", "5"]],
        );
        let output = DataTransformer::new().transform_multi_sheet(&[&invoices], &[]);
        assert_eq!(output.invoices.len(), 1);
        assert_eq!(output.invoices[0].invoice_number, "INV-1");
        assert_eq!(
            output.warnings[0],
            "Only one sheet ('Invoices'), reading it as flat data."
        );
    }

    #[test]
    fn test_selected_sheets_through_transform() {
        let workbook = Workbook::new(vec![customers(), invoices(), items()]);
        let selected = names(&["Invoices", "Items"]);

        let output = DataTransformer::new()
            .transform(&workbook, &[], SheetFormat::MultiSheet, Some(&selected))
            .unwrap();

        // Customers sheet not selected, so names come from nowhere
        assert_eq!(output.invoices.len(), 2);
        assert_eq!(output.invoices[0].customer.name, UNKNOWN_CUSTOMER);
        assert_eq!(output.invoices[0].line_items.len(), 2);
    }
}
