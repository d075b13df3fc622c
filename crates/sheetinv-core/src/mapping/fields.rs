//! Canonical invoice fields and the header variants that identify them.
//!
//! Patterns are listed most specific first; position in the list is the
//! tie-breaker when several fields share a header variant. The catalog covers
//! QuickBooks, Xero, Zoho, Wave and FreshBooks exports, regional tax naming
//! (VAT, GST, ABN, PAN...) and Spanish, German, Italian, French, Portuguese,
//! Dutch and Nordic headers.

use serde::{Deserialize, Serialize};

/// A canonical invoice field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    InvoiceNumber,
    IssueDate,
    DueDate,
    CustomerName,
    CustomerEmail,
    CustomerPhone,
    CustomerAddress,
    CustomerCompany,
    CustomerCity,
    CustomerState,
    CustomerPostalCode,
    CustomerCountry,
    CustomerTaxId,
    Description,
    Quantity,
    UnitPrice,
    LineTotal,
    TaxRate,
    TaxAmount,
    Discount,
    Sku,
    HsnCode,
    InvoiceSubtotal,
    InvoiceTax,
    InvoiceTotal,
    AmountPaid,
    Currency,
    Status,
    Notes,
    Terms,
    PoNumber,
    CustomerId,
    InvoiceId,
    LineItemId,
}

impl Field {
    /// Canonical camelCase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::InvoiceNumber => "invoiceNumber",
            Field::IssueDate => "issueDate",
            Field::DueDate => "dueDate",
            Field::CustomerName => "customerName",
            Field::CustomerEmail => "customerEmail",
            Field::CustomerPhone => "customerPhone",
            Field::CustomerAddress => "customerAddress",
            Field::CustomerCompany => "customerCompany",
            Field::CustomerCity => "customerCity",
            Field::CustomerState => "customerState",
            Field::CustomerPostalCode => "customerPostalCode",
            Field::CustomerCountry => "customerCountry",
            Field::CustomerTaxId => "customerTaxId",
            Field::Description => "description",
            Field::Quantity => "quantity",
            Field::UnitPrice => "unitPrice",
            Field::LineTotal => "lineTotal",
            Field::TaxRate => "taxRate",
            Field::TaxAmount => "taxAmount",
            Field::Discount => "discount",
            Field::Sku => "sku",
            Field::HsnCode => "hsnCode",
            Field::InvoiceSubtotal => "invoiceSubtotal",
            Field::InvoiceTax => "invoiceTax",
            Field::InvoiceTotal => "invoiceTotal",
            Field::AmountPaid => "amountPaid",
            Field::Currency => "currency",
            Field::Status => "status",
            Field::Notes => "notes",
            Field::Terms => "terms",
            Field::PoNumber => "poNumber",
            Field::CustomerId => "customerId",
            Field::InvoiceId => "invoiceId",
            Field::LineItemId => "lineItemId",
        }
    }

    /// Fields holding dates; numeric cells in these are read as date serials.
    pub fn is_date(&self) -> bool {
        self.as_str().to_lowercase().contains("date")
    }

    /// Look up a field by its canonical name.
    pub fn from_name(name: &str) -> Option<Field> {
        FIELD_DEFINITIONS
            .iter()
            .map(|d| d.field)
            .find(|f| f.as_str().eq_ignore_ascii_case(name.trim()))
    }

    /// Catalog entry for this field.
    pub fn definition(&self) -> &'static FieldDefinition {
        // Every variant has exactly one entry, in declaration order.
        &FIELD_DEFINITIONS[*self as usize]
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static catalog entry for one canonical field.
#[derive(Debug)]
pub struct FieldDefinition {
    pub field: Field,
    /// Lower-case header variants, highest priority first.
    pub patterns: &'static [&'static str],
    pub required: bool,
    /// Value prefixes or shapes typical for the field.
    pub data_type_hints: &'static [&'static str],
}

/// Required canonical fields, in catalog order.
pub fn required_fields() -> Vec<Field> {
    FIELD_DEFINITIONS
        .iter()
        .filter(|d| d.required)
        .map(|d| d.field)
        .collect()
}

/// Optional canonical fields, in catalog order.
pub fn optional_fields() -> Vec<Field> {
    FIELD_DEFINITIONS
        .iter()
        .filter(|d| !d.required)
        .map(|d| d.field)
        .collect()
}

/// The whole catalog.
pub fn all_field_definitions() -> &'static [FieldDefinition] {
    FIELD_DEFINITIONS
}

pub static FIELD_DEFINITIONS: &[FieldDefinition] = &[
    FieldDefinition {
        field: Field::InvoiceNumber,
        patterns: &[
            "invoice number", "invoice no", "invoice #", "invoice no.", "invoice num",
            "inv no", "inv #", "inv no.", "inv num", "inv number",
            "invoice_no", "invoice_number", "invoiceno", "invoicenumber", "invoice-no",
            "doc no", "doc #", "doc number", "document number", "document no",
            "document id", "doc id", "document_number", "document_no",
            "bill no", "bill #", "bill number", "bill_no", "bill_number",
            "reference", "ref", "ref no", "ref #", "ref.", "reference number", "reference no",
            "ref number", "ref_no", "reference_number", "ref_number",
            "transaction no", "transaction number", "trans no", "trans #", "txn no", "txn #",
            "transaction_no", "transaction_number", "transaction id", "trans id",
            "num", "no.", "number", "txn number",
            "invoice ref", "inv ref", "credit note number",
            "invoice#", "creditnote#", "bill#",
            "factura no", "factura numero", "rechnung nr", "rechnungsnummer",
            "fattura n", "numero fattura",
            "facture no", "numéro facture",
            "faktura nr",
        ],
        required: true,
        data_type_hints: &["INV-", "INV", "BILL-", "REF-", "DOC-"],
    },
    FieldDefinition {
        field: Field::IssueDate,
        patterns: &[
            "invoice date", "date", "issue date", "issued date", "issued",
            "invoice_date", "issue_date", "invoicedate", "issuedate",
            "doc date", "document date", "doc_date", "document_date",
            "bill date", "billed date", "bill_date",
            "transaction date", "trans date", "txn date", "transaction_date",
            "created", "created date", "create date", "created_date", "creation date",
            "date created", "date_created",
            "raised date", "created time",
            "fecha", "fecha factura", "datum", "rechnungsdatum",
            "data", "data fattura",
            "date facture",
        ],
        required: true,
        data_type_hints: &[],
    },
    FieldDefinition {
        field: Field::DueDate,
        patterns: &[
            "due date", "due", "payment due", "due_date", "duedate",
            "payment due date", "pay due", "pay due date",
            "pay by", "pay by date", "payable by", "payable date",
            "payment date", "payment_date", "pmt date",
            "net date", "terms date",
            "expiry", "expiry date", "expires", "valid until", "valid till",
            "expected payment", "expected date",
            "fecha vencimiento", "vencimiento", "fällig", "fälligkeitsdatum",
            "scadenza", "data scadenza",
            "date échéance", "échéance",
        ],
        required: false,
        data_type_hints: &[],
    },
    FieldDefinition {
        field: Field::CustomerName,
        patterns: &[
            "customer", "customer name", "cust", "cust name", "cust. name",
            "customer_name", "customername", "cust_name",
            "client", "client name", "client_name", "clientname",
            "name", "full name", "fullname", "full_name", "contact name",
            "buyer", "buyer name", "buyer_name", "purchaser", "purchaser name",
            "bill to", "billed to", "bill to name", "billto", "bill_to",
            "billing name", "billing_name", "invoice to",
            "sold to", "sold_to", "soldto", "sell to",
            "ship to", "ship to name", "shipto", "ship_to", "shipping name",
            "contact", "contact_name", "contactname",
            "account", "account name", "account_name", "acct name", "acct",
            "customer/job", "customer:job",
            "to", "customer/vendor",
            "cliente", "nombre cliente", "kunde", "kundenname",
            "nome cliente",
            "nom client",
            "klant", "klantnaam",
        ],
        required: true,
        data_type_hints: &[],
    },
    FieldDefinition {
        field: Field::CustomerEmail,
        patterns: &[
            "email", "e-mail", "e mail", "email address", "email_address", "emailaddress",
            "customer email", "customer_email", "customeremail", "cust email", "cust_email",
            "client email", "client_email", "clientemail",
            "contact email", "contact_email", "contactemail",
            "billing email", "billing_email", "bill to email", "invoice email",
            "primary email", "main email",
            "correo", "correo electrónico",
            "courriel", "adresse email",
        ],
        required: false,
        data_type_hints: &["@"],
    },
    FieldDefinition {
        field: Field::CustomerPhone,
        patterns: &[
            "phone", "phone number", "phone_number", "phonenumber", "phone no",
            "telephone", "tel", "tel.", "tel no", "telephone number",
            "mobile", "mobile number", "mobile_number", "mob", "cell", "cell phone", "cellphone",
            "customer phone", "customer_phone", "cust phone", "client phone", "client_phone",
            "contact", "contact number", "contact_number", "contact phone",
            "work phone", "business phone", "office phone", "office",
            "primary phone", "main phone",
            "fax", "fax number",
            "work",
            "teléfono", "telefono", "telefon",
            "téléphone",
        ],
        required: false,
        data_type_hints: &[],
    },
    FieldDefinition {
        field: Field::CustomerAddress,
        patterns: &[
            "address", "full address", "address_full", "fulladdress", "addr",
            "customer address", "customer_address", "cust address", "cust_address",
            "client address", "client_address",
            "billing address", "billing_address", "billingaddress", "bill address", "bill_address",
            "bill to address", "billto address", "invoice address",
            "street", "street address", "street_address", "streetaddress",
            "address line 1", "address1", "address_1", "addr1", "line 1",
            "address line", "address_line",
            "shipping address", "shipping_address", "ship address", "ship_address",
            "ship to address", "shipto address",
            "mailing address", "mailing_address", "postal address",
            "location", "business address", "company address",
            "bill to",
            "dirección", "direccion", "adresse", "anschrift",
            "indirizzo", "endereço",
        ],
        required: false,
        data_type_hints: &[],
    },
    FieldDefinition {
        field: Field::CustomerCompany,
        patterns: &[
            "company", "company name", "company_name", "companyname", "co name",
            "business name", "business", "business_name", "org name", "organization",
            "organisation", "firm", "firm name", "enterprise", "entity",
            "customer company", "customer_company", "client company", "client_company",
            "empresa", "sociedad", "firma", "unternehmen", "gesellschaft",
            "azienda", "société", "entreprise",
        ],
        required: false,
        data_type_hints: &[],
    },
    FieldDefinition {
        field: Field::CustomerCity,
        patterns: &[
            "city", "city name", "town", "municipality", "suburb",
            "customer city", "billing city", "bill city",
            "ciudad", "stadt", "città", "ville", "cidade",
        ],
        required: false,
        data_type_hints: &[],
    },
    FieldDefinition {
        field: Field::CustomerState,
        patterns: &[
            "state", "state/province", "province", "region", "county",
            "customer state", "billing state", "bill state",
            "estado", "bundesland", "provincia", "région",
        ],
        required: false,
        data_type_hints: &[],
    },
    FieldDefinition {
        field: Field::CustomerPostalCode,
        patterns: &[
            "postal code", "postalcode", "postal_code", "zip", "zip code", "zipcode", "zip_code",
            "postcode", "post code", "post_code", "pin", "pin code", "pincode",
            "customer postal code", "billing postal code", "billing zip",
            "código postal", "codigo postal", "plz", "postleitzahl", "cap", "cep", "code postal",
        ],
        required: false,
        data_type_hints: &[],
    },
    FieldDefinition {
        field: Field::CustomerCountry,
        patterns: &[
            "country", "country name", "nation", "customer country", "billing country",
            "país", "pais", "land", "paese", "pays",
        ],
        required: false,
        data_type_hints: &[],
    },
    FieldDefinition {
        field: Field::CustomerTaxId,
        patterns: &[
            "tax id", "tax_id", "taxid", "tax number", "tax no", "tax #",
            "vat", "vat number", "vat no", "vat #", "vat_number", "vatnumber",
            "vat id", "vat registration", "vat reg", "vat reg no",
            "gst", "gst number", "gst no", "gst #", "gst_number", "gstnumber",
            "gst registration", "gst reg", "gst reg no", "gstin", "gst in",
            "abn", "abn number", "australian business number",
            "ein", "ein number", "tin", "tin number", "fein", "federal ein",
            "taxpayer id", "taxpayer identification",
            "pan", "pan number", "pan no", "pan card",
            "customer tax id", "customer_tax_id", "client tax id", "client vat",
            "buyer tax id", "buyer vat", "buyer gst",
            "resale no",
            "nif", "cif", "rfc", "cnpj", "cpf",
            "ust-idnr", "steuernummer",
            "partita iva", "codice fiscale",
            "siret", "siren", "numéro tva",
        ],
        required: false,
        data_type_hints: &[],
    },
    FieldDefinition {
        field: Field::Description,
        patterns: &[
            "description", "desc", "desc.", "item description", "item_description",
            "line description", "line_description",
            "item", "item name", "item_name", "itemname",
            "product", "product name", "product_name", "productname", "prod name",
            "product description", "product_description",
            "service", "service name", "service_name", "service description", "service_description",
            "details", "line details", "particulars", "line particulars",
            "goods", "goods description", "goods_description", "goods name",
            "material", "material description", "material_description", "material name",
            "name", "line item", "lineitem", "line_item", "line item name",
            "work", "work description", "labor", "labour", "task", "task description",
            "memo", "line memo", "item memo",
            "sku", "sku description",
            "product/service", "service/product",
            "item details",
            "descripción", "descripcion", "beschreibung", "bezeichnung",
            "descrizione", "descrição",
        ],
        required: true,
        data_type_hints: &[],
    },
    FieldDefinition {
        field: Field::Quantity,
        patterns: &[
            "quantity", "qty", "qty.", "qnty", "quant", "quantity ordered", "quantity shipped",
            "quantity_ordered", "quantity_shipped", "ordered qty", "shipped qty",
            "units", "unit", "count", "cnt", "pcs", "pieces", "nos", "no of units",
            "no.", "no", "number", "num", "amount", "amt",
            "hours", "hrs", "hour", "time", "duration",
            "cantidad", "menge", "quantità", "quantité", "quantidade",
            "antal", "aantal",
        ],
        required: false,
        data_type_hints: &["numeric", "positive integer"],
    },
    FieldDefinition {
        field: Field::UnitPrice,
        patterns: &[
            "unit price", "unit_price", "unitprice", "price", "unit cost", "unit_cost",
            "price per unit", "price/unit", "cost per unit", "cost/unit",
            "rate", "unit rate", "unit_rate", "hourly rate", "hr rate", "rate/hr",
            "each", "per unit", "per each", "price each", "cost each",
            "single price", "item price", "item cost", "item_price", "product price",
            "service rate", "line rate",
            "sales price", "selling price", "sell price", "sale price",
            "unit amount",
            "precio", "precio unitario", "preis", "einzelpreis", "stückpreis",
            "prezzo", "prezzo unitario", "prix", "prix unitaire",
            "preço", "preço unitário",
        ],
        required: true,
        data_type_hints: &[],
    },
    FieldDefinition {
        field: Field::LineTotal,
        patterns: &[
            "total", "line total", "line_total", "linetotal", "item total", "item_total",
            "row total", "row_total", "total price", "total_price",
            "amount", "amt", "amt.", "line amount", "line_amount", "lineamount",
            "item amount", "item_amount", "row amount",
            "subtotal", "sub total", "sub_total", "sub-total", "line subtotal",
            "net", "net amount", "net_amount", "net total", "net value",
            "extended", "extended price", "extended_price", "extended amount", "ext price", "ext amt",
            "gross", "gross amount", "gross_amount", "gross total",
            "sum", "line sum",
            "importe", "monto", "betrag", "summe", "gesamt",
            "totale", "importo", "montant", "somme",
        ],
        required: false,
        data_type_hints: &[],
    },
    FieldDefinition {
        field: Field::TaxRate,
        patterns: &[
            "tax rate", "tax_rate", "taxrate", "tax %", "tax%", "tax percent", "tax percentage",
            "vat rate", "vat_rate", "vatrate", "vat %", "vat%", "vat percent",
            "gst rate", "gst_rate", "gstrate", "gst %", "gst%", "gst percent",
            "sales tax rate", "sales tax %", "sales_tax_rate",
            "tax class", "tax code", "tax_code", "taxcode", "tax type",
            "tasa impuesto", "iva %", "iva", "mwst", "mwst %", "mehrwertsteuer",
            "aliquota iva", "tva", "taux tva",
        ],
        required: false,
        data_type_hints: &[],
    },
    FieldDefinition {
        field: Field::TaxAmount,
        patterns: &[
            "tax amount", "tax_amount", "taxamount", "tax", "tax total", "tax value",
            "line tax", "line_tax", "item tax", "item_tax", "row tax",
            "vat amount", "vat_amount", "vatamount", "vat", "vat total",
            "gst amount", "gst_amount", "gstamount", "gst", "gst total",
            "sales tax", "sales_tax", "salestax", "sales tax amount",
            "tax due", "taxes", "tax charges",
            "impuesto", "iva", "mwst", "steuer",
            "imposta", "tasse", "taxe", "tva",
        ],
        required: false,
        data_type_hints: &[],
    },
    FieldDefinition {
        field: Field::Discount,
        patterns: &[
            "discount", "disc", "disc.", "discnt", "discount amount", "discount_amount",
            "discount %", "discount%", "discount percent", "discount percentage", "discount_percent",
            "line discount", "line_discount", "item discount", "item_discount", "row discount",
            "rebate", "rebate amount", "rebate %",
            "reduction", "price reduction", "markdown",
            "allowance", "allowances",
            "discount rate",
            "descuento", "rabatt", "rabat",
            "sconto", "remise", "desconto",
        ],
        required: false,
        data_type_hints: &[],
    },
    FieldDefinition {
        field: Field::Sku,
        patterns: &[
            "sku", "sku number", "sku_number", "skunumber", "sku no", "sku #", "sku code",
            "item code", "item_code", "itemcode", "item no", "item #", "item number",
            "product code", "product_code", "productcode", "prod code", "prod no", "prod #",
            "part number", "part_number", "partnumber", "part no", "part #", "p/n", "pn",
            "article", "article number", "article_number", "art no", "art #", "art. no",
            "model", "model number", "model_number", "model no", "model #",
            "catalog", "catalog number", "catalogue", "cat no", "cat #",
            "item ref", "product ref", "reference", "ref",
            "upc", "ean", "barcode", "gtin",
            "hsn", "hsn code", "hsn_code", "sac", "sac code", "sac_code", "hsn/sac",
            "code",
            "código", "codigo", "artikelnummer", "artikelnr",
            "codice", "código do produto", "référence",
        ],
        required: false,
        data_type_hints: &[],
    },
    FieldDefinition {
        field: Field::HsnCode,
        patterns: &[
            "hsn", "hsn code", "hsn_code", "hsn/sac", "hsn sac code", "hsn number", "hsn no",
            "sac", "sac code", "sac_code", "sac number",
            "harmonized code", "hs code", "hs_code", "tariff code", "commodity code",
        ],
        required: false,
        data_type_hints: &[],
    },
    FieldDefinition {
        field: Field::InvoiceSubtotal,
        patterns: &[
            "subtotal", "sub total", "sub_total", "sub-total",
            "net total", "net_total", "net amount", "net",
            "items total", "line items total", "amount before tax",
            "total before tax", "pretax total", "pre-tax total",
        ],
        required: false,
        data_type_hints: &[],
    },
    FieldDefinition {
        field: Field::InvoiceTax,
        patterns: &[
            "total tax", "total_tax", "tax total", "tax_total",
            "total vat", "vat total", "total gst", "gst total",
            "invoice tax", "taxes total", "tax due",
        ],
        required: false,
        data_type_hints: &[],
    },
    FieldDefinition {
        field: Field::InvoiceTotal,
        patterns: &[
            "grand total", "grand_total", "grandtotal",
            "invoice total", "invoice_total", "invoicetotal",
            "total amount", "total_amount", "totalamount",
            "total due", "total_due", "amount due", "amount_due",
            "balance due", "balance_due", "balance",
            "final total", "final_total", "final amount",
            "gross total", "gross_total", "gross amount",
            "amount payable", "payable amount", "payable",
            "total (usd)", "total (eur)", "total (gbp)", "total (inr)",
            "total incl tax", "total including tax", "total inc vat", "total inc gst",
        ],
        required: false,
        data_type_hints: &[],
    },
    FieldDefinition {
        field: Field::AmountPaid,
        patterns: &[
            "amount paid", "amount_paid", "amountpaid", "paid", "paid amount",
            "payment", "payment amount", "payments", "received", "amount received",
            "deposit", "deposits", "advance", "advance payment", "prepaid",
        ],
        required: false,
        data_type_hints: &[],
    },
    FieldDefinition {
        field: Field::Currency,
        patterns: &[
            "currency", "curr", "cur", "currency code", "currency_code", "currencycode",
            "ccy", "money", "payment currency",
            "moneda", "währung", "valuta", "devise", "moeda",
        ],
        required: false,
        data_type_hints: &["USD", "EUR", "GBP", "INR"],
    },
    FieldDefinition {
        field: Field::Status,
        patterns: &[
            "status", "invoice status", "invoice_status", "invoicestatus",
            "payment status", "payment_status", "paymentstatus",
            "state", "invoice state", "invoice_state",
            "paid status", "billing status", "order status",
            "paid", "unpaid", "overdue", "draft", "sent", "pending",
            "estado", "statut", "zustand",
        ],
        required: false,
        data_type_hints: &["paid", "unpaid", "overdue", "draft"],
    },
    FieldDefinition {
        field: Field::Notes,
        patterns: &[
            "notes", "note", "memo", "memos", "comments", "comment",
            "remarks", "remark", "additional notes", "additional_notes",
            "invoice notes", "invoice_notes", "message", "messages",
            "internal notes", "customer notes", "description notes",
            "notas", "notizen", "anmerkungen", "remarques",
        ],
        required: false,
        data_type_hints: &[],
    },
    FieldDefinition {
        field: Field::Terms,
        patterns: &[
            "terms", "payment terms", "payment_terms", "paymentterms",
            "terms and conditions", "conditions", "payment conditions",
            "net terms", "credit terms",
            "términos", "condiciones", "bedingungen", "zahlungsbedingungen",
            "termini", "condizioni", "conditions de paiement",
        ],
        required: false,
        data_type_hints: &[],
    },
    FieldDefinition {
        field: Field::PoNumber,
        patterns: &[
            "po number", "po_number", "ponumber", "po no", "po no.", "po #", "po",
            "p.o. number", "p.o. no", "p.o.", "p.o",
            "purchase order", "purchase order number", "purchase_order", "purchaseorder",
            "order number", "order no", "order #", "order", "order_number", "ordernumber",
            "customer po", "customer_po", "cust po", "client po", "your po",
            "customer order", "client order",
            "your ref", "your reference", "buyer ref", "buyer reference",
            "so number", "so no", "so #", "sales order", "sales_order",
            "reference", "customer ref",
            "pedido", "número pedido", "bestellung", "bestellnummer",
            "ordine", "numero ordine", "commande", "numéro commande",
        ],
        required: false,
        data_type_hints: &[],
    },
    FieldDefinition {
        field: Field::CustomerId,
        patterns: &[
            "customer id", "customer_id", "customerid", "cust id", "cust_id", "custid",
            "client id", "client_id", "clientid",
            "customer code", "customer_code", "cust code",
            "customer number", "customer_number", "cust no", "cust #",
            "account id", "account_id", "acct id", "account number", "acct no",
            "contact id", "contact_id",
        ],
        required: false,
        data_type_hints: &[],
    },
    FieldDefinition {
        field: Field::InvoiceId,
        patterns: &[
            "invoice id", "invoice_id", "invoiceid", "inv id", "inv_id", "invid",
            "document id", "doc id", "doc_id", "docid",
            "transaction id", "trans id", "trans_id", "transid", "txn id",
        ],
        required: false,
        data_type_hints: &[],
    },
    FieldDefinition {
        field: Field::LineItemId,
        patterns: &[
            "line id", "line_id", "lineid", "item id", "item_id", "itemid",
            "line number", "line_number", "line no", "line #",
            "row id", "row_id", "rowid", "row number", "row no", "row #",
            "detail id", "detail_id", "seq", "sequence", "seq no",
        ],
        required: false,
        data_type_hints: &[],
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_order_matches_enum() {
        for (i, def) in FIELD_DEFINITIONS.iter().enumerate() {
            assert_eq!(def.field as usize, i, "{} out of place", def.field);
            assert!(!def.patterns.is_empty(), "{} has no patterns", def.field);
        }
    }

    #[test]
    fn test_field_names_unique() {
        let names: HashSet<&str> = FIELD_DEFINITIONS.iter().map(|d| d.field.as_str()).collect();
        assert_eq!(names.len(), FIELD_DEFINITIONS.len());
    }

    #[test]
    fn test_required_fields() {
        assert_eq!(
            required_fields(),
            vec![
                Field::InvoiceNumber,
                Field::IssueDate,
                Field::CustomerName,
                Field::Description,
                Field::UnitPrice,
            ]
        );
        assert_eq!(
            optional_fields().len() + required_fields().len(),
            all_field_definitions().len()
        );
    }

    #[test]
    fn test_names_round_trip() {
        assert_eq!(Field::from_name("customerTaxId"), Some(Field::CustomerTaxId));
        assert_eq!(Field::from_name("INVOICENUMBER"), Some(Field::InvoiceNumber));
        assert_eq!(Field::from_name("nope"), None);
        assert_eq!(
            serde_json::to_string(&Field::PoNumber).unwrap(),
            "\"poNumber\""
        );
    }

    #[test]
    fn test_date_fields() {
        assert!(Field::IssueDate.is_date());
        assert!(Field::DueDate.is_date());
        assert!(!Field::Description.is_date());
        assert!(!Field::InvoiceId.is_date());
    }
}
