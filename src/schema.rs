//! The field and column tables, and the transformer that joins them.
//!
//! Everything the pipeline knows about invoices lives here as data:
//!
//! * [`SOURCE_FIELDS`]: the eleven keys the model is asked to return, in
//!   prompt order.
//! * [`FIELD_RENAMES`]: the source keys that get a new name before
//!   projection.
//! * [`OUTPUT_SCHEMA`]: every output column, in order, with where its value
//!   comes from.
//!
//! [`transform_record`] applies the renames and then the projection. It only
//! reads and copies, so it cannot fail, and running it again on the same
//! records yields the same table.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// The fields requested from the model, in the order the prompt lists them.
pub const SOURCE_FIELDS: [&str; 11] = [
    "Buyer's Order No.",
    "Quantity",
    "Rate",
    "Basic amount without tax",
    "IGST",
    "Total Amount",
    "InvoiceNo",
    "Ack Date",
    "GSTIN Number",
    "TML GSTIN",
    "IRN",
];

/// Source key → renamed key. Applied only when the source key is present.
pub const FIELD_RENAMES: [(&str, &str); 7] = [
    ("Buyer's Order No.", "PoNumber"),
    ("InvoiceNo", "Vendor Challan No"),
    ("Ack Date", "Challan Date"),
    ("Basic amount without tax", "Basic value"),
    ("IGST", "IGST VALUE"),
    ("Total Amount", "INVOICE VALUE"),
    ("Rate", "Gross Rate"),
];

/// Fixed value of the `Currency` column.
pub const CURRENCY: &str = "INR";

/// Where an output column takes its value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnSource {
    /// Copy the (renamed) record field; a missing field yields `""`.
    Field(&'static str),
    /// Always this literal.
    Constant(&'static str),
    /// Always the empty string.
    Empty,
}

use ColumnSource::{Constant, Empty, Field};

/// The output table layout: column name and value source, in column order.
pub const OUTPUT_SCHEMA: [(&str, ColumnSource); 34] = [
    ("PO NUMBER", Field("PoNumber")),
    ("PO Item No", Empty),
    ("Quantity", Field("Quantity")),
    ("VENDOR CHALLAN NO", Field("Vendor Challan No")),
    ("Challan Date", Field("Challan Date")),
    ("Gross Rate", Field("Gross Rate")),
    ("Net P O Rate", Field("Gross Rate")),
    ("Basic Value", Field("Basic value")),
    ("Taxable Value", Field("Basic value")),
    ("SGST VALUE", Empty),
    ("CGST VALUE", Empty),
    ("IGST VALUE", Field("IGST VALUE")),
    ("SGST RATE", Empty),
    ("CGST RATE", Empty),
    ("IGST RATE", Empty),
    ("Packing Amount", Empty),
    ("Freight Amount", Empty),
    ("Others Amount", Empty),
    ("INVOICE VALUE", Field("INVOICE VALUE")),
    ("Currency", Constant(CURRENCY)),
    ("E Way Bill", Empty),
    ("57F4 NUMBER", Empty),
    ("57F4 NO DATE", Empty),
    ("GSTIN Number", Field("GSTIN Number")),
    ("Vehicle Number", Empty),
    ("PART REV Level", Empty),
    ("COP Certificate", Empty),
    ("Certificate Date", Empty),
    ("TML GSTIN", Field("TML GSTIN")),
    ("Digital Invoice File Name", Empty),
    ("IRN", Field("IRN")),
    ("TCS Value", Empty),
    ("Field4", Empty),
    ("Field5", Empty),
];

/// Number of output columns.
pub const COLUMN_COUNT: usize = OUTPUT_SCHEMA.len();

/// Output column names in order.
pub fn output_columns() -> impl Iterator<Item = &'static str> {
    OUTPUT_SCHEMA.iter().map(|(name, _)| *name)
}

// ── FieldRecord ──────────────────────────────────────────────────────────

/// The fields the model returned for one document.
///
/// Keys are whatever the model sent: requested keys may be missing and
/// unexpected keys are kept. Values are stored exactly as parsed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldRecord(Map<String, Value>);

impl FieldRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The field rendered as a table cell, or `None` when the key is absent.
    pub fn text(&self, key: &str) -> Option<String> {
        self.0.get(key).map(cell_text)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Requested fields the model left out entirely.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        SOURCE_FIELDS
            .iter()
            .copied()
            .filter(|f| !self.0.contains_key(*f))
            .collect()
    }
}

/// Render a JSON value as a table cell.
///
/// Strings are copied verbatim; numbers and booleans use their JSON text;
/// `null` is empty; arrays and objects are compact JSON.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

// ── OutputRow ────────────────────────────────────────────────────────────

/// One row of the output table: exactly [`COLUMN_COUNT`] string cells in
/// [`OUTPUT_SCHEMA`] order.
///
/// Serialises as a JSON object whose keys follow column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRow {
    cells: [String; COLUMN_COUNT],
}

impl OutputRow {
    /// Look up a cell by column name.
    pub fn get(&self, column: &str) -> Option<&str> {
        OUTPUT_SCHEMA
            .iter()
            .position(|(name, _)| *name == column)
            .map(|i| self.cells[i].as_str())
    }

    pub fn cells(&self) -> &[String] {
        &self.cells
    }

    /// `(column, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        output_columns().zip(self.cells.iter().map(String::as_str))
    }
}

impl Serialize for OutputRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(COLUMN_COUNT))?;
        for (column, value) in self.iter() {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

// ── Transformer ──────────────────────────────────────────────────────────

/// Apply [`FIELD_RENAMES`] to a record. Keys without a rename pass through.
pub fn rename_fields(record: &FieldRecord) -> FieldRecord {
    let mut renamed = record.0.clone();
    for (from, to) in FIELD_RENAMES {
        if let Some(value) = renamed.remove(from) {
            renamed.insert(to.to_string(), value);
        }
    }
    FieldRecord(renamed)
}

/// Project one record onto the output schema.
pub fn transform_record(record: &FieldRecord) -> OutputRow {
    let renamed = rename_fields(record);
    let cells = OUTPUT_SCHEMA.map(|(_, source)| match source {
        Field(key) => renamed.text(key).unwrap_or_default(),
        Constant(value) => value.to_string(),
        Empty => String::new(),
    });
    OutputRow { cells }
}

/// Project a batch table onto the output schema, preserving row order.
pub fn transform_records(records: &[FieldRecord]) -> Vec<OutputRow> {
    records.iter().map(transform_record).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(v: Value) -> FieldRecord {
        match v {
            Value::Object(map) => FieldRecord::new(map),
            _ => panic!("fixture must be an object"),
        }
    }

    fn full_record() -> FieldRecord {
        record(json!({
            "Buyer's Order No.": "4500012345",
            "Quantity": 5,
            "Rate": 1200,
            "Basic amount without tax": "6000.00",
            "IGST": "1080.00",
            "Total Amount": "7080.00",
            "InvoiceNo": "SW/25-26/2513",
            "Ack Date": "12-Apr-25",
            "GSTIN Number": "27AAACS1234A1Z5",
            "TML GSTIN": "27AAACT2727Q1ZW",
            "IRN": "a1b2c3"
        }))
    }

    #[test]
    fn schema_has_exact_column_list() {
        let columns: Vec<&str> = output_columns().collect();
        assert_eq!(
            columns,
            vec![
                "PO NUMBER",
                "PO Item No",
                "Quantity",
                "VENDOR CHALLAN NO",
                "Challan Date",
                "Gross Rate",
                "Net P O Rate",
                "Basic Value",
                "Taxable Value",
                "SGST VALUE",
                "CGST VALUE",
                "IGST VALUE",
                "SGST RATE",
                "CGST RATE",
                "IGST RATE",
                "Packing Amount",
                "Freight Amount",
                "Others Amount",
                "INVOICE VALUE",
                "Currency",
                "E Way Bill",
                "57F4 NUMBER",
                "57F4 NO DATE",
                "GSTIN Number",
                "Vehicle Number",
                "PART REV Level",
                "COP Certificate",
                "Certificate Date",
                "TML GSTIN",
                "Digital Invoice File Name",
                "IRN",
                "TCS Value",
                "Field4",
                "Field5",
            ]
        );
    }

    #[test]
    fn column_names_are_unique() {
        let mut names: Vec<&str> = output_columns().collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), COLUMN_COUNT);
    }

    #[test]
    fn every_field_source_is_reachable_from_a_source_field() {
        // A Field(...) source must be either a source field or a rename target.
        for (column, source) in OUTPUT_SCHEMA {
            if let Field(key) = source {
                let known = SOURCE_FIELDS.contains(&key)
                    || FIELD_RENAMES.iter().any(|(_, to)| *to == key);
                assert!(known, "column {column} reads unknown key {key}");
            }
        }
    }

    #[test]
    fn renames_apply_only_to_present_keys() {
        let r = record(json!({ "Rate": 10, "Unrelated": "x" }));
        let renamed = rename_fields(&r);
        assert!(renamed.contains("Gross Rate"));
        assert!(!renamed.contains("Rate"));
        assert!(renamed.contains("Unrelated"));
        assert!(!renamed.contains("PoNumber"));
    }

    #[test]
    fn full_record_populates_sourced_columns() {
        let row = transform_record(&full_record());
        assert_eq!(row.get("PO NUMBER"), Some("4500012345"));
        assert_eq!(row.get("Quantity"), Some("5"));
        assert_eq!(row.get("VENDOR CHALLAN NO"), Some("SW/25-26/2513"));
        assert_eq!(row.get("Challan Date"), Some("12-Apr-25"));
        assert_eq!(row.get("Gross Rate"), Some("1200"));
        assert_eq!(row.get("Net P O Rate"), Some("1200"));
        assert_eq!(row.get("Basic Value"), Some("6000.00"));
        assert_eq!(row.get("Taxable Value"), Some("6000.00"));
        assert_eq!(row.get("IGST VALUE"), Some("1080.00"));
        assert_eq!(row.get("INVOICE VALUE"), Some("7080.00"));
        assert_eq!(row.get("GSTIN Number"), Some("27AAACS1234A1Z5"));
        assert_eq!(row.get("TML GSTIN"), Some("27AAACT2727Q1ZW"));
        assert_eq!(row.get("IRN"), Some("a1b2c3"));
        assert_eq!(row.get("Currency"), Some("INR"));
        assert_eq!(row.get("SGST VALUE"), Some(""));
        assert_eq!(row.get("Field5"), Some(""));
    }

    #[test]
    fn missing_keys_become_empty_strings() {
        let row = transform_record(&FieldRecord::default());
        assert_eq!(row.cells().len(), COLUMN_COUNT);
        for (column, value) in row.iter() {
            if column == "Currency" {
                assert_eq!(value, "INR");
            } else {
                assert_eq!(value, "", "column {column} should be empty");
            }
        }
    }

    #[test]
    fn transform_is_idempotent() {
        let records = vec![full_record(), FieldRecord::default()];
        let first = transform_records(&records);
        let second = transform_records(&records);
        assert_eq!(first, second);
    }

    #[test]
    fn values_are_not_coerced() {
        let r = record(json!({ "Quantity": "5 Nos", "Rate": "N/A", "IRN": null }));
        let row = transform_record(&r);
        assert_eq!(row.get("Quantity"), Some("5 Nos"));
        assert_eq!(row.get("Gross Rate"), Some("N/A"));
        assert_eq!(row.get("IRN"), Some(""));
    }

    #[test]
    fn cell_text_renders_each_json_kind() {
        assert_eq!(cell_text(&json!("x")), "x");
        assert_eq!(cell_text(&json!(42)), "42");
        assert_eq!(cell_text(&json!(1.5)), "1.5");
        assert_eq!(cell_text(&json!(true)), "true");
        assert_eq!(cell_text(&Value::Null), "");
        assert_eq!(cell_text(&json!([1, 2])), "[1,2]");
    }

    #[test]
    fn row_serialises_in_column_order() {
        let row = transform_record(&full_record());
        let text = serde_json::to_string(&row).unwrap();
        let po = text.find("\"PO NUMBER\"").unwrap();
        let currency = text.find("\"Currency\"").unwrap();
        let field5 = text.find("\"Field5\"").unwrap();
        assert!(po < currency && currency < field5);

        let v: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v.as_object().unwrap().len(), COLUMN_COUNT);
    }

    #[test]
    fn missing_fields_lists_absent_requested_keys() {
        let r = record(json!({ "IRN": "x", "Quantity": 1 }));
        let missing = r.missing_fields();
        assert_eq!(missing.len(), 9);
        assert!(!missing.contains(&"IRN"));
        assert!(missing.contains(&"TML GSTIN"));
    }
}
