//! Prompts for invoice field extraction.
//!
//! The field list is rendered from [`crate::schema::SOURCE_FIELDS`], so the
//! prompt and the transformer can never disagree about which keys exist.
//! Callers can override the system prompt via
//! [`crate::config::ExtractionConfig::system_prompt`]; the user prompt is
//! always built here.

use crate::schema::SOURCE_FIELDS;
use std::fmt::Write as _;

/// Default system prompt sent with every extraction request.
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant designed to extract information from documents and return it as a single JSON object. The keys in the JSON should be exactly as requested in the prompt.";

/// Value the model must use for a field it cannot find.
pub const MISSING_VALUE: &str = "N/A";

const PROMPT_HEADER: &str = r#"You are an expert data extractor. From the following invoice text, extract the specified fields and return the data in a clean JSON format.
If a field is not present, its value should be "N/A".

The JSON keys should be exactly as specified in the "Fields to Extract" list.
"#;

const EXTRACTION_GUIDELINES: &str = r#"**Extraction Guidelines:**
- "Quantity", "Rate", "Basic amount without tax", and "Total Amount" are usually found within the table describing the goods.
- For "Quantity" and "Rate", extract only the integer value. For example, if the quantity is "5 Nos", the value should be 5.
- For "InvoiceNo", look for a label like "Invoice No.". The value can be alphanumeric with slashes, like "SW/25-26/2513".
- For "Ack Date", look for a label like "Dated" or "Ack Date".
- For "IGST", find the value for IGST tax. It might be under a description of taxes.
- For "GSTIN Number", this is the GSTIN of the seller issuing the invoice.
- For "TML GSTIN", this is the GSTIN for the "Buyer" or "Bill to" party.
- For "Buyer's Order No." and "IRN", copy the value exactly as printed.
"#;

/// Build the user prompt for one document's text.
///
/// Deterministic: the same text always yields the same prompt.
pub fn build_extraction_prompt(text: &str) -> String {
    let mut fields_list = String::new();
    for field in SOURCE_FIELDS {
        // Writing to a String cannot fail.
        let _ = writeln!(fields_list, "- \"{field}\"");
    }

    format!(
        "{PROMPT_HEADER}\n**Fields to Extract:**\n{fields_list}\n{EXTRACTION_GUIDELINES}\n**Invoice Text:**\n---\n{text}\n---\n"
    )
}
