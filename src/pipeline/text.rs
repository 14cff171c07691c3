//! PDF text extraction via `pdf-extract`.
//!
//! Parsing happens on the blocking pool: `pdf-extract` is synchronous and
//! CPU-bound, and it can panic on malformed content streams. Running it in
//! `spawn_blocking` keeps the async workers free and turns a panic into a
//! `JoinError` we can report against the document.

use super::input::RawDocument;
use crate::error::DocumentError;
use tracing::debug;

/// First bytes of every PDF file.
const PDF_MAGIC: &[u8] = b"%PDF";

/// Extract the text of every page, concatenated in page order.
///
/// Pages are joined without a separator; a page without extractable text
/// contributes an empty string. The document's bytes are moved into the
/// blocking task and released when it returns.
pub async fn extract_text(doc: RawDocument) -> Result<String, DocumentError> {
    let name = doc.name;
    let bytes = doc.bytes;

    let task_name = name.clone();
    tokio::task::spawn_blocking(move || extract_text_blocking(&task_name, &bytes))
        .await
        .map_err(|e| DocumentError::Extraction {
            name: name.clone(),
            detail: format!("PDF parser aborted: {e}"),
        })?
}

/// Blocking implementation of text extraction.
pub fn extract_text_blocking(name: &str, bytes: &[u8]) -> Result<String, DocumentError> {
    if !bytes.starts_with(PDF_MAGIC) {
        let magic: Vec<u8> = bytes.iter().take(4).copied().collect();
        return Err(DocumentError::Extraction {
            name: name.to_string(),
            detail: format!("not a PDF (first bytes: {magic:?})"),
        });
    }

    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes).map_err(|e| {
        DocumentError::Extraction {
            name: name.to_string(),
            detail: e.to_string(),
        }
    })?;

    debug!("{}: extracted text from {} pages", name, pages.len());
    Ok(pages.concat())
}
