//! Shared fixtures: a scripted completion client and generated invoice PDFs.

#![allow(dead_code)]

use invoice_extract::{Completion, CompletionClient, DocumentError, RawDocument};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Route library logs to the test harness; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ── MockClient ───────────────────────────────────────────────────────────────

/// Completion client that replays canned responses in call order.
///
/// Once the script runs out every call fails with a completion error.
pub struct MockClient {
    responses: Mutex<VecDeque<Result<Completion, DocumentError>>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl MockClient {
    pub fn new(responses: Vec<Result<Completion, DocumentError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// A client that answers each call with the next string.
    pub fn replying<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            replies
                .into_iter()
                .map(|r| Ok(Completion::text(r)))
                .collect(),
        )
    }

    /// A client whose every call fails upstream.
    pub fn failing(times: usize) -> Self {
        Self::new(
            (0..times)
                .map(|_| {
                    Err(DocumentError::Completion {
                        name: String::new(),
                        detail: "503 Service Unavailable".into(),
                    })
                })
                .collect(),
        )
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl CompletionClient for MockClient {
    async fn complete(
        &self,
        _system_prompt: &str,
        prompt: &str,
    ) -> Result<Completion, DocumentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(DocumentError::Completion {
                    name: String::new(),
                    detail: "no scripted response left".into(),
                })
            })
    }
}

// ── Canned model answers ─────────────────────────────────────────────────────

pub fn fenced_answer(invoice_no: &str) -> String {
    format!(
        "Here is the extracted data:\n```json\n{{\n  \"Buyer's Order No.\": \"PO-7781\",\n  \
         \"Quantity\": \"5\",\n  \"Rate\": \"1200\",\n  \"Basic amount without tax\": \"6000\",\n  \
         \"IGST\": \"1080\",\n  \"Total Amount\": \"7080\",\n  \"InvoiceNo\": \"{invoice_no}\",\n  \
         \"Ack Date\": \"12-04-2025\",\n  \"GSTIN Number\": \"27AAACT2727Q1ZW\",\n  \
         \"TML GSTIN\": \"27AAACT2727Q1ZV\",\n  \"IRN\": \"a1b2c3\"\n}}\n```"
    )
}

pub fn bare_answer(invoice_no: &str) -> String {
    format!(r#"{{"InvoiceNo": "{invoice_no}", "Quantity": "2", "Total Amount": "118.00"}}"#)
}

pub const PROSE_ANSWER: &str = "I could not find any invoice details in this document.";

// ── PDF fixtures ─────────────────────────────────────────────────────────────

/// A one-page PDF whose page shows `line` in Courier.
pub fn invoice_pdf(line: &str) -> Vec<u8> {
    multi_page_pdf(&[line])
}

/// A PDF with one page per entry; an empty entry gives a page with no text.
pub fn multi_page_pdf(lines: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(lines.len());
    for line in lines {
        let operations = if line.is_empty() {
            Vec::new()
        } else {
            vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*line)]),
                Operation::new("ET", vec![]),
            ]
        };
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode content stream"),
        ));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("serialise fixture PDF");
    bytes
}

/// An uploaded PDF named `name` whose text is `line`.
pub fn pdf_document(name: &str, line: &str) -> RawDocument {
    RawDocument::new(name, invoice_pdf(line)).with_content_type("application/pdf")
}

/// `count` valid PDF documents named `invoice-N.pdf`.
pub fn pdf_documents(count: usize) -> Vec<RawDocument> {
    (1..=count)
        .map(|i| pdf_document(&format!("invoice-{i}.pdf"), &format!("Invoice No INV-{i:03}")))
        .collect()
}
