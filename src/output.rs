//! Result types produced by a batch extraction.

use crate::error::DocumentError;
use crate::schema::{FieldRecord, OutputRow};
use serde::Serialize;

/// What happened to one document of the batch.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentResult {
    /// 1-indexed position in the batch (upload order).
    pub index: usize,
    /// Display name of the document.
    pub name: String,
    /// The parsed record, or why there is none.
    pub outcome: Result<FieldRecord, DocumentError>,
    /// Raw model output, when the model was reached.
    pub raw_response: Option<String>,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub duration_ms: u64,
}

impl DocumentResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn record(&self) -> Option<&FieldRecord> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&DocumentError> {
        self.outcome.as_ref().err()
    }
}

/// Aggregate numbers for one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    pub total_documents: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub total_prompt_tokens: u64,
    pub total_completion_tokens: u64,
    pub total_duration_ms: u64,
}

/// Everything a successful batch produced.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutput {
    /// One entry per input document, in upload order.
    pub documents: Vec<DocumentResult>,
    /// One output row per successful document, in upload order.
    pub rows: Vec<OutputRow>,
    pub stats: BatchStats,
}

impl BatchOutput {
    /// The batch table: successful records in upload order.
    pub fn records(&self) -> impl Iterator<Item = &FieldRecord> {
        self.documents.iter().filter_map(DocumentResult::record)
    }

    /// Documents that failed, in upload order.
    pub fn failures(&self) -> impl Iterator<Item = &DocumentError> {
        self.documents.iter().filter_map(DocumentResult::error)
    }
}
