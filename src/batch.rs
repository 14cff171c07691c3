//! Batch orchestration: run every document through the pipeline, in order.
//!
//! Documents are processed strictly one after another. Each one goes
//! text → prompt → completion → parse and ends as a [`DocumentResult`];
//! a failure is recorded on that result and the loop moves to the next
//! document. Only two things fail the whole batch: too many documents
//! (checked before anything is read) and a batch where nothing succeeded.

use crate::config::{ExtractionConfig, MAX_DOCUMENTS};
use crate::error::{DocumentError, ExtractError};
use crate::output::{BatchOutput, BatchStats, DocumentResult};
use crate::pipeline::input::{self, RawDocument};
use crate::pipeline::llm::{Completion, CompletionClient, LlmCompletionClient};
use crate::pipeline::{parse, text};
use crate::prompts::build_extraction_prompt;
use crate::schema::{transform_records, FieldRecord};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Reject a batch that is empty or larger than [`MAX_DOCUMENTS`].
pub fn check_batch_size(count: usize) -> Result<(), ExtractError> {
    if count > MAX_DOCUMENTS {
        return Err(ExtractError::BatchLimitExceeded {
            count,
            max: MAX_DOCUMENTS,
        });
    }
    if count == 0 {
        return Err(ExtractError::NoDocuments);
    }
    Ok(())
}

/// Extract fields from in-memory documents.
///
/// # Returns
/// `Ok(BatchOutput)` when at least one document produced a record; failed
/// documents are listed in `output.documents` with their error.
///
/// # Errors
/// - [`ExtractError::BatchLimitExceeded`] for more than ten documents; no
///   document is read and the client is never called
/// - [`ExtractError::NoDocuments`] for an empty batch
/// - [`ExtractError::EmptyResult`] when every document failed
pub async fn extract_batch<C: CompletionClient>(
    client: &C,
    documents: Vec<RawDocument>,
    config: &ExtractionConfig,
) -> Result<BatchOutput, ExtractError> {
    let batch_start = Instant::now();
    check_batch_size(documents.len())?;

    let total = documents.len();
    info!("Starting batch of {} documents", total);
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let mut results = Vec::with_capacity(total);
    for (i, doc) in documents.into_iter().enumerate() {
        let index = i + 1;
        if let Some(ref cb) = config.progress_callback {
            cb.on_document_start(index, total, &doc.name);
        }

        let result = process_document(client, index, doc, config).await;

        match &result.outcome {
            Ok(record) => {
                let missing = record.missing_fields();
                if !missing.is_empty() {
                    debug!("{}: model omitted {:?}", result.name, missing);
                }
                if let Some(ref cb) = config.progress_callback {
                    cb.on_document_complete(index, total, &result.name, missing.len());
                }
            }
            Err(e) => {
                warn!("Document {}/{} skipped: {}", index, total, e);
                if let Some(raw) = e.raw_response() {
                    debug!("{}: raw model response: {}", result.name, raw);
                }
                if let Some(ref cb) = config.progress_callback {
                    cb.on_document_error(index, total, e);
                }
            }
        }

        results.push(result);
    }

    let succeeded = results.iter().filter(|r| r.is_success()).count();
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total, succeeded);
    }

    if succeeded == 0 {
        let first_error = results
            .iter()
            .find_map(DocumentResult::error)
            .map(|e| e.to_string())
            .unwrap_or_else(|| "Unknown error".to_string());
        let any_parse_failure = results
            .iter()
            .any(|r| r.error().is_some_and(DocumentError::is_parse));

        return Err(ExtractError::EmptyResult {
            total,
            first_error,
            any_parse_failure,
        });
    }

    let records: Vec<FieldRecord> = results
        .iter()
        .filter_map(|r| r.record().cloned())
        .collect();
    let rows = transform_records(&records);

    let stats = BatchStats {
        total_documents: total,
        succeeded,
        failed: total - succeeded,
        total_prompt_tokens: results.iter().map(|r| r.prompt_tokens as u64).sum(),
        total_completion_tokens: results.iter().map(|r| r.completion_tokens as u64).sum(),
        total_duration_ms: batch_start.elapsed().as_millis() as u64,
    };

    info!(
        "Batch complete: {}/{} documents, {}ms total",
        succeeded, total, stats.total_duration_ms
    );

    Ok(BatchOutput {
        documents: results,
        rows,
        stats,
    })
}

/// Resolve paths/URLs, build the configured client, and run the batch.
///
/// The batch size is checked before any input is opened and before the
/// client is created.
pub async fn extract_files(
    inputs: &[String],
    config: &ExtractionConfig,
) -> Result<BatchOutput, ExtractError> {
    check_batch_size(inputs.len())?;
    let client = LlmCompletionClient::from_config(config)?;
    let documents = input::resolve_inputs(inputs, config.download_timeout_secs).await?;
    extract_batch(&client, documents, config).await
}

/// Run one document through text extraction, completion and parsing.
///
/// Always returns a `DocumentResult`; the error, if any, is stored on it.
pub async fn process_document<C: CompletionClient>(
    client: &C,
    index: usize,
    doc: RawDocument,
    config: &ExtractionConfig,
) -> DocumentResult {
    let start = Instant::now();
    let name = doc.name.clone();

    let (outcome, completion) = run_document(client, doc, config).await;

    DocumentResult {
        index,
        outcome,
        raw_response: completion.as_ref().map(|c| c.content.clone()),
        prompt_tokens: completion.as_ref().map_or(0, |c| c.prompt_tokens),
        completion_tokens: completion.as_ref().map_or(0, |c| c.completion_tokens),
        duration_ms: start.elapsed().as_millis() as u64,
        name,
    }
}

async fn run_document<C: CompletionClient>(
    client: &C,
    doc: RawDocument,
    config: &ExtractionConfig,
) -> (Result<FieldRecord, DocumentError>, Option<Completion>) {
    let name = doc.name.clone();

    let text = match text::extract_text(doc).await {
        Ok(text) => text,
        Err(e) => return (Err(e), None),
    };
    debug!("{}: {} characters of text", name, text.len());

    let prompt = build_extraction_prompt(&text);
    let completion = match client.complete(config.system_prompt(), &prompt).await {
        Ok(completion) => completion,
        Err(e) => return (Err(e.with_name(&name)), None),
    };

    let outcome = parse::parse_field_record(&name, &completion.content);
    (outcome, Some(completion))
}
