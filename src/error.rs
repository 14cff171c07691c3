//! Error types for the invoice-extract library.
//!
//! Two error types mirror the two scopes a failure can have:
//!
//! * [`ExtractError`] is **fatal** for the whole call: the batch is rejected
//!   (too many files), produced nothing, or could not even start (missing API
//!   key, unreadable input path).
//!
//! * [`DocumentError`] is **scoped to one document**: its PDF was unreadable,
//!   the completion call failed, or the model answered with something that is
//!   not a JSON object. It is stored on the document's
//!   [`crate::output::DocumentResult`] and the batch moves on.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the invoice-extract library.
///
/// Per-document failures use [`DocumentError`] and are stored in
/// [`crate::output::DocumentResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Batch errors ──────────────────────────────────────────────────────
    /// More documents were supplied than a single batch may hold.
    #[error("You can only upload a maximum of {max} files at a time (got {count}).")]
    BatchLimitExceeded { count: usize, max: usize },

    /// The batch was empty.
    #[error("No files were provided.")]
    NoDocuments,

    /// Every document in the batch failed; there is nothing to tabulate.
    #[error("No data could be extracted from the provided files ({total} attempted).\nFirst error: {first_error}")]
    EmptyResult {
        total: usize,
        first_error: String,
        /// True when at least one document failed because the model's answer
        /// was not a JSON object. False means every document failed reading
        /// its PDF or calling the completion service.
        any_parse_failure: bool,
    },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Config errors ─────────────────────────────────────────────────────
    /// The completion-service credential is not set.
    #[error("{var} is not set.\nExport it or add it to a .env file: {var}=sk-...")]
    MissingApiKey { var: &'static str },

    /// The configured provider could not be created.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Output errors ─────────────────────────────────────────────────────
    /// CSV serialisation failed.
    #[error("Failed to serialise CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Service errors ────────────────────────────────────────────────────
    /// The HTTP listener could not be bound or stopped with an I/O error.
    #[error("HTTP server failed on {addr}: {source}")]
    ServerFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single document.
///
/// The variants are the three ways one document can fail; each carries the
/// document's display name so reports stay attributable.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DocumentError {
    /// The bytes could not be read as a PDF.
    #[error("Error processing PDF '{name}': {detail}")]
    Extraction { name: String, detail: String },

    /// The completion service call failed (network, auth, rate limit).
    #[error("Error calling the completion service for '{name}': {detail}")]
    Completion { name: String, detail: String },

    /// The model answered, but not with a JSON object.
    #[error("Error parsing data for '{name}': {detail}")]
    Parse {
        name: String,
        detail: String,
        raw: String,
    },
}

impl DocumentError {
    /// Display name of the document the error belongs to.
    pub fn document_name(&self) -> &str {
        match self {
            DocumentError::Extraction { name, .. }
            | DocumentError::Completion { name, .. }
            | DocumentError::Parse { name, .. } => name,
        }
    }

    /// The raw model output, when the failure happened after the model answered.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            DocumentError::Parse { raw, .. } => Some(raw),
            _ => None,
        }
    }

    pub fn is_completion(&self) -> bool {
        matches!(self, DocumentError::Completion { .. })
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, DocumentError::Parse { .. })
    }

    /// Attach a document name to an error produced before the name was known.
    pub(crate) fn with_name(self, doc: &str) -> Self {
        match self {
            DocumentError::Extraction { detail, .. } => DocumentError::Extraction {
                name: doc.to_string(),
                detail,
            },
            DocumentError::Completion { detail, .. } => DocumentError::Completion {
                name: doc.to_string(),
                detail,
            },
            DocumentError::Parse { detail, raw, .. } => DocumentError::Parse {
                name: doc.to_string(),
                detail,
                raw,
            },
        }
    }
}
