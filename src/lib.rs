//! # invoice-extract
//!
//! Pull structured fields out of invoice PDFs with a chat-completion model
//! and lay them out as a fixed 34-column table.
//!
//! Each PDF's text is extracted, embedded in an extraction prompt, and sent
//! to the model, which answers with a JSON object of invoice fields. The
//! objects from one batch are renamed and projected onto the output schema
//! and exported as CSV, JSON or an HTTP response.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDFs (1..=10)
//!  │
//!  ├─ 1. Input    resolve local files / URLs, or take uploaded bytes
//!  ├─ 2. Text     concatenate page text via pdf-extract (spawn_blocking)
//!  ├─ 3. Prompt   field list + guidelines + document text
//!  ├─ 4. LLM      one chat completion per document, in upload order
//!  ├─ 5. Parse    strip ```json fence, read a JSON object
//!  ├─ 6. Schema   rename keys, project onto the 34 output columns
//!  └─ 7. Export   CSV file / JSON / terminal table / HTTP JSON
//! ```
//!
//! A document that fails at steps 2–5 is skipped; the batch fails only when
//! it holds more than ten documents or when no document yields data.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use invoice_extract::{extract_files, write_csv, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads OPENAI_API_KEY from the environment.
//!     let config = ExtractionConfig::default();
//!     let inputs = vec!["invoice-1.pdf".to_string(), "invoice-2.pdf".to_string()];
//!     let output = extract_files(&inputs, &config).await?;
//!     write_csv("extracted_data.csv", &output.rows).await?;
//!     eprintln!("{}/{} documents extracted",
//!         output.stats.succeeded, output.stats.total_documents);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `cli`    | on      | Enables the `invoice-extract` binary (clap + anyhow + indicatif + tracing-subscriber) |
//! | `server` | on      | Enables [`server`] (axum + tower-http) and the `serve` subcommand |
//!
//! Library-only users can opt out of both:
//! ```toml
//! invoice-extract = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod config;
pub mod error;
pub mod export;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod schema;
#[cfg(feature = "server")]
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{extract_batch, extract_files};
pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use error::{DocumentError, ExtractError};
pub use export::{render_table, to_csv, to_json, write_csv};
pub use output::{BatchOutput, BatchStats, DocumentResult};
pub use pipeline::input::RawDocument;
pub use pipeline::llm::{Completion, CompletionClient, LlmCompletionClient};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use schema::{FieldRecord, OutputRow};
