//! Per-document pipeline stages.
//!
//! Each submodule implements exactly one step; the batch orchestrator in
//! [`crate::batch`] strings them together for every document.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ text ──▶ (prompt) ──▶ llm ──▶ parse
//! (path/URL) (pdf)               (chat)   (fence + JSON)
//! ```
//!
//! 1. [`input`]: turn a path or URL into a [`input::RawDocument`]
//! 2. [`text`]: concatenate the text of every page; runs in
//!    `spawn_blocking` because PDF parsing is CPU-bound
//! 3. [`llm`]: one chat completion per document; the only stage with
//!    network I/O besides URL download
//! 4. [`parse`]: strip an optional ```` ```json ```` fence and read the
//!    payload as a JSON object

pub mod input;
pub mod llm;
pub mod parse;
pub mod text;
