//! Progress-callback trait for per-document batch events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! events as the orchestrator works through the batch. The CLI uses it to
//! drive a progress bar and to print each failing document's raw model
//! output as soon as it happens.
//!
//! # Example
//!
//! ```rust
//! use invoice_extract::{BatchProgressCallback, DocumentError, ExtractionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct FailureCounter {
//!     failed: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for FailureCounter {
//!     fn on_document_error(&self, index: usize, total: usize, error: &DocumentError) {
//!         self.failed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{index}/{total}: {error}");
//!     }
//! }
//!
//! let counter = Arc::new(FailureCounter { failed: AtomicUsize::new(0) });
//!
//! let config = ExtractionConfig::builder()
//!     .progress_callback(counter as Arc<dyn BatchProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::DocumentError;
use std::sync::Arc;

/// Called by the batch orchestrator as it processes each document.
///
/// Documents are processed sequentially, so events arrive in upload order.
/// Implementations must still be `Send + Sync`: the server shares one config
/// across concurrent requests. All methods default to no-ops.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once before the first document is read.
    fn on_batch_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// Called before a document's text is extracted.
    ///
    /// # Arguments
    /// * `index`: 1-indexed position in the batch
    /// * `total`: batch size
    /// * `name`: display name of the document
    fn on_document_start(&self, index: usize, total: usize, name: &str) {
        let _ = (index, total, name);
    }

    /// Called when a document produced a field record.
    ///
    /// `missing_fields` counts requested keys the model left out.
    fn on_document_complete(&self, index: usize, total: usize, name: &str, missing_fields: usize) {
        let _ = (index, total, name, missing_fields);
    }

    /// Called when a document failed. The batch continues.
    fn on_document_error(&self, index: usize, total: usize, error: &DocumentError) {
        let _ = (index, total, error);
    }

    /// Called once after every document has been attempted.
    fn on_batch_complete(&self, total_documents: usize, success_count: usize) {
        let _ = (total_documents, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: Mutex<Vec<String>>,
        batch_total: AtomicUsize,
        batch_success: AtomicUsize,
    }

    impl BatchProgressCallback for TrackingCallback {
        fn on_batch_start(&self, total_documents: usize) {
            self.batch_total.store(total_documents, Ordering::SeqCst);
        }

        fn on_document_start(&self, _index: usize, _total: usize, _name: &str) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_document_complete(&self, _index: usize, _total: usize, _name: &str, _missing: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_document_error(&self, _index: usize, _total: usize, error: &DocumentError) {
            self.errors
                .lock()
                .unwrap()
                .push(error.document_name().to_string());
        }

        fn on_batch_complete(&self, _total_documents: usize, success_count: usize) {
            self.batch_success.store(success_count, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_batch_start(2);
        cb.on_document_start(1, 2, "a.pdf");
        cb.on_document_complete(1, 2, "a.pdf", 0);
        cb.on_document_error(
            2,
            2,
            &DocumentError::Extraction {
                name: "b.pdf".into(),
                detail: "corrupt".into(),
            },
        );
        cb.on_batch_complete(2, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_batch_start(3);
        tracker.on_document_start(1, 3, "a.pdf");
        tracker.on_document_complete(1, 3, "a.pdf", 0);
        tracker.on_document_start(2, 3, "b.pdf");
        tracker.on_document_error(
            2,
            3,
            &DocumentError::Parse {
                name: "b.pdf".into(),
                detail: "expected value".into(),
                raw: "nope".into(),
            },
        );
        tracker.on_document_start(3, 3, "c.pdf");
        tracker.on_document_complete(3, 3, "c.pdf", 2);
        tracker.on_batch_complete(3, 2);

        assert_eq!(tracker.batch_total.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.starts.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
        assert_eq!(*tracker.errors.lock().unwrap(), vec!["b.pdf".to_string()]);
        assert_eq!(tracker.batch_success.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_batch_start(10);
        cb.on_document_start(1, 10, "x.pdf");
    }
}
