//! Input resolution: turn a user-supplied path or URL into a [`RawDocument`].
//!
//! Documents are held in memory. Invoices are small, and the server receives
//! them as multipart bodies anyway, so every source ends up in the same
//! shape. PDF validation happens in [`super::text`], so a bad file fails
//! only its own document.

use crate::error::ExtractError;
use std::path::Path;
use tracing::{debug, info};

/// An uploaded or resolved document: display name plus raw bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct RawDocument {
    /// Display name used in logs, errors and progress events.
    pub name: String,
    /// MIME type declared by an upload. Paths and URLs leave it unset.
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl RawDocument {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: None,
            bytes,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// True when the declared content type is `application/pdf`.
    pub fn declares_pdf(&self) -> bool {
        self.content_type.as_deref() == Some("application/pdf")
    }
}

impl std::fmt::Debug for RawDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawDocument")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve a path or URL to an in-memory document.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<RawDocument, ExtractError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        read_local(Path::new(input)).await
    }
}

/// Resolve every input in order, stopping at the first one that cannot be read.
pub async fn resolve_inputs(
    inputs: &[String],
    timeout_secs: u64,
) -> Result<Vec<RawDocument>, ExtractError> {
    let mut documents = Vec::with_capacity(inputs.len());
    for input in inputs {
        documents.push(resolve_input(input, timeout_secs).await?);
    }
    Ok(documents)
}

async fn read_local(path: &Path) -> Result<RawDocument, ExtractError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => ExtractError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => ExtractError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    debug!("Read local document {} ({} bytes)", path.display(), bytes.len());
    Ok(RawDocument::new(name, bytes))
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<RawDocument, ExtractError> {
    info!("Downloading PDF from: {}", url);

    let download_failed = |reason: String| ExtractError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| download_failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            ExtractError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            download_failed(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(download_failed(format!("HTTP {}", response.status())));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| download_failed(e.to_string()))?;

    info!("Downloaded {} bytes from {}", bytes.len(), url);

    Ok(RawDocument::new(filename_from_url(url), bytes.to_vec()))
}

/// Extract a display name from the last URL path segment.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded.pdf".to_string()
}
