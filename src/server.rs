//! HTTP service: multipart PDF upload in, JSON rows out.
//!
//! ```text
//! GET  /             → {"message": "..."}
//! POST /api/extract  → [ {row}, ... ]   (multipart field "files", up to 10)
//! ```
//!
//! Every error answers `{"detail": "<message>"}`. Requests share only the
//! immutable [`AppState`].

use crate::batch::{check_batch_size, extract_batch};
use crate::config::{ExtractionConfig, MAX_DOCUMENTS};
use crate::error::ExtractError;
use crate::pipeline::input::RawDocument;
use crate::pipeline::llm::CompletionClient;
use crate::schema::OutputRow;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tracing::{info, warn};

pub const WELCOME_MESSAGE: &str = "Welcome to the PDF Data Extractor API";

/// Multipart field carrying the uploaded PDFs.
pub const UPLOAD_FIELD: &str = "files";

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Browser origins allowed to call the API.
pub const ALLOWED_ORIGINS: [&str; 2] = ["http://localhost:3000", "http://localhost:5173"];

/// Shared, read-only state for every request.
pub struct AppState<C> {
    pub client: C,
    pub config: ExtractionConfig,
}

impl<C> AppState<C> {
    pub fn new(client: C, config: ExtractionConfig) -> Self {
        Self { client, config }
    }
}

/// Build the application router.
pub fn router<C: CompletionClient + 'static>(state: Arc<AppState<C>>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/extract", post(extract::<C>))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors_layer())
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve<C: CompletionClient + 'static>(
    addr: SocketAddr,
    state: AppState<C>,
) -> Result<(), ExtractError> {
    let server_failed = |e: std::io::Error| ExtractError::ServerFailed {
        addr: addr.to_string(),
        source: e,
    };

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(server_failed)?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, router(Arc::new(state)))
        .await
        .map_err(server_failed)
}

fn cors_layer() -> CorsLayer {
    let origins = ALLOWED_ORIGINS.map(HeaderValue::from_static);
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

async fn index() -> Json<serde_json::Value> {
    Json(json!({ "message": WELCOME_MESSAGE }))
}

async fn extract<C: CompletionClient + 'static>(
    State(state): State<Arc<AppState<C>>>,
    multipart: Multipart,
) -> Result<Json<Vec<OutputRow>>, ApiError> {
    let documents = read_uploads(multipart).await?;
    info!("Received {} uploaded files", documents.len());

    check_batch_size(documents.len())?;
    if let Some(doc) = documents.iter().find(|d| !d.declares_pdf()) {
        return Err(ApiError::bad_request(format!(
            "File '{}' is not a PDF.",
            doc.name
        )));
    }

    let output = extract_batch(&state.client, documents, &state.config).await?;
    Ok(Json(output.rows))
}

/// Collect every `files` part; other fields are drained and ignored.
///
/// Reading stops at the first `files` part past [`MAX_DOCUMENTS`]; the rest
/// of the body is never buffered.
async fn read_uploads(mut multipart: Multipart) -> Result<Vec<RawDocument>, ApiError> {
    let mut documents = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Failed to read form field: {e}")))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            let _ = field.bytes().await;
            continue;
        }
        if documents.len() == MAX_DOCUMENTS {
            return Err(ExtractError::BatchLimitExceeded {
                count: MAX_DOCUMENTS + 1,
                max: MAX_DOCUMENTS,
            }
            .into());
        }

        let name = field
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("upload-{}.pdf", documents.len() + 1));
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read '{name}': {e}")))?;

        let mut doc = RawDocument::new(name, bytes.to_vec());
        if let Some(content_type) = content_type {
            doc = doc.with_content_type(content_type);
        }
        documents.push(doc);
    }

    Ok(documents)
}

// ── Errors ───────────────────────────────────────────────────────────────

/// An error response: a status code and a `{"detail": ...}` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: detail.into(),
        }
    }
}

impl From<ExtractError> for ApiError {
    fn from(e: ExtractError) -> Self {
        match e {
            ExtractError::BatchLimitExceeded { max, .. } => Self::bad_request(format!(
                "You can only upload a maximum of {max} files at a time."
            )),
            e @ ExtractError::NoDocuments => Self::bad_request(e.to_string()),
            ExtractError::EmptyResult {
                any_parse_failure: false,
                first_error,
                ..
            } => Self::internal(first_error),
            ExtractError::EmptyResult { .. } => {
                Self::bad_request("No data could be extracted from the provided files.")
            }
            other => Self::internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            warn!("{}: {}", self.status, self.detail);
        }
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_limit_is_bad_request() {
        let e: ApiError = ExtractError::BatchLimitExceeded { count: 11, max: 10 }.into();
        assert_eq!(e.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            e.detail,
            "You can only upload a maximum of 10 files at a time."
        );
    }

    #[test]
    fn empty_result_status_depends_on_failure_kind() {
        let parse: ApiError = ExtractError::EmptyResult {
            total: 2,
            first_error: "bad json".into(),
            any_parse_failure: true,
        }
        .into();
        assert_eq!(parse.status, StatusCode::BAD_REQUEST);

        let upstream: ApiError = ExtractError::EmptyResult {
            total: 2,
            first_error: "Error calling the completion service for 'a.pdf': 503".into(),
            any_parse_failure: false,
        }
        .into();
        assert_eq!(upstream.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(upstream.detail.contains("503"));

        let unreadable: ApiError = ExtractError::EmptyResult {
            total: 1,
            first_error: "Error processing PDF 'scan.pdf': not a PDF".into(),
            any_parse_failure: false,
        }
        .into();
        assert_eq!(unreadable.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(unreadable.detail.starts_with("Error processing PDF"));
    }

    #[test]
    fn other_errors_are_internal() {
        let e: ApiError = ExtractError::Internal("boom".into()).into();
        assert_eq!(e.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
