//! Configuration types for invoice extraction.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. The config is cheap to clone and is
//! shared read-only by the CLI and by every request the server handles.

use crate::error::ExtractError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// Environment variable holding the completion-service credential.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Default provider name passed to `edgequake_llm::ProviderFactory`.
pub const DEFAULT_PROVIDER: &str = "openai";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gpt-4";

/// Largest number of documents accepted in one batch.
pub const MAX_DOCUMENTS: usize = 10;

/// Default timeout for downloading URL inputs.
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 120;

/// Default CSV file name for interactive exports.
pub const DEFAULT_CSV_NAME: &str = "extracted_data.csv";

/// Configuration for a batch extraction.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use invoice_extract::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .model("gpt-4.1-mini")
///     .temperature(0.0)
///     .build()
///     .unwrap();
/// assert_eq!(config.model, "gpt-4.1-mini");
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// LLM model identifier. Default: `gpt-4`.
    pub model: String,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama"). Default: `openai`.
    pub provider_name: String,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. `None` leaves the provider default in place.
    pub temperature: Option<f32>,

    /// Maximum tokens the model may generate per document. `None` leaves the
    /// provider default in place.
    pub max_tokens: Option<usize>,

    /// Custom system prompt. If None, uses [`crate::prompts::SYSTEM_PROMPT`].
    pub system_prompt: Option<String>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional per-document progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            provider_name: DEFAULT_PROVIDER.to_string(),
            provider: None,
            temperature: None,
            max_tokens: None,
            system_prompt: None,
            download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("system_prompt", &self.system_prompt.as_ref().map(|p| p.len()))
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn BatchProgressCallback>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// The system prompt in effect: the override, or the built-in default.
    pub fn system_prompt(&self) -> &str {
        self.system_prompt
            .as_deref()
            .unwrap_or(crate::prompts::SYSTEM_PROMPT)
    }

    /// Check that the completion-service credential is present.
    ///
    /// Call this at startup so a missing key fails before the first document
    /// is read rather than inside the first request. A pre-built provider
    /// carries its own credentials and skips the check.
    pub fn require_api_key(&self) -> Result<(), ExtractError> {
        if self.provider.is_some() {
            return Ok(());
        }
        check_api_key(std::env::var(API_KEY_ENV).ok().as_deref())
    }
}

/// A blank key counts as missing.
fn check_api_key(value: Option<&str>) -> Result<(), ExtractError> {
    match value {
        Some(key) if !key.trim().is_empty() => Ok(()),
        _ => Err(ExtractError::MissingApiKey { var: API_KEY_ENV }),
    }
}

/// Builder for [`ExtractionConfig`].
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl fmt::Debug for ExtractionConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl ExtractionConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = name.into();
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = Some(n);
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(ExtractError::InvalidConfig("model must not be empty".into()));
        }
        if c.provider.is_none() && c.provider_name.trim().is_empty() {
            return Err(ExtractError::InvalidConfig(
                "provider name must not be empty".into(),
            ));
        }
        if c.max_tokens == Some(0) {
            return Err(ExtractError::InvalidConfig(
                "max tokens must be ≥ 1".into(),
            ));
        }
        if c.system_prompt.as_deref().is_some_and(|p| p.trim().is_empty()) {
            return Err(ExtractError::InvalidConfig(
                "system prompt override must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}
