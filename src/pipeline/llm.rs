//! Completion-service interaction.
//!
//! [`CompletionClient`] is the seam between the pipeline and the model: the
//! orchestrator only ever sees `complete(system, prompt) -> text`. The
//! production implementation, [`LlmCompletionClient`], forwards to an
//! `edgequake_llm` provider; tests substitute a client that returns canned
//! responses.
//!
//! One attempt per document. A failure here is reported as
//! [`DocumentError::Completion`] and ends that document only.

use crate::config::{ExtractionConfig, API_KEY_ENV, DEFAULT_PROVIDER};
use crate::error::{DocumentError, ExtractError};
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// The model's answer to one prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    /// Raw response text, exactly as the model produced it.
    pub content: String,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
}

impl Completion {
    /// A completion with no token accounting.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }
}

/// Sends one system + user prompt pair to a completion service.
///
/// Errors are returned as [`DocumentError::Completion`]; the orchestrator
/// fills in the document name.
pub trait CompletionClient: Send + Sync {
    fn complete(
        &self,
        system_prompt: &str,
        prompt: &str,
    ) -> impl Future<Output = Result<Completion, DocumentError>> + Send;
}

/// [`CompletionClient`] backed by an `edgequake_llm` chat provider.
#[derive(Clone)]
pub struct LlmCompletionClient {
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
}

impl std::fmt::Debug for LlmCompletionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmCompletionClient")
            .field("provider", &"<dyn LLMProvider>")
            .field("temperature", &self.options.temperature)
            .field("max_tokens", &self.options.max_tokens)
            .finish()
    }
}

impl LlmCompletionClient {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &ExtractionConfig) -> Self {
        Self {
            provider,
            options: build_options(config),
        }
    }

    /// Resolve the provider described by `config` and wrap it.
    ///
    /// Checks the API key first so a missing credential is reported as
    /// [`ExtractError::MissingApiKey`] rather than a provider error.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self, ExtractError> {
        let provider = resolve_provider(config)?;
        Ok(Self::new(provider, config))
    }
}

impl CompletionClient for LlmCompletionClient {
    async fn complete(
        &self,
        system_prompt: &str,
        prompt: &str,
    ) -> Result<Completion, DocumentError> {
        let messages = vec![ChatMessage::system(system_prompt), ChatMessage::user(prompt)];

        let response = self
            .provider
            .chat(&messages, Some(&self.options))
            .await
            .map_err(|e| DocumentError::Completion {
                name: String::new(),
                detail: e.to_string(),
            })?;

        debug!(
            "{} input tokens, {} output tokens",
            response.prompt_tokens, response.completion_tokens
        );

        Ok(Completion {
            content: response.content,
            prompt_tokens: response.prompt_tokens as usize,
            completion_tokens: response.completion_tokens as usize,
        })
    }
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`) is used as-is.
/// 2. **Named provider + model** (`config.provider_name`, `config.model`) is
///    created through [`ProviderFactory::create_llm_provider`], which reads
///    the provider's API key from the environment. For the default OpenAI
///    provider the key is checked up front.
pub fn resolve_provider(config: &ExtractionConfig) -> Result<Arc<dyn LLMProvider>, ExtractError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if config.provider_name == DEFAULT_PROVIDER {
        config.require_api_key()?;
    }

    ProviderFactory::create_llm_provider(&config.provider_name, &config.model).map_err(|e| {
        ExtractError::ProviderNotConfigured {
            provider: config.provider_name.clone(),
            hint: format!("Check {API_KEY_ENV} (or the provider's own key variable).\nError: {e}"),
        }
    })
}

/// Build `CompletionOptions` from the extraction config.
fn build_options(config: &ExtractionConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: config.temperature,
        max_tokens: config.max_tokens,
        ..Default::default()
    }
}
