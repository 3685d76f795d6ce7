//! Core types for the generation backend abstraction

use async_trait::async_trait;
use std::time::Duration;

use studyforge_model::{Task, WebSource};
use studyforge_utils::error::LlmError;

/// Input to one backend invocation.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Fully composed prompt.
    pub prompt: String,
    /// Provider model name (already resolved from the registry id).
    pub model: String,
    /// Ask the provider for a JSON response.
    pub expect_json: bool,
    /// Task the call serves; sent to the proxy as `action`.
    pub task: Task,
    /// Number of items requested by a structured task.
    pub items: Option<usize>,
    pub timeout: Duration,
}

impl GenerationRequest {
    /// A request for `task`. Structured tasks always expect JSON.
    #[must_use]
    pub fn new(prompt: impl Into<String>, model: impl Into<String>, task: Task) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            expect_json: task.expects_json(),
            task,
            items: None,
            timeout: Duration::from_secs(studyforge_config::DEFAULT_TIMEOUT_SECS),
        }
    }

    #[must_use]
    pub fn with_items(mut self, items: usize) -> Self {
        self.items = Some(items);
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn expecting_json(mut self, expect_json: bool) -> Self {
        self.expect_json = expect_json || self.task.expects_json();
        self
    }

    /// Size of the prompt in bytes, reported to the proxy as `docBytes`.
    #[must_use]
    pub fn doc_bytes(&self) -> usize {
        self.prompt.len()
    }
}

/// Result from a backend invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmResult {
    pub text: String,
    /// Backend that produced the text (`proxy`, `demo`, ...).
    pub provider: String,
    pub model_used: String,
    pub sources: Option<Vec<WebSource>>,
}

impl LlmResult {
    #[must_use]
    pub fn new(
        text: impl Into<String>,
        provider: impl Into<String>,
        model_used: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            provider: provider.into(),
            model_used: model_used.into(),
            sources: None,
        }
    }

    #[must_use]
    pub fn with_sources(mut self, sources: Vec<WebSource>) -> Self {
        self.sources = Some(sources);
        self
    }
}

/// Trait for generation backend implementations
///
/// The gateway routes every call through one of these, so callers never know
/// whether the proxy, the demo backend or a test double answered.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Invoke the backend.
    ///
    /// # Errors
    ///
    /// Returns `LlmError` for transport failures, provider errors (auth, quota,
    /// outage, content blocking), timeouts and an exhausted anonymous quota.
    async fn invoke(&self, request: GenerationRequest) -> Result<LlmResult, LlmError>;

    /// Stable name used in logs.
    fn provider_name(&self) -> &'static str;
}

#[async_trait]
impl<T: LlmBackend + ?Sized> LlmBackend for std::sync::Arc<T> {
    async fn invoke(&self, request: GenerationRequest) -> Result<LlmResult, LlmError> {
        (**self).invoke(request).await
    }

    fn provider_name(&self) -> &'static str {
        (**self).provider_name()
    }
}
