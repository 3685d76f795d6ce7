//! Single entry point for generation calls.
//!
//! The gateway resolves the model, routes to the configured backend and turns
//! every failure except a content-safety refusal into renderable fallback
//! text. Callers only ever see `SafetyError`.

use std::sync::Arc;
use std::time::Duration;
use tracing::{Instrument, debug, info, warn};

use studyforge_config::Config;
use studyforge_model::{AiModel, GenerationResult, Task, find_model};
use studyforge_utils::error::{LlmError, SafetyError};
use studyforge_utils::logging::{log_backend_failure, task_span};
use studyforge_utils::redaction::redact_error_message;

use crate::demo_backend::DemoBackend;
use crate::fallback;
use crate::proxy_backend::ProxyBackend;
use crate::quota_backend::QuotaBackend;
use crate::types::{GenerationRequest, LlmBackend};
use crate::usage_counter::{FileUsageCounter, UsageCounter};

const AUTH_MARKERS: &[&str] = &["api key", "unauthorized", "authentication"];
const QUOTA_MARKERS: &[&str] = &["quota", "rate limit", "exceeded"];
const NETWORK_MARKERS: &[&str] = &["network", "connection", "timeout"];
const SAFETY_MARKERS: &[&str] = &["safety", "policy", "blocked"];

/// Upper bound for a connection probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(15);

const PROBE_PROMPT: &str = "Reply with the single word: ready";

/// Per-call options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Registry model id.
    pub model: String,
    pub expect_json: bool,
    pub task: Task,
    /// Number of items a structured task asks for.
    pub items: Option<usize>,
}

impl GenerateOptions {
    #[must_use]
    pub fn new(task: Task, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            expect_json: task.expects_json(),
            task,
            items: None,
        }
    }

    #[must_use]
    pub fn with_items(mut self, items: usize) -> Self {
        self.items = Some(items);
        self
    }
}

/// How a failed call is reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Safety,
    Authentication,
    Quota,
    Network,
    /// The anonymous cap was reached before any call was made.
    LimitReached,
    Other,
}

fn mentions(text: &str, markers: &[&str]) -> bool {
    markers.iter().any(|m| text.contains(m))
}

/// Classify a backend failure by variant, then by message keywords.
#[must_use]
pub fn classify(error: &LlmError) -> FailureClass {
    match error {
        LlmError::ContentBlocked(_) => FailureClass::Safety,
        LlmError::QuotaExhausted { .. } => FailureClass::LimitReached,
        LlmError::ProviderAuth(_) => FailureClass::Authentication,
        LlmError::ProviderQuota(_) => FailureClass::Quota,
        LlmError::Timeout { .. } => FailureClass::Network,
        LlmError::Transport(_)
        | LlmError::ProviderOutage(_)
        | LlmError::Misconfiguration(_)
        | LlmError::Unsupported(_) => {
            let message = error.to_string().to_lowercase();
            if mentions(&message, AUTH_MARKERS) {
                FailureClass::Authentication
            } else if mentions(&message, QUOTA_MARKERS) {
                FailureClass::Quota
            } else if mentions(&message, NETWORK_MARKERS) {
                FailureClass::Network
            } else if mentions(&message, SAFETY_MARKERS) {
                FailureClass::Safety
            } else {
                FailureClass::Other
            }
        }
    }
}

/// Convert a failure into fallback text, or a `SafetyError` for refusals.
pub fn recover(error: &LlmError, prompt: &str) -> Result<GenerationResult, SafetyError> {
    let details = redact_error_message(&error.to_string());
    let text = match classify(error) {
        FailureClass::Safety => {
            let reason = match error {
                LlmError::ContentBlocked(reason) => redact_error_message(reason),
                _ => details,
            };
            return Err(SafetyError::new(reason));
        }
        FailureClass::LimitReached => match error {
            LlmError::QuotaExhausted { limit, .. } => fallback::limit_reached(*limit),
            _ => fallback::service_issue("AI", prompt),
        },
        FailureClass::Authentication => fallback::authentication(&details),
        FailureClass::Quota => fallback::quota(&details),
        FailureClass::Network => fallback::connection(&details),
        FailureClass::Other => fallback::service_issue("AI", prompt),
    };
    Ok(GenerationResult::fallback(text))
}

/// Whether calls go out under a signed-in identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Authenticated,
    Anonymous { limit: u32 },
}

pub struct GenerationGateway {
    backend: Box<dyn LlmBackend>,
    access: AccessMode,
    timeout: Duration,
}

impl GenerationGateway {
    /// Route every call to `backend` without an anonymous cap.
    pub fn new(backend: Box<dyn LlmBackend>) -> Self {
        Self {
            backend,
            access: AccessMode::Authenticated,
            timeout: Duration::from_secs(studyforge_config::DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Route calls to `backend` behind the anonymous cap.
    pub fn anonymous(
        backend: Box<dyn LlmBackend>,
        counter: Arc<dyn UsageCounter>,
        limit: u32,
    ) -> Self {
        Self {
            backend: Box::new(QuotaBackend::new(backend, counter, limit)),
            access: AccessMode::Anonymous { limit },
            timeout: Duration::from_secs(studyforge_config::DEFAULT_TIMEOUT_SECS),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the gateway described by `config`.
    ///
    /// - proxy URL and access token: authenticated proxy calls
    /// - proxy URL only: anonymous proxy calls, capped
    /// - neither: the demo backend, capped
    ///
    /// # Errors
    ///
    /// `LlmError::Misconfiguration` when a token is set without a proxy URL,
    /// when the HTTP client cannot be built, or when the usage file path is
    /// unusable.
    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        let token = config.access_token();
        let gateway = match (config.proxy_base_url(), token) {
            (Some(base), Some(token)) => {
                info!(proxy = %base, "Using authenticated study proxy");
                Self::new(Box::new(ProxyBackend::new(base, Some(token))?))
            }
            (None, Some(_)) => {
                return Err(LlmError::Misconfiguration(format!(
                    "{} is set but no proxy URL is configured",
                    config.access_token_env()
                )));
            }
            (base, None) => {
                let counter = FileUsageCounter::new(config.usage_file())
                    .map_err(|e| LlmError::Misconfiguration(e.to_string()))?;
                let inner: Box<dyn LlmBackend> = match base {
                    Some(base) => {
                        info!(proxy = %base, "Using anonymous study proxy");
                        Box::new(ProxyBackend::new(base, None)?)
                    }
                    None => {
                        info!("No study proxy configured, using demo backend");
                        Box::new(DemoBackend)
                    }
                };
                Self::anonymous(inner, Arc::new(counter), config.anonymous_limit())
            }
        };
        Ok(gateway.with_timeout(config.timeout()))
    }

    #[must_use]
    pub fn access(&self) -> AccessMode {
        self.access
    }

    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.backend.provider_name()
    }

    /// Generate text for `prompt`.
    ///
    /// # Errors
    ///
    /// Only content-safety refusals are errors. Every other failure, and an
    /// unknown model id, yields descriptive fallback text.
    pub async fn generate(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<GenerationResult, SafetyError> {
        let Some(model) = find_model(&options.model).filter(|m| m.is_available) else {
            warn!(model = %options.model, "Unknown or unavailable model");
            return Ok(GenerationResult::fallback(fallback::service_issue("AI", prompt)));
        };

        let mut request = GenerationRequest::new(prompt, model.model_name, options.task)
            .expecting_json(options.expect_json)
            .with_timeout(self.timeout);
        request.items = options.items;

        let span = task_span(options.task.as_str(), model.id);
        let result = self.backend.invoke(request).instrument(span).await;

        match result {
            Ok(result) => {
                debug!(
                    provider = %result.provider,
                    task = %options.task,
                    chars = result.text.chars().count(),
                    "Generation succeeded"
                );
                Ok(GenerationResult {
                    text: result.text,
                    sources: result.sources,
                    fallback: false,
                })
            }
            Err(error) => {
                log_backend_failure(
                    self.backend.provider_name(),
                    options.task.as_str(),
                    &error.to_string(),
                );
                recover(&error, prompt)
            }
        }
    }

    /// Probe each candidate model and return the first that answers.
    ///
    /// # Errors
    ///
    /// The last failure when no candidate answers, or `LlmError::Unsupported`
    /// when `models` is empty.
    pub async fn check_connection(&self, models: &[&str]) -> Result<&'static AiModel, LlmError> {
        let mut last_error = LlmError::Unsupported("no candidate models given".to_string());

        for id in models {
            let Some(model) = find_model(id) else {
                last_error = LlmError::Unsupported(format!("unknown model '{id}'"));
                continue;
            };
            let request = GenerationRequest::new(PROBE_PROMPT, model.model_name, Task::Probe)
                .with_timeout(self.timeout.min(PROBE_TIMEOUT));

            match self.backend.invoke(request).await {
                Ok(result) if !result.text.trim().is_empty() => {
                    info!(model = model.id, provider = %result.provider, "Connection check succeeded");
                    return Ok(model);
                }
                Ok(_) => {
                    last_error = LlmError::Transport(format!("empty probe response from {id}"));
                }
                Err(e) => {
                    warn!(model = model.id, error = %redact_error_message(&e.to_string()), "Connection check failed");
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedBackend;
    use crate::usage_counter::InMemoryUsageCounter;

    fn opts(task: Task) -> GenerateOptions {
        GenerateOptions::new(task, "gemini-2.5-flash")
    }

    #[test]
    fn test_classify_by_variant() {
        assert_eq!(classify(&LlmError::ContentBlocked("x".into())), FailureClass::Safety);
        assert_eq!(classify(&LlmError::ProviderAuth("x".into())), FailureClass::Authentication);
        assert_eq!(classify(&LlmError::ProviderQuota("x".into())), FailureClass::Quota);
        assert_eq!(
            classify(&LlmError::Timeout {
                duration: Duration::from_secs(1)
            }),
            FailureClass::Network
        );
        assert_eq!(
            classify(&LlmError::QuotaExhausted { limit: 10, used: 10 }),
            FailureClass::LimitReached
        );
    }

    #[test]
    fn test_classify_by_keyword() {
        let t = |m: &str| classify(&LlmError::Transport(m.to_string()));
        assert_eq!(t("Invalid API key supplied"), FailureClass::Authentication);
        assert_eq!(t("rate limit hit"), FailureClass::Quota);
        assert_eq!(t("connection reset by peer"), FailureClass::Network);
        assert_eq!(t("prompt violates policy"), FailureClass::Safety);
        assert_eq!(t("HTTP 418"), FailureClass::Other);
        assert_eq!(
            classify(&LlmError::Misconfiguration(
                "proxy returned HTTP 404 (function not deployed or wrong URL)".into()
            )),
            FailureClass::Other
        );
    }

    #[tokio::test]
    async fn test_success_passes_text_through() {
        let backend = Arc::new(ScriptedBackend::texts(["hello"]));
        let gateway = GenerationGateway::new(Box::new(backend.clone()));
        let result = gateway.generate("prompt", &opts(Task::Chat)).await.unwrap();
        assert_eq!(result.text, "hello");
        assert!(!result.fallback);
        let request = backend.requests().remove(0);
        assert_eq!(request.model, "gemini-2.5-flash");
        assert_eq!(request.task, Task::Chat);
    }

    #[tokio::test]
    async fn test_structured_calls_send_json_and_items() {
        let backend = Arc::new(ScriptedBackend::texts(["[]"]));
        let gateway = GenerationGateway::new(Box::new(backend.clone()));
        gateway
            .generate("p", &opts(Task::Quiz).with_items(4))
            .await
            .unwrap();
        let request = backend.requests().remove(0);
        assert!(request.expect_json);
        assert_eq!(request.items, Some(4));
    }

    #[tokio::test]
    async fn test_safety_failure_surfaces() {
        let backend = ScriptedBackend::new([Err(LlmError::ContentBlocked(
            "HARM_CATEGORY_DANGEROUS".into(),
        ))]);
        let gateway = GenerationGateway::new(Box::new(backend));
        let err = gateway.generate("p", &opts(Task::Chat)).await.unwrap_err();
        assert_eq!(err.reason, "HARM_CATEGORY_DANGEROUS");
        assert!(err.to_string().starts_with("Your document or prompt was blocked"));
    }

    #[tokio::test]
    async fn test_other_failures_become_fallback_text() {
        let backend = ScriptedBackend::new([
            Err(LlmError::ProviderAuth("HTTP 401".into())),
            Err(LlmError::ProviderOutage("HTTP 503".into())),
        ]);
        let gateway = GenerationGateway::new(Box::new(backend));
        let auth = gateway.generate("p", &opts(Task::Chat)).await.unwrap();
        assert!(auth.text.starts_with("# 🔑 Authentication Error"));
        assert!(auth.fallback);
        let outage = gateway.generate("p", &opts(Task::Chat)).await.unwrap();
        assert!(outage.text.starts_with("# ⚠️ Temporary Service Issue"));
        assert!(outage.fallback);
    }

    #[tokio::test]
    async fn test_unknown_model_skips_backend() {
        let backend = Arc::new(ScriptedBackend::texts(["never"]));
        let gateway = GenerationGateway::new(Box::new(backend.clone()));
        let result = gateway
            .generate("p", &GenerateOptions::new(Task::Chat, "mystery-model"))
            .await
            .unwrap();
        assert!(result.text.contains("Temporary Service Issue"));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_eleventh_anonymous_call_is_refused_without_backend_call() {
        let backend = Arc::new(ScriptedBackend::repeating("ok"));
        let counter = Arc::new(InMemoryUsageCounter::default());
        let gateway = GenerationGateway::anonymous(Box::new(backend.clone()), counter.clone(), 10);

        for _ in 0..10 {
            let result = gateway.generate("p", &opts(Task::Chat)).await.unwrap();
            assert_eq!(result.text, "ok");
        }
        let eleventh = gateway.generate("p", &opts(Task::Chat)).await.unwrap();
        assert!(eleventh.text.contains("Free Limit Reached"));
        assert!(eleventh.fallback);
        assert_eq!(backend.calls(), 10);
        assert_eq!(counter.get().unwrap(), 10);
        assert_eq!(gateway.access(), AccessMode::Anonymous { limit: 10 });
    }

    #[tokio::test]
    async fn test_check_connection_returns_first_answering_model() {
        let backend = ScriptedBackend::texts(["ready"]);
        let gateway = GenerationGateway::new(Box::new(backend));
        let model = gateway
            .check_connection(&["unknown", "gemini-2.5-flash"])
            .await
            .unwrap();
        assert_eq!(model.id, "gemini-2.5-flash");
    }

    #[tokio::test]
    async fn test_check_connection_reports_last_failure() {
        let backend = ScriptedBackend::new([Err(LlmError::ProviderAuth("HTTP 401".into()))]);
        let gateway = GenerationGateway::new(Box::new(backend));
        let err = gateway.check_connection(&["gemini-2.5-flash"]).await.unwrap_err();
        assert!(matches!(err, LlmError::ProviderAuth(_)));
        assert!(matches!(
            gateway.check_connection(&[]).await,
            Err(LlmError::Unsupported(_))
        ));
    }

    #[test]
    fn test_from_config_without_proxy_is_anonymous_demo() {
        let temp = tempfile::TempDir::new().unwrap();
        let config = Config::builder()
            .access_token_env("STUDYFORGE_TEST_TOKEN_THAT_IS_NEVER_SET")
            .usage_file(temp.path().join("usage.json"))
            .anonymous_limit(4)
            .build()
            .unwrap();
        let gateway = GenerationGateway::from_config(&config).unwrap();
        assert_eq!(gateway.provider_name(), "demo");
        assert_eq!(gateway.access(), AccessMode::Anonymous { limit: 4 });
    }
}
