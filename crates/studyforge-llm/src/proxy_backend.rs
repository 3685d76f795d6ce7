//! HTTP backend for the study generation proxy
//!
//! The proxy holds the provider credentials. Clients POST the composed prompt
//! to `{base}/functions/v1/ai-generate` and receive `{ "text": ... }`.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use studyforge_utils::error::LlmError;

use crate::http_client::HttpClient;
use crate::types::{GenerationRequest, LlmBackend, LlmResult};

/// Path of the generation function below the proxy base URL.
pub const GENERATE_PATH: &str = "/functions/v1/ai-generate";

const PROVIDER: &str = "proxy";

#[derive(Clone)]
pub struct ProxyBackend {
    client: Arc<HttpClient>,
    endpoint: String,
    /// Bearer token; `None` for anonymous use.
    access_token: Option<String>,
}

impl ProxyBackend {
    /// Create a backend for the proxy at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the HTTP client cannot be constructed
    pub fn new(base_url: &str, access_token: Option<String>) -> Result<Self, LlmError> {
        Ok(Self::with_client(HttpClient::new()?, base_url, access_token))
    }

    pub(crate) fn with_client(
        client: HttpClient,
        base_url: &str,
        access_token: Option<String>,
    ) -> Self {
        Self {
            client: Arc::new(client),
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), GENERATE_PATH),
            access_token,
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }
}

#[async_trait]
impl LlmBackend for ProxyBackend {
    async fn invoke(&self, request: GenerationRequest) -> Result<LlmResult, LlmError> {
        let body = ProxyRequest {
            prompt: &request.prompt,
            model: &request.model,
            expect_json: request.expect_json,
            action: request.task.as_str(),
            items: request.items,
            doc_bytes: request.doc_bytes(),
        };

        debug!(
            provider = PROVIDER,
            model = %request.model,
            action = body.action,
            doc_bytes = body.doc_bytes,
            authenticated = self.access_token.is_some(),
            "Invoking generation proxy"
        );

        let mut builder = self
            .client
            .client()
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(token) = &self.access_token {
            builder = builder.bearer_auth(token);
        }

        let response = self
            .client
            .execute_with_retry(builder, request.timeout, PROVIDER)
            .await?;

        let payload: Value = response
            .json()
            .await
            .map_err(|_| LlmError::Transport("Malformed response".to_string()))?;
        let text = payload
            .get("text")
            .and_then(Value::as_str)
            .ok_or_else(|| LlmError::Transport("Malformed response".to_string()))?;

        debug!(
            provider = PROVIDER,
            chars = text.chars().count(),
            "Proxy invocation completed"
        );

        Ok(LlmResult::new(text, PROVIDER, request.model))
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

/// Proxy request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProxyRequest<'a> {
    prompt: &'a str,
    model: &'a str,
    expect_json: bool,
    action: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    items: Option<usize>,
    doc_bytes: usize,
}
