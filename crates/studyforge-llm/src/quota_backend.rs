//! Anonymous-use cap around any backend.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use studyforge_model::Task;
use studyforge_utils::error::LlmError;

use crate::types::{GenerationRequest, LlmBackend, LlmResult};
use crate::usage_counter::UsageCounter;

/// Wraps a backend and refuses calls once the anonymous limit is reached.
///
/// The count is read before and bumped before each call, so failed calls
/// still consume a use. Once `used >= limit` the inner backend is never
/// called. A counter that cannot be read or written is logged and ignored;
/// the cap is advisory. Connection probes are neither counted nor capped.
pub struct QuotaBackend {
    inner: Box<dyn LlmBackend>,
    counter: Arc<dyn UsageCounter>,
    limit: u32,
}

impl QuotaBackend {
    pub fn new(inner: Box<dyn LlmBackend>, counter: Arc<dyn UsageCounter>, limit: u32) -> Self {
        debug!(limit, provider = inner.provider_name(), "Creating QuotaBackend");
        Self {
            inner,
            counter,
            limit,
        }
    }

    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Uses consumed so far, or `None` if the counter is unreadable.
    #[must_use]
    pub fn used(&self) -> Option<u32> {
        self.counter.get().ok()
    }
}

#[async_trait]
impl LlmBackend for QuotaBackend {
    async fn invoke(&self, request: GenerationRequest) -> Result<LlmResult, LlmError> {
        if request.task == Task::Probe {
            return self.inner.invoke(request).await;
        }

        let used = match self.counter.get() {
            Ok(used) => used,
            Err(e) => {
                warn!(error = %e, "Anonymous usage counter unreadable, continuing");
                0
            }
        };

        if used >= self.limit {
            warn!(limit = self.limit, used, "Anonymous usage limit reached");
            return Err(LlmError::QuotaExhausted {
                limit: self.limit,
                used,
            });
        }

        match self.counter.increment() {
            Ok(now) => debug!(used = now, limit = self.limit, "Anonymous use recorded"),
            Err(e) => warn!(error = %e, "Failed to record anonymous use"),
        }

        self.inner.invoke(request).await
    }

    fn provider_name(&self) -> &'static str {
        self.inner.provider_name()
    }
}
