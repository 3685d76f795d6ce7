//! Generation backends for studyforge
//!
//! Every call goes through [`GenerationGateway`]. Behind it sits one
//! [`LlmBackend`]: the HTTP study proxy, the offline demo backend, or a test
//! double. Anonymous use is capped by [`QuotaBackend`], which consults a
//! [`UsageCounter`] before each call.

mod demo_backend;
pub mod fallback;
mod gateway;
pub(crate) mod http_client;
mod proxy_backend;
mod quota_backend;
mod types;
mod usage_counter;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use demo_backend::{DEMO_TOPICS, DEMO_WELCOME, DemoBackend};
pub use gateway::{
    AccessMode, FailureClass, GenerateOptions, GenerationGateway, classify, recover,
};
pub use proxy_backend::{GENERATE_PATH, ProxyBackend};
pub use quota_backend::QuotaBackend;
pub use types::{GenerationRequest, LlmBackend, LlmResult};
pub use usage_counter::{FileUsageCounter, InMemoryUsageCounter, UsageCounter};

pub use studyforge_utils::error::{LlmError, SafetyError};
