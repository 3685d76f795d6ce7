//! Scripted backends for tests.
//!
//! Test seam; not part of public API stability guarantees.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use studyforge_utils::error::LlmError;

use crate::types::{GenerationRequest, LlmBackend, LlmResult};

type Responder = Box<dyn Fn(&GenerationRequest) -> Result<String, LlmError> + Send + Sync>;

/// Backend that replays queued responses and records every request.
///
/// Once the queue is empty it answers with the repeat text if one was set,
/// otherwise with a transport error.
pub struct ScriptedBackend {
    queue: Mutex<VecDeque<Result<String, LlmError>>>,
    repeat: Option<String>,
    responder: Option<Responder>,
    requests: Mutex<Vec<GenerationRequest>>,
    calls: AtomicU32,
}

impl ScriptedBackend {
    pub fn new(responses: impl IntoIterator<Item = Result<String, LlmError>>) -> Self {
        Self {
            queue: Mutex::new(responses.into_iter().collect()),
            repeat: None,
            responder: None,
            requests: Mutex::new(Vec::new()),
            calls: AtomicU32::new(0),
        }
    }

    /// Successful responses with the given texts.
    pub fn texts<'a>(texts: impl IntoIterator<Item = &'a str>) -> Self {
        Self::new(texts.into_iter().map(|t| Ok(t.to_string())))
    }

    /// Answer every call with `text`.
    pub fn repeating(text: &str) -> Self {
        let mut backend = Self::new([]);
        backend.repeat = Some(text.to_string());
        backend
    }

    /// Answer each call by inspecting the request.
    pub fn responding<F>(responder: F) -> Self
    where
        F: Fn(&GenerationRequest) -> Result<String, LlmError> + Send + Sync + 'static,
    {
        let mut backend = Self::new([]);
        backend.responder = Some(Box::new(responder));
        backend
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Prompts received so far, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.prompt).collect()
    }
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    async fn invoke(&self, request: GenerationRequest) -> Result<LlmResult, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let next = match &self.responder {
            Some(responder) => responder(&request),
            None => self
                .queue
                .lock()
                .ok()
                .and_then(|mut q| q.pop_front())
                .or_else(|| self.repeat.clone().map(Ok))
                .unwrap_or_else(|| Err(LlmError::Transport("script exhausted".to_string()))),
        };

        next.map(|text| LlmResult::new(text, "scripted", request.model))
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}
