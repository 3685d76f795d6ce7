//! Tracing initialisation and structured log helpers.

use std::time::Instant;
use tracing::{Level, debug, span, warn};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::redaction::redact_error_message;

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins when set. Otherwise verbose mode enables debug output for
/// studyforge crates and span-close timing events; the default is info for
/// studyforge and warn for dependencies. Logs go to stderr so command output on
/// stdout stays clean.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("studyforge=debug,info")
            } else {
                EnvFilter::try_new("studyforge=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    if verbose {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_line_number(false)
                    .with_file(false)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_line_number(false)
                    .with_file(false)
                    .compact(),
            )
            .try_init()?;
    }

    Ok(())
}

/// Span covering one study operation (`topics`, `flashcards`, ...).
pub fn task_span(task: &str, model: &str) -> tracing::Span {
    span!(Level::INFO, "study_task", task = %task, model = %model)
}

/// Log a backend failure with its message redacted.
pub fn log_backend_failure(provider: &str, task: &str, error: &str) {
    warn!(
        provider = %provider,
        task = %task,
        error = %redact_error_message(error),
        "Generation call failed"
    );
}

/// Measures the wall-clock duration of a pipeline stage and logs it on drop.
pub struct StageTimer {
    stage: &'static str,
    started: Instant,
}

impl StageTimer {
    #[must_use]
    pub fn start(stage: &'static str) -> Self {
        Self {
            stage,
            started: Instant::now(),
        }
    }
}

impl Drop for StageTimer {
    fn drop(&mut self) {
        debug!(
            stage = self.stage,
            duration_ms = self.started.elapsed().as_millis() as u64,
            "Stage finished"
        );
    }
}
