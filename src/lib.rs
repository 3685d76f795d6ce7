//! studyforge - token-budgeted study context and resilient flashcard/quiz generation
//!
//! studyforge turns a student's plain-text study materials into key topics,
//! a tutoring conversation, flashcards and multiple-choice quizzes using a
//! generation service behind a study proxy.
//!
//! studyforge can be used in two ways:
//! - **CLI**: run `studyforge` with one or more `--doc` files
//! - **Library**: build a [`StudyEngine`] and call its operations
//!
//! # Quick Start (CLI)
//!
//! ```bash
//! # Key topics for two chapters, as a 10th grader
//! studyforge --doc ch1.txt --doc ch2.txt --grade 10 topics
//!
//! # Eight flashcards as JSON
//! studyforge --doc ch1.txt --json flashcards --count 8
//!
//! # Inspect the context a quiz prompt would carry (no generation call)
//! studyforge --doc ch1.txt context --task quiz
//! ```
//!
//! # Quick Start (Library)
//!
//! ```rust,no_run
//! use studyforge::{Config, Document, StudyEngine};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::builder().grade(8).build()?;
//! let engine = StudyEngine::from_config(&config)?;
//! let docs = vec![Document::new(1, "Cells", "Cells are the basic unit of life.")];
//!
//! let cards = engine
//!     .generate_flashcards(&docs, config.grade(), config.model_id(), 5)
//!     .await;
//! assert!(cards.len() <= 5);
//! # Ok(())
//! # }
//! ```
//!
//! # Failure Model
//!
//! Text operations return [`SafetyError`] only when the provider refuses the
//! content. Every other backend failure becomes readable fallback text.
//! Structured operations never fail; they fall back through a repair cascade
//! down to placeholder items.

// ============================================================================
// Stable public API
// ============================================================================

pub use studyforge_config::{CliArgs, Config, ConfigBuilder, ConfigSource};
pub use studyforge_context::{ContextBudget, ContextBuilder, StudyContext, estimate_tokens};
pub use studyforge_engine::{
    CascadeStage, StructuredOutcome, StudyEngine, StudySession, TaskBudgets,
};
pub use studyforge_extraction::{StructuredItem, extract_items};
pub use studyforge_llm::{AccessMode, GenerationGateway, LlmBackend, UsageCounter};
pub use studyforge_model::{
    AiModel, ChatRole, ChatTurn, DEFAULT_MODEL_ID, Document, DocumentStatus, Flashcard,
    GenerationResult, GradeLevel, MODELS, QuizQuestion, Task, WebSource, find_model,
};
pub use studyforge_utils::error::{
    ConfigError, LlmError, SafetyError, StudyError, UsageError, UserFriendlyError,
};
pub use studyforge_utils::exit_codes::ExitCode;

// ============================================================================
// Member crates, for callers that need the lower layers
// ============================================================================

#[doc(hidden)]
pub use studyforge_config as config;
#[doc(hidden)]
pub use studyforge_context as context;
#[doc(hidden)]
pub use studyforge_engine as engine;
#[doc(hidden)]
pub use studyforge_extraction as extraction;
#[doc(hidden)]
pub use studyforge_llm as llm;
#[doc(hidden)]
pub use studyforge_model as model;
#[doc(hidden)]
pub use studyforge_prompt_template as prompt_template;
#[doc(hidden)]
pub use studyforge_utils as utils;

#[doc(hidden)]
pub mod cli;
