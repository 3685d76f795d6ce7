//! Study operations for studyforge.
//!
//! [`StudyEngine`] turns documents into key topics, a welcome message,
//! tutoring answers, flashcards, quizzes and quiz feedback. Text operations
//! only fail with [`SafetyError`]; structured operations and quiz analysis
//! never fail.

mod analysis;
mod budgets;
mod service;
mod structured;
pub mod texts;

pub use budgets::TaskBudgets;
pub use service::{StudyEngine, StudySession};
pub use structured::{CascadeStage, StructuredOutcome};

pub use studyforge_llm::SafetyError;
