//! Fixed guidance returned instead of a generation.

pub const TOPICS_NO_MATERIALS: &str =
    "Please upload your study materials first to generate key topics.";

pub const WELCOME_NO_MATERIALS: &str =
    "Welcome! Please upload your study materials to begin our tutoring session.";

pub const CHAT_NO_MATERIALS: &str =
    "I don't have any study materials to reference. Please upload your documents first.";

pub const TOPICS_EMPTY_RESPONSE: &str = "I received an empty response from the AI. Please try again or check if your study materials contain readable text.";

pub const WELCOME_EMPTY_RESPONSE: &str =
    "Welcome! I'm ready to help you study. Let's explore your materials together!";

pub const CHAT_EMPTY_RESPONSE: &str =
    "I'm having trouble generating a response. Please try rephrasing your question.";

/// Local summary used when the quiz analysis cannot be generated.
#[must_use]
pub fn analysis_unavailable(score: usize, total: usize) -> String {
    let percent = if total == 0 {
        0
    } else {
        (score * 100 + total / 2) / total
    };
    format!(
        "# Quiz Analysis\n\nScore: {score}/{total} ({percent}%)\n\n*Analysis temporarily unavailable. Please try again.*"
    )
}
