//! Prompt composition for studyforge.
//!
//! Every generation prompt has the same skeleton: tutor role framing, the
//! student's grade, the source policy, the study materials verbatim, and the
//! task instruction. The policy is strict for study tasks (materials only) and
//! relaxed for chat (general knowledge allowed when the materials are silent,
//! provided the answer says so).

pub mod instructions;

use studyforge_context::truncate_to_approx_tokens;
use studyforge_model::{ChatTurn, GradeLevel};

/// Number of most recent chat turns carried into a chat prompt.
pub const CHAT_HISTORY_TURNS: usize = 5;

/// Approximate token cap for each carried chat turn.
pub const CHAT_TURN_TOKENS: usize = 120;

/// How strictly the model must stay within the supplied materials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourcePolicy {
    /// Only the provided materials may be used.
    Strict,
    /// General knowledge is allowed when the materials do not cover the
    /// question, and the answer must say so.
    Relaxed,
}

impl SourcePolicy {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Relaxed => "relaxed",
        }
    }

    fn rules(self) -> &'static str {
        match self {
            Self::Strict => STRICT_RULES,
            Self::Relaxed => RELAXED_RULES,
        }
    }

    fn materials_heading(self) -> &'static str {
        match self {
            Self::Strict => "**Study Materials (ONLY SOURCE OF INFORMATION)**:",
            Self::Relaxed => "**Student's Study Materials**:",
        }
    }
}

const ROLE: &str = "You are an educational AI tutor. Help students learn from their study materials.";

const STRICT_RULES: &str = "\
**CRITICAL INSTRUCTIONS - MUST FOLLOW**:
- You MUST ONLY use information from the provided study materials below
- You CANNOT use any external knowledge, facts, or information from your training
- You CANNOT reference anything not explicitly mentioned in these materials
- If the materials don't contain enough information, say \"I can only find information about [what's available] in your study materials\"
- DO NOT add any introductory phrases, meta-commentary or disclaimers about using only the provided materials
- Provide direct, clean responses without unnecessary preambles";

const RELAXED_RULES: &str = "\
**INSTRUCTIONS**:
- Base your answer on the provided study materials whenever they cover the question
- If the materials do not cover the question, you may use general knowledge, but you MUST say that the answer is not from the student's materials
- Keep explanations appropriate for the student's grade level
- DO NOT add meta-commentary about these instructions; answer directly";

/// Compose a strict-source study prompt.
#[must_use]
pub fn compose_prompt(context: &str, grade: GradeLevel, instruction: &str) -> String {
    render(SourcePolicy::Strict, context, grade, None, instruction)
}

/// Compose a tutoring chat prompt with recent history.
///
/// Only the last [`CHAT_HISTORY_TURNS`] turns are kept, each truncated to about
/// [`CHAT_TURN_TOKENS`] tokens.
#[must_use]
pub fn compose_chat_prompt(
    context: &str,
    history: &[ChatTurn],
    question: &str,
    grade: GradeLevel,
) -> String {
    let transcript = history_transcript(history);
    let instruction = format!(
        "Answer the student's question below.\n\nStudent Question: {}\n\nTutor Response:",
        question.trim()
    );
    render(
        SourcePolicy::Relaxed,
        context,
        grade,
        Some(&transcript),
        &instruction,
    )
}

/// Render the last turns of `history` as `role: text` lines.
#[must_use]
pub fn history_transcript(history: &[ChatTurn]) -> String {
    let start = history.len().saturating_sub(CHAT_HISTORY_TURNS);
    history[start..]
        .iter()
        .map(|turn| {
            format!(
                "{}: {}",
                turn.role.as_str(),
                truncate_to_approx_tokens(turn.text.trim(), CHAT_TURN_TOKENS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render(
    policy: SourcePolicy,
    context: &str,
    grade: GradeLevel,
    history: Option<&str>,
    instruction: &str,
) -> String {
    let mut prompt = String::with_capacity(context.len() + instruction.len() + 1024);
    prompt.push_str(ROLE);
    prompt.push_str("\n\n**Grade Level**: ");
    prompt.push_str(&grade.label());
    prompt.push_str(" (");
    prompt.push_str(grade.description());
    prompt.push_str(")\n\n");
    prompt.push_str(policy.rules());
    prompt.push_str("\n\n");
    prompt.push_str(policy.materials_heading());
    prompt.push('\n');
    prompt.push_str(context);
    if let Some(history) = history.filter(|h| !h.is_empty()) {
        prompt.push_str("\n\n**Conversation History**:\n");
        prompt.push_str(history);
    }
    prompt.push_str("\n\n**Task**: ");
    prompt.push_str(instruction);
    prompt
}
