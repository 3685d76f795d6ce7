//! Task instructions appended to composed prompts.

use studyforge_model::{GradeLevel, QuizQuestion, Task};

const FLASHCARD_EXAMPLE: &str = r#"[
  {"term": "Concept Name", "definition": "Clear, grade-appropriate definition from the materials"},
  {"term": "Another Term", "definition": "Another definition from the materials"}
]"#;

const QUIZ_EXAMPLE: &str = r#"[
  {
    "question": "Based on the study materials, what is...",
    "options": ["Option A", "Option B", "Option C", "Option D"],
    "correctAnswer": "Option B",
    "explanation": "According to the study materials, this is correct because..."
  }
]"#;

const JSON_ONLY: &str =
    "Only return the JSON array, no other text. DO NOT add any introductory phrases or explanations.";

/// Example array shown to the model for a structured task.
#[must_use]
pub const fn json_example(task: Task) -> &'static str {
    match task {
        Task::Quiz => QUIZ_EXAMPLE,
        _ => FLASHCARD_EXAMPLE,
    }
}

/// Instruction for the key-topics overview.
#[must_use]
pub fn topics() -> String {
    "Create key study topics from these materials ONLY.

Provide ONLY the key topics in clear, organized markdown with headings and bullet points. \
Keep it concise and student-friendly.

Provide:
- Main concepts (found in the materials)
- Important definitions (from the materials)
- Key study points (based on the materials)
- Practice areas (derived from the materials)

If something is not in the materials, do NOT include it."
        .to_string()
}

/// Instruction for the session welcome message.
#[must_use]
pub fn welcome() -> String {
    "Welcome the student and describe what you can help them learn. \
Provide a friendly welcome that mentions the specific topics and subjects you see in THESE materials. \
Only reference what you can actually see in the provided documents."
        .to_string()
}

/// Instruction for a flashcard set.
#[must_use]
pub fn flashcards(count: usize, grade: GradeLevel) -> String {
    format!(
        "Generate exactly {count} flashcards using ONLY information from the provided study materials. \
Each flashcard must be based on content explicitly found in the materials.

Format as a JSON array with objects containing \"term\" and \"definition\" fields. \
Make sure definitions are appropriate for {grade} level and come directly from the study materials.

Example format:
{FLASHCARD_EXAMPLE}

{JSON_ONLY}",
        grade = grade.label(),
    )
}

/// Instruction for a multiple-choice quiz.
#[must_use]
pub fn quiz(count: usize, grade: GradeLevel) -> String {
    format!(
        "Generate exactly {count} multiple choice quiz questions using ONLY information from the provided study materials.

All questions must be answerable from the study materials provided. Format as a JSON array with objects containing \
\"question\", \"options\" (array of {options} choices), \"correctAnswer\" (copied exactly from one of the options), \
and \"explanation\" fields. Make questions appropriate for {grade} level.

Example format:
{QUIZ_EXAMPLE}

{JSON_ONLY}",
        options = QuizQuestion::OPTION_COUNT,
        grade = grade.label(),
    )
}

/// Instruction for the first attempt of a structured task.
#[must_use]
pub fn structured(task: Task, count: usize, grade: GradeLevel) -> String {
    match task {
        Task::Quiz => quiz(count, grade),
        _ => flashcards(count, grade),
    }
}

/// Instruction asking for `missing` more items that do not repeat `existing`.
#[must_use]
pub fn top_up(task: Task, kind: &str, keys: &[&str], existing: &[&str], missing: usize) -> String {
    let listed = existing
        .iter()
        .map(|e| format!("- {e}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "These {kind} items already exist:
{listed}

Generate {missing} ADDITIONAL {kind} items from the study materials that do NOT duplicate any item listed above.

Format as a JSON array with objects containing {keys}.

Example format:
{example}

{JSON_ONLY}",
        keys = quoted_keys(keys),
        example = json_example(task),
    )
}

/// Instruction for line-delimited flashcards.
#[must_use]
pub fn flashcard_lines(count: usize) -> String {
    format!(
        "Generate exactly {count} flashcards from the study materials.

Write one flashcard per line in the form:
term || definition

Use the two characters || exactly once per line. Do not number the lines and do not add any other text."
    )
}

/// Standalone prompt that converts a previous free-form answer into JSON.
#[must_use]
pub fn conversion(task: Task, kind: &str, keys: &[&str], count: usize, previous: &str) -> String {
    format!(
        "Convert the following text into a JSON array of at most {count} {kind} items with keys {keys}.
Keep the content exactly as written; do not invent new items.

Example format:
{example}

Text to convert:
{previous}

{JSON_ONLY}",
        keys = quoted_keys(keys),
        example = json_example(task),
    )
}

/// One line of a per-question quiz result.
#[derive(Debug, Clone)]
pub struct QuestionResult<'a> {
    pub question: &'a str,
    pub correct: &'a str,
    pub student: Option<&'a str>,
}

impl QuestionResult<'_> {
    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.student == Some(self.correct)
    }
}

/// Prompt for the quiz performance analysis.
#[must_use]
pub fn quiz_analysis(
    results: &[QuestionResult<'_>],
    document_names: &[&str],
    grade: GradeLevel,
) -> String {
    let score = results.iter().filter(|r| r.is_correct()).count();
    let details = results
        .iter()
        .map(|r| {
            format!(
                "Q: {}\nCorrect: {}\nStudent: {}\nResult: {}",
                r.question,
                r.correct,
                r.student.unwrap_or("Not answered"),
                if r.is_correct() { "Correct" } else { "Incorrect" }
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "You are an AI tutor analyzing a student's quiz performance. You can ONLY reference information from the student's study materials.

**STRICT RULE**: Base your analysis and recommendations ONLY on the study materials provided. \
Do NOT suggest external resources or general study tips not related to their specific materials.

**Student Grade Level**: {grade_label}
**Quiz Results**: {score}/{total} correct

**Detailed Results**:
{details}

**Available Study Materials**: {materials}

**Task**: Provide a comprehensive analysis including:
- Performance summary
- Strengths and areas for improvement based on the quiz topics
- Specific study recommendations focusing on reviewing sections from their uploaded materials
- Encouraging feedback appropriate for {grade_label}

Only reference concepts and topics that appear in their study materials. Format in clear text. Just provide a direct analysis.",
        grade_label = grade.label(),
        total = results.len(),
        materials = document_names.join(", "),
    )
}

fn quoted_keys(keys: &[&str]) -> String {
    keys.iter()
        .map(|k| format!("\"{k}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grade() -> GradeLevel {
        GradeLevel::new(8).unwrap()
    }

    #[test]
    fn structured_instructions_name_count_and_shape() {
        let f = structured(Task::Flashcards, 7, grade());
        assert!(f.contains("exactly 7 flashcards"));
        assert!(f.contains("\"term\""));
        let q = structured(Task::Quiz, 3, grade());
        assert!(q.contains("exactly 3 multiple choice"));
        assert!(q.contains("correctAnswer"));
        assert!(q.contains("8th Grade"));
    }

    #[test]
    fn top_up_lists_existing_items() {
        let text = top_up(
            Task::Flashcards,
            "flashcard",
            &["term", "definition"],
            &["Atom", "Cell"],
            4,
        );
        assert!(text.contains("- Atom\n- Cell"));
        assert!(text.contains("Generate 4 ADDITIONAL"));
        assert!(text.contains("\"term\", \"definition\""));
    }

    #[test]
    fn conversion_embeds_previous_text() {
        let text = conversion(Task::Quiz, "quiz question", &["question"], 2, "Q1 is about cells");
        assert!(text.contains("Text to convert:\nQ1 is about cells"));
        assert!(text.contains("at most 2 quiz question items"));
    }

    #[test]
    fn analysis_reports_score_and_unanswered() {
        let results = [
            QuestionResult {
                question: "Q1",
                correct: "A",
                student: Some("A"),
            },
            QuestionResult {
                question: "Q2",
                correct: "B",
                student: None,
            },
        ];
        let prompt = quiz_analysis(&results, &["Bio notes", "Chem"], grade());
        assert!(prompt.contains("**Quiz Results**: 1/2 correct"));
        assert!(prompt.contains("Student: Not answered"));
        assert!(prompt.contains("Bio notes, Chem"));
    }
}
