use serde_json::Value;
use studyforge_model::{Flashcard, QuizQuestion, Task};
use tracing::{debug, warn};

use crate::merge::normalize_identity;

/// A record type the structured pipeline can produce.
///
/// Implementations decide how to read one element of a repaired JSON array,
/// which field identifies an item for deduplication, and what generic items
/// to fall back on when nothing usable came back.
pub trait StructuredItem: Sized + Clone + Send + 'static {
    /// Task the items are generated for.
    const TASK: Task;

    /// Singular, human-readable kind (`"flashcard"`).
    const KIND: &'static str;

    /// JSON keys every element must carry, in prompt order.
    const KEYS: &'static [&'static str];

    /// Whether the kind can be requested as `left || right` lines.
    const LINE_PAIRS: bool = false;

    /// Read one array element, returning `None` if it lacks required fields.
    fn from_value(value: &Value) -> Option<Self>;

    /// The text that identifies this item (term or question).
    fn identity(&self) -> &str;

    /// Normalized identity used for duplicate detection.
    fn identity_key(&self) -> String {
        normalize_identity(self.identity())
    }

    /// Build an item from a `left || right` line, if the kind supports it.
    fn from_line_pair(_left: &str, _right: &str) -> Option<Self> {
        None
    }

    /// Generic items used when generation produced nothing usable.
    fn placeholders(count: usize) -> Vec<Self>;
}

/// First string value among `keys`, trimmed and non-empty.
fn string_field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| match value.get(*k)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

impl StructuredItem for Flashcard {
    const TASK: Task = Task::Flashcards;
    const KIND: &'static str = "flashcard";
    const KEYS: &'static [&'static str] = &["term", "definition"];
    const LINE_PAIRS: bool = true;

    fn from_value(value: &Value) -> Option<Self> {
        Some(Flashcard {
            term: string_field(value, &["term", "front", "concept"])?,
            definition: string_field(value, &["definition", "back", "meaning"])?,
        })
    }

    fn identity(&self) -> &str {
        &self.term
    }

    fn from_line_pair(left: &str, right: &str) -> Option<Self> {
        let (term, definition) = (left.trim(), right.trim());
        (!term.is_empty() && !definition.is_empty()).then(|| Flashcard::new(term, definition))
    }

    fn placeholders(count: usize) -> Vec<Self> {
        const CARDS: [(&str, &str); 3] = [
            ("Key Concept", "Important idea from your study materials"),
            ("Main Topic", "Central theme discussed in your content"),
            ("Critical Point", "Essential information to remember"),
        ];
        CARDS
            .iter()
            .cycle()
            .take(count)
            .map(|(t, d)| Flashcard::new(*t, *d))
            .collect()
    }
}

impl StructuredItem for QuizQuestion {
    const TASK: Task = Task::Quiz;
    const KIND: &'static str = "quiz question";
    const KEYS: &'static [&'static str] = &["question", "options", "correctAnswer", "explanation"];

    fn from_value(value: &Value) -> Option<Self> {
        let question = string_field(value, &["question", "prompt"])?;
        let raw_options = value
            .get("options")
            .or_else(|| value.get("choices"))?
            .as_array()?;
        if raw_options.len() != QuizQuestion::OPTION_COUNT {
            debug!(
                options = raw_options.len(),
                question = %question,
                "Skipping quiz question without exactly four options"
            );
            return None;
        }
        let options = raw_options
            .iter()
            .map(|o| match o {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect::<Option<Vec<String>>>()?;
        let correct_answer =
            string_field(value, &["correctAnswer", "correct_answer", "answer"])?;
        let explanation = string_field(value, &["explanation"]).unwrap_or_default();

        let item = QuizQuestion {
            question,
            options,
            correct_answer,
            explanation,
        };
        if !item.answer_is_listed() {
            warn!(
                question = %item.question,
                answer = %item.correct_answer,
                "Quiz correctAnswer is not one of the options; kept verbatim"
            );
        }
        Some(item)
    }

    fn identity(&self) -> &str {
        &self.question
    }

    fn placeholders(count: usize) -> Vec<Self> {
        let question = QuizQuestion {
            question: "Based on your study materials, which concept is most important?"
                .to_string(),
            options: ["Option A", "Option B", "Option C", "Option D"]
                .map(String::from)
                .to_vec(),
            correct_answer: "Option B".to_string(),
            explanation: "This relates to the key concepts in your uploaded content.".to_string(),
        };
        vec![question; count]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flashcard_requires_both_fields() {
        assert!(Flashcard::from_value(&json!({"term": "A"})).is_none());
        assert!(Flashcard::from_value(&json!({"term": " ", "definition": "B"})).is_none());
        let card = Flashcard::from_value(&json!({"term": " A ", "definition": "B"})).unwrap();
        assert_eq!(card, Flashcard::new("A", "B"));
    }

    #[test]
    fn flashcard_accepts_front_back_aliases() {
        let card = Flashcard::from_value(&json!({"front": "Q", "back": "A"})).unwrap();
        assert_eq!(card.term, "Q");
    }

    #[test]
    fn quiz_answer_is_kept_verbatim_even_when_unlisted() {
        let q = QuizQuestion::from_value(&json!({
            "question": "2+2?",
            "options": ["3", "4", "5", "6"],
            "correctAnswer": "four",
            "explanation": "Arithmetic."
        }))
        .unwrap();
        assert_eq!(q.correct_answer, "four");
        assert!(!q.answer_is_listed());
    }

    #[test]
    fn quiz_needs_options_and_answer() {
        assert!(QuizQuestion::from_value(&json!({"question": "Q", "correctAnswer": "A"})).is_none());
        assert!(
            QuizQuestion::from_value(&json!({"question": "Q", "options": ["A"], "correctAnswer": "A"}))
                .is_none()
        );
        let q = QuizQuestion::from_value(
            &json!({"question": "Q", "options": ["A", "B", "C", "D"], "correct_answer": "A"}),
        )
        .unwrap();
        assert_eq!(q.explanation, "");
    }

    #[test]
    fn quiz_requires_exactly_four_options() {
        let with = |options: Value| {
            QuizQuestion::from_value(&json!({
                "question": "Q",
                "options": options,
                "correctAnswer": "A"
            }))
        };
        assert!(with(json!(["A", "B"])).is_none());
        assert!(with(json!(["A", "B", "C"])).is_none());
        assert!(with(json!(["A", "B", "C", "D", "E"])).is_none());
        assert!(with(json!(["A", "B", " ", "D"])).is_none());
        assert!(with(json!(["A", "B", null, "D"])).is_none());
        assert_eq!(with(json!(["A", "B", 3, "D"])).unwrap().options[2], "3");
    }

    #[test]
    fn placeholders_pad_to_count() {
        let cards = Flashcard::placeholders(5);
        assert_eq!(cards.len(), 5);
        assert_eq!(cards[3].term, "Key Concept");
        assert!(QuizQuestion::placeholders(0).is_empty());
        let quiz = QuizQuestion::placeholders(2);
        assert!(quiz.iter().all(QuizQuestion::answer_is_listed));
    }

    #[test]
    fn only_flashcards_support_line_pairs() {
        assert!(Flashcard::from_line_pair("Atom", "Smallest unit").is_some());
        assert!(QuizQuestion::from_line_pair("Q", "A").is_none());
        assert!(Flashcard::LINE_PAIRS);
        assert!(!QuizQuestion::LINE_PAIRS);
    }
}
