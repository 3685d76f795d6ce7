//! Core data types shared across studyforge crates.
//!
//! Everything here is plain data: documents handed in by the caller, the grade
//! level a response is pitched at, the structured study items produced by the
//! generation pipeline, and the registry of models the gateway can address.
//! None of these types perform I/O.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Documents
// ============================================================================

/// Processing state of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    #[default]
    Ready,
    Processing,
    Error,
}

/// A study document supplied by the caller. Read-only to the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: u64,
    pub name: String,
    pub content: String,
    #[serde(default)]
    pub status: DocumentStatus,
}

impl Document {
    /// Create a ready document.
    pub fn new(id: u64, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            content: content.into(),
            status: DocumentStatus::Ready,
        }
    }

    /// Whether the document can contribute to a context block.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.status == DocumentStatus::Ready
    }
}

// ============================================================================
// Grade levels
// ============================================================================

/// School grade a response is pitched at (6 through 12 inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct GradeLevel(u8);

/// Error returned when a grade outside 6..=12 is requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidGrade(pub i64);

impl fmt::Display for InvalidGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "grade level {} is out of range (expected {}-{})",
            self.0,
            GradeLevel::MIN.0,
            GradeLevel::MAX.0
        )
    }
}

impl std::error::Error for InvalidGrade {}

impl GradeLevel {
    pub const MIN: Self = Self(6);
    pub const MAX: Self = Self(12);

    /// Validate and wrap a grade number.
    pub fn new(grade: u8) -> Result<Self, InvalidGrade> {
        if (Self::MIN.0..=Self::MAX.0).contains(&grade) {
            Ok(Self(grade))
        } else {
            Err(InvalidGrade(i64::from(grade)))
        }
    }

    /// Parse a grade from user input such as `"9"` or `"9th"`.
    pub fn parse(s: &str) -> Result<Self, InvalidGrade> {
        let digits: String = s.trim().chars().take_while(char::is_ascii_digit).collect();
        let value: i64 = digits.parse().map_err(|_| InvalidGrade(-1))?;
        u8::try_from(value)
            .map_err(|_| InvalidGrade(value))
            .and_then(Self::new)
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// All supported grades in ascending order.
    pub fn all() -> impl Iterator<Item = Self> {
        (Self::MIN.0..=Self::MAX.0).map(Self)
    }

    /// Display label, e.g. `"9th Grade"`.
    #[must_use]
    pub fn label(self) -> String {
        format!("{}th Grade", self.0)
    }

    /// Short description of how explanations are pitched at this grade.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self.0 {
            6 => "Simple terms & basic concepts",
            7 => "Building on fundamentals",
            8 => "Intro to more complex ideas",
            9 => "High school level foundations",
            10 => "Deeper analysis & connections",
            11 => "Advanced topics & critical thinking",
            _ => "College-prep level explanations",
        }
    }
}

impl Default for GradeLevel {
    fn default() -> Self {
        Self(9)
    }
}

impl TryFrom<u8> for GradeLevel {
    type Error = InvalidGrade;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<GradeLevel> for u8 {
    fn from(grade: GradeLevel) -> Self {
        grade.0
    }
}

impl fmt::Display for GradeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Structured study items
// ============================================================================

/// A term/definition study card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub term: String,
    pub definition: String,
}

impl Flashcard {
    pub fn new(term: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            definition: definition.into(),
        }
    }
}

/// A multiple-choice quiz question.
///
/// `correct_answer` is carried exactly as the model produced it. Whether it is
/// one of `options` is reported by [`QuizQuestion::answer_is_listed`] and never
/// corrected locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: String,
}

impl QuizQuestion {
    /// Number of options a well-formed question carries.
    pub const OPTION_COUNT: usize = 4;

    /// Whether `correct_answer` appears verbatim among `options`.
    #[must_use]
    pub fn answer_is_listed(&self) -> bool {
        self.options.iter().any(|o| o == &self.correct_answer)
    }
}

// ============================================================================
// Chat
// ============================================================================

/// Author of a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
    System,
}

impl ChatRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
            Self::System => "system",
        }
    }
}

/// One turn of tutoring conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<WebSource>>,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
            sources: None,
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            text: text.into(),
            sources: None,
        }
    }
}

// ============================================================================
// Generation results
// ============================================================================

/// A grounding source attached to a model answer. Passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebSource {
    pub uri: String,
    pub title: String,
}

/// Text produced by one generation call, plus any grounding sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub text: String,
    #[serde(default)]
    pub sources: Option<Vec<WebSource>>,
    /// Set when `text` is a failure notice rather than a model answer.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub fallback: bool,
}

impl GenerationResult {
    /// A result with no sources.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sources: None,
            fallback: false,
        }
    }

    /// Failure notice shown in place of a model answer.
    pub fn fallback(text: impl Into<String>) -> Self {
        Self {
            fallback: true,
            ..Self::text(text)
        }
    }
}

/// The kind of study task a generation call serves.
///
/// The proxy receives this as its `action` field; structured tasks are the
/// ones whose answers must be JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(any(test, feature = "test-utils"), derive(strum::VariantNames))]
#[cfg_attr(any(test, feature = "test-utils"), strum(serialize_all = "snake_case"))]
pub enum Task {
    Topics,
    Welcome,
    Chat,
    Flashcards,
    Quiz,
    Analysis,
    Probe,
}

impl Task {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Topics => "topics",
            Self::Welcome => "welcome",
            Self::Chat => "chat",
            Self::Flashcards => "flashcards",
            Self::Quiz => "quiz",
            Self::Analysis => "analysis",
            Self::Probe => "probe",
        }
    }

    /// Parse a task name as used on the wire.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "topics" => Some(Self::Topics),
            "welcome" => Some(Self::Welcome),
            "chat" => Some(Self::Chat),
            "flashcards" => Some(Self::Flashcards),
            "quiz" => Some(Self::Quiz),
            "analysis" => Some(Self::Analysis),
            "probe" => Some(Self::Probe),
            _ => None,
        }
    }

    /// Whether responses for this task must be a JSON array.
    #[must_use]
    pub const fn expects_json(self) -> bool {
        matches!(self, Self::Flashcards | Self::Quiz)
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Model registry
// ============================================================================

/// Identifier of the model used when none is configured.
pub const DEFAULT_MODEL_ID: &str = "gemini-2.5-flash";

/// A model the gateway can route to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiModel {
    /// Stable identifier used in configuration and on the CLI.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    pub provider: &'static str,
    /// Name sent to the provider.
    pub model_name: &'static str,
    pub description: &'static str,
    pub is_available: bool,
}

/// Built-in model registry.
pub const MODELS: &[AiModel] = &[AiModel {
    id: "gemini-2.5-flash",
    name: "Gemini 2.5 Flash",
    provider: "gemini",
    model_name: "gemini-2.5-flash",
    description: "Latest Gemini 2.5 model with enhanced speed and advanced capabilities.",
    is_available: true,
}];

/// Look up a model by identifier.
#[must_use]
pub fn find_model(id: &str) -> Option<&'static AiModel> {
    MODELS.iter().find(|m| m.id == id)
}
