//! Public API boundary tests
//!
//! Uses ONLY items re-exported from the crate root, so a change that drops a
//! re-export or breaks its shape fails here first.

use studyforge::{
    AiModel, CascadeStage, ChatTurn, Config, ContextBudget, ContextBuilder, DEFAULT_MODEL_ID,
    Document, DocumentStatus, ExitCode, GradeLevel, LlmError, MODELS, SafetyError, StudyError,
    Task, TaskBudgets, UserFriendlyError, estimate_tokens, find_model,
};

#[test]
fn test_default_model_is_listed_and_available() {
    let model: &AiModel = find_model(DEFAULT_MODEL_ID).unwrap();
    assert!(model.is_available);
    assert!(MODELS.iter().any(|m| m.id == DEFAULT_MODEL_ID));
}

#[test]
fn test_config_builder_defaults() {
    let config = Config::builder().build().unwrap();
    assert_eq!(config.model_id(), DEFAULT_MODEL_ID);
    assert_eq!(config.anonymous_limit(), 10);
    assert_eq!(config.budget_for(Task::Quiz), ContextBudget::STRUCTURED);
    assert_eq!(TaskBudgets::from_config(&config), TaskBudgets::default());
}

#[test]
fn test_grade_levels_cover_six_to_twelve() {
    assert!(GradeLevel::new(5).is_err());
    assert!(GradeLevel::new(13).is_err());
    assert_eq!(GradeLevel::all().count(), 7);
}

#[test]
fn test_only_ready_documents_reach_the_context() {
    let mut pending = Document::new(2, "Pending", "Still uploading.");
    pending.status = DocumentStatus::Processing;
    let docs = vec![Document::new(1, "Ready", "Plants need light."), pending];

    let context = ContextBuilder::new(ContextBudget::TOPICS).build(&docs);
    assert!(context.content().contains("Plants need light."));
    assert!(!context.content().contains("Still uploading."));
    assert_eq!(context.tokens_used(), estimate_tokens(context.content()));
}

#[test]
fn test_errors_map_to_exit_codes() {
    let blocked: StudyError = SafetyError::new("HARM_CATEGORY").into();
    assert_eq!(blocked.to_exit_code(), ExitCode::CONTENT_BLOCKED);

    let backend: StudyError = LlmError::Transport("connection reset".into()).into();
    assert_eq!(backend.to_exit_code(), ExitCode::BACKEND_FAILURE);
    assert!(!backend.suggestions().is_empty());
}

#[test]
fn test_cascade_stages_are_ordered() {
    assert_eq!(CascadeStage::ORDER.first(), Some(&CascadeStage::Direct));
    assert_eq!(CascadeStage::ORDER.last(), Some(&CascadeStage::Placeholders));
}

#[test]
fn test_chat_turns_serialize_with_roles() {
    let json = serde_json::to_value([ChatTurn::user("Hi"), ChatTurn::model("Hello")]).unwrap();
    assert_eq!(json[0]["role"], "user");
    assert_eq!(json[1]["role"], "model");
}
