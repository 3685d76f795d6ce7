//! CLI tests module
//!
//! Tests for argument parsing, document loading and output rendering.

use super::*;
use clap::Parser;
use std::path::PathBuf;
use tempfile::TempDir;

use studyforge_config::Config;
use studyforge_model::{Flashcard, QuizQuestion, Task};
use studyforge_utils::error::StudyError;
use studyforge_utils::exit_codes::ExitCode;

#[test]
fn test_cli_definition_is_valid() {
    build_cli().debug_assert();
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from([
        "studyforge",
        "flashcards",
        "--count",
        "8",
        "--doc",
        "a.txt",
        "--doc",
        "b.txt",
        "--grade",
        "11",
        "--json",
    ])
    .unwrap();

    assert!(matches!(cli.command, Commands::Flashcards { count: 8 }));
    assert_eq!(cli.docs, vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")]);
    assert_eq!(cli.grade, Some(11));
    assert!(cli.json);
}

#[test]
fn test_grade_outside_range_is_rejected() {
    assert!(Cli::try_parse_from(["studyforge", "--grade", "5", "topics"]).is_err());
    assert!(Cli::try_parse_from(["studyforge", "--grade", "13", "topics"]).is_err());
    assert!(Cli::try_parse_from(["studyforge", "--grade", "6", "topics"]).is_ok());
}

#[test]
fn test_default_counts_and_context_task() {
    let cli = Cli::try_parse_from(["studyforge", "quiz"]).unwrap();
    assert!(matches!(cli.command, Commands::Quiz { count: 5 }));

    let cli = Cli::try_parse_from(["studyforge", "context", "--task", "flashcards"]).unwrap();
    match cli.command {
        Commands::Context { task } => assert_eq!(Task::from(task), Task::Flashcards),
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn test_chat_takes_message_and_history() {
    let cli = Cli::try_parse_from([
        "studyforge",
        "chat",
        "What is ATP?",
        "--history",
        "turns.json",
    ])
    .unwrap();
    match cli.command {
        Commands::Chat { message, history } => {
            assert_eq!(message, "What is ATP?");
            assert_eq!(history, Some(PathBuf::from("turns.json")));
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn test_load_documents_names_and_numbers_files() {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("cells.txt");
    let second = dir.path().join("atoms.md");
    std::fs::write(&first, "Cells are small.").unwrap();
    std::fs::write(&second, "Atoms are smaller.").unwrap();

    let docs = load_documents(&[first, second]).unwrap();
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].id, 1);
    assert_eq!(docs[0].name, "cells.txt");
    assert_eq!(docs[1].content, "Atoms are smaller.");
    assert!(docs.iter().all(|d| d.is_ready()));
}

#[test]
fn test_missing_document_maps_to_cli_exit_code() {
    let dir = TempDir::new().unwrap();
    let err = load_documents(&[dir.path().join("missing.txt")]).unwrap_err();
    assert!(matches!(err, StudyError::Document { .. }));
    assert_eq!(err.to_exit_code(), ExitCode::CLI_ARGS);
}

#[test]
fn test_render_flashcards_numbers_cards() {
    let text = commands::render_flashcards(&[
        Flashcard::new("Atom", "Smallest unit"),
        Flashcard::new("Cell", "Unit of life"),
    ]);
    assert_eq!(text, "1. **Atom**: Smallest unit\n2. **Cell**: Unit of life");
}

#[test]
fn test_render_quiz_lists_lettered_options() {
    let quiz = vec![QuizQuestion {
        question: "2 + 2?".to_string(),
        options: ["3", "4", "5", "6"].map(String::from).to_vec(),
        correct_answer: "4".to_string(),
        explanation: "Basic addition.".to_string(),
    }];
    let text = commands::render_quiz(&quiz);
    assert!(text.starts_with("### Question 1\n2 + 2?\n- A) 3\n- B) 4"));
    assert!(text.contains("**Answer**: 4"));
    assert!(text.ends_with("*Basic addition.*"));
}

#[test]
fn test_context_command_runs_offline() {
    let config = Config::builder().build().unwrap();
    let docs = vec![studyforge_model::Document::new(1, "Notes", "One. Two. Three.")];
    let inv = commands::Invocation {
        config: &config,
        documents: &docs,
        json: true,
    };
    assert!(commands::execute_context_command(&inv, Task::Quiz).is_ok());
}
