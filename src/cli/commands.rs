//! Command implementations for the studyforge CLI
//!
//! Every command writes its result to stdout, as markdown text or as JSON
//! when `--json` is given. Diagnostics go through `tracing` to stderr.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

use studyforge_config::Config;
use studyforge_context::{ContextBuilder, StudyContext};
use studyforge_engine::StudyEngine;
use studyforge_llm::{AccessMode, FileUsageCounter, UsageCounter};
use studyforge_model::{
    ChatTurn, Document, Flashcard, GenerationResult, MODELS, QuizQuestion, Task,
};
use studyforge_utils::error::{SafetyError, StudyError};

/// Options shared by the generating commands.
pub struct Invocation<'a> {
    pub config: &'a Config,
    pub documents: &'a [Document],
    pub json: bool,
}

/// Read `--doc` files as plain-text documents, numbered from 1.
pub fn load_documents(paths: &[PathBuf]) -> Result<Vec<Document>, StudyError> {
    paths
        .iter()
        .enumerate()
        .map(|(i, path)| {
            let content = std::fs::read_to_string(path).map_err(|e| StudyError::Document {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
            let name = path
                .file_name()
                .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
            Ok(Document::new(i as u64 + 1, name, content))
        })
        .collect()
}

fn engine(config: &Config) -> Result<StudyEngine> {
    StudyEngine::from_config(config)
        .map_err(StudyError::from)
        .context("Failed to set up the generation backend")
}

fn safety(error: SafetyError) -> anyhow::Error {
    StudyError::Safety(error).into()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}

fn print_result(result: &GenerationResult, json: bool) -> Result<()> {
    if json {
        return print_json(result);
    }
    println!("{}", result.text);
    if let Some(sources) = result.sources.as_deref().filter(|s| !s.is_empty()) {
        println!("\nSources:");
        for source in sources {
            println!("  - {} ({})", source.title, source.uri);
        }
    }
    Ok(())
}

pub async fn execute_topics_command(inv: &Invocation<'_>) -> Result<()> {
    let result = engine(inv.config)?
        .generate_key_topics(inv.documents, inv.config.grade(), inv.config.model_id())
        .await
        .map_err(safety)?;
    print_result(&result, inv.json)
}

pub async fn execute_welcome_command(inv: &Invocation<'_>) -> Result<()> {
    let result = engine(inv.config)?
        .generate_welcome(inv.documents, inv.config.grade(), inv.config.model_id())
        .await
        .map_err(safety)?;
    print_result(&result, inv.json)
}

pub async fn execute_session_command(inv: &Invocation<'_>) -> Result<()> {
    let session = engine(inv.config)?
        .start_session(inv.documents, inv.config.grade(), inv.config.model_id())
        .await
        .map_err(safety)?;
    if inv.json {
        return print_json(&session);
    }
    print_result(&session.welcome, false)?;
    println!();
    print_result(&session.topics, false)
}

pub async fn execute_chat_command(
    inv: &Invocation<'_>,
    message: &str,
    history: Option<&Path>,
) -> Result<()> {
    let history: Vec<ChatTurn> = match history {
        Some(path) => read_json(path, "chat history")?,
        None => Vec::new(),
    };
    let result = engine(inv.config)?
        .send_message(
            &history,
            message,
            inv.documents,
            inv.config.grade(),
            inv.config.model_id(),
        )
        .await
        .map_err(safety)?;
    print_result(&result, inv.json)
}

pub async fn execute_flashcards_command(inv: &Invocation<'_>, count: usize) -> Result<()> {
    let cards = engine(inv.config)?
        .generate_flashcards(inv.documents, inv.config.grade(), inv.config.model_id(), count)
        .await;
    if inv.json {
        return print_json(&cards);
    }
    println!("{}", render_flashcards(&cards));
    Ok(())
}

pub async fn execute_quiz_command(inv: &Invocation<'_>, count: usize) -> Result<()> {
    let quiz = engine(inv.config)?
        .generate_quiz(inv.documents, inv.config.grade(), inv.config.model_id(), count)
        .await;
    if inv.json {
        return print_json(&quiz);
    }
    println!("{}", render_quiz(&quiz));
    Ok(())
}

pub async fn execute_analyze_command(
    inv: &Invocation<'_>,
    quiz_path: &Path,
    answers_path: &Path,
) -> Result<()> {
    let quiz: Vec<QuizQuestion> = read_json(quiz_path, "quiz")?;
    let answers: Vec<Option<String>> = read_json(answers_path, "answers")?;
    let analysis = engine(inv.config)?
        .analyze_quiz_results(
            &quiz,
            &answers,
            inv.documents,
            inv.config.grade(),
            inv.config.model_id(),
        )
        .await;
    if inv.json {
        return print_json(&serde_json::json!({ "analysis": analysis }));
    }
    println!("{analysis}");
    Ok(())
}

#[derive(Serialize)]
struct ContextReport<'a> {
    task: Task,
    budget: studyforge_context::ContextBudget,
    tokens: usize,
    #[serde(flatten)]
    context: &'a StudyContext,
}

/// Print the budgeted context for `task`. Makes no generation call.
pub fn execute_context_command(inv: &Invocation<'_>, task: Task) -> Result<()> {
    let budget = inv.config.budget_for(task);
    let context = ContextBuilder::new(budget).build(inv.documents);

    if inv.json {
        return print_json(&ContextReport {
            task,
            budget,
            tokens: context.tokens_used(),
            context: &context,
        });
    }

    if context.is_empty() {
        println!("(no ready study materials)");
    } else {
        println!("{}", context.content());
    }
    eprintln!();
    eprintln!(
        "Estimated tokens: {} / {} (task: {task}, blake3: {})",
        context.tokens_used(),
        budget.total_budget_tokens,
        short_hash(&context.blake3_hash)
    );
    for block in &context.evidence {
        eprintln!(
            "  {}: {}/{} chunks, ~{} tokens",
            block.name, block.chunks_included, block.chunks_total, block.tokens
        );
    }
    Ok(())
}

#[derive(Serialize)]
struct UsageReport {
    authenticated: bool,
    used: u32,
    limit: u32,
    remaining: u32,
    usage_file: String,
}

/// Print the anonymous usage count. Makes no generation call.
pub fn execute_usage_command(config: &Config, json: bool) -> Result<()> {
    let counter = FileUsageCounter::new(config.usage_file()).map_err(StudyError::from)?;
    let used = counter.get().map_err(StudyError::from)?;
    let limit = config.anonymous_limit();
    let report = UsageReport {
        authenticated: config.access_token().is_some(),
        used,
        limit,
        remaining: limit.saturating_sub(used),
        usage_file: counter.path().to_string(),
    };

    if json {
        return print_json(&report);
    }
    if report.authenticated {
        println!("Signed in: generations are not limited by the anonymous cap.");
    }
    println!("Anonymous generations used: {}/{}", report.used, report.limit);
    println!("Remaining: {}", report.remaining);
    println!("Counter file: {}", report.usage_file);
    Ok(())
}

pub fn execute_models_command(config: &Config, json: bool) -> Result<()> {
    if json {
        return print_json(&MODELS);
    }
    for model in MODELS {
        let marker = if model.id == config.model_id() { "*" } else { " " };
        let availability = if model.is_available { "" } else { " (unavailable)" };
        println!("{marker} {} - {}{availability}", model.id, model.name);
        println!("    {}", model.description);
    }
    Ok(())
}

pub async fn execute_check_command(config: &Config, json: bool) -> Result<()> {
    let engine = engine(config)?;
    let gateway = engine.gateway();
    let access = match gateway.access() {
        AccessMode::Authenticated => "authenticated".to_string(),
        AccessMode::Anonymous { limit } => format!("anonymous (limit {limit})"),
    };
    let model = gateway
        .check_connection(&[config.model_id()])
        .await
        .map_err(StudyError::from)?;

    if json {
        return print_json(&serde_json::json!({
            "ok": true,
            "model": model.id,
            "provider": gateway.provider_name(),
            "access": access,
        }));
    }
    println!(
        "✓ {} answered through the {} backend ({access})",
        model.name,
        gateway.provider_name()
    );
    Ok(())
}

pub fn execute_config_command(config: &Config, json: bool) -> Result<()> {
    let effective = config.effective_config();
    if json {
        let map: serde_json::Map<String, serde_json::Value> = effective
            .into_iter()
            .map(|(key, (value, source))| {
                (key, serde_json::json!({ "value": value, "source": source }))
            })
            .collect();
        return print_json(&map);
    }
    for (key, (value, source)) in effective {
        println!("{key} = {value}  [{source}]");
    }
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let text = std::fs::read_to_string(path).map_err(|e| StudyError::Document {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&text).map_err(|e| {
        StudyError::Document {
            path: path.display().to_string(),
            reason: format!("invalid {what} JSON: {e}"),
        }
        .into()
    })
}

fn short_hash(hash: &str) -> &str {
    hash.get(..8).unwrap_or(hash)
}

/// Markdown rendering of flashcards.
pub fn render_flashcards(cards: &[Flashcard]) -> String {
    cards
        .iter()
        .enumerate()
        .map(|(i, card)| format!("{}. **{}**: {}", i + 1, card.term, card.definition))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Markdown rendering of a quiz, answers included.
pub fn render_quiz(quiz: &[QuizQuestion]) -> String {
    const LETTERS: [char; 6] = ['A', 'B', 'C', 'D', 'E', 'F'];
    quiz.iter()
        .enumerate()
        .map(|(i, q)| {
            let mut out = format!("### Question {}\n{}\n", i + 1, q.question);
            for (j, option) in q.options.iter().enumerate() {
                let letter = LETTERS.get(j).copied().unwrap_or('-');
                out.push_str(&format!("- {letter}) {option}\n"));
            }
            out.push_str(&format!("\n**Answer**: {}", q.correct_answer));
            if !q.explanation.is_empty() {
                out.push_str(&format!("\n*{}*", q.explanation));
            }
            out
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
