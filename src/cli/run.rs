//! CLI entry point and dispatch logic
//!
//! This module owns the `run()` function which:
//! - Parses CLI arguments
//! - Builds CliArgs and discovers Config
//! - Installs tracing
//! - Creates the tokio runtime
//! - Dispatches to command handlers
//! - Handles all error output

use clap::Parser;
use tracing::debug;

use super::args::{Cli, Commands};
use super::commands::{self, Invocation};

use studyforge_config::{CliArgs, Config};
use studyforge_utils::error::{ConfigError, StudyError};
use studyforge_utils::exit_codes::ExitCode;
use studyforge_utils::logging::init_tracing;
use studyforge_utils::redaction::redact_error_message;

/// Main CLI execution function.
///
/// Handles ALL output including errors and returns the exit code to use on
/// failure. main.rs only calls `std::process::exit`.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();

    let cli_args = CliArgs {
        config_path: cli.config.clone(),
        model: cli.model.clone(),
        grade: cli.grade,
        verbose: cli.verbose.then_some(true),
    };

    let config = match Config::discover(&cli_args) {
        Ok(config) => config,
        Err(err) => {
            let study_error = match err.downcast::<ConfigError>() {
                Ok(config_error) => StudyError::Config(config_error),
                Err(other) => StudyError::Config(ConfigError::DiscoveryFailed {
                    reason: format!("{other:#}"),
                }),
            };
            eprintln!("{}", study_error.display_for_user());
            return Err(study_error.to_exit_code());
        }
    };

    // A subscriber may already be installed when embedded; keep it.
    let _ = init_tracing(config.verbose());

    let documents = match commands::load_documents(&cli.docs) {
        Ok(documents) => documents,
        Err(err) => {
            eprintln!("{}", err.display_for_user());
            return Err(err.to_exit_code());
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("✗ Failed to create async runtime: {e}");
            return Err(ExitCode::INTERNAL);
        }
    };

    debug!(
        command = ?cli.command,
        documents = documents.len(),
        model = config.model_id(),
        grade = config.grade().get(),
        "Dispatching command"
    );

    let inv = Invocation {
        config: &config,
        documents: &documents,
        json: cli.json,
    };

    let result = rt.block_on(async {
        match cli.command {
            Commands::Topics => commands::execute_topics_command(&inv).await,
            Commands::Welcome => commands::execute_welcome_command(&inv).await,
            Commands::Session => commands::execute_session_command(&inv).await,
            Commands::Chat { message, history } => {
                commands::execute_chat_command(&inv, &message, history.as_deref()).await
            }
            Commands::Flashcards { count } => commands::execute_flashcards_command(&inv, count).await,
            Commands::Quiz { count } => commands::execute_quiz_command(&inv, count).await,
            Commands::Analyze { quiz, answers } => {
                commands::execute_analyze_command(&inv, &quiz, &answers).await
            }
            Commands::Context { task } => commands::execute_context_command(&inv, task.into()),
            Commands::Usage => commands::execute_usage_command(&config, cli.json),
            Commands::Models => commands::execute_models_command(&config, cli.json),
            Commands::Check => commands::execute_check_command(&config, cli.json).await,
            Commands::Config => commands::execute_config_command(&config, cli.json),
        }
    });

    if let Err(error) = result {
        if let Some(study_error) = error.downcast_ref::<StudyError>() {
            eprintln!("{}", study_error.display_for_user());
            return Err(study_error.to_exit_code());
        }

        eprintln!("✗ Unexpected error: {}", redact_error_message(&format!("{error:#}")));
        eprintln!("\n  General troubleshooting:");
        eprintln!("    - Run with --verbose for more detailed output");
        eprintln!("    - Run `studyforge config` to see the effective configuration");
        return Err(ExitCode::INTERNAL);
    }

    Ok(())
}
