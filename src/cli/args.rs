//! CLI argument definitions and parsing structures
//!
//! This module defines the command-line interface structure using clap,
//! including the main `Cli` struct and the subcommand enum.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use studyforge_model::Task;

/// studyforge - study assistant for plain-text course materials
#[derive(Parser, Debug)]
#[command(name = "studyforge")]
#[command(about = "Generate key topics, tutoring answers, flashcards and quizzes from study materials")]
#[command(long_about = r#"
studyforge assembles a token-budgeted context from your study materials and asks
a generation service for key topics, a welcome message, tutoring answers,
flashcards and multiple-choice quizzes, all grounded in those materials.

EXAMPLES:
  # Key topics for two chapters at a 10th grade level
  studyforge --doc ch1.txt --doc ch2.txt --grade 10 topics

  # Ask a question about the materials
  studyforge --doc ch1.txt chat "What does the mitochondria do?"

  # Eight flashcards as JSON
  studyforge --doc ch1.txt --json flashcards --count 8

  # Show the context a quiz prompt would carry (no generation call)
  studyforge --doc ch1.txt context --task quiz

  # How many free generations are left on this device
  studyforge usage

CONFIGURATION:
  Configuration is loaded with precedence: CLI flags > environment > config file > defaults
  Config file is discovered by searching upward from CWD for .studyforge/config.toml,
  or read from $STUDYFORGE_HOME/config.toml
  Set STUDYFORGE_PROXY_URL and STUDYFORGE_ACCESS_TOKEN to use your study proxy;
  without a token, a limited number of anonymous generations are available
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Model id to generate with (see `studyforge models`)
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Student grade level (6-12)
    #[arg(long, global = true, value_parser = clap::value_parser!(u8).range(6..=12))]
    pub grade: Option<u8>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit JSON instead of markdown text
    #[arg(long, global = true)]
    pub json: bool,

    /// Study material file (UTF-8 text); repeat for several documents
    #[arg(long = "doc", global = true, value_name = "PATH")]
    pub docs: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Summarise the key topics of the materials
    ///
    /// EXAMPLES:
    ///   studyforge --doc notes.txt topics
    Topics,

    /// Generate the tutor's welcome message
    Welcome,

    /// Start a study session: welcome message and key topics together
    Session,

    /// Ask the tutor a question about the materials
    ///
    /// EXAMPLES:
    ///   studyforge --doc notes.txt chat "Explain photosynthesis"
    ///   studyforge --doc notes.txt chat "And respiration?" --history turns.json
    Chat {
        /// The question to ask
        message: String,

        /// JSON file with previous turns: `[{"role": "user", "text": "..."}, ...]`
        #[arg(long)]
        history: Option<PathBuf>,
    },

    /// Generate flashcards
    Flashcards {
        /// Number of flashcards to generate
        #[arg(short = 'n', long, default_value_t = 10)]
        count: usize,
    },

    /// Generate a multiple-choice quiz
    Quiz {
        /// Number of questions to generate
        #[arg(short = 'n', long, default_value_t = 5)]
        count: usize,
    },

    /// Get feedback on a completed quiz
    ///
    /// EXAMPLES:
    ///   studyforge --json --doc notes.txt quiz > quiz.json
    ///   studyforge --doc notes.txt analyze --quiz quiz.json --answers answers.json
    Analyze {
        /// Quiz JSON as printed by `studyforge --json quiz`
        #[arg(long)]
        quiz: PathBuf,

        /// JSON array of answers, one per question (`null` when unanswered)
        #[arg(long)]
        answers: PathBuf,
    },

    /// Print the budgeted context for a task without calling the generator
    Context {
        /// Task whose context budget is used
        #[arg(long, value_enum, default_value_t = TaskArg::Topics)]
        task: TaskArg,
    },

    /// Show anonymous usage against the free limit
    Usage,

    /// List the available models
    Models,

    /// Check that a model answers through the configured backend
    Check,

    /// Show the effective configuration and where each value came from
    Config,
}

/// Study tasks selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TaskArg {
    Topics,
    Welcome,
    Chat,
    Flashcards,
    Quiz,
}

impl From<TaskArg> for Task {
    fn from(task: TaskArg) -> Self {
        match task {
            TaskArg::Topics => Task::Topics,
            TaskArg::Welcome => Task::Welcome,
            TaskArg::Chat => Task::Chat,
            TaskArg::Flashcards => Task::Flashcards,
            TaskArg::Quiz => Task::Quiz,
        }
    }
}

/// Build the clap command (used by tests and completions).
#[must_use]
pub fn build_cli() -> clap::Command {
    <Cli as clap::CommandFactory>::command()
}
