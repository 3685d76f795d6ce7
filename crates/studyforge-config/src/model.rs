use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use studyforge_context::ContextBudget;
use studyforge_model::{DEFAULT_MODEL_ID, GradeLevel, Task};

/// Anonymous generations allowed before an access token is required.
pub const DEFAULT_ANON_LIMIT: u32 = 10;

/// Environment variable holding the access token unless `[proxy].access_token_env` says otherwise.
pub const DEFAULT_ACCESS_TOKEN_ENV: &str = "STUDYFORGE_ACCESS_TOKEN";

/// Per-request HTTP timeout when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Where a configuration value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Cli,
    Env(String),
    ConfigFile(PathBuf),
    Programmatic,
    Defaults,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env(var) => write!(f, "environment ({var})"),
            Self::ConfigFile(path) => write!(f, "config file ({})", path.display()),
            Self::Programmatic => write!(f, "programmatic"),
            Self::Defaults => write!(f, "defaults"),
        }
    }
}

/// `[defaults]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    pub model: Option<String>,
    pub grade: Option<u8>,
    pub verbose: Option<bool>,
}

/// `[proxy]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProxyConfig {
    /// Base URL of the generation proxy; `/functions/v1/ai-generate` is appended.
    pub base_url: Option<String>,
    /// Name of the environment variable holding the bearer token.
    pub access_token_env: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// `[anonymous]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AnonymousConfig {
    pub limit: Option<u32>,
    /// JSON file holding the anonymous usage count.
    pub usage_file: Option<PathBuf>,
}

/// One `[budgets.<task>]` table. Unset fields keep the built-in preset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct BudgetOverride {
    pub total: Option<usize>,
    pub per_doc: Option<usize>,
    pub chunk: Option<usize>,
    pub headings: Option<bool>,
}

impl BudgetOverride {
    pub(crate) fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the set fields on top of `base`.
    #[must_use]
    pub fn apply(&self, base: ContextBudget) -> ContextBudget {
        ContextBudget::new(
            self.total.unwrap_or(base.total_budget_tokens),
            self.per_doc.unwrap_or(base.per_doc_budget_tokens),
            self.chunk.unwrap_or(base.chunk_tokens),
            self.headings.unwrap_or(base.include_headings),
        )
    }
}

/// `[budgets]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct BudgetsConfig {
    pub welcome: Option<BudgetOverride>,
    pub topics: Option<BudgetOverride>,
    pub chat: Option<BudgetOverride>,
    pub structured: Option<BudgetOverride>,
}

impl BudgetsConfig {
    /// Named overrides in a fixed order, for validation and reporting.
    pub(crate) fn entries(&self) -> [(&'static str, ContextBudget, Option<&BudgetOverride>); 4] {
        [
            ("welcome", ContextBudget::WELCOME, self.welcome.as_ref()),
            ("topics", ContextBudget::TOPICS, self.topics.as_ref()),
            ("chat", ContextBudget::CHAT, self.chat.as_ref()),
            ("structured", ContextBudget::STRUCTURED, self.structured.as_ref()),
        ]
    }
}

/// Values supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config_path: Option<PathBuf>,
    pub model: Option<String>,
    pub grade: Option<u8>,
    pub verbose: Option<bool>,
}

/// Effective configuration after merging CLI, environment, file and defaults.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub defaults: Defaults,
    pub proxy: ProxyConfig,
    pub anonymous: AnonymousConfig,
    pub budgets: BudgetsConfig,
    /// Which layer supplied each key.
    pub source_attribution: HashMap<String, ConfigSource>,
}

impl Config {
    /// Model identifier to use.
    #[must_use]
    pub fn model_id(&self) -> &str {
        self.defaults.model.as_deref().unwrap_or(DEFAULT_MODEL_ID)
    }

    /// Student grade level. Validation guarantees a configured grade is in range.
    #[must_use]
    pub fn grade(&self) -> GradeLevel {
        self.defaults
            .grade
            .and_then(|g| GradeLevel::new(g).ok())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn verbose(&self) -> bool {
        self.defaults.verbose.unwrap_or(false)
    }

    #[must_use]
    pub fn proxy_base_url(&self) -> Option<&str> {
        self.proxy
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }

    #[must_use]
    pub fn access_token_env(&self) -> &str {
        self.proxy
            .access_token_env
            .as_deref()
            .unwrap_or(DEFAULT_ACCESS_TOKEN_ENV)
    }

    /// Read the access token from the configured environment variable.
    ///
    /// An empty variable counts as unset.
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        std::env::var(self.access_token_env())
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.proxy.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    #[must_use]
    pub fn anonymous_limit(&self) -> u32 {
        self.anonymous.limit.unwrap_or(DEFAULT_ANON_LIMIT)
    }

    /// Location of the anonymous usage store.
    ///
    /// Defaults to `<data dir>/studyforge/usage.json`, or `.studyforge/usage.json`
    /// when the platform has no data directory.
    #[must_use]
    pub fn usage_file(&self) -> PathBuf {
        if let Some(path) = &self.anonymous.usage_file {
            return path.clone();
        }
        dirs::data_dir()
            .map(|d| d.join("studyforge"))
            .unwrap_or_else(|| PathBuf::from(".studyforge"))
            .join("usage.json")
    }

    /// Context budget for a task, with any configured override applied.
    #[must_use]
    pub fn budget_for(&self, task: Task) -> ContextBudget {
        let (base, custom) = match task {
            Task::Welcome => (ContextBudget::WELCOME, self.budgets.welcome.as_ref()),
            Task::Chat => (ContextBudget::CHAT, self.budgets.chat.as_ref()),
            Task::Flashcards | Task::Quiz => {
                (ContextBudget::STRUCTURED, self.budgets.structured.as_ref())
            }
            Task::Topics | Task::Analysis | Task::Probe => {
                (ContextBudget::TOPICS, self.budgets.topics.as_ref())
            }
        };
        custom.map_or(base, |o| o.apply(base))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_fall_back_to_defaults() {
        let config = Config::default();
        assert_eq!(config.model_id(), DEFAULT_MODEL_ID);
        assert_eq!(config.grade().get(), 9);
        assert!(!config.verbose());
        assert_eq!(config.anonymous_limit(), 10);
        assert_eq!(config.timeout(), Duration::from_secs(60));
        assert_eq!(config.access_token_env(), "STUDYFORGE_ACCESS_TOKEN");
        assert!(config.usage_file().ends_with("studyforge/usage.json")
            || config.usage_file().ends_with(".studyforge/usage.json"));
    }

    #[test]
    fn blank_proxy_url_counts_as_unset() {
        let mut config = Config::default();
        config.proxy.base_url = Some("   ".to_string());
        assert_eq!(config.proxy_base_url(), None);
    }

    #[test]
    fn budget_override_replaces_only_set_fields() {
        let mut config = Config::default();
        config.budgets.structured = Some(BudgetOverride {
            total: Some(1200),
            ..BudgetOverride::default()
        });
        let budget = config.budget_for(Task::Quiz);
        assert_eq!(budget.total_budget_tokens, 1200);
        assert_eq!(budget.chunk_tokens, ContextBudget::STRUCTURED.chunk_tokens);
        assert_eq!(config.budget_for(Task::Welcome), ContextBudget::WELCOME);
    }
}
