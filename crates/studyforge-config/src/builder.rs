use std::path::PathBuf;

use studyforge_model::Task;
use studyforge_utils::error::ConfigError;

use crate::discovery::TRACKED_KEYS;
use crate::model::{BudgetOverride, Config, ConfigSource};

impl Config {
    /// Create a builder for programmatic configuration.
    ///
    /// Use this when embedding studyforge without environment variables or a
    /// config file.
    ///
    /// # Example
    ///
    /// ```rust
    /// use studyforge_config::Config;
    ///
    /// let config = Config::builder()
    ///     .grade(10)
    ///     .proxy_base_url("https://proxy.example")
    ///     .anonymous_limit(3)
    ///     .build()
    ///     .expect("valid config");
    /// assert_eq!(config.anonymous_limit(), 3);
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Fluent builder for [`Config`].
///
/// Every value set here is attributed to [`ConfigSource::Programmatic`].
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    fn set(mut self, key: &str, apply: impl FnOnce(&mut Config)) -> Self {
        apply(&mut self.config);
        self.config
            .source_attribution
            .insert(key.to_string(), ConfigSource::Programmatic);
        self
    }

    #[must_use]
    pub fn model(self, id: impl Into<String>) -> Self {
        let id = id.into();
        self.set("model", |c| c.defaults.model = Some(id))
    }

    #[must_use]
    pub fn grade(self, grade: u8) -> Self {
        self.set("grade", |c| c.defaults.grade = Some(grade))
    }

    #[must_use]
    pub fn verbose(self, verbose: bool) -> Self {
        self.set("verbose", |c| c.defaults.verbose = Some(verbose))
    }

    #[must_use]
    pub fn proxy_base_url(self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.set("proxy_base_url", |c| c.proxy.base_url = Some(url))
    }

    #[must_use]
    pub fn access_token_env(self, var: impl Into<String>) -> Self {
        let var = var.into();
        self.set("access_token_env", |c| c.proxy.access_token_env = Some(var))
    }

    #[must_use]
    pub fn timeout_secs(self, secs: u64) -> Self {
        self.set("timeout_secs", |c| c.proxy.timeout_secs = Some(secs))
    }

    #[must_use]
    pub fn anonymous_limit(self, limit: u32) -> Self {
        self.set("anonymous_limit", |c| c.anonymous.limit = Some(limit))
    }

    #[must_use]
    pub fn usage_file(self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.set("usage_file", |c| c.anonymous.usage_file = Some(path))
    }

    /// Override the context budget used for `task`.
    #[must_use]
    pub fn budget(self, task: Task, budget: BudgetOverride) -> Self {
        let name = match task {
            Task::Welcome => "welcome",
            Task::Chat => "chat",
            Task::Flashcards | Task::Quiz => "structured",
            Task::Topics | Task::Analysis | Task::Probe => "topics",
        };
        self.set(&format!("budgets.{name}"), |c| {
            let slot = match name {
                "welcome" => &mut c.budgets.welcome,
                "chat" => &mut c.budgets.chat,
                "structured" => &mut c.budgets.structured,
                _ => &mut c.budgets.topics,
            };
            *slot = Some(budget);
        })
    }

    /// Validate and return the configuration.
    pub fn build(self) -> Result<Config, ConfigError> {
        let mut config = self.config;
        for key in TRACKED_KEYS {
            config
                .source_attribution
                .entry((*key).to_string())
                .or_insert(ConfigSource::Defaults);
        }
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_attributes_programmatic_values() {
        let config = Config::builder().grade(10).verbose(true).build().unwrap();
        assert_eq!(config.grade().get(), 10);
        assert!(config.verbose());
        assert_eq!(
            config.source_attribution.get("grade"),
            Some(&ConfigSource::Programmatic)
        );
        assert_eq!(
            config.source_attribution.get("model"),
            Some(&ConfigSource::Defaults)
        );
    }

    #[test]
    fn test_builder_validates() {
        assert!(Config::builder().grade(4).build().is_err());
        assert!(
            Config::builder()
                .budget(
                    Task::Quiz,
                    BudgetOverride {
                        total: Some(0),
                        ..BudgetOverride::default()
                    }
                )
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_builder_budget_routes_to_task() {
        let config = Config::builder()
            .budget(
                Task::Flashcards,
                BudgetOverride {
                    chunk: Some(100),
                    ..BudgetOverride::default()
                },
            )
            .build()
            .unwrap();
        assert_eq!(config.budget_for(Task::Quiz).chunk_tokens, 100);
    }
}
