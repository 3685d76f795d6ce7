use std::collections::BTreeMap;

use crate::model::{Config, ConfigSource};

fn stable_source_label(source: &ConfigSource) -> &'static str {
    match source {
        ConfigSource::Cli => "cli",
        ConfigSource::Env(_) => "env",
        ConfigSource::ConfigFile(_) => "config",
        ConfigSource::Programmatic => "programmatic",
        ConfigSource::Defaults => "default",
    }
}

impl Config {
    fn source_label(&self, key: &str) -> String {
        stable_source_label(
            self.source_attribution
                .get(key)
                .unwrap_or(&ConfigSource::Defaults),
        )
        .to_string()
    }

    /// Effective configuration as `key -> (value, source)` pairs.
    ///
    /// The access token itself is never included, only the variable it is read from.
    #[must_use]
    pub fn effective_config(&self) -> BTreeMap<String, (String, String)> {
        let mut config = BTreeMap::new();
        let mut add = |key: &str, value: String| {
            let source = self.source_label(key);
            config.insert(key.to_string(), (value, source));
        };

        add("model", self.model_id().to_string());
        add("grade", self.grade().get().to_string());
        add("verbose", self.verbose().to_string());
        add(
            "proxy_base_url",
            self.proxy_base_url().unwrap_or("(none)").to_string(),
        );
        add("access_token_env", self.access_token_env().to_string());
        add("timeout_secs", self.timeout().as_secs().to_string());
        add("anonymous_limit", self.anonymous_limit().to_string());
        add("usage_file", self.usage_file().display().to_string());

        for (name, _, custom) in self.budgets.entries() {
            if custom.is_some() {
                let key = format!("budgets.{name}");
                let budget = self.budget_for_name(name);
                add(
                    &key,
                    format!(
                        "total={} per_doc={} chunk={} headings={}",
                        budget.total_budget_tokens,
                        budget.per_doc_budget_tokens,
                        budget.chunk_tokens,
                        budget.include_headings
                    ),
                );
            }
        }

        config
    }

    fn budget_for_name(&self, name: &str) -> studyforge_context::ContextBudget {
        use studyforge_model::Task;
        let task = match name {
            "welcome" => Task::Welcome,
            "chat" => Task::Chat,
            "structured" => Task::Flashcards,
            _ => Task::Topics,
        };
        self.budget_for(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_config_labels_sources() {
        let mut config = Config::default();
        config.defaults.model = Some("gemini-2.5-flash".to_string());
        config
            .source_attribution
            .insert("model".to_string(), ConfigSource::Cli);

        let effective = config.effective_config();
        assert_eq!(
            effective.get("model"),
            Some(&("gemini-2.5-flash".to_string(), "cli".to_string()))
        );
        assert_eq!(effective.get("anonymous_limit").map(|v| v.1.as_str()), Some("default"));
        assert!(!effective.contains_key("budgets.chat"));
    }
}
