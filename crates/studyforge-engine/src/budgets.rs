use studyforge_config::Config;
use studyforge_context::ContextBudget;
use studyforge_model::Task;

/// Context budgets for each kind of study task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskBudgets {
    pub welcome: ContextBudget,
    pub topics: ContextBudget,
    pub chat: ContextBudget,
    /// Shared by flashcards and quizzes.
    pub structured: ContextBudget,
}

impl Default for TaskBudgets {
    fn default() -> Self {
        Self {
            welcome: ContextBudget::WELCOME,
            topics: ContextBudget::TOPICS,
            chat: ContextBudget::CHAT,
            structured: ContextBudget::STRUCTURED,
        }
    }
}

impl TaskBudgets {
    /// Budgets from `[budgets.*]` overrides, falling back to the presets.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            welcome: config.budget_for(Task::Welcome),
            topics: config.budget_for(Task::Topics),
            chat: config.budget_for(Task::Chat),
            structured: config.budget_for(Task::Flashcards),
        }
    }

    #[must_use]
    pub const fn for_task(&self, task: Task) -> ContextBudget {
        match task {
            Task::Welcome => self.welcome,
            Task::Chat => self.chat,
            Task::Flashcards | Task::Quiz => self.structured,
            Task::Topics | Task::Analysis | Task::Probe => self.topics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studyforge_config::BudgetOverride;

    #[test]
    fn defaults_match_presets() {
        let budgets = TaskBudgets::default();
        assert_eq!(budgets.for_task(Task::Quiz), ContextBudget::STRUCTURED);
        assert_eq!(budgets.for_task(Task::Welcome), ContextBudget::WELCOME);
        assert_eq!(TaskBudgets::from_config(&Config::default()), budgets);
    }

    #[test]
    fn config_overrides_apply_per_task() {
        let config = Config::builder()
            .budget(
                Task::Chat,
                BudgetOverride {
                    total: Some(2000),
                    ..BudgetOverride::default()
                },
            )
            .build()
            .unwrap();
        let budgets = TaskBudgets::from_config(&config);
        assert_eq!(budgets.chat.total_budget_tokens, 2000);
        assert_eq!(budgets.chat.chunk_tokens, ContextBudget::CHAT.chunk_tokens);
        assert_eq!(budgets.topics, ContextBudget::TOPICS);
    }
}
