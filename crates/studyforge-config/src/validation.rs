use studyforge_model::{GradeLevel, find_model};
use studyforge_utils::error::ConfigError;

use crate::model::Config;

/// Largest accepted anonymous usage limit.
const MAX_ANON_LIMIT: u32 = 1000;

const MIN_TIMEOUT_SECS: u64 = 5;
const MAX_TIMEOUT_SECS: u64 = 600;

fn invalid(key: impl Into<String>, value: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.into(),
        value: value.into(),
    }
}

impl Config {
    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(model) = &self.defaults.model
            && find_model(model).is_none()
        {
            return Err(ConfigError::UnknownModel(model.clone()));
        }

        if let Some(grade) = self.defaults.grade
            && GradeLevel::new(grade).is_err()
        {
            return Err(invalid(
                "grade",
                format!(
                    "{grade} is outside {}-{}",
                    GradeLevel::MIN.get(),
                    GradeLevel::MAX.get()
                ),
            ));
        }

        if let Some(timeout) = self.proxy.timeout_secs {
            if timeout < MIN_TIMEOUT_SECS {
                return Err(invalid(
                    "timeout_secs",
                    format!("must be at least {MIN_TIMEOUT_SECS} seconds"),
                ));
            }
            if timeout > MAX_TIMEOUT_SECS {
                return Err(invalid(
                    "timeout_secs",
                    format!("exceeds maximum limit of {MAX_TIMEOUT_SECS} seconds"),
                ));
            }
        }

        if let Some(url) = self.proxy_base_url()
            && !(url.starts_with("https://") || url.starts_with("http://"))
        {
            return Err(invalid("proxy_base_url", "must start with http:// or https://"));
        }

        if let Some(env) = &self.proxy.access_token_env
            && env.trim().is_empty()
        {
            return Err(invalid("access_token_env", "must not be empty"));
        }

        if let Some(limit) = self.anonymous.limit
            && limit > MAX_ANON_LIMIT
        {
            return Err(invalid(
                "anonymous_limit",
                format!("exceeds maximum limit of {MAX_ANON_LIMIT}"),
            ));
        }

        for (name, base, custom) in self.budgets.entries() {
            let Some(custom) = custom else { continue };
            let budget = custom.apply(base);
            let key = |field: &str| format!("budgets.{name}.{field}");
            if budget.total_budget_tokens == 0 {
                return Err(invalid(key("total"), "must be greater than 0"));
            }
            if budget.per_doc_budget_tokens == 0 {
                return Err(invalid(key("per_doc"), "must be greater than 0"));
            }
            if budget.chunk_tokens == 0 {
                return Err(invalid(key("chunk"), "must be greater than 0"));
            }
            if budget.per_doc_budget_tokens > budget.total_budget_tokens {
                return Err(invalid(
                    key("per_doc"),
                    format!(
                        "{} exceeds total {}",
                        budget.per_doc_budget_tokens, budget.total_budget_tokens
                    ),
                ));
            }
        }

        Ok(())
    }
}
