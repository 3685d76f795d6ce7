use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use studyforge_utils::error::ConfigError;

use crate::model::{
    AnonymousConfig, BudgetsConfig, CliArgs, Config, ConfigSource, Defaults, ProxyConfig,
};

/// Directory holding the project configuration.
pub const CONFIG_DIR: &str = ".studyforge";

/// Configuration file name inside [`CONFIG_DIR`] or `STUDYFORGE_HOME`.
pub const CONFIG_FILE: &str = "config.toml";

/// Overrides the configuration directory.
pub const HOME_ENV: &str = "STUDYFORGE_HOME";

/// Overrides `[proxy].base_url`.
pub const PROXY_URL_ENV: &str = "STUDYFORGE_PROXY_URL";

/// Overrides `[anonymous].limit`.
pub const ANON_LIMIT_ENV: &str = "STUDYFORGE_ANON_LIMIT";

/// Keys tracked in `source_attribution`.
pub(crate) const TRACKED_KEYS: &[&str] = &[
    "model",
    "grade",
    "verbose",
    "proxy_base_url",
    "access_token_env",
    "timeout_secs",
    "anonymous_limit",
    "usage_file",
];

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize, Serialize)]
struct TomlConfig {
    defaults: Option<Defaults>,
    proxy: Option<ProxyConfig>,
    anonymous: Option<AnonymousConfig>,
    budgets: Option<BudgetsConfig>,
}

/// Replace `slot` with `value` when set, recording where it came from.
fn overlay<T>(
    slot: &mut Option<T>,
    value: Option<T>,
    key: &str,
    source: &ConfigSource,
    attribution: &mut HashMap<String, ConfigSource>,
) {
    if value.is_some() {
        *slot = value;
        attribution.insert(key.to_string(), source.clone());
    }
}

impl Config {
    /// Discover and load configuration with precedence: CLI > env > file > defaults
    ///
    /// Uses the current working directory for config file discovery when no
    /// explicit path is provided in `cli_args`.
    pub fn discover(cli_args: &CliArgs) -> Result<Self> {
        let start_dir = std::env::current_dir().context("Failed to get current directory")?;
        Self::discover_from(&start_dir, cli_args)
    }

    /// Discover configuration starting from a specific directory.
    pub fn discover_from(start_dir: &Path, cli_args: &CliArgs) -> Result<Self> {
        Self::discover_with_env(start_dir, cli_args, |key| std::env::var(key).ok())
    }

    /// Discover configuration with an explicit environment lookup.
    ///
    /// Tests pass a closure over a map instead of mutating the process
    /// environment.
    pub fn discover_with_env<F>(start_dir: &Path, cli_args: &CliArgs, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut source_attribution: HashMap<String, ConfigSource> = TRACKED_KEYS
            .iter()
            .map(|k| ((*k).to_string(), ConfigSource::Defaults))
            .collect();

        let mut defaults = Defaults::default();
        let mut proxy = ProxyConfig::default();
        let mut anonymous = AnonymousConfig::default();
        let mut budgets = BudgetsConfig::default();

        let config_path = match &cli_args.config_path {
            Some(explicit) if !explicit.exists() => {
                return Err(ConfigError::NotFound {
                    path: explicit.display().to_string(),
                }
                .into());
            }
            Some(explicit) => Some(explicit.clone()),
            None => match env(HOME_ENV).filter(|h| !h.trim().is_empty()) {
                Some(home) => Some(PathBuf::from(home).join(CONFIG_FILE)).filter(|p| p.exists()),
                None => Self::discover_config_file_from(start_dir),
            },
        };

        if let Some(path) = &config_path {
            debug!(path = %path.display(), "Loading configuration file");
            let file_config = Self::load_config_file(path)
                .with_context(|| format!("Failed to load config file: {}", path.display()))?;
            let source = ConfigSource::ConfigFile(path.clone());
            let attr = &mut source_attribution;

            if let Some(file) = file_config.defaults {
                overlay(&mut defaults.model, file.model, "model", &source, attr);
                overlay(&mut defaults.grade, file.grade, "grade", &source, attr);
                overlay(&mut defaults.verbose, file.verbose, "verbose", &source, attr);
            }
            if let Some(file) = file_config.proxy {
                overlay(&mut proxy.base_url, file.base_url, "proxy_base_url", &source, attr);
                overlay(
                    &mut proxy.access_token_env,
                    file.access_token_env,
                    "access_token_env",
                    &source,
                    attr,
                );
                overlay(&mut proxy.timeout_secs, file.timeout_secs, "timeout_secs", &source, attr);
            }
            if let Some(file) = file_config.anonymous {
                overlay(&mut anonymous.limit, file.limit, "anonymous_limit", &source, attr);
                overlay(&mut anonymous.usage_file, file.usage_file, "usage_file", &source, attr);
            }
            if let Some(file) = file_config.budgets {
                for (name, _, custom) in file.entries() {
                    if custom.is_some_and(|c| !c.is_empty()) {
                        attr.insert(format!("budgets.{name}"), source.clone());
                    }
                }
                budgets = file;
            }
        }

        if let Some(url) = env(PROXY_URL_ENV) {
            proxy.base_url = Some(url);
            source_attribution.insert(
                "proxy_base_url".to_string(),
                ConfigSource::Env(PROXY_URL_ENV.to_string()),
            );
        }
        if let Some(raw) = env(ANON_LIMIT_ENV) {
            let limit = raw.trim().parse::<u32>().map_err(|_| ConfigError::InvalidValue {
                key: ANON_LIMIT_ENV.to_string(),
                value: format!("'{raw}' is not a non-negative integer"),
            })?;
            anonymous.limit = Some(limit);
            source_attribution.insert(
                "anonymous_limit".to_string(),
                ConfigSource::Env(ANON_LIMIT_ENV.to_string()),
            );
        }

        let cli = ConfigSource::Cli;
        let attr = &mut source_attribution;
        overlay(&mut defaults.model, cli_args.model.clone(), "model", &cli, attr);
        overlay(&mut defaults.grade, cli_args.grade, "grade", &cli, attr);
        overlay(&mut defaults.verbose, cli_args.verbose, "verbose", &cli, attr);

        let config = Self {
            defaults,
            proxy,
            anonymous,
            budgets,
            source_attribution,
        };

        config.validate()?;

        Ok(config)
    }

    /// Search upward from `start_dir` for `.studyforge/config.toml`, stopping
    /// at repository root markers (.git, .hg, .svn) or the filesystem root.
    #[must_use]
    pub fn discover_config_file_from(start_dir: &Path) -> Option<PathBuf> {
        let mut current = Some(start_dir);

        while let Some(dir) = current {
            let config_path = dir.join(CONFIG_DIR).join(CONFIG_FILE);
            if config_path.exists() {
                return Some(config_path);
            }
            if [".git", ".hg", ".svn"].iter().any(|m| dir.join(m).exists()) {
                break;
            }
            current = dir.parent();
        }

        None
    }

    /// Load configuration from a TOML file. A missing file yields an empty config.
    fn load_config_file(path: &Path) -> Result<TomlConfig> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let config: TomlConfig = toml::from_str(&content)
                    .map_err(|e| ConfigError::InvalidFile(e.to_string()))
                    .with_context(|| {
                        format!("Failed to parse TOML config file: {}", path.display())
                    })?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(TomlConfig::default()),
            Err(e) => Err(anyhow::anyhow!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            )),
        }
    }
}
