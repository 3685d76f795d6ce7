//! Configuration for studyforge.
//!
//! Values are layered with precedence CLI > environment > config file >
//! built-in defaults, and every tracked key records which layer supplied it.
//! The config file is `.studyforge/config.toml`, found by searching upward
//! from the working directory, or `$STUDYFORGE_HOME/config.toml`.

mod builder;
mod discovery;
mod model;
mod sources;
mod validation;

pub use builder::ConfigBuilder;
pub use discovery::{ANON_LIMIT_ENV, CONFIG_DIR, CONFIG_FILE, HOME_ENV, PROXY_URL_ENV};
pub use model::{
    AnonymousConfig, BudgetOverride, BudgetsConfig, CliArgs, Config, ConfigSource,
    DEFAULT_ACCESS_TOKEN_ENV, DEFAULT_ANON_LIMIT, DEFAULT_TIMEOUT_SECS, Defaults, ProxyConfig,
};
