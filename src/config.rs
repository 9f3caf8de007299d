//! Configuration loading and management.
//!
//! Configuration is loaded from multiple sources with the following precedence
//! (highest to lowest):
//!
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. `.sql-template.toml` in current directory
//! 4. `~/.config/sql-template/config.toml`
//! 5. Default values
//!
//! # Configuration File Format
//!
//! ```toml
//! [render]
//! dialect = "postgresql"       # sqlserver, mysql, postgresql, sqlite, oracle, db2
//! parameter_prefix = "$"
//! max_batch_size = 500
//! validate = true
//!
//! [cache]
//! max_entries = 1000
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Description |
//! |----------|-------------|
//! | `SQL_TEMPLATE_DIALECT` | Default dialect |
//! | `SQL_TEMPLATE_PARAMETER_PREFIX` | Bound-parameter prefix character |
//! | `SQL_TEMPLATE_MAX_BATCH_SIZE` | Rows per batch statement |

use std::{env, fs, path::PathBuf};

use serde::Deserialize;

use crate::{
    cache::DEFAULT_CACHE_SIZE,
    dialect::SqlDialect,
    error::{AppResult, config_error}
};

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub cache:  CacheConfig
}

/// Rendering defaults
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RenderConfig {
    /// Dialect name, parsed with [`SqlDialect::from_str`](std::str::FromStr)
    pub dialect:          Option<String>,
    pub parameter_prefix: Option<char>,
    pub max_batch_size:   Option<usize>,
    /// Parse rendered SQL before printing it
    #[serde(default)]
    pub validate:         bool
}

/// Prepared-template cache sizing
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub max_entries: usize
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_CACHE_SIZE
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. Config file in current directory (.sql-template.toml)
    /// 3. Config file in home directory (~/.config/sql-template/config.toml)
    /// 4. Default values
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        // Try to load from home directory config
        if let Some(home) = env::var_os("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("sql-template")
                .join("config.toml");

            if home_config.exists() {
                config = Self::from_file(&home_config)?;
            }
        }

        // Try to load from current directory config (overrides home config)
        let local_config = PathBuf::from(".sql-template.toml");
        if local_config.exists() {
            config = Self::from_file(&local_config)?;
        }

        config.apply_env(|key| env::var(key).ok())?;
        Ok(config)
    }

    fn from_file(path: &PathBuf) -> AppResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| config_error(format!("Failed to read config file: {}", e)))?;
        Self::from_toml_str(&content)
    }

    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|e| config_error(format!("Invalid config file: {}", e)))
    }

    /// Override with environment variables read through `var`
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> AppResult<()> {
        if let Some(dialect) = var("SQL_TEMPLATE_DIALECT") {
            self.render.dialect = Some(dialect);
        }

        if let Some(prefix) = var("SQL_TEMPLATE_PARAMETER_PREFIX") {
            let mut chars = prefix.trim().chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => self.render.parameter_prefix = Some(c),
                _ => {
                    return Err(config_error(format!(
                        "SQL_TEMPLATE_PARAMETER_PREFIX must be one character, got '{}'",
                        prefix
                    )));
                }
            }
        }

        if let Some(size) = var("SQL_TEMPLATE_MAX_BATCH_SIZE") {
            let size = size.trim().parse().map_err(|_| {
                config_error(format!(
                    "SQL_TEMPLATE_MAX_BATCH_SIZE must be a positive integer, got '{}'",
                    size
                ))
            })?;
            self.render.max_batch_size = Some(size);
        }

        Ok(())
    }

    /// Configured dialect, if any
    pub fn dialect(&self) -> AppResult<Option<SqlDialect>> {
        self.render
            .dialect
            .as_deref()
            .map(|name| name.parse::<SqlDialect>().map_err(config_error))
            .transpose()
    }
}
