//! Core configuration structure and builder for the collective primitives.

use crate::core::error::{CollectiveError, Result};
use crate::core::utils::log::Logger;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default size of an in-process rank group
pub const DEFAULT_NUM_RANKS: usize = 1;
/// Default verbosity (Info)
pub const DEFAULT_VERBOSITY: i32 = 1;

/// Environment variable overriding `num_ranks`
pub const ENV_NUM_RANKS: &str = "BOOST_COLLECTIVE_NUM_RANKS";
/// Environment variable overriding `verbosity`
pub const ENV_VERBOSITY: &str = "BOOST_COLLECTIVE_VERBOSITY";
/// Environment variable overriding `logger_name`
pub const ENV_LOGGER_NAME: &str = "BOOST_COLLECTIVE_LOGGER_NAME";

/// Configuration of the logging sink and of the in-process rank group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectiveConfig {
    /// Number of ranks in an in-process group
    pub num_ranks: usize,
    /// Verbosity: -1 fatal only, 0 warnings, 1 info, 2+ debug
    pub verbosity: i32,
    /// Name the logger reports under
    pub logger_name: String,
}

impl Default for CollectiveConfig {
    fn default() -> Self {
        CollectiveConfig {
            num_ranks: DEFAULT_NUM_RANKS,
            verbosity: DEFAULT_VERBOSITY,
            logger_name: Logger::DEFAULT_NAME.to_string(),
        }
    }
}

impl CollectiveConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.num_ranks == 0 {
            return Err(CollectiveError::invalid_parameter(
                "num_ranks",
                self.num_ranks.to_string(),
                "must be at least 1",
            ));
        }

        if self.logger_name.trim().is_empty() {
            return Err(CollectiveError::invalid_parameter(
                "logger_name",
                format!("{:?}", self.logger_name),
                "must not be empty",
            ));
        }

        // Every local rank blocks a thread inside the barrier
        if self.num_ranks > num_cpus::get() * 2 {
            log::warn!(
                "num_ranks ({}) is much larger than available cores ({})",
                self.num_ranks,
                num_cpus::get()
            );
        }

        Ok(())
    }

    /// Load configuration from a `.json` or `.toml` file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| CollectiveError::config(format!("Failed to read config file: {}", e)))?;

        let config: CollectiveConfig = match path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            Some("toml") => toml::from_str(&content).map_err(|e| {
                CollectiveError::config(format!("Failed to parse TOML config: {}", e))
            })?,
            _ => {
                return Err(CollectiveError::config(
                    "Unsupported config file format. Use .json or .toml",
                ))
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a `.json` or `.toml` file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = match path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::to_string_pretty(self)?,
            Some("toml") => toml::to_string_pretty(self).map_err(|e| {
                CollectiveError::config(format!("Failed to serialize to TOML: {}", e))
            })?,
            _ => {
                return Err(CollectiveError::config(
                    "Unsupported config file format. Use .json or .toml",
                ))
            }
        };

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from the process environment
    pub fn load_from_environment() -> Result<Self> {
        Self::from_env_vars(|key| std::env::var(key).ok())
    }

    /// Build a configuration from defaults and whatever `lookup` returns for
    /// the `BOOST_COLLECTIVE_*` keys
    pub fn from_env_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = CollectiveConfig::default();

        if let Some(val) = lookup(ENV_NUM_RANKS) {
            config.num_ranks = val
                .trim()
                .parse()
                .map_err(|_| CollectiveError::config(format!("Invalid {}", ENV_NUM_RANKS)))?;
        }

        if let Some(val) = lookup(ENV_VERBOSITY) {
            config.verbosity = val
                .trim()
                .parse()
                .map_err(|_| CollectiveError::config(format!("Invalid {}", ENV_VERBOSITY)))?;
        }

        if let Some(val) = lookup(ENV_LOGGER_NAME) {
            config.logger_name = val;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Configuration builder for fluent configuration creation
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: CollectiveConfig,
    validation_errors: Vec<String>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        ConfigBuilder {
            config: CollectiveConfig::default(),
            validation_errors: Vec::new(),
        }
    }

    /// Set the number of ranks of an in-process group
    pub fn num_ranks(mut self, num_ranks: usize) -> Self {
        if num_ranks == 0 {
            self.validation_errors
                .push("num_ranks must be at least 1".to_string());
        }
        self.config.num_ranks = num_ranks;
        self
    }

    pub fn verbosity(mut self, verbosity: i32) -> Self {
        self.config.verbosity = verbosity;
        self
    }

    pub fn logger_name<S: Into<String>>(mut self, name: S) -> Self {
        self.config.logger_name = name.into();
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<CollectiveConfig> {
        if !self.validation_errors.is_empty() {
            return Err(CollectiveError::config(format!(
                "Configuration validation failed: {}",
                self.validation_errors.join(", ")
            )));
        }

        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
