//! # Dispatch Configuration
//!
//! Runtime settings for the command dispatcher, loaded from the environment
//! (after `.env` has been read by the binary) or from a YAML file.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: YAML loading with validation
//! - 1.0.0: Environment-based configuration

use serde::{Deserialize, Serialize};
use std::env;

use super::error::{DispatchError, DispatchResult};
use super::response::MESSAGE_LIMIT;

pub const DEFAULT_PREFIX: &str = "!";
pub const DEFAULT_MAX_CONCURRENT_TASKS: usize = 16;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Command prefix. `None` means every message is treated as a command line.
    #[serde(default = "default_prefix")]
    pub prefix: Option<String>,

    /// Sent when a user lacks the permission a command requires. Unset sends nothing.
    #[serde(default)]
    pub missing_permissions_message: Option<String>,

    /// Upper bound on detached command executions running at once
    #[serde(default = "default_max_concurrent_tasks")]
    pub max_concurrent_tasks: usize,

    /// Longest reply chunk sent in one message (characters)
    #[serde(default = "default_message_limit")]
    pub message_limit: usize,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_prefix() -> Option<String> {
    Some(DEFAULT_PREFIX.to_string())
}

fn default_max_concurrent_tasks() -> usize {
    DEFAULT_MAX_CONCURRENT_TASKS
}

fn default_message_limit() -> usize {
    MESSAGE_LIMIT
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            missing_permissions_message: None,
            max_concurrent_tasks: default_max_concurrent_tasks(),
            message_limit: default_message_limit(),
            log_level: default_log_level(),
        }
    }
}

impl DispatchConfig {
    /// Build configuration from environment variables
    ///
    /// Recognised variables: `COMMAND_PREFIX`, `MISSING_PERMISSIONS_MESSAGE`,
    /// `MAX_CONCURRENT_TASKS`, `MESSAGE_LIMIT`, `LOG_LEVEL`. Missing variables
    /// keep their defaults.
    pub fn from_env() -> DispatchResult<Self> {
        let mut config = Self::default();

        if let Ok(prefix) = env::var("COMMAND_PREFIX") {
            config.prefix = Some(prefix);
        }
        if let Ok(message) = env::var("MISSING_PERMISSIONS_MESSAGE") {
            if !message.trim().is_empty() {
                config.missing_permissions_message = Some(message);
            }
        }
        if let Ok(value) = env::var("MAX_CONCURRENT_TASKS") {
            config.max_concurrent_tasks = parse_usize("MAX_CONCURRENT_TASKS", &value)?;
        }
        if let Ok(value) = env::var("MESSAGE_LIMIT") {
            config.message_limit = parse_usize("MESSAGE_LIMIT", &value)?;
        }
        if let Ok(level) = env::var("LOG_LEVEL") {
            config.log_level = level;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn load(path: &str) -> DispatchResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> DispatchResult<Self> {
        let config: DispatchConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> DispatchResult<()> {
        if self.max_concurrent_tasks == 0 {
            return Err(DispatchError::Config(
                "max_concurrent_tasks must be greater than zero".to_string(),
            ));
        }
        if self.message_limit == 0 {
            return Err(DispatchError::Config(
                "message_limit must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// The prefix after normalisation
    pub fn normalized_prefix(&self) -> String {
        normalize_prefix(self.prefix.as_deref())
    }
}

/// Strip every space from a prefix; an unset prefix becomes empty
pub fn normalize_prefix(prefix: Option<&str>) -> String {
    match prefix {
        Some(prefix) => prefix.replace(' ', ""),
        None => String::new(),
    }
}

fn parse_usize(name: &str, value: &str) -> DispatchResult<usize> {
    value
        .trim()
        .parse::<usize>()
        .map_err(|e| DispatchError::Config(format!("{name} must be a positive integer: {e}")))
}
