//! Project Configuration (stacksim.toml)
//!
//! Handles project-level configuration stored in `stacksim.toml` at the project root.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Project configuration from stacksim.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Call stack limits
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<StackConfig>,

    /// Deferred task scheduling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduler: Option<SchedulerConfig>,
}

/// Call stack configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct StackConfig {
    /// Maximum number of active frames (default: 4096)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
}

/// Scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct SchedulerConfig {
    /// How many tasks a single tick drains (default: single)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<TickMode>,
}

/// How many queued tasks one scheduler tick runs
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TickMode {
    /// Run exactly one task per tick
    #[default]
    Single,
    /// Run every task that was queued when the tick started
    Batch,
}

impl fmt::Display for TickMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TickMode::Single => write!(f, "single"),
            TickMode::Batch => write!(f, "batch"),
        }
    }
}

impl FromStr for TickMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "single" => Ok(TickMode::Single),
            "batch" => Ok(TickMode::Batch),
            other => Err(ConfigError::InvalidValue {
                field: "scheduler.mode".to_string(),
                reason: format!("expected 'single' or 'batch', got '{}'", other),
            }),
        }
    }
}

impl ProjectConfig {
    /// Load project configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the project configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(depth) = self.max_depth() {
            validate_max_depth(depth)?;
        }
        Ok(())
    }

    /// Get the configured maximum stack depth, if present
    pub fn max_depth(&self) -> Option<usize> {
        self.stack.as_ref().and_then(|s| s.max_depth)
    }

    /// Get the configured tick mode, if present
    pub fn tick_mode(&self) -> Option<TickMode> {
        self.scheduler.as_ref().and_then(|s| s.mode)
    }

    /// Merge another project config into this one
    /// Other config takes precedence for non-None values
    pub fn merge(&mut self, other: &ProjectConfig) {
        if let Some(depth) = other.max_depth() {
            self.stack.get_or_insert_with(Default::default).max_depth = Some(depth);
        }
        if let Some(mode) = other.tick_mode() {
            self.scheduler.get_or_insert_with(Default::default).mode = Some(mode);
        }
    }
}

/// A stack that cannot hold a single frame can never run anything
pub(crate) fn validate_max_depth(depth: usize) -> ConfigResult<()> {
    if depth == 0 {
        return Err(ConfigError::InvalidValue {
            field: "stack.max_depth".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(())
}
