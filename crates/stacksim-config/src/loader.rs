//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper precedence.

use crate::project::{validate_max_depth, ProjectConfig, TickMode};
use crate::{ConfigError, ConfigResult, CONFIG_FILE_NAME, DEFAULT_MAX_DEPTH};
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable overriding `stack.max_depth`
pub const ENV_MAX_DEPTH: &str = "STACKSIM_MAX_DEPTH";

/// Environment variable overriding `scheduler.mode`
pub const ENV_TICK_MODE: &str = "STACKSIM_TICK_MODE";

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Built-in defaults - lowest priority
/// 2. Project config (./stacksim.toml) - overrides defaults
/// 3. Environment variables (STACKSIM_*) - highest priority
#[derive(Debug, Default)]
pub struct ConfigLoader {
    /// Skip environment overrides (used by hosts that want file-only behaviour)
    ignore_env: bool,
}

/// Merged configuration result
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    /// Project configuration
    pub project: ProjectConfig,

    /// Project root directory (where stacksim.toml was found)
    pub project_root: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self { ignore_env: false }
    }

    /// Create a loader that ignores STACKSIM_* environment variables
    pub fn without_env() -> Self {
        Self { ignore_env: true }
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find stacksim.toml, then applies
    /// environment overrides.
    pub fn load_from_directory(&self, start_dir: &Path) -> ConfigResult<Config> {
        let (project_root, project_config) = self.find_project_config(start_dir)?;
        let project = self.apply_env_overrides(project_config)?;

        Ok(Config {
            project,
            project_root,
        })
    }

    /// Load configuration from a specific project config file
    pub fn load_from_file(&self, config_path: &Path) -> ConfigResult<Config> {
        let project_config = ProjectConfig::load_from_file(config_path)?;
        let project = self.apply_env_overrides(project_config)?;

        Ok(Config {
            project,
            project_root: config_path.parent().map(|p| p.to_path_buf()),
        })
    }

    /// Find project configuration by walking up directory tree
    ///
    /// Returns (project_root, project_config); defaults when nothing is found
    fn find_project_config(
        &self,
        start_dir: &Path,
    ) -> ConfigResult<(Option<PathBuf>, ProjectConfig)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(CONFIG_FILE_NAME);

            if config_path.exists() {
                let project_config = ProjectConfig::load_from_file(&config_path)?;
                return Ok((Some(current), project_config));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok((None, ProjectConfig::default())),
            }
        }
    }

    /// Apply environment variable overrides to project config
    ///
    /// Recognised variables: STACKSIM_MAX_DEPTH, STACKSIM_TICK_MODE
    fn apply_env_overrides(&self, mut config: ProjectConfig) -> ConfigResult<ProjectConfig> {
        if self.ignore_env {
            return Ok(config);
        }

        if let Ok(raw) = env::var(ENV_MAX_DEPTH) {
            let depth = raw
                .trim()
                .parse::<usize>()
                .map_err(|e| ConfigError::InvalidValue {
                    field: ENV_MAX_DEPTH.to_string(),
                    reason: format!("'{}' is not a frame count: {}", raw, e),
                })?;
            validate_max_depth(depth)?;
            config.stack.get_or_insert_with(Default::default).max_depth = Some(depth);
        }

        if let Ok(raw) = env::var(ENV_TICK_MODE) {
            let mode: TickMode = raw.parse()?;
            config.scheduler.get_or_insert_with(Default::default).mode = Some(mode);
        }

        Ok(config)
    }
}

impl Config {
    /// Effective maximum stack depth (project > default)
    pub fn max_depth(&self) -> usize {
        self.project.max_depth().unwrap_or(DEFAULT_MAX_DEPTH)
    }

    /// Effective scheduler tick mode (project > default)
    pub fn tick_mode(&self) -> TickMode {
        self.project.tick_mode().unwrap_or_default()
    }

    /// Get the project root directory
    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }

    /// Check if a stacksim.toml was found
    pub fn is_project(&self) -> bool {
        self.project_root.is_some()
    }
}
