//! Runtime configuration (`lkr-rt.toml` plus `LKR_RT_*` environment overrides).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_NAME: &str = "LKR_RT_NAME";
pub const ENV_MAX_CALL_DEPTH: &str = "LKR_RT_MAX_CALL_DEPTH";
pub const ENV_PROFILING: &str = "LKR_RT_PROFILING";

pub const DEFAULT_RUNTIME_NAME: &str = "Interpreted";
/// Each guest call costs several native frames, so this stays well inside a
/// 2 MiB thread stack in unoptimized builds.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 512;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read runtime config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid runtime config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Reported by `Runtime::name`.
    pub name: String,
    /// Deepest allowed activation chain per thread; 0 disables the check.
    pub max_call_depth: usize,
    pub profiling: bool,
    /// Searched after any roots contributed by locators.
    pub search_roots: Vec<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_RUNTIME_NAME.to_string(),
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            profiling: false,
            search_roots: Vec::new(),
        }
    }
}

impl RuntimeConfig {
    pub fn from_toml_str(input: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Applies `LKR_RT_*` variables from the process environment.
    pub fn with_env_overrides(self) -> ConfigResult<Self> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary lookup, which keeps tests off the
    /// process environment.
    pub fn apply_overrides<F>(mut self, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup(ENV_NAME) {
            let trimmed = name.trim();
            if !trimmed.is_empty() {
                self.name = trimmed.to_string();
            }
        }
        if let Some(raw) = lookup(ENV_MAX_CALL_DEPTH) {
            self.max_call_depth = raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
                field: "max_call_depth",
                reason: format!("{raw:?}: {e}"),
            })?;
        }
        if let Some(raw) = lookup(ENV_PROFILING) {
            self.profiling = env_toggle_enabled(&raw);
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "name",
                reason: "runtime name cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Empty, `0`, `false` and `off` disable a toggle; anything else enables it.
pub fn env_toggle_enabled(raw: &str) -> bool {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return false;
    }
    !(trimmed.eq_ignore_ascii_case("0") || trimmed.eq_ignore_ascii_case("false") || trimmed.eq_ignore_ascii_case("off"))
}
