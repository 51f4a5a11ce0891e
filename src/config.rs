//! Executor configuration.
//!
//! Defaults are suitable for an interactive shell. A JSON file named by
//! `RUSTY_EXEC_CONFIG` can override any field, and `RUSTY_EXEC_REDIRECT`
//! overrides the redirect policy on top of that.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_PATH_VAR: &str = "RUSTY_EXEC_CONFIG";
pub const REDIRECT_VAR: &str = "RUSTY_EXEC_REDIRECT";

/// How the child's stdout and stderr reach the executor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RedirectPolicy {
    /// Two pipes, two pumps; stderr can be reported on its own.
    #[default]
    Separate,
    /// One pipe shared by stdout and stderr; the OS keeps them interleaved.
    Merged,
    /// Like `Merged`, and ask the child to emit color even without a tty.
    MergedColor,
}

impl RedirectPolicy {
    pub fn is_merged(self) -> bool {
        !matches!(self, RedirectPolicy::Separate)
    }
}

impl FromStr for RedirectPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "separate" => Ok(RedirectPolicy::Separate),
            "merged" => Ok(RedirectPolicy::Merged),
            "merged-color" => Ok(RedirectPolicy::MergedColor),
            other => Err(ConfigError::UnknownRedirect(other.to_string())),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unknown redirect policy '{0}' (expected separate, merged or merged-color)")]
    UnknownRedirect(String),

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecConfig {
    pub redirect: RedirectPolicy,
    /// Bytes per pump read.
    pub chunk_size: usize,
    /// How often the launcher checks whether the child has exited.
    pub poll_interval_ms: u64,
    /// How long `interrupt()` waits after SIGTERM before killing.
    pub interrupt_grace_ms: u64,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            redirect: RedirectPolicy::Separate,
            chunk_size: 8192,
            poll_interval_ms: 10,
            interrupt_grace_ms: 200,
        }
    }
}

impl ExecConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()
    }

    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(CONFIG_PATH_VAR).filter(|p| !p.is_empty()) {
            Some(path) => {
                let path = PathBuf::from(path);
                let json = std::fs::read_to_string(&path)
                    .map_err(|source| ConfigError::Read { path, source })?;
                Self::from_json(&json)?
            }
            None => Self::default(),
        };

        if let Some(policy) = lookup(REDIRECT_VAR).filter(|p| !p.is_empty()) {
            config.redirect = policy.parse()?;
        }

        config.validate()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid("chunk_size must be positive".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("poll_interval_ms must be positive".into()));
        }
        Ok(self)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn interrupt_grace(&self) -> Duration {
        Duration::from_millis(self.interrupt_grace_ms)
    }
}
