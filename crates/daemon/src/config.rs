// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon settings loaded from `<state>/config.toml`.
//!
//! Every key is optional; a missing file means all defaults.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use sw_engine::{BaseClientConfig, ManagerConfig, ScriptLimits};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DaemonConfig {
    /// `User-Agent` sent with every check
    pub user_agent: String,
    pub max_redirects: usize,
    /// How often the daemon re-runs boot recovery
    #[serde(with = "humantime_serde")]
    pub recovery_interval: Duration,
    /// Pending jobs accepted before new submissions are rejected
    pub max_pending_jobs: usize,
    /// Post desktop notifications for failing sites
    pub notifications: bool,
    #[serde(with = "humantime_serde")]
    pub script_timeout: Duration,
    /// Bytes
    pub script_memory_limit: usize,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        let client = BaseClientConfig::default();
        let script = ScriptLimits::default();
        Self {
            user_agent: client.user_agent,
            max_redirects: client.max_redirects,
            recovery_interval: Duration::from_secs(15 * 60),
            max_pending_jobs: 100,
            notifications: true,
            script_timeout: script.timeout,
            script_memory_limit: script.memory_limit,
        }
    }
}

impl DaemonConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn manager_config(&self) -> ManagerConfig {
        ManagerConfig {
            client: BaseClientConfig {
                user_agent: self.user_agent.clone(),
                max_redirects: self.max_redirects,
            },
            script: ScriptLimits {
                timeout: self.script_timeout,
                memory_limit: self.script_memory_limit,
            },
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
