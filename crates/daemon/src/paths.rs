// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Where the daemon keeps its files
//!
//! Shared by `swd` and `sw` so both sides agree on the socket and PID file.

use std::path::PathBuf;

use thiserror::Error;

const APP_DIR: &str = "sitewatch";

#[derive(Debug, Error)]
#[error("Could not determine state directory (set SW_STATE_DIR or HOME)")]
pub struct NoStateDir;

/// Every file the daemon owns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonPaths {
    pub state_dir: PathBuf,
    /// Unix socket
    pub socket_path: PathBuf,
    /// Lock file, holds the daemon PID
    pub lock_path: PathBuf,
    pub version_path: PathBuf,
    pub log_path: PathBuf,
    pub wal_path: PathBuf,
    /// Optional `config.toml`
    pub config_path: PathBuf,
}

impl DaemonPaths {
    /// Resolve paths from the environment
    pub fn from_env() -> Result<Self, NoStateDir> {
        let state_dir = state_dir_from(
            env_path("SW_STATE_DIR"),
            env_path("XDG_STATE_HOME"),
            env_path("HOME"),
        )
        .ok_or(NoStateDir)?;
        let socket_dir = env_path("SW_SOCKET_DIR").unwrap_or_else(default_socket_dir);
        Ok(Self::new(state_dir, socket_dir))
    }

    pub fn new(state_dir: PathBuf, socket_dir: PathBuf) -> Self {
        Self {
            socket_path: socket_dir.join("swd.sock"),
            lock_path: state_dir.join("daemon.pid"),
            version_path: state_dir.join("daemon.version"),
            log_path: state_dir.join("daemon.log"),
            wal_path: state_dir.join("sites.wal"),
            config_path: state_dir.join("config.toml"),
            state_dir,
        }
    }
}

/// `SW_STATE_DIR`, else `$XDG_STATE_HOME/sitewatch`, else `~/.local/state/sitewatch`
pub fn state_dir_from(
    explicit: Option<PathBuf>,
    xdg_state_home: Option<PathBuf>,
    home: Option<PathBuf>,
) -> Option<PathBuf> {
    if let Some(dir) = explicit {
        return Some(dir);
    }
    if let Some(xdg) = xdg_state_home {
        return Some(xdg.join(APP_DIR));
    }
    home.map(|h| h.join(".local/state").join(APP_DIR))
}

/// Short path under /tmp to stay inside the SUN_LEN limit (104 bytes on macOS)
fn default_socket_dir() -> PathBuf {
    PathBuf::from("/tmp").join(APP_DIR)
}

fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
