// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for daemon client behavior.

use super::*;
use std::fs;
use tempfile::tempdir;

fn isolated_paths(dir: &tempfile::TempDir) -> DaemonPaths {
    DaemonPaths::new(dir.path().join("state"), dir.path().join("sock"))
}

/// connect() must not delete state files when the daemon is not running:
/// during startup polling the pid file exists before the socket does.
#[test]
fn connect_does_not_delete_pid_file() {
    let dir = tempdir().unwrap();
    let paths = isolated_paths(&dir);

    fs::create_dir_all(&paths.state_dir).unwrap();
    fs::write(&paths.lock_path, "12345\n").unwrap();

    let result = DaemonClient::connect(&paths);
    assert!(matches!(result, Err(ClientError::DaemonNotRunning)));

    assert!(paths.lock_path.exists(), "connect() must not delete pid file");
}

#[test]
fn read_daemon_pid_parses_lock_file() {
    let dir = tempdir().unwrap();
    let paths = isolated_paths(&dir);
    assert_eq!(read_daemon_pid(&paths), None);

    fs::create_dir_all(&paths.state_dir).unwrap();
    fs::write(&paths.lock_path, "4242\n").unwrap();
    assert_eq!(read_daemon_pid(&paths), Some(4242));

    fs::write(&paths.lock_path, "not a pid").unwrap();
    assert_eq!(read_daemon_pid(&paths), None);
}

#[test]
fn startup_error_only_looks_at_the_last_attempt() {
    let log = format!(
        "{p}1)\nERROR Failed to start daemon: Store error: old\n{p}2)\n\
         2026-01-01T00:00:00Z  INFO swd: Starting swd\n\
         ERROR Failed to start daemon: Failed to acquire lock: daemon already running?\n",
        p = STARTUP_MARKER_PREFIX
    );

    let err = startup_error_in(&log).unwrap();
    assert_eq!(err, "Failed to acquire lock: daemon already running?");
}

#[test]
fn clean_startup_has_no_error() {
    let log = format!(
        "{}7)\n2026-01-01T00:00:00Z  INFO swd: Daemon ready\n",
        STARTUP_MARKER_PREFIX
    );
    assert_eq!(startup_error_in(&log), None);
    assert_eq!(startup_error_in("no marker at all"), None);
}

#[tokio::test]
async fn stop_without_daemon_cleans_stale_pid() {
    let dir = tempdir().unwrap();
    let paths = isolated_paths(&dir);
    fs::create_dir_all(&paths.state_dir).unwrap();
    fs::write(&paths.lock_path, "12345\n").unwrap();

    let stopped = daemon_stop(&paths).await.unwrap();

    assert!(!stopped);
    assert!(!paths.lock_path.exists());
}

#[test]
fn error_responses_become_rejections() {
    let err = unexpected(Response::Error {
        message: "site 9 not found".to_string(),
    });
    assert_eq!(err.to_string(), "site 9 not found");
    assert!(matches!(
        unexpected(Response::Pong),
        ClientError::UnexpectedResponse
    ));
}
