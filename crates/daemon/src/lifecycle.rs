// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, shutdown, recovery.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use fs2::FileExt;
use sw_adapters::{
    DesktopNotifyAdapter, ForegroundGate, JobParameters, LocalJobScheduler, NoOpNotifyAdapter,
    NotifyAdapter, NotifyError, TracedJobScheduler, TracedNotifyAdapter,
};
use sw_core::{EventBus, Site, SystemClock};
use sw_daemon::paths::DaemonPaths;
use sw_engine::{
    BootHook, EngineError, JobOutcome, ManagerDeps, SystemSignal, ValidationJob,
    ValidationManager,
};
use sw_storage::{SiteStore, StoreError};
use thiserror::Error;
use tokio::net::UnixListener;
use tokio::sync::{mpsc, Notify};
use tracing::{error, info, warn};

use crate::config::DaemonConfig;

/// Job facility with concrete adapter types (wrapped with tracing)
pub type DaemonJobs = TracedJobScheduler<LocalJobScheduler>;
/// Notifier chain: tracing, then foreground suppression, then the desktop
pub type DaemonNotify = TracedNotifyAdapter<ForegroundGate<DaemonNotifier>>;
pub type DaemonManager = ValidationManager<DaemonJobs, DaemonNotify, SystemClock>;

/// Desktop notifications, or nothing when `notifications = false`
#[derive(Clone)]
pub enum DaemonNotifier {
    Desktop(DesktopNotifyAdapter),
    Silent(NoOpNotifyAdapter),
}

impl DaemonNotifier {
    pub fn from_config(config: &DaemonConfig) -> Self {
        if config.notifications {
            DaemonNotifier::Desktop(DesktopNotifyAdapter::default())
        } else {
            DaemonNotifier::Silent(NoOpNotifyAdapter::new())
        }
    }
}

#[async_trait]
impl NotifyAdapter for DaemonNotifier {
    async fn post_status(&self, site: &Site) -> Result<(), NotifyError> {
        match self {
            DaemonNotifier::Desktop(n) => n.post_status(site).await,
            DaemonNotifier::Silent(n) => n.post_status(site).await,
        }
    }

    async fn cancel_status(&self, site: &Site) -> Result<(), NotifyError> {
        match self {
            DaemonNotifier::Desktop(n) => n.cancel_status(site).await,
            DaemonNotifier::Silent(n) => n.cancel_status(site).await,
        }
    }
}

/// Everything a connection handler needs, cheap to clone into tasks
#[derive(Clone)]
pub struct ServerContext {
    pub manager: Arc<DaemonManager>,
    /// Same gate the notifier chain uses; `watch` clients attach to it
    pub gate: ForegroundGate<DaemonNotifier>,
    pub start_time: Instant,
    pub shutdown: Arc<Notify>,
}

/// Daemon state during operation
pub struct DaemonState {
    pub paths: DaemonPaths,
    pub config: DaemonConfig,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    /// Unix socket listener
    pub listener: UnixListener,
    pub manager: Arc<DaemonManager>,
    pub gate: ForegroundGate<DaemonNotifier>,
    /// Jobs fired by the local job facility
    pub job_invocations: mpsc::Receiver<JobParameters>,
    /// When daemon started
    pub start_time: Instant,
    /// Signalled by a `Shutdown` request
    pub shutdown_requested: Arc<Notify>,
}

impl DaemonState {
    pub fn context(&self) -> ServerContext {
        ServerContext {
            manager: Arc::clone(&self.manager),
            gate: self.gate.clone(),
            start_time: self.start_time,
            shutdown: Arc::clone(&self.shutdown_requested),
        }
    }

    /// Run a fired job on its own task
    pub fn spawn_job(&self, params: JobParameters) {
        let job = ValidationJob::new(Arc::clone(&self.manager));
        tokio::spawn(async move {
            let site_id = params.extras.site_id;
            match job.on_start(params).await {
                Ok(JobOutcome::Completed(site)) => {
                    tracing::debug!(site_id, status = %site.status(), "job completed");
                }
                Ok(outcome) => tracing::debug!(site_id, ?outcome, "job skipped"),
                Err(e) => error!(site_id, error = %e, "job failed"),
            }
        });
    }

    /// Periodic re-run of boot recovery
    pub async fn recover(&self) {
        if let Err(e) = self.manager.ensure_scheduled_checks().await {
            warn!("Recovery pass failed: {}", e);
        }
    }

    /// Shutdown the daemon gracefully
    pub async fn shutdown(&mut self) -> Result<(), LifecycleError> {
        info!("Shutting down daemon...");

        // Pending jobs are lost on exit; boot recovery reschedules them
        for (path, what) in [
            (&self.paths.socket_path, "socket"),
            (&self.paths.lock_path, "PID"),
            (&self.paths.version_path, "version"),
        ] {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(path) {
                    warn!("Failed to remove {} file: {}", what, e);
                }
            }
        }

        info!("Daemon shutdown complete");
        Ok(())
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind socket at {0}: {1}")]
    BindFailed(std::path::PathBuf, std::io::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Config error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Recovery failed: {0}")]
    Engine(#[from] EngineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the daemon
pub async fn startup(
    paths: &DaemonPaths,
    config: DaemonConfig,
) -> Result<DaemonState, LifecycleError> {
    match startup_inner(paths, config).await {
        Ok(state) => Ok(state),
        // Losing the lock race means another daemon owns every file
        Err(e @ LifecycleError::LockFailed(_)) => Err(e),
        Err(e) => {
            cleanup_on_failure(paths);
            Err(e)
        }
    }
}

async fn startup_inner(
    paths: &DaemonPaths,
    config: DaemonConfig,
) -> Result<DaemonState, LifecycleError> {
    // 1. Directories for state and socket
    std::fs::create_dir_all(&paths.state_dir)?;
    if let Some(parent) = paths.socket_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // 2. Lock FIRST; truncate only once we own it so a running daemon keeps its PID
    let mut lock_file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&paths.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;

    std::fs::write(&paths.version_path, env!("CARGO_PKG_VERSION"))?;

    // 3. Replay and compact the store
    let store = SiteStore::open(&paths.wal_path)?;
    let kept = store.compact()?;
    info!("Loaded store: {} operations after compaction", kept);

    // 4. Adapters
    let (local_jobs, job_invocations) = LocalJobScheduler::new(config.max_pending_jobs);
    let gate = ForegroundGate::new(DaemonNotifier::from_config(&config), false);
    let manager = Arc::new(ValidationManager::new(
        ManagerDeps {
            jobs: TracedJobScheduler::new(local_jobs),
            notify: TracedNotifyAdapter::new(gate.clone()),
            store: Arc::new(store),
            events: EventBus::new(),
        },
        config.manager_config(),
        SystemClock,
    ));

    // 5. Remove stale socket and bind (only after everything above succeeded)
    if paths.socket_path.exists() {
        std::fs::remove_file(&paths.socket_path)?;
    }
    let listener = UnixListener::bind(&paths.socket_path)
        .map_err(|e| LifecycleError::BindFailed(paths.socket_path.clone(), e))?;

    // 6. Restore schedules lost with the previous process
    let scheduled = BootHook::new(Arc::clone(&manager))
        .on_receive(SystemSignal::BootCompleted)
        .await?;
    info!("Boot recovery scheduled {} checks", scheduled);

    Ok(DaemonState {
        paths: paths.clone(),
        config,
        lock_file,
        listener,
        manager,
        gate,
        job_invocations,
        start_time: Instant::now(),
        shutdown_requested: Arc::new(Notify::new()),
    })
}

/// Clean up resources on startup failure
fn cleanup_on_failure(paths: &DaemonPaths) {
    if paths.socket_path.exists() {
        let _ = std::fs::remove_file(&paths.socket_path);
    }
    if paths.version_path.exists() {
        let _ = std::fs::remove_file(&paths.version_path);
    }
    if paths.lock_path.exists() {
        let _ = std::fs::remove_file(&paths.lock_path);
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
