// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process job scheduler backed by tokio timers

use super::{JobError, JobId, JobParameters, JobScheduler, JobSpec};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

struct PendingJob {
    spec: JobSpec,
    /// Distinguishes a replaced job's timer from the current one
    token: u64,
    timer: JoinHandle<()>,
}

#[derive(Default)]
struct JobTable {
    pending: HashMap<JobId, PendingJob>,
    next_token: u64,
}

/// Fires due jobs into a channel drained by the daemon's event loop
#[derive(Clone)]
pub struct LocalJobScheduler {
    table: Arc<Mutex<JobTable>>,
    tx: mpsc::Sender<JobParameters>,
    max_pending: usize,
}

impl LocalJobScheduler {
    /// Create a scheduler and the receiver its jobs fire into
    pub fn new(max_pending: usize) -> (Self, mpsc::Receiver<JobParameters>) {
        let (tx, rx) = mpsc::channel(64);
        let scheduler = Self {
            table: Arc::new(Mutex::new(JobTable::default())),
            tx,
            max_pending,
        };
        (scheduler, rx)
    }

    pub fn pending_count(&self) -> usize {
        self.table
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pending
            .len()
    }
}

#[async_trait]
impl JobScheduler for LocalJobScheduler {
    async fn schedule(&self, spec: JobSpec) -> Result<(), JobError> {
        if self.tx.is_closed() {
            return Err(JobError::Closed);
        }

        let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = table.pending.remove(&spec.id) {
            previous.timer.abort();
        } else if table.pending.len() >= self.max_pending {
            return Err(JobError::Rejected {
                id: spec.id,
                limit: self.max_pending,
            });
        }

        table.next_token += 1;
        let token = table.next_token;
        let id = spec.id;
        let delay = spec.delay;
        let params = spec.parameters();
        let shared = Arc::clone(&self.table);
        let tx = self.tx.clone();

        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut table = shared.lock().unwrap_or_else(|e| e.into_inner());
                match table.pending.get(&id) {
                    Some(job) if job.token == token => {
                        table.pending.remove(&id);
                    }
                    _ => return,
                }
            }
            if tx.send(params).await.is_err() {
                tracing::debug!(job_id = id, "job fired after receiver closed");
            }
        });

        table.pending.insert(id, PendingJob { spec, token, timer });
        Ok(())
    }

    async fn cancel(&self, id: JobId) {
        let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(job) = table.pending.remove(&id) {
            job.timer.abort();
        }
    }

    async fn all_pending_jobs(&self) -> Vec<JobSpec> {
        let table = self.table.lock().unwrap_or_else(|e| e.into_inner());
        let mut specs: Vec<JobSpec> = table.pending.values().map(|j| j.spec.clone()).collect();
        specs.sort_by_key(|s| s.id);
        specs
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
