// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake job scheduler for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{JobError, JobId, JobParameters, JobScheduler, JobSpec};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Recorded scheduler call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobCall {
    Schedule(JobSpec),
    Cancel(JobId),
}

/// Fake job scheduler: jobs stay pending until a test fires them
#[derive(Clone, Default)]
pub struct FakeJobScheduler {
    pending: Arc<Mutex<BTreeMap<JobId, JobSpec>>>,
    calls: Arc<Mutex<Vec<JobCall>>>,
    reject: Arc<AtomicBool>,
}

impl FakeJobScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<JobCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Submissions only, in order
    pub fn scheduled(&self) -> Vec<JobSpec> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                JobCall::Schedule(spec) => Some(spec),
                JobCall::Cancel(_) => None,
            })
            .collect()
    }

    pub fn cancelled(&self) -> Vec<JobId> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                JobCall::Cancel(id) => Some(id),
                JobCall::Schedule(_) => None,
            })
            .collect()
    }

    /// Make every following submission fail
    pub fn set_reject(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }

    /// Seed a pending job without recording a call
    pub fn insert_pending(&self, spec: JobSpec) {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(spec.id, spec);
    }

    /// Fire a pending job, removing it from the table
    pub fn fire(&self, id: JobId) -> Option<JobParameters> {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id)
            .map(|spec| spec.parameters())
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

#[async_trait]
impl JobScheduler for FakeJobScheduler {
    async fn schedule(&self, spec: JobSpec) -> Result<(), JobError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(JobCall::Schedule(spec.clone()));

        if self.reject.load(Ordering::SeqCst) {
            return Err(JobError::Rejected {
                id: spec.id,
                limit: 0,
            });
        }
        self.insert_pending(spec);
        Ok(())
    }

    async fn cancel(&self, id: JobId) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(JobCall::Cancel(id));
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id);
    }

    async fn all_pending_jobs(&self) -> Vec<JobSpec> {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect()
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
