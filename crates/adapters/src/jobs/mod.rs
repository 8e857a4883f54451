// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deferred job facility
//!
//! Jobs are keyed by a caller-chosen identifier. At most one job per id is
//! pending; scheduling an id that is already pending replaces it. Nothing
//! survives a process restart.

mod local;

#[cfg(any(test, feature = "test-support"))]
mod fake;

pub use local::LocalJobScheduler;

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeJobScheduler, JobCall};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use sw_core::SiteId;
use thiserror::Error;

/// Identifier of a deferred job
pub type JobId = u64;

/// Errors from job scheduling
#[derive(Debug, Error)]
pub enum JobError {
    #[error("job {id} rejected: {limit} jobs already pending")]
    Rejected { id: JobId, limit: usize },
    #[error("job facility is shut down")]
    Closed,
}

/// Data carried from submission to invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobExtras {
    pub site_id: SiteId,
}

/// A job submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
    pub id: JobId,
    /// Minimum latency before the job may run
    pub delay: Duration,
    pub extras: JobExtras,
}

impl JobSpec {
    pub fn for_site(site_id: SiteId, delay: Duration) -> Self {
        Self {
            id: site_id,
            delay,
            extras: JobExtras { site_id },
        }
    }

    /// Parameters delivered when this job fires
    pub fn parameters(&self) -> JobParameters {
        JobParameters {
            job_id: self.id,
            extras: self.extras,
        }
    }
}

/// Delivered to the job entry point when a job fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobParameters {
    pub job_id: JobId,
    pub extras: JobExtras,
}

/// Adapter for submitting and cancelling deferred jobs
#[async_trait]
pub trait JobScheduler: Clone + Send + Sync + 'static {
    /// Submit a job; replaces any pending job with the same id
    async fn schedule(&self, spec: JobSpec) -> Result<(), JobError>;

    /// Cancel a pending job. Unknown ids are ignored.
    async fn cancel(&self, id: JobId);

    /// Jobs submitted but not yet fired, ordered by id
    async fn all_pending_jobs(&self) -> Vec<JobSpec>;
}
