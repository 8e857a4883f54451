// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::jobs::{JobError, JobId, JobScheduler, JobSpec};
use crate::notify::{NotifyAdapter, NotifyError};
use async_trait::async_trait;
use sw_core::Site;
use tracing::Instrument;

/// Wrapper that adds tracing to any JobScheduler
#[derive(Clone)]
pub struct TracedJobScheduler<J> {
    inner: J,
}

impl<J> TracedJobScheduler<J> {
    pub fn new(inner: J) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &J {
        &self.inner
    }
}

#[async_trait]
impl<J: JobScheduler> JobScheduler for TracedJobScheduler<J> {
    async fn schedule(&self, spec: JobSpec) -> Result<(), JobError> {
        let span = tracing::info_span!("jobs.schedule", job_id = spec.id);
        async move {
            let delay_ms = spec.delay.as_millis() as u64;
            let result = self.inner.schedule(spec).await;

            match &result {
                Ok(()) => tracing::info!(delay_ms, "job scheduled"),
                Err(e) => tracing::warn!(delay_ms, error = %e, "job rejected"),
            }

            result
        }
        .instrument(span)
        .await
    }

    async fn cancel(&self, id: JobId) {
        let span = tracing::info_span!("jobs.cancel", job_id = id);
        async move {
            self.inner.cancel(id).await;
            tracing::debug!("job cancelled");
        }
        .instrument(span)
        .await
    }

    async fn all_pending_jobs(&self) -> Vec<JobSpec> {
        let jobs = self.inner.all_pending_jobs().await;
        tracing::trace!(count = jobs.len(), "listed pending jobs");
        jobs
    }
}

/// Wrapper that adds tracing to any NotifyAdapter
#[derive(Clone)]
pub struct TracedNotifyAdapter<N> {
    inner: N,
}

impl<N> TracedNotifyAdapter<N> {
    pub fn new(inner: N) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &N {
        &self.inner
    }
}

#[async_trait]
impl<N: NotifyAdapter> NotifyAdapter for TracedNotifyAdapter<N> {
    async fn post_status(&self, site: &Site) -> Result<(), NotifyError> {
        let span = tracing::info_span!("notify.post", site_id = site.id, status = %site.status());
        async move {
            let start = std::time::Instant::now();
            let result = self.inner.post_status(site).await;
            let elapsed = start.elapsed();

            match &result {
                Ok(()) => tracing::info!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    "notification posted"
                ),
                Err(e) => tracing::error!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "post failed"
                ),
            }

            result
        }
        .instrument(span)
        .await
    }

    async fn cancel_status(&self, site: &Site) -> Result<(), NotifyError> {
        let span = tracing::info_span!("notify.cancel", site_id = site.id);
        async move {
            let result = self.inner.cancel_status(site).await;
            // Cancelling a notification that is already gone is harmless
            match &result {
                Ok(()) => tracing::debug!("notification cancelled"),
                Err(e) => tracing::warn!(error = %e, "cancel failed"),
            }

            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
