// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background job entry point
//!
//! One invocation runs one full check cycle for one site, strictly in order:
//! mark checking, request, evaluate, record, notify, reschedule.

use crate::error::EngineError;
use crate::manager::{ScheduleOptions, ValidationManager};
use crate::validation::{ValidationStrategy, Verdict};
use std::sync::Arc;
use std::time::Duration;
use sw_adapters::{JobParameters, JobScheduler, NotifyAdapter};
use sw_core::{Clock, Site, SiteId, Status};
use sw_storage::StoreError;
use tracing::Instrument;

/// How an invocation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Cycle ran; carries the site as recorded
    Completed(Site),
    /// The site was deleted; the job must not be retried
    SiteMissing,
    /// The site was disabled after the job was submitted
    Disabled,
}

/// Runs check cycles for fired jobs
pub struct ValidationJob<J, N, C> {
    manager: Arc<ValidationManager<J, N, C>>,
}

impl<J, N, C> Clone for ValidationJob<J, N, C> {
    fn clone(&self) -> Self {
        Self {
            manager: Arc::clone(&self.manager),
        }
    }
}

impl<J, N, C> ValidationJob<J, N, C>
where
    J: JobScheduler,
    N: NotifyAdapter,
    C: Clock,
{
    pub fn new(manager: Arc<ValidationManager<J, N, C>>) -> Self {
        Self { manager }
    }

    pub async fn on_start(&self, params: JobParameters) -> Result<JobOutcome, EngineError> {
        let site_id = params.extras.site_id;
        let span = tracing::info_span!("job.run", site_id, job_id = params.job_id);
        self.run(site_id).instrument(span).await
    }

    /// The facility stopped the job early; nothing to undo
    pub fn on_stop(&self, params: JobParameters) {
        tracing::info!(
            site_id = params.extras.site_id,
            job_id = params.job_id,
            "job stopped"
        );
    }

    async fn run(&self, site_id: SiteId) -> Result<JobOutcome, EngineError> {
        let manager = &self.manager;
        let Some(site) = manager.get_site(site_id).await? else {
            tracing::info!("site no longer exists");
            return Ok(JobOutcome::SiteMissing);
        };
        if site.is_disabled() {
            tracing::info!("site disabled, skipping");
            return Ok(JobOutcome::Disabled);
        }

        let marked = site.with_status(Status::Checking, None, manager.clock().epoch_ms());
        let Some(checking) = self.record(&marked, None).await? else {
            return Ok(JobOutcome::SiteMissing);
        };

        let (status, reason) = self.check(&checking).await;

        // The site may have changed during the request
        let Some(current) = manager.get_site(site_id).await? else {
            tracing::info!("site removed during check");
            return Ok(JobOutcome::SiteMissing);
        };
        if current.is_disabled() {
            tracing::info!("site disabled during check, dropping result");
            if current.status() == Status::Checking {
                let now = manager.clock().epoch_ms();
                let waiting = current.with_status(Status::Waiting, None, now);
                self.record(&waiting, None).await?;
            }
            return Ok(JobOutcome::Disabled);
        }

        let timestamp_ms = manager.clock().epoch_ms();
        let (finished, retry_delay) =
            apply_retry_policy(current.with_status(status, reason, timestamp_ms));
        let attempts = finished.retry_policy.map(|p| p.attempts);
        let Some(checked) = self.record(&finished, attempts).await? else {
            return Ok(JobOutcome::SiteMissing);
        };
        tracing::info!(status = %checked.status(), "check finished");

        match checked.status() {
            Status::Ok => manager.cancel_notification(&checked).await,
            _ => manager.post_notification(&checked).await,
        }

        let options = ScheduleOptions {
            from_finishing_job: true,
            override_delay: retry_delay,
            ..ScheduleOptions::default()
        };
        // Skipped when the site was disabled after the result was read
        manager.schedule_check(&checked, options).await?;

        Ok(JobOutcome::Completed(checked))
    }

    /// Request and evaluate; every failure becomes an error status
    async fn check(&self, site: &Site) -> (Status, Option<String>) {
        let result = match self.manager.perform_check(site).await {
            Ok(result) => result,
            Err(e) => return (Status::Error, Some(e.to_string())),
        };
        let Some(response) = result.response else {
            let reason = result.site.last_result.and_then(|r| r.reason);
            return (Status::Error, reason);
        };

        let strategy = match site.settings.as_ref() {
            Some(settings) => ValidationStrategy::from_settings(settings),
            None => Err(EngineError::MissingSettings),
        };
        let verdict = match strategy {
            Ok(strategy) => {
                strategy
                    .evaluate(&response.body, self.manager.script_limits())
                    .await
            }
            Err(e) => Verdict::Error(e.to_string()),
        };

        match verdict {
            Verdict::Ok => (Status::Ok, None),
            Verdict::Error(reason) => (Status::Error, Some(reason)),
        }
    }

    /// Persist `site`'s result and broadcast the stored site.
    ///
    /// Configuration is left as stored; `None` when the site was deleted meanwhile.
    async fn record(
        &self,
        site: &Site,
        retry_attempts: Option<u32>,
    ) -> Result<Option<Site>, EngineError> {
        let id = site.id;
        let result = site.last_result.clone().unwrap_or_default();
        match self
            .manager
            .with_store(move |store| store.record_result(id, &result, retry_attempts))
            .await
        {
            Ok(stored) => {
                self.manager.publish(&stored);
                Ok(Some(stored))
            }
            Err(EngineError::Store(StoreError::NotFound(_))) => {
                tracing::info!("site removed during check");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// Advance the retry streak for a terminal result.
///
/// Returns the delay to use instead of the normal interval, if any.
pub fn apply_retry_policy(site: Site) -> (Site, Option<Duration>) {
    let Some(policy) = site.retry_policy else {
        return (site, None);
    };

    if site.status() == Status::Ok {
        return (site.with_retry_policy(Some(policy.with_attempts(0))), None);
    }
    if policy.has_retries_left() {
        let delay = Duration::from_millis(policy.retry_interval_ms());
        let policy = policy.with_attempts(policy.attempts + 1);
        return (site.with_retry_policy(Some(policy)), Some(delay));
    }
    (site.with_retry_policy(Some(policy.with_attempts(0))), None)
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
