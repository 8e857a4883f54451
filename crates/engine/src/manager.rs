// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Validation scheduling and execution
//!
//! At most one pending job exists per site. That is enforced by checking
//! the scheduler's pending table before submitting, so two callers racing
//! on the same site may both pass the check; the second submission then
//! replaces the first.

use crate::error::EngineError;
use crate::network::{BaseClientConfig, HttpClientFactory};
use crate::script::ScriptLimits;
use std::sync::Arc;
use std::time::Duration;
use sw_adapters::{JobScheduler, JobSpec, NotifyAdapter};
use sw_core::{Clock, Event, EventBus, Site, SiteId, Status};
use sw_storage::{SiteStore, StoreError};
use tracing::Instrument;

/// Delay used for "check right now" submissions
pub const RIGHT_NOW: Duration = Duration::from_millis(1);

/// Adapter and storage dependencies
pub struct ManagerDeps<J, N> {
    pub jobs: J,
    pub notify: N,
    pub store: Arc<SiteStore>,
    pub events: EventBus,
}

/// Tunables shared by every check
#[derive(Debug, Clone, Default)]
pub struct ManagerConfig {
    pub client: BaseClientConfig,
    pub script: ScriptLimits,
}

/// Options for [`ValidationManager::schedule_check`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ScheduleOptions {
    /// Run after [`RIGHT_NOW`] instead of the site's interval
    pub right_now: bool,
    /// Cancel any pending job first; defaults to `right_now`
    pub cancel_previous: Option<bool>,
    /// Submitted by the job that just ran for this site
    pub from_finishing_job: bool,
    /// Delay to use instead of the site's interval
    pub override_delay: Option<Duration>,
}

impl ScheduleOptions {
    pub fn right_now() -> Self {
        Self {
            right_now: true,
            ..Self::default()
        }
    }
}

/// Outcome of a scheduling request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheduled {
    Submitted { delay: Duration },
    /// Disabled site, or no usable interval
    Skipped,
    /// The job facility refused the submission
    Rejected,
}

/// Response retained from a successful request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub code: u16,
    pub body: String,
}

/// Outcome of one HTTP check, before mode evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    /// The site carrying the terminal status of the request
    pub site: Site,
    /// Present when the request succeeded
    pub response: Option<HttpResponse>,
}

/// Schedules, cancels and performs site checks
pub struct ValidationManager<J, N, C> {
    jobs: J,
    notify: N,
    store: Arc<SiteStore>,
    events: EventBus,
    http: HttpClientFactory,
    script: ScriptLimits,
    clock: C,
}

impl<J, N, C> ValidationManager<J, N, C>
where
    J: JobScheduler,
    N: NotifyAdapter,
    C: Clock,
{
    pub fn new(deps: ManagerDeps<J, N>, config: ManagerConfig, clock: C) -> Self {
        Self {
            jobs: deps.jobs,
            notify: deps.notify,
            store: deps.store,
            events: deps.events,
            http: HttpClientFactory::new(config.client),
            script: config.script,
            clock,
        }
    }

    pub fn jobs(&self) -> &J {
        &self.jobs
    }

    pub fn notify(&self) -> &N {
        &self.notify
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn script_limits(&self) -> ScriptLimits {
        self.script
    }

    /// Run a store call on the blocking pool
    pub(crate) async fn with_store<T, F>(&self, f: F) -> Result<T, EngineError>
    where
        F: FnOnce(&SiteStore) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || f(&store))
            .await
            .map_err(|e| EngineError::Join(e.to_string()))?
            .map_err(EngineError::from)
    }

    pub(crate) fn publish(&self, site: &Site) {
        self.events.publish(Event::StatusUpdate { site: site.clone() });
    }

    async fn has_pending_job(&self, id: SiteId) -> bool {
        self.jobs
            .all_pending_jobs()
            .await
            .iter()
            .any(|spec| spec.id == id)
    }

    /// Schedule an immediate check for every enabled site without a pending job
    pub async fn ensure_scheduled_checks(&self) -> Result<usize, EngineError> {
        let sites = self.with_store(|store| store.all(None)).await?;
        let pending: Vec<_> = self
            .jobs
            .all_pending_jobs()
            .await
            .into_iter()
            .map(|spec| spec.id)
            .collect();

        let mut scheduled = 0;
        for site in sites
            .iter()
            .filter(|s| !s.is_disabled() && !pending.contains(&s.id))
        {
            let options = ScheduleOptions {
                right_now: true,
                cancel_previous: Some(false),
                ..ScheduleOptions::default()
            };
            match self.schedule_check(site, options).await {
                Ok(Scheduled::Submitted { .. }) => scheduled += 1,
                Ok(_) => {}
                Err(e) => tracing::warn!(site_id = site.id, error = %e, "could not schedule check"),
            }
        }

        tracing::info!(sites = sites.len(), scheduled, "ensured scheduled checks");
        Ok(scheduled)
    }

    pub async fn schedule_check(
        &self,
        site: &Site,
        options: ScheduleOptions,
    ) -> Result<Scheduled, EngineError> {
        if !site.is_saved() {
            return Err(EngineError::UnsavedSite);
        }
        let settings = site.settings.as_ref().ok_or(EngineError::MissingSettings)?;

        if options.cancel_previous.unwrap_or(options.right_now) {
            self.jobs.cancel(site.id).await;
        } else if !options.from_finishing_job && self.has_pending_job(site.id).await {
            return Err(EngineError::AlreadyScheduled(site.id));
        }

        if settings.disabled {
            tracing::debug!(site_id = site.id, "site disabled, not scheduling");
            return Ok(Scheduled::Skipped);
        }

        let delay = if options.right_now {
            RIGHT_NOW
        } else if let Some(delay) = options.override_delay {
            delay
        } else if settings.validation_interval_ms > 0 {
            Duration::from_millis(settings.validation_interval_ms)
        } else {
            tracing::warn!(site_id = site.id, "validation interval is zero, not scheduling");
            return Ok(Scheduled::Skipped);
        };

        match self.jobs.schedule(JobSpec::for_site(site.id, delay)).await {
            Ok(()) => Ok(Scheduled::Submitted { delay }),
            Err(e) => {
                tracing::warn!(site_id = site.id, error = %e, "check submission rejected");
                Ok(Scheduled::Rejected)
            }
        }
    }

    /// Cancel any pending check for the site
    pub async fn cancel_check(&self, site: &Site) -> Result<(), EngineError> {
        if !site.is_saved() {
            return Err(EngineError::UnsavedSite);
        }
        self.jobs.cancel(site.id).await;
        Ok(())
    }

    /// Perform the HTTP request for a site and classify the outcome
    pub async fn perform_check(&self, site: &Site) -> Result<CheckResult, EngineError> {
        if !site.is_saved() {
            return Err(EngineError::UnsavedSite);
        }
        let settings = site.settings.as_ref().ok_or(EngineError::MissingSettings)?;
        if settings.network_timeout_ms == 0 {
            return Err(EngineError::NonPositiveTimeout(site.id));
        }
        let timeout_ms = settings.network_timeout_ms;

        let span = tracing::info_span!("check.http", site_id = site.id, url = %site.url);
        let result = async move {
            let client = match self.http.client_for(site) {
                Ok(client) => client,
                Err(e) => {
                    tracing::warn!(error = %e, "could not build client");
                    return self.failed(site, e.to_string());
                }
            };

            let mut request = client.get(&site.url);
            for header in &site.headers {
                request = request.header(header.key.as_str(), header.value.as_str());
            }

            let start = std::time::Instant::now();
            let response = match request.send().await {
                Ok(response) => response,
                Err(e) => return self.failed(site, transport_reason(&e, timeout_ms)),
            };
            let code = response.status().as_u16();
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => return self.failed(site, transport_reason(&e, timeout_ms)),
            };
            tracing::info!(
                code,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "response received"
            );

            if is_reachable(code) {
                CheckResult {
                    site: site
                        .clone()
                        .with_status(Status::Ok, None, self.clock.epoch_ms()),
                    response: Some(HttpResponse { code, body }),
                }
            } else {
                let detail = if body.is_empty() { "Unknown" } else { body.as_str() };
                self.failed(site, format!("Response {} - {}", code, detail))
            }
        }
        .instrument(span)
        .await;
        Ok(result)
    }

    fn failed(&self, site: &Site, reason: String) -> CheckResult {
        CheckResult {
            site: site
                .clone()
                .with_status(Status::Error, Some(reason), self.clock.epoch_ms()),
            response: None,
        }
    }

    // Site management, as requested by clients

    pub async fn list_sites(&self, tag: Option<String>) -> Result<Vec<Site>, EngineError> {
        self.with_store(move |store| store.all(tag.as_deref())).await
    }

    pub async fn get_site(&self, id: SiteId) -> Result<Option<Site>, EngineError> {
        self.with_store(move |store| store.get(id)).await
    }

    async fn require_site(&self, id: SiteId) -> Result<Site, EngineError> {
        self.get_site(id).await?.ok_or(EngineError::SiteNotFound(id))
    }

    /// Persist a new site and check it right away
    pub async fn add_site(&self, site: Site) -> Result<(Site, Scheduled), EngineError> {
        let saved = self.with_store(move |store| store.put(&site)).await?;
        tracing::info!(site_id = saved.id, url = %saved.url, "site added");
        self.publish(&saved);
        let scheduled = self.schedule_check(&saved, ScheduleOptions::right_now()).await?;
        Ok((saved, scheduled))
    }

    /// Persist an edited site and restart its schedule
    pub async fn update_site(&self, site: Site) -> Result<(Site, Scheduled), EngineError> {
        let id = site.id;
        let to_store = site.clone();
        self.with_store(move |store| store.update(&to_store)).await?;
        let saved = self.require_site(id).await?;
        self.publish(&saved);

        if saved.is_disabled() {
            self.cancel_check(&saved).await?;
            self.cancel_notification(&saved).await;
            return Ok((saved, Scheduled::Skipped));
        }
        let scheduled = self.schedule_check(&saved, ScheduleOptions::right_now()).await?;
        Ok((saved, scheduled))
    }

    /// Delete a site with everything it owns
    pub async fn remove_site(&self, id: SiteId) -> Result<Site, EngineError> {
        let site = self.require_site(id).await?;
        self.cancel_check(&site).await?;
        self.cancel_notification(&site).await;

        let to_delete = site.clone();
        self.with_store(move |store| store.delete(&to_delete)).await?;
        tracing::info!(site_id = id, "site removed");
        self.events.publish(Event::SiteRemoved { id });
        Ok(site)
    }

    /// Check a site as soon as possible
    pub async fn check_now(&self, id: SiteId) -> Result<Scheduled, EngineError> {
        let site = self.require_site(id).await?;
        self.schedule_check(&site, ScheduleOptions::right_now()).await
    }

    /// Enable or disable a site's checks
    pub async fn set_disabled(&self, id: SiteId, disabled: bool) -> Result<Site, EngineError> {
        let site = self.require_site(id).await?;
        let settings = site
            .settings
            .clone()
            .ok_or(EngineError::MissingSettings)?
            .with_disabled(disabled);
        let mut site = site.with_settings(settings);

        if disabled {
            self.cancel_check(&site).await?;
            self.cancel_notification(&site).await;
            site = site.with_status(Status::Waiting, None, self.clock.epoch_ms());
        }

        let to_store = site.clone();
        self.with_store(move |store| store.update(&to_store)).await?;
        self.publish(&site);

        if !disabled {
            self.schedule_check(&site, ScheduleOptions::right_now()).await?;
        }
        Ok(site)
    }

    pub(crate) async fn cancel_notification(&self, site: &Site) {
        if let Err(e) = self.notify.cancel_status(site).await {
            tracing::warn!(site_id = site.id, error = %e, "could not cancel notification");
        }
    }

    pub(crate) async fn post_notification(&self, site: &Site) {
        if let Err(e) = self.notify.post_status(site).await {
            tracing::warn!(site_id = site.id, error = %e, "could not post notification");
        }
    }
}

/// 2xx, plus 401: an auth wall still proves the site is up
fn is_reachable(code: u16) -> bool {
    (200..300).contains(&code) || code == 401
}

fn transport_reason(error: &reqwest::Error, timeout_ms: u64) -> String {
    if error.is_timeout() {
        return format!("Timed out after {}ms", timeout_ms);
    }
    let mut reason = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        reason.push_str(": ");
        reason.push_str(&cause.to_string());
        source = cause.source();
    }
    reason
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
