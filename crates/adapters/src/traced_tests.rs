// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::jobs::{FakeJobScheduler, JobCall};
use crate::notify::{FakeNotifyAdapter, NotifyCall};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use sw_core::{SiteSettings, Status};
use tracing_subscriber::fmt::MakeWriter;

/// A writer that captures log output for testing
#[derive(Clone, Default)]
struct CapturedLogs {
    logs: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    fn new() -> Self {
        Self::default()
    }

    fn contents(&self) -> String {
        let logs = self.logs.lock().unwrap();
        String::from_utf8_lossy(&logs).to_string()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.logs.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run a test with captured tracing output
fn with_tracing<F, Fut>(f: F) -> (String, Fut::Output)
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future,
{
    let logs = CapturedLogs::new();
    let logs_clone = logs.clone();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(logs_clone)
        .with_ansi(false)
        .without_time()
        .finish();

    let result = tracing::subscriber::with_default(subscriber, || {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(f())
    });

    (logs.contents(), result)
}

fn failing_site() -> Site {
    Site::new("api", "https://api.test", SiteSettings::default())
        .with_id(8)
        .with_status(Status::Error, Some("Response 500 - Unknown".into()), 1)
}

// =============================================================================
// Tracing output verification tests
// =============================================================================

#[test]
fn traced_schedule_logs_job_and_delay() {
    let (logs, result) = with_tracing(|| async {
        let traced = TracedJobScheduler::new(FakeJobScheduler::new());
        traced
            .schedule(JobSpec::for_site(8, Duration::from_millis(250)))
            .await
    });

    assert!(result.is_ok(), "schedule should succeed: {:?}", result);
    assert!(
        logs.contains("jobs.schedule"),
        "Should log span name. Logs:\n{}",
        logs
    );
    assert!(
        logs.contains("job_id=8"),
        "Should log job id. Logs:\n{}",
        logs
    );
    assert!(
        logs.contains("delay_ms=250"),
        "Should log delay. Logs:\n{}",
        logs
    );
    assert!(
        logs.contains("job scheduled"),
        "Should log completion. Logs:\n{}",
        logs
    );
}

#[test]
fn traced_schedule_logs_rejection() {
    let (logs, result) = with_tracing(|| async {
        let fake = FakeJobScheduler::new();
        fake.set_reject(true);
        let traced = TracedJobScheduler::new(fake);
        traced.schedule(JobSpec::for_site(1, Duration::ZERO)).await
    });

    assert!(result.is_err());
    assert!(
        logs.contains("job rejected"),
        "Should log rejection. Logs:\n{}",
        logs
    );
}

#[test]
fn traced_post_logs_entry_and_timing() {
    let (logs, result) = with_tracing(|| async {
        let traced = TracedNotifyAdapter::new(FakeNotifyAdapter::new());
        traced.post_status(&failing_site()).await
    });

    assert!(result.is_ok());
    assert!(
        logs.contains("notify.post"),
        "Should log span name. Logs:\n{}",
        logs
    );
    assert!(
        logs.contains("status=error"),
        "Should log status. Logs:\n{}",
        logs
    );
    assert!(
        logs.contains("elapsed_ms"),
        "Should log timing. Logs:\n{}",
        logs
    );
}

#[test]
fn traced_post_logs_failure() {
    let (logs, result) = with_tracing(|| async {
        let fake = FakeNotifyAdapter::new();
        fake.set_fail(true);
        let traced = TracedNotifyAdapter::new(fake);
        traced.post_status(&failing_site()).await
    });

    assert!(result.is_err());
    assert!(
        logs.contains("post failed"),
        "Should log failure. Logs:\n{}",
        logs
    );
}

// =============================================================================
// Delegation tests - verify traced wrapper delegates to inner adapter
// =============================================================================

#[tokio::test]
async fn traced_scheduler_delegates_to_inner() {
    let fake = FakeJobScheduler::new();
    let traced = TracedJobScheduler::new(fake.clone());
    let spec = JobSpec::for_site(2, Duration::from_secs(1));

    traced.schedule(spec.clone()).await.unwrap();
    assert_eq!(traced.all_pending_jobs().await, vec![spec.clone()]);
    traced.cancel(2).await;

    assert_eq!(fake.calls(), vec![JobCall::Schedule(spec), JobCall::Cancel(2)]);
}

#[tokio::test]
async fn traced_notify_delegates_to_inner() {
    let fake = FakeNotifyAdapter::new();
    let traced = TracedNotifyAdapter::new(fake.clone());

    traced.post_status(&failing_site()).await.unwrap();
    traced.cancel_status(&failing_site()).await.unwrap();

    assert_eq!(
        fake.calls(),
        vec![NotifyCall::Post(8), NotifyCall::Cancel(8)]
    );
}
