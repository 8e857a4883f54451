// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;

#[tokio::test]
async fn fake_scheduler_records_calls_and_tracks_pending() {
    let jobs = FakeJobScheduler::new();
    let spec = JobSpec::for_site(4, Duration::from_millis(1));

    jobs.schedule(spec.clone()).await.unwrap();
    assert_eq!(jobs.all_pending_jobs().await, vec![spec.clone()]);

    jobs.cancel(4).await;
    assert!(jobs.all_pending_jobs().await.is_empty());
    assert_eq!(jobs.calls(), vec![JobCall::Schedule(spec), JobCall::Cancel(4)]);
}

#[tokio::test]
async fn fake_scheduler_rejects_on_demand() {
    let jobs = FakeJobScheduler::new();
    jobs.set_reject(true);

    let result = jobs.schedule(JobSpec::for_site(1, Duration::ZERO)).await;
    assert!(result.is_err());
    assert!(jobs.all_pending_jobs().await.is_empty());
    assert_eq!(jobs.scheduled().len(), 1);
}

#[tokio::test]
async fn fire_removes_the_job() {
    let jobs = FakeJobScheduler::new();
    jobs.insert_pending(JobSpec::for_site(2, Duration::ZERO));

    let params = jobs.fire(2).unwrap();
    assert_eq!(params.extras.site_id, 2);
    assert!(jobs.fire(2).is_none());
    assert!(jobs.calls().is_empty());
}
