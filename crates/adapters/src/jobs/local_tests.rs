// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(2);

#[tokio::test]
async fn due_job_fires_with_its_extras() {
    let (scheduler, mut rx) = LocalJobScheduler::new(10);
    scheduler
        .schedule(JobSpec::for_site(7, Duration::from_millis(1)))
        .await
        .unwrap();

    let params = tokio::time::timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    assert_eq!(params.job_id, 7);
    assert_eq!(params.extras.site_id, 7);
}

#[tokio::test]
async fn fired_job_is_no_longer_pending() {
    let (scheduler, mut rx) = LocalJobScheduler::new(10);
    scheduler
        .schedule(JobSpec::for_site(1, Duration::from_millis(1)))
        .await
        .unwrap();

    tokio::time::timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    assert!(scheduler.all_pending_jobs().await.is_empty());
}

#[tokio::test]
async fn cancelled_job_never_fires() {
    let (scheduler, mut rx) = LocalJobScheduler::new(10);
    scheduler
        .schedule(JobSpec::for_site(1, Duration::from_millis(50)))
        .await
        .unwrap();
    scheduler.cancel(1).await;
    // Idempotent
    scheduler.cancel(1).await;

    assert_eq!(scheduler.pending_count(), 0);
    assert!(tokio::time::timeout(Duration::from_millis(200), rx.recv())
        .await
        .is_err());
}

#[tokio::test]
async fn rescheduling_an_id_replaces_the_pending_job() {
    let (scheduler, mut rx) = LocalJobScheduler::new(10);
    scheduler
        .schedule(JobSpec::for_site(3, Duration::from_secs(3600)))
        .await
        .unwrap();
    scheduler
        .schedule(JobSpec::for_site(3, Duration::from_millis(1)))
        .await
        .unwrap();

    let pending = scheduler.all_pending_jobs().await;
    assert!(pending.len() <= 1);

    let params = tokio::time::timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    assert_eq!(params.job_id, 3);
    assert_eq!(scheduler.pending_count(), 0);
}

#[tokio::test]
async fn submissions_beyond_the_limit_are_rejected() {
    let (scheduler, _rx) = LocalJobScheduler::new(2);
    for id in 1..=2 {
        scheduler
            .schedule(JobSpec::for_site(id, Duration::from_secs(3600)))
            .await
            .unwrap();
    }

    let err = scheduler
        .schedule(JobSpec::for_site(3, Duration::from_secs(3600)))
        .await
        .unwrap_err();
    assert!(matches!(err, JobError::Rejected { id: 3, limit: 2 }));

    // Replacing an existing id does not count against the limit
    scheduler
        .schedule(JobSpec::for_site(2, Duration::from_secs(60)))
        .await
        .unwrap();
}

#[tokio::test]
async fn pending_jobs_are_ordered_by_id() {
    let (scheduler, _rx) = LocalJobScheduler::new(10);
    for id in [5, 2, 9] {
        scheduler
            .schedule(JobSpec::for_site(id, Duration::from_secs(3600)))
            .await
            .unwrap();
    }

    let ids: Vec<_> = scheduler
        .all_pending_jobs()
        .await
        .iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(ids, vec![2, 5, 9]);
}

#[tokio::test]
async fn schedule_after_receiver_dropped_is_closed() {
    let (scheduler, rx) = LocalJobScheduler::new(10);
    drop(rx);

    let err = scheduler
        .schedule(JobSpec::for_site(1, Duration::from_millis(1)))
        .await
        .unwrap_err();
    assert!(matches!(err, JobError::Closed));
}
