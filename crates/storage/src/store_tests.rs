// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sw_core::{Header, RetryPolicy, SiteSettings, Status, ValidationMode, ValidationResult};
use tempfile::TempDir;

fn open_store() -> (TempDir, SiteStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = SiteStore::open(&dir.path().join("sites.wal")).unwrap();
    (dir, store)
}

fn full_site() -> Site {
    Site::new(
        "api",
        "https://api.example.test/health",
        SiteSettings::default()
            .with_mode(ValidationMode::TermSearch, Some("healthy".into()))
            .with_interval_ms(60_000)
            .with_certificate(Some("file:///etc/api.pem".into())),
    )
    .with_tags(vec!["prod".into(), "API".into()])
    .with_headers(vec![
        Header::new("Authorization", "Bearer token"),
        Header::new("X-Probe", "1"),
    ])
    .with_retry_policy(Some(RetryPolicy::new(3, 15)))
    .with_result(ValidationResult {
        timestamp_ms: 42,
        status: Status::Error,
        reason: Some("Response 500 - Unknown".into()),
    })
}

#[test]
fn put_then_get_returns_equal_site() {
    let (_dir, store) = open_store();
    let saved = store.put(&full_site()).unwrap();

    assert_eq!(saved.id, 1);
    assert_eq!(saved, full_site().with_id(1));
    assert_eq!(store.get(1).unwrap(), Some(saved));
}

#[test]
fn put_without_settings_is_rejected() {
    let (_dir, store) = open_store();
    let mut site = full_site();
    site.settings = None;

    assert!(matches!(store.put(&site), Err(StoreError::MissingSettings)));
    assert!(store.all(None).unwrap().is_empty());
}

#[test]
fn ids_are_never_reused() {
    let (_dir, store) = open_store();
    let first = store.put(&full_site()).unwrap();
    store.delete(&first).unwrap();

    let second = store.put(&full_site()).unwrap();
    assert_eq!(second.id, 2);
}

#[test]
fn update_unsaved_site_is_rejected() {
    let (_dir, store) = open_store();
    assert!(matches!(
        store.update(&full_site()),
        Err(StoreError::Unsaved)
    ));
}

#[test]
fn update_deleted_site_is_not_found() {
    let (_dir, store) = open_store();
    let site = store.put(&full_site()).unwrap();
    store.delete(&site).unwrap();

    assert!(matches!(store.update(&site), Err(StoreError::NotFound(1))));
    assert!(store.get(1).unwrap().is_none());
}

#[test]
fn update_replaces_headers_and_upserts_sub_records() {
    let (_dir, store) = open_store();
    let site = Site::new("web", "https://web.test", SiteSettings::default())
        .with_headers(vec![Header::new("A", "1")]);
    let site = store.put(&site).unwrap();
    assert!(site.retry_policy.is_none());

    let changed = site
        .clone()
        .with_headers(vec![Header::new("B", "2")])
        .with_retry_policy(Some(RetryPolicy::new(2, 4)))
        .with_status(Status::Ok, None, 100);
    store.update(&changed).unwrap();

    let loaded = store.get(site.id).unwrap().unwrap();
    assert_eq!(loaded.headers, vec![Header::new("B", "2")]);
    assert_eq!(loaded.retry_policy, Some(RetryPolicy::new(2, 4)));
    assert_eq!(loaded.status(), Status::Ok);
}

#[test]
fn delete_removes_every_sub_record() {
    let (_dir, store) = open_store();
    let site = store.put(&full_site()).unwrap();
    store.delete(&site).unwrap();

    let inner = store.inner.lock().unwrap();
    assert!(inner.state.sites.is_empty());
    assert!(inner.state.site_settings.is_empty());
    assert!(inner.state.validation_results.is_empty());
    assert!(inner.state.retry_policies.is_empty());
    assert!(inner.state.headers.is_empty());
}

#[test]
fn all_filters_tags_case_insensitively() {
    let (_dir, store) = open_store();
    store.put(&full_site()).unwrap();
    store
        .put(&Site::new("blog", "https://blog.test", SiteSettings::default()).with_tags(vec!["staging".into()]))
        .unwrap();

    let api = store.all(Some("api")).unwrap();
    assert_eq!(api.len(), 1);
    assert_eq!(api[0].name, "api");

    assert_eq!(store.all(Some("PROD")).unwrap().len(), 1);
    assert_eq!(store.all(Some("missing")).unwrap().len(), 0);
    assert_eq!(store.all(None).unwrap().len(), 2);
}

#[test]
fn reopen_replays_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sites.wal");
    {
        let store = SiteStore::open(&path).unwrap();
        store.put(&full_site()).unwrap();
        let gone = store.put(&full_site()).unwrap();
        store.delete(&gone).unwrap();
    }

    let store = SiteStore::open(&path).unwrap();
    assert_eq!(store.all(None).unwrap(), vec![full_site().with_id(1)]);
    assert_eq!(store.put(&full_site()).unwrap().id, 3);
}

#[test]
fn compact_preserves_state_and_next_id() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sites.wal");
    {
        let store = SiteStore::open(&path).unwrap();
        let site = store.put(&full_site()).unwrap();
        for ts in 0..10 {
            store
                .update(&site.clone().with_status(Status::Ok, None, ts))
                .unwrap();
        }
        let gone = store.put(&full_site()).unwrap();
        store.delete(&gone).unwrap();
        store.compact().unwrap();
    }

    let store = SiteStore::open(&path).unwrap();
    let sites = store.all(None).unwrap();
    assert_eq!(sites.len(), 1);
    assert_eq!(sites[0].last_result.as_ref().unwrap().timestamp_ms, 9);
    assert_eq!(store.put(&full_site()).unwrap().id, 3);
}

#[test]
fn update_without_retry_policy_drops_the_stored_one() {
    let (_dir, store) = open_store();
    let site = store.put(&full_site()).unwrap();
    assert!(site.retry_policy.is_some());

    store.update(&site.clone().with_retry_policy(None)).unwrap();

    assert_eq!(store.get(site.id).unwrap().unwrap().retry_policy, None);
    let inner = store.inner.lock().unwrap();
    assert!(inner.state.retry_policies.is_empty());
}

#[test]
fn record_result_leaves_configuration_alone() {
    let (_dir, store) = open_store();
    let site = store.put(&full_site()).unwrap();

    // Configuration changed after the caller took its snapshot
    let edited = site
        .clone()
        .with_settings(site.settings.clone().unwrap().with_disabled(true))
        .with_headers(vec![Header::new("X-New", "yes")]);
    store.update(&edited).unwrap();

    let result = ValidationResult {
        timestamp_ms: 500,
        status: Status::Ok,
        reason: None,
    };
    let stored = store.record_result(site.id, &result, Some(0)).unwrap();

    assert_eq!(stored.last_result, Some(result));
    assert!(stored.is_disabled());
    assert_eq!(stored.headers, vec![Header::new("X-New", "yes")]);
    assert_eq!(store.get(site.id).unwrap(), Some(stored));
}

#[test]
fn record_result_only_moves_the_attempt_counter() {
    let (_dir, store) = open_store();
    let site = store.put(&full_site()).unwrap();
    store
        .update(&site.clone().with_retry_policy(Some(RetryPolicy::new(5, 10))))
        .unwrap();

    let failed = ValidationResult {
        timestamp_ms: 1,
        status: Status::Error,
        reason: Some("down".into()),
    };
    let stored = store.record_result(site.id, &failed, Some(1)).unwrap();
    assert_eq!(
        stored.retry_policy,
        Some(RetryPolicy::new(5, 10).with_attempts(1))
    );

    // A policy dropped meanwhile is not brought back
    store.update(&stored.clone().with_retry_policy(None)).unwrap();
    let stored = store.record_result(site.id, &failed, Some(2)).unwrap();
    assert_eq!(stored.retry_policy, None);
}

#[test]
fn record_result_for_deleted_site_is_not_found() {
    let (_dir, store) = open_store();
    let site = store.put(&full_site()).unwrap();
    store.delete(&site).unwrap();

    assert!(matches!(
        store.record_result(site.id, &ValidationResult::default(), None),
        Err(StoreError::NotFound(1))
    ));
}

#[test]
fn wal_stays_bounded_under_steady_updates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sites.wal");
    let store = SiteStore::open(&path).unwrap().with_compact_after(50);
    let site = store.put(&full_site()).unwrap();

    for ts in 0..1_000 {
        store
            .record_result(
                site.id,
                &ValidationResult {
                    timestamp_ms: ts,
                    status: Status::Ok,
                    reason: None,
                },
                Some(0),
            )
            .unwrap();
        store
            .update(&store.get(site.id).unwrap().unwrap())
            .unwrap();
    }

    let lines = std::fs::read_to_string(&path).unwrap().lines().count();
    assert!(lines <= 60, "WAL grew to {} lines", lines);

    drop(store);
    let reopened = SiteStore::open(&path).unwrap();
    let loaded = reopened.get(site.id).unwrap().unwrap();
    assert_eq!(loaded.last_result.unwrap().timestamp_ms, 999);
}
