// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for engine tests

use crate::manager::{ManagerConfig, ManagerDeps, ValidationManager};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use sw_adapters::{FakeJobScheduler, FakeNotifyAdapter};
use sw_core::{EventBus, FakeClock, Site, SiteSettings};
use sw_storage::SiteStore;
use tempfile::TempDir;

pub type TestManager = ValidationManager<FakeJobScheduler, FakeNotifyAdapter, FakeClock>;

pub struct Harness {
    _dir: TempDir,
    pub jobs: FakeJobScheduler,
    pub notify: FakeNotifyAdapter,
    pub clock: FakeClock,
    pub store: Arc<SiteStore>,
    pub events: EventBus,
    pub manager: Arc<TestManager>,
}

pub fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SiteStore::open(&dir.path().join("sites.wal")).unwrap());
    let jobs = FakeJobScheduler::new();
    let notify = FakeNotifyAdapter::new();
    let clock = FakeClock::new();
    let events = EventBus::new();

    let manager = Arc::new(ValidationManager::new(
        ManagerDeps {
            jobs: jobs.clone(),
            notify: notify.clone(),
            store: Arc::clone(&store),
            events: events.clone(),
        },
        ManagerConfig::default(),
        clock.clone(),
    ));

    Harness {
        _dir: dir,
        jobs,
        notify,
        clock,
        store,
        events,
        manager,
    }
}

impl Harness {
    /// Persist a site directly, bypassing scheduling
    pub fn saved(&self, site: Site) -> Site {
        self.store.put(&site).unwrap()
    }

    pub fn site_at(&self, url: &str, settings: SiteSettings) -> Site {
        self.saved(Site::new("stub", url, settings))
    }
}

/// Headers of every request the stub received
pub type SeenRequests = Arc<Mutex<Vec<Vec<(String, String)>>>>;

/// HTTP server answering every request with the same response
pub struct StubServer {
    pub url: String,
    pub requests: SeenRequests,
}

pub fn serve(code: u16, body: &'static str) -> StubServer {
    serve_after(Duration::ZERO, code, body)
}

/// Like [`serve`], but each response waits `delay` first
pub fn serve_after(delay: Duration, code: u16, body: &'static str) -> StubServer {
    let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let requests: SeenRequests = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&requests);

    std::thread::spawn(move || {
        for request in server.incoming_requests() {
            let headers = request
                .headers()
                .iter()
                .map(|h| (h.field.as_str().as_str().to_string(), h.value.as_str().to_string()))
                .collect();
            seen.lock().unwrap().push(headers);
            std::thread::sleep(delay);
            let response = tiny_http::Response::from_string(body).with_status_code(code);
            let _ = request.respond(response);
        }
    });

    StubServer {
        url: format!("http://{}/health", addr),
        requests,
    }
}

/// Accepts connections and never answers
pub fn serve_silently() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        let mut held = Vec::new();
        for stream in listener.incoming() {
            held.push(stream);
        }
    });
    format!("http://{}/", addr)
}
