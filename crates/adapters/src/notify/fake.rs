// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake notification adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{NotifyAdapter, NotifyError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use sw_core::{Site, SiteId};

/// Recorded notification call, by site id
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyCall {
    Post(SiteId),
    Cancel(SiteId),
}

/// Fake notification adapter for testing
#[derive(Clone, Default)]
pub struct FakeNotifyAdapter {
    calls: Arc<Mutex<Vec<NotifyCall>>>,
    fail: Arc<AtomicBool>,
}

impl FakeNotifyAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded notifications
    pub fn calls(&self) -> Vec<NotifyCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Make every following call fail after being recorded
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    fn record(&self, call: NotifyCall) -> Result<(), NotifyError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifyError::Failed("injected failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl NotifyAdapter for FakeNotifyAdapter {
    async fn post_status(&self, site: &Site) -> Result<(), NotifyError> {
        self.record(NotifyCall::Post(site.id))
    }

    async fn cancel_status(&self, site: &Site) -> Result<(), NotifyError> {
        self.record(NotifyCall::Cancel(site.id))
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
