// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Foreground suppression
//!
//! While a client is watching status updates live, posting a notification
//! is redundant. Cancels always pass through.

use super::{NotifyAdapter, NotifyError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use sw_core::Site;

/// Wraps a notifier, dropping posts while in the foreground
#[derive(Clone)]
pub struct ForegroundGate<N> {
    inner: N,
    attached: Arc<AtomicUsize>,
}

impl<N> ForegroundGate<N> {
    /// Wrap `inner`, starting in the foreground when `foreground` is set
    pub fn new(inner: N, foreground: bool) -> Self {
        Self {
            inner,
            attached: Arc::new(AtomicUsize::new(usize::from(foreground))),
        }
    }

    pub fn is_foreground(&self) -> bool {
        self.attached.load(Ordering::SeqCst) > 0
    }

    /// Hold the foreground until the guard is dropped
    pub fn attach(&self) -> ForegroundGuard {
        self.attached.fetch_add(1, Ordering::SeqCst);
        ForegroundGuard {
            attached: Arc::clone(&self.attached),
        }
    }
}

/// Keeps a [`ForegroundGate`] in the foreground while alive
pub struct ForegroundGuard {
    attached: Arc<AtomicUsize>,
}

impl Drop for ForegroundGuard {
    fn drop(&mut self) {
        self.attached.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl<N: NotifyAdapter> NotifyAdapter for ForegroundGate<N> {
    async fn post_status(&self, site: &Site) -> Result<(), NotifyError> {
        if self.is_foreground() {
            tracing::debug!(site_id = site.id, "in foreground, notification suppressed");
            return Ok(());
        }
        self.inner.post_status(site).await
    }

    async fn cancel_status(&self, site: &Site) -> Result<(), NotifyError> {
        self.inner.cancel_status(site).await
    }
}

#[cfg(test)]
#[path = "gate_tests.rs"]
mod tests;
