// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status notification adapters
//!
//! One notification per site. Posting replaces the site's previous
//! notification; cancelling withdraws it.

mod desktop;
mod gate;

#[cfg(any(test, feature = "test-support"))]
mod fake;

pub use desktop::DesktopNotifyAdapter;
pub use gate::{ForegroundGate, ForegroundGuard};

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeNotifyAdapter, NotifyCall};

use async_trait::async_trait;
use sw_core::{Site, Status};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification failed: {0}")]
    Failed(String),
    #[error("notifier exited with error: {0}")]
    Command(String),
}

/// Adapter for surfacing a site's status to the user
#[async_trait]
pub trait NotifyAdapter: Clone + Send + Sync + 'static {
    /// Show (or replace) the notification for this site
    async fn post_status(&self, site: &Site) -> Result<(), NotifyError>;

    /// Withdraw the notification for this site, if any
    async fn cancel_status(&self, site: &Site) -> Result<(), NotifyError>;
}

/// Title and body shown for a site's current status
pub fn status_message(site: &Site) -> (String, String) {
    let title = match site.status() {
        Status::Error => format!("{} is down", site.name),
        Status::Ok => format!("{} is up", site.name),
        Status::Checking => format!("Checking {}", site.name),
        Status::Waiting => format!("{} is waiting", site.name),
    };
    let body = site
        .last_result
        .as_ref()
        .and_then(|r| r.reason.clone())
        .unwrap_or_else(|| site.url.clone());
    (title, body)
}

/// Notifier that drops everything
#[derive(Clone, Debug, Default)]
pub struct NoOpNotifyAdapter;

impl NoOpNotifyAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotifyAdapter for NoOpNotifyAdapter {
    async fn post_status(&self, _site: &Site) -> Result<(), NotifyError> {
        Ok(())
    }

    async fn cancel_status(&self, _site: &Site) -> Result<(), NotifyError> {
        Ok(())
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
