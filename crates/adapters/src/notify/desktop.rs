// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Desktop notifications via the platform notifier binary
//!
//! `notify-send` on Linux, `terminal-notifier` on macOS. Both group
//! notifications by a per-site key so a new post replaces the old one.

use super::{status_message, NotifyAdapter, NotifyError};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use sw_core::{Site, SiteId};
use tokio::process::Command;

/// Posts site status through the desktop notifier
#[derive(Clone, Debug)]
pub struct DesktopNotifyAdapter {
    app_name: String,
    /// Sites with a notification currently shown
    posted: Arc<Mutex<HashSet<SiteId>>>,
}

impl Default for DesktopNotifyAdapter {
    fn default() -> Self {
        Self::new("sitewatch")
    }
}

impl DesktopNotifyAdapter {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            posted: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    fn group(&self, id: SiteId) -> String {
        format!("{}-site-{}", self.app_name, id)
    }

    /// Program and arguments posting a notification
    fn post_command(&self, site: &Site) -> (&'static str, Vec<String>) {
        let (title, body) = status_message(site);
        let group = self.group(site.id);
        if cfg!(target_os = "macos") {
            (
                "terminal-notifier",
                vec![
                    "-title".into(),
                    title,
                    "-message".into(),
                    body,
                    "-group".into(),
                    group,
                ],
            )
        } else {
            (
                "notify-send",
                vec![
                    "--app-name".into(),
                    self.app_name.clone(),
                    "--hint".into(),
                    format!("string:x-canonical-private-synchronous:{}", group),
                    title,
                    body,
                ],
            )
        }
    }

    /// Program and arguments withdrawing a notification, where supported
    fn cancel_command(&self, id: SiteId) -> Option<(&'static str, Vec<String>)> {
        if cfg!(target_os = "macos") {
            Some(("terminal-notifier", vec!["-remove".into(), self.group(id)]))
        } else {
            None
        }
    }

    async fn run(program: &str, args: &[String]) -> Result<(), NotifyError> {
        let output = Command::new(program)
            .args(args)
            .output()
            .await
            .map_err(|e| NotifyError::Failed(format!("{}: {}", program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(NotifyError::Command(stderr.trim().to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl NotifyAdapter for DesktopNotifyAdapter {
    async fn post_status(&self, site: &Site) -> Result<(), NotifyError> {
        let (program, args) = self.post_command(site);
        Self::run(program, &args).await?;
        self.posted
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(site.id);
        Ok(())
    }

    async fn cancel_status(&self, site: &Site) -> Result<(), NotifyError> {
        let was_posted = self
            .posted
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&site.id);
        if !was_posted {
            return Ok(());
        }
        match self.cancel_command(site.id) {
            Some((program, args)) => Self::run(program, &args).await,
            // notify-send notifications expire on their own
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "desktop_tests.rs"]
mod tests;
