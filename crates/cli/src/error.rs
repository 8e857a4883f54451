// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-friendly error display with context and suggestions.
//!
//! This module provides enhanced error types that include:
//! - What went wrong (message)
//! - Why it might have happened (context)
//! - How to fix it (suggestions)

use std::fmt;

use sw_core::SiteId;

use crate::client::ClientError;

/// Error with context and recovery suggestions for user-friendly display.
#[derive(Debug)]
pub struct SwError {
    /// What went wrong
    pub message: String,
    /// Why it might have happened
    pub context: Vec<String>,
    /// How to fix it
    pub suggestions: Vec<String>,
}

impl SwError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }
}

impl fmt::Display for SwError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "error: {}", self.message)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            for ctx in &self.context {
                writeln!(f, "  -> {}", ctx)?;
            }
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            writeln!(f, "suggestions:")?;
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for SwError {}

/// Common error builders for typical failure scenarios.
impl SwError {
    pub fn site_not_found(id: SiteId) -> Self {
        SwError::new(format!("Site {} not found", id))
            .with_context("The site may have been removed")
            .with_suggestion("List sites: sw site list")
    }

    pub fn daemon_start_failed(reason: &str) -> Self {
        SwError::new("Failed to start the sitewatch daemon")
            .with_context(reason.to_string())
            .with_suggestion("Read the daemon log: sw daemon logs")
            .with_suggestion("Check whether another swd is running: sw daemon status")
    }

    pub fn daemon_unreachable(err: &ClientError) -> Self {
        SwError::new("Could not reach the sitewatch daemon")
            .with_context(err.to_string())
            .with_suggestion("Restart it: sw daemon stop && sw daemon start")
            .with_suggestion("Raise the IPC timeout with SW_TIMEOUT_IPC_MS")
    }

    pub fn invalid_header(raw: &str) -> Self {
        SwError::new(format!("Invalid header '{}'", raw))
            .with_context("Headers are written as 'Name: value'")
            .with_suggestion("Example: --header 'Authorization: Bearer TOKEN'")
    }
}

/// Attach suggestions to errors that mean the daemon itself is in trouble
pub fn explain(err: ClientError) -> anyhow::Error {
    match &err {
        ClientError::DaemonStartFailed(reason) => SwError::daemon_start_failed(reason).into(),
        ClientError::DaemonStartTimeout | ClientError::Protocol(_) | ClientError::Io(_) => {
            SwError::daemon_unreachable(&err).into()
        }
        _ => err.into(),
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
