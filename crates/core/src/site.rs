// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Site data model
//!
//! Every entity is a value snapshot. Mutations produce a new copy through the
//! `with_*` builders; only the site store writes the authoritative copy.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identifier assigned by the store on insert. `0` means unsaved.
pub type SiteId = u64;

/// A user-configured endpoint to be health-checked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub id: SiteId,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub headers: Vec<Header>,
    pub settings: Option<SiteSettings>,
    pub last_result: Option<ValidationResult>,
    pub retry_policy: Option<RetryPolicy>,
}

impl Site {
    /// Create an unsaved site with the given settings
    pub fn new(name: impl Into<String>, url: impl Into<String>, settings: SiteSettings) -> Self {
        Self {
            id: 0,
            name: name.into(),
            url: url.into(),
            tags: Vec::new(),
            headers: Vec::new(),
            settings: Some(settings),
            last_result: None,
            retry_policy: None,
        }
    }

    pub fn is_saved(&self) -> bool {
        self.id != 0
    }

    /// Whether scheduling is suppressed for this site
    pub fn is_disabled(&self) -> bool {
        self.settings.as_ref().is_some_and(|s| s.disabled)
    }

    /// Current status, `Waiting` when the site has never been checked
    pub fn status(&self) -> Status {
        self.last_result
            .as_ref()
            .map_or(Status::Waiting, |r| r.status)
    }

    pub fn with_id(mut self, id: SiteId) -> Self {
        self.id = id;
        self
    }

    pub fn with_settings(mut self, settings: SiteSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn with_result(mut self, result: ValidationResult) -> Self {
        self.last_result = Some(result);
        self
    }

    pub fn with_retry_policy(mut self, policy: Option<RetryPolicy>) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_headers(mut self, headers: Vec<Header>) -> Self {
        self.headers = headers;
        self
    }

    /// Copy with a new status, keeping the previous timestamp.
    ///
    /// A terminal status (`Ok`/`Error`) stamps `timestamp_ms`; pending states
    /// keep the timestamp of the last completed attempt. `Ok` clears the reason.
    pub fn with_status(self, status: Status, reason: Option<String>, timestamp_ms: u64) -> Self {
        let previous = self.last_result.clone().unwrap_or_default();
        let timestamp_ms = if status.is_pending() {
            previous.timestamp_ms
        } else {
            timestamp_ms
        };
        let reason = if status == Status::Ok { None } else { reason };
        self.with_result(ValidationResult {
            timestamp_ms,
            status,
            reason,
        })
    }

    /// Tags persisted as a single comma-joined column
    pub fn tags_joined(&self) -> String {
        self.tags.join(",")
    }

    /// Case-insensitive tag membership
    pub fn has_tag(&self, tag: &str) -> bool {
        let tag = tag.trim();
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

/// Split a comma-joined tag column into trimmed, non-empty tags
pub fn parse_tags(joined: &str) -> Vec<String> {
    joined
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// HTTP header attached to every check request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub key: String,
    pub value: String,
}

impl Header {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Per-site check configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSettings {
    /// Time between checks, must be > 0 for scheduling to proceed
    pub validation_interval_ms: u64,
    pub validation_mode: ValidationMode,
    /// Search term or script source, required by `TermSearch` and `Script`
    pub validation_args: Option<String>,
    /// Total-call timeout, must be > 0 to perform a check
    pub network_timeout_ms: u64,
    #[serde(default)]
    pub disabled: bool,
    /// URI of a certificate to trust for this site's host
    pub certificate: Option<String>,
}

impl SiteSettings {
    pub const DEFAULT_INTERVAL_MS: u64 = 10 * 60 * 1000;
    pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

    pub fn with_mode(mut self, mode: ValidationMode, args: Option<String>) -> Self {
        self.validation_mode = mode;
        self.validation_args = args;
        self
    }

    pub fn with_interval_ms(mut self, interval_ms: u64) -> Self {
        self.validation_interval_ms = interval_ms;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.network_timeout_ms = timeout_ms;
        self
    }

    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn with_certificate(mut self, certificate: Option<String>) -> Self {
        self.certificate = certificate;
        self
    }
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            validation_interval_ms: Self::DEFAULT_INTERVAL_MS,
            validation_mode: ValidationMode::StatusCode,
            validation_args: None,
            network_timeout_ms: Self::DEFAULT_TIMEOUT_MS,
            disabled: false,
            certificate: None,
        }
    }
}

/// Strategy used to judge a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    StatusCode,
    TermSearch,
    Script,
}

impl ValidationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationMode::StatusCode => "status_code",
            ValidationMode::TermSearch => "term_search",
            ValidationMode::Script => "script",
        }
    }

    /// Whether `validation_args` must be present for this mode
    pub fn requires_args(&self) -> bool {
        !matches!(self, ValidationMode::StatusCode)
    }
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown validation mode: {0} (expected status_code, term_search or script)")]
pub struct ParseModeError(String);

impl FromStr for ValidationMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "status_code" | "status" => Ok(ValidationMode::StatusCode),
            "term_search" | "term" => Ok(ValidationMode::TermSearch),
            "script" | "javascript" | "js" => Ok(ValidationMode::Script),
            _ => Err(ParseModeError(s.to_string())),
        }
    }
}

/// Status of a site's check cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Scheduled, not yet running
    #[default]
    Waiting,
    /// HTTP request in flight
    Checking,
    Ok,
    Error,
}

impl Status {
    /// Waiting or Checking
    pub fn is_pending(&self) -> bool {
        matches!(self, Status::Waiting | Status::Checking)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Waiting => "waiting",
            Status::Checking => "checking",
            Status::Ok => "ok",
            Status::Error => "error",
        };
        f.write_str(s)
    }
}

/// Outcome of the most recent attempt
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub timestamp_ms: u64,
    pub status: Status,
    pub reason: Option<String>,
}

/// Number of retries permitted within a time window after a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub count: u32,
    pub minutes: u32,
    /// Retries consumed in the current failure streak
    #[serde(default)]
    pub attempts: u32,
}

impl RetryPolicy {
    pub fn new(count: u32, minutes: u32) -> Self {
        Self {
            count,
            minutes,
            attempts: 0,
        }
    }

    /// Spacing between retries, in milliseconds (never zero)
    pub fn retry_interval_ms(&self) -> u64 {
        let window_ms = u64::from(self.minutes) * 60_000;
        (window_ms / u64::from(self.count.max(1))).max(1)
    }

    pub fn has_retries_left(&self) -> bool {
        self.attempts < self.count
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }
}

#[cfg(test)]
#[path = "site_tests.rs"]
mod tests;
