// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output formatting for CLI commands

use std::fmt;
use std::time::Duration;

use clap::ValueEnum;
use serde::Serialize;
use sw_core::{Event, Site};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Print output in the specified format
pub fn print<T: Serialize + fmt::Display>(value: &T, format: OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", value),
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(value) {
                println!("{}", json);
            }
        }
    }
}

/// Print a list of items
pub fn print_list<T: Serialize + fmt::Display>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Text => {
            for item in items {
                println!("{}", item);
            }
        }
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(items) {
                println!("{}", json);
            }
        }
    }
}

/// Header matching [`SiteLine`]'s columns
pub const SITE_LIST_HEADER: &str = "ID    STATUS    NAME                 URL";

/// One row of `sw site list`
#[derive(Serialize)]
#[serde(transparent)]
pub struct SiteLine(pub Site);

impl fmt::Display for SiteLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let site = &self.0;
        let status = if site.is_disabled() {
            "disabled".to_string()
        } else {
            site.status().to_string()
        };
        write!(
            f,
            "{:<5} {:<9} {:<20} {}",
            site.id,
            status,
            truncate(&site.name, 20),
            site.url
        )?;
        if !site.tags.is_empty() {
            write!(f, " [{}]", site.tags.join(", "))?;
        }
        Ok(())
    }
}

/// Everything known about a site, for `sw site show`
#[derive(Serialize)]
#[serde(transparent)]
pub struct SiteDetail(pub Site);

impl fmt::Display for SiteDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let site = &self.0;
        writeln!(f, "Site: {}", site.id)?;
        writeln!(f, "  Name: {}", site.name)?;
        writeln!(f, "  URL: {}", site.url)?;
        if !site.tags.is_empty() {
            writeln!(f, "  Tags: {}", site.tags.join(", "))?;
        }
        if let Some(settings) = &site.settings {
            writeln!(f, "  Mode: {}", settings.validation_mode)?;
            if let Some(args) = &settings.validation_args {
                writeln!(f, "  Argument: {}", first_line(args))?;
            }
            writeln!(f, "  Interval: {}", millis(settings.validation_interval_ms))?;
            writeln!(f, "  Timeout: {}", millis(settings.network_timeout_ms))?;
            if let Some(certificate) = &settings.certificate {
                writeln!(f, "  Certificate: {}", certificate)?;
            }
            if settings.disabled {
                writeln!(f, "  Disabled: yes")?;
            }
        }
        if let Some(policy) = &site.retry_policy {
            writeln!(
                f,
                "  Retries: {} within {} min ({} used)",
                policy.count, policy.minutes, policy.attempts
            )?;
        }
        for header in &site.headers {
            writeln!(f, "  Header: {}: {}", header.key, header.value)?;
        }
        write!(f, "  Status: {}", site.status())?;
        if let Some(result) = &site.last_result {
            write!(f, " (since {})", timestamp(result.timestamp_ms))?;
            if let Some(reason) = &result.reason {
                write!(f, "\n  Reason: {}", reason)?;
            }
        }
        Ok(())
    }
}

/// One line per broadcast, for `sw watch`
#[derive(Serialize)]
#[serde(transparent)]
pub struct EventLine(pub Event);

impl fmt::Display for EventLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Event::StatusUpdate { site } => {
                write!(f, "{} #{} {}: {}", self.0.action(), site.id, site.name, site.status())?;
                if let Some(reason) = site.last_result.as_ref().and_then(|r| r.reason.as_ref()) {
                    write!(f, " ({})", reason)?;
                }
                Ok(())
            }
            Event::SiteRemoved { id } => write!(f, "{} #{}", self.0.action(), id),
        }
    }
}

/// `2026-01-01 12:00:00 UTC`
pub fn timestamp(epoch_ms: u64) -> String {
    i64::try_from(epoch_ms)
        .ok()
        .and_then(chrono::DateTime::from_timestamp_millis)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// `10m`, `1m 30s`
pub fn millis(ms: u64) -> String {
    humantime::format_duration(Duration::from_millis(ms)).to_string()
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

fn first_line(s: &str) -> &str {
    s.lines().next().unwrap_or_default()
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
