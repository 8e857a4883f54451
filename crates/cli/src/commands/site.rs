// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sw site`: manage monitored sites

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use sw_core::{Header, RetryPolicy, Site, SiteId, SiteSettings, ValidationMode};
use sw_daemon::ScheduleOutcome;

use crate::client::DaemonClient;
use crate::error::{explain, SwError};
use crate::output::{self, OutputFormat, SiteDetail, SiteLine, SITE_LIST_HEADER};

#[derive(Args)]
pub struct SiteArgs {
    #[command(subcommand)]
    pub command: SiteCommand,
}

#[derive(Subcommand)]
pub enum SiteCommand {
    /// Start monitoring a site
    Add(AddArgs),
    /// List sites
    List {
        /// Only sites carrying this tag
        #[arg(long)]
        tag: Option<String>,
    },
    /// Show a site's configuration and last result
    Show { id: SiteId },
    /// Change a site's configuration
    Edit(EditArgs),
    /// Stop monitoring a site and delete it
    Remove { id: SiteId },
    /// Check a site right now
    Check { id: SiteId },
    /// Resume checks for a disabled site
    Enable { id: SiteId },
    /// Pause checks for a site
    Disable { id: SiteId },
}

/// How a response is judged
#[derive(Args, Default)]
pub struct ValidationArgs {
    /// status_code, term_search or script
    #[arg(long)]
    pub mode: Option<ValidationMode>,

    /// Term to search for, or script source
    #[arg(long = "arg", conflicts_with = "script_file")]
    pub validation_arg: Option<String>,

    /// Read the script source from a file
    #[arg(long)]
    pub script_file: Option<PathBuf>,
}

impl ValidationArgs {
    fn argument(&self) -> Result<Option<String>> {
        match (&self.validation_arg, &self.script_file) {
            (Some(arg), _) => Ok(Some(arg.clone())),
            (None, Some(path)) => Ok(Some(std::fs::read_to_string(path)?)),
            (None, None) => Ok(None),
        }
    }
}

#[derive(Args)]
pub struct AddArgs {
    pub name: String,
    pub url: String,

    /// Tag the site (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Request header as 'Name: value' (repeatable)
    #[arg(long = "header", short = 'H')]
    pub headers: Vec<String>,

    #[command(flatten)]
    pub validation: ValidationArgs,

    /// Time between checks
    #[arg(long, value_parser = humantime::parse_duration, default_value = "10m")]
    pub interval: Duration,

    /// Network timeout per check
    #[arg(long, value_parser = humantime::parse_duration, default_value = "10s")]
    pub timeout: Duration,

    /// Pinned certificate: a PEM or DER file path, or a file:// URI.
    /// content:// and other URI schemes are not supported.
    #[arg(long)]
    pub certificate: Option<String>,

    /// Retries allowed after a failure
    #[arg(long, requires = "retry_minutes")]
    pub retries: Option<u32>,

    /// Minutes within which the retries run
    #[arg(long, requires = "retries")]
    pub retry_minutes: Option<u32>,

    /// Save without scheduling checks
    #[arg(long)]
    pub disabled: bool,
}

#[derive(Args)]
pub struct EditArgs {
    pub id: SiteId,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub url: Option<String>,

    /// Replace all tags (repeatable)
    #[arg(long = "tag", conflicts_with = "clear_tags")]
    pub tags: Vec<String>,

    #[arg(long)]
    pub clear_tags: bool,

    /// Replace all headers (repeatable)
    #[arg(long = "header", short = 'H', conflicts_with = "clear_headers")]
    pub headers: Vec<String>,

    #[arg(long)]
    pub clear_headers: bool,

    #[command(flatten)]
    pub validation: ValidationArgs,

    #[arg(long, value_parser = humantime::parse_duration)]
    pub interval: Option<Duration>,

    #[arg(long, value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,

    /// Pinned certificate: a PEM or DER file path, or a file:// URI.
    /// content:// and other URI schemes are not supported.
    #[arg(long, conflicts_with = "no_certificate")]
    pub certificate: Option<String>,

    /// Stop pinning a certificate
    #[arg(long)]
    pub no_certificate: bool,

    #[arg(long, requires = "retry_minutes", conflicts_with = "no_retry")]
    pub retries: Option<u32>,

    #[arg(long, requires = "retries")]
    pub retry_minutes: Option<u32>,

    /// Drop the retry policy
    #[arg(long)]
    pub no_retry: bool,
}

pub async fn handle(command: SiteCommand, client: &DaemonClient, format: OutputFormat) -> Result<()> {
    match command {
        SiteCommand::Add(args) => {
            let site = build_site(&args)?;
            let (site, scheduled) = client.add_site(site).await.map_err(explain)?;
            report_saved("Added", site, scheduled, format);
        }

        SiteCommand::List { tag } => {
            let sites = client.list_sites(tag).await.map_err(explain)?;
            let lines: Vec<SiteLine> = sites.into_iter().map(SiteLine).collect();
            match format {
                OutputFormat::Text if lines.is_empty() => println!("No sites"),
                OutputFormat::Text => {
                    println!("{}", SITE_LIST_HEADER);
                    output::print_list(&lines, format);
                }
                OutputFormat::Json => output::print_list(&lines, format),
            }
        }

        SiteCommand::Show { id } => {
            let site = require(client, id).await?;
            output::print(&SiteDetail(site), format);
        }

        SiteCommand::Edit(args) => {
            let site = require(client, args.id).await?;
            let edited = apply_edit(site, &args)?;
            let (site, scheduled) = client.update_site(edited).await.map_err(explain)?;
            report_saved("Updated", site, scheduled, format);
        }

        SiteCommand::Remove { id } => {
            client.remove_site(id).await.map_err(explain)?;
            println!("Removed site {}", id);
        }

        SiteCommand::Check { id } => {
            let scheduled = client.check_now(id).await.map_err(explain)?;
            println!("Site {}: {}", id, describe(scheduled));
        }

        SiteCommand::Enable { id } => toggle(client, id, false, format).await?,
        SiteCommand::Disable { id } => toggle(client, id, true, format).await?,
    }

    Ok(())
}

async fn toggle(
    client: &DaemonClient,
    id: SiteId,
    disabled: bool,
    format: OutputFormat,
) -> Result<()> {
    let site = client.set_disabled(id, disabled).await.map_err(explain)?;
    match format {
        OutputFormat::Text => println!(
            "{} site {} ({})",
            if disabled { "Disabled" } else { "Enabled" },
            site.id,
            site.name
        ),
        OutputFormat::Json => output::print(&SiteDetail(site), format),
    }
    Ok(())
}

async fn require(client: &DaemonClient, id: SiteId) -> Result<Site> {
    match client.get_site(id).await.map_err(explain)? {
        Some(site) => Ok(site),
        None => Err(SwError::site_not_found(id).into()),
    }
}

fn report_saved(verb: &str, site: Site, scheduled: ScheduleOutcome, format: OutputFormat) {
    match format {
        OutputFormat::Text => println!(
            "{} site {} ({}): {}",
            verb,
            site.id,
            site.name,
            describe(scheduled)
        ),
        OutputFormat::Json => output::print(&SiteDetail(site), format),
    }
}

fn describe(scheduled: ScheduleOutcome) -> String {
    match scheduled {
        ScheduleOutcome::Submitted { delay_ms } if delay_ms <= 1_000 => {
            "check scheduled now".to_string()
        }
        ScheduleOutcome::Submitted { delay_ms } => {
            format!("next check in {}", output::millis(delay_ms))
        }
        ScheduleOutcome::Skipped => "not scheduled (disabled)".to_string(),
        ScheduleOutcome::Rejected => "the daemon refused the check, too many pending".to_string(),
    }
}

/// Turn `sw site add` arguments into an unsaved site
pub fn build_site(args: &AddArgs) -> Result<Site> {
    let mode = args.validation.mode.unwrap_or(ValidationMode::StatusCode);
    let validation_arg = args.validation.argument()?;
    check_mode_argument(mode, validation_arg.as_deref())?;

    let settings = SiteSettings::default()
        .with_mode(mode, validation_arg)
        .with_interval_ms(as_millis(args.interval))
        .with_timeout_ms(as_millis(args.timeout))
        .with_certificate(args.certificate.clone())
        .with_disabled(args.disabled);

    let retry_policy = match (args.retries, args.retry_minutes) {
        (Some(count), Some(minutes)) => Some(RetryPolicy::new(count, minutes)),
        _ => None,
    };

    Ok(Site::new(args.name.clone(), args.url.clone(), settings)
        .with_tags(clean_tags(&args.tags))
        .with_headers(parse_headers(&args.headers)?)
        .with_retry_policy(retry_policy))
}

/// Apply `sw site edit` arguments to a saved site
pub fn apply_edit(site: Site, args: &EditArgs) -> Result<Site> {
    let mut site = site;
    if let Some(name) = &args.name {
        site.name = name.clone();
    }
    if let Some(url) = &args.url {
        site.url = url.clone();
    }
    if args.clear_tags {
        site.tags.clear();
    } else if !args.tags.is_empty() {
        site.tags = clean_tags(&args.tags);
    }
    if args.clear_headers {
        site.headers.clear();
    } else if !args.headers.is_empty() {
        site.headers = parse_headers(&args.headers)?;
    }

    let mut settings = site.settings.clone().unwrap_or_default();
    let new_arg = args.validation.argument()?;
    if args.validation.mode.is_some() || new_arg.is_some() {
        let mode = args.validation.mode.unwrap_or(settings.validation_mode);
        // Switching to status codes drops the old argument
        let arg = match mode {
            ValidationMode::StatusCode => None,
            _ => new_arg.or(settings.validation_args.clone()),
        };
        check_mode_argument(mode, arg.as_deref())?;
        settings = settings.with_mode(mode, arg);
    }
    if let Some(interval) = args.interval {
        settings = settings.with_interval_ms(as_millis(interval));
    }
    if let Some(timeout) = args.timeout {
        settings = settings.with_timeout_ms(as_millis(timeout));
    }
    if args.no_certificate {
        settings = settings.with_certificate(None);
    } else if let Some(certificate) = &args.certificate {
        settings = settings.with_certificate(Some(certificate.clone()));
    }
    site = site.with_settings(settings);

    if args.no_retry {
        site = site.with_retry_policy(None);
    } else if let (Some(count), Some(minutes)) = (args.retries, args.retry_minutes) {
        site = site.with_retry_policy(Some(RetryPolicy::new(count, minutes)));
    }

    Ok(site)
}

fn check_mode_argument(mode: ValidationMode, arg: Option<&str>) -> Result<()> {
    if mode.requires_args() && arg.map(str::trim).unwrap_or_default().is_empty() {
        let flag = match mode {
            ValidationMode::Script => "--arg SOURCE or --script-file PATH",
            _ => "--arg TERM",
        };
        bail!(SwError::new(format!("Mode {} needs an argument", mode))
            .with_suggestion(format!("Pass {}", flag)));
    }
    Ok(())
}

pub fn parse_headers(raw: &[String]) -> Result<Vec<Header>, SwError> {
    raw.iter()
        .map(|h| match h.split_once(':') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok(Header::new(key.trim(), value.trim()))
            }
            _ => Err(SwError::invalid_header(h)),
        })
        .collect()
}

fn clean_tags(raw: &[String]) -> Vec<String> {
    // Accept both `--tag a --tag b` and `--tag a,b`
    sw_core::parse_tags(&raw.join(","))
}

fn as_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[path = "site_tests.rs"]
mod tests;
