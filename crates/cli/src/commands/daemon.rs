// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sw daemon`: control the background daemon

use std::fmt;

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;
use sw_daemon::DaemonPaths;

use crate::client::{self, DaemonClient, DaemonStatus};
use crate::error::explain;
use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct DaemonArgs {
    #[command(subcommand)]
    pub command: DaemonCommand,
}

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Start the daemon in the background
    Start,
    /// Stop the daemon
    Stop,
    /// Report whether the daemon is running
    Status,
    /// Print the end of the daemon log
    Logs {
        /// Number of lines to show
        #[arg(long, short = 'n', default_value = "50")]
        lines: usize,
    },
}

/// `sw daemon status` report
#[derive(Serialize)]
struct StatusReport {
    running: bool,
    pid: Option<u32>,
    protocol: Option<String>,
    #[serde(flatten)]
    status: Option<DaemonStatus>,
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(status) = &self.status else {
            return write!(f, "Daemon not running");
        };
        writeln!(f, "Daemon running")?;
        if let Some(pid) = self.pid {
            writeln!(f, "  PID: {}", pid)?;
        }
        if let Some(protocol) = &self.protocol {
            writeln!(f, "  Protocol: {}", protocol)?;
        }
        writeln!(
            f,
            "  Uptime: {}",
            humantime::format_duration(std::time::Duration::from_secs(status.uptime_secs))
        )?;
        writeln!(f, "  Sites: {}", status.sites)?;
        writeln!(f, "  Pending jobs: {}", status.pending_jobs)?;
        write!(f, "  Watchers: {}", status.watchers)
    }
}

pub async fn handle(args: DaemonArgs, format: OutputFormat) -> Result<()> {
    let paths = DaemonPaths::from_env()?;

    match args.command {
        DaemonCommand::Start => {
            if client::daemon_start(&paths).await.map_err(explain)? {
                println!("Daemon started");
            } else {
                println!("Daemon already running");
            }
        }

        DaemonCommand::Stop => {
            if client::daemon_stop(&paths).await.map_err(explain)? {
                println!("Daemon stopped");
            } else {
                println!("Daemon not running");
            }
        }

        DaemonCommand::Status => {
            let report = status_report(&paths).await;
            output::print(&report, format);
        }

        DaemonCommand::Logs { lines } => match std::fs::read_to_string(&paths.log_path) {
            Ok(content) => {
                for line in tail(&content, lines) {
                    println!("{}", line);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                println!("No daemon log at {}", paths.log_path.display());
            }
            Err(e) => return Err(e.into()),
        },
    }

    Ok(())
}

async fn status_report(paths: &DaemonPaths) -> StatusReport {
    let not_running = StatusReport {
        running: false,
        pid: None,
        protocol: None,
        status: None,
    };
    let Ok(client) = DaemonClient::connect(paths) else {
        return not_running;
    };
    let Ok(status) = client.status().await else {
        return not_running;
    };
    StatusReport {
        running: true,
        pid: client::read_daemon_pid(paths),
        protocol: client.hello().await.ok(),
        status: Some(status),
    }
}

/// Last `n` lines of `content`
fn tail(content: &str, n: usize) -> Vec<&str> {
    let lines: Vec<&str> = content.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].to_vec()
}
