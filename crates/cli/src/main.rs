// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! sw - Sitewatch CLI

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod commands;
mod error;
mod output;

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{daemon, site, watch};
use sw_daemon::DaemonPaths;

use crate::client::DaemonClient;
use crate::error::{explain, SwError};
use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "sw", version, about = "Sitewatch - periodic health checks for web sites")]
struct Cli {
    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Site management
    Site(site::SiteArgs),
    /// Follow status updates
    Watch(watch::WatchArgs),
    /// Daemon management
    Daemon(daemon::DaemonArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<SwError>() {
                Some(sw) => eprint!("{}", sw),
                None => eprintln!("error: {:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let format = cli.output;

    // Daemon commands manage the daemon themselves
    let command = match cli.command {
        Commands::Daemon(args) => return daemon::handle(args, format).await,
        other => other,
    };

    // Everything else goes through the daemon, starting it if needed
    let paths = DaemonPaths::from_env()?;
    let client = DaemonClient::connect_or_start(&paths)
        .await
        .map_err(explain)?;

    match command {
        Commands::Site(args) => site::handle(args.command, &client, format).await,
        Commands::Watch(args) => watch::handle(args, &client, format).await,
        Commands::Daemon(_) => Ok(()),
    }
}
