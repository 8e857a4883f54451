// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sw watch`: follow status updates as they happen
//!
//! While a watch is attached the daemon treats the user as present and
//! holds back desktop notifications.

use anyhow::Result;
use clap::Args;
use sw_core::SiteId;

use crate::client::DaemonClient;
use crate::error::explain;
use crate::output::{self, EventLine, OutputFormat};

#[derive(Args)]
pub struct WatchArgs {
    /// Only show events for this site
    #[arg(long)]
    pub site: Option<SiteId>,
}

pub async fn handle(args: WatchArgs, client: &DaemonClient, format: OutputFormat) -> Result<()> {
    if matches!(format, OutputFormat::Text) {
        eprintln!("Watching for status updates (Ctrl-C to stop)");
    }
    client
        .watch(|event| {
            if args.site.map_or(true, |id| id == event.site_id()) {
                output::print(&EventLine(event), format);
            }
        })
        .await
        .map_err(explain)?;
    eprintln!("Daemon closed the connection");
    Ok(())
}
