// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Shared pieces of the sitewatch daemon: the wire protocol and file layout
//! that both `swd` and the `sw` CLI rely on.

pub mod paths;
pub mod protocol;

pub use paths::DaemonPaths;
pub use protocol::{Query, Request, Response, ScheduleOutcome, PROTOCOL_VERSION};

/// Startup marker prefix written to the log before anything else.
/// The CLI uses it to find where the current startup attempt begins.
/// Full format: "--- swd: starting (pid: 12345)"
pub const STARTUP_MARKER_PREFIX: &str = "--- swd: starting (pid: ";
