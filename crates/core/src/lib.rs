// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sw-core: shared types for the sitewatch workspace
//!
//! This crate provides:
//! - The site data model (sites, settings, results, retry policies)
//! - Store operations recorded in the write-ahead log
//! - The status-update event bus
//! - A clock abstraction for testable timestamps

pub mod clock;
pub mod events;
pub mod operation;
pub mod site;

pub use clock::{Clock, FakeClock, SystemClock};
pub use events::{Event, EventBus, EventReceiver, SubscriberId};
pub use operation::Operation;
pub use site::{
    parse_tags, Header, ParseModeError, RetryPolicy, Site, SiteId, SiteSettings, Status,
    ValidationMode, ValidationResult,
};
