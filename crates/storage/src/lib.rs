// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sw-storage: WAL-backed persistence for sites

mod state;
mod store;
mod wal;

pub use state::{MaterializedState, SiteRow};
pub use store::{SiteStore, StoreError, DEFAULT_COMPACT_AFTER};
pub use wal::{Wal, WalError};
