// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for external I/O: the deferred job facility and notifications

pub mod jobs;
pub mod notify;
pub mod traced;

pub use jobs::{JobError, JobExtras, JobId, JobParameters, JobScheduler, JobSpec, LocalJobScheduler};
pub use notify::{
    status_message, DesktopNotifyAdapter, ForegroundGate, ForegroundGuard, NoOpNotifyAdapter,
    NotifyAdapter, NotifyError,
};
pub use traced::{TracedJobScheduler, TracedNotifyAdapter};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use jobs::{FakeJobScheduler, JobCall};
#[cfg(any(test, feature = "test-support"))]
pub use notify::{FakeNotifyAdapter, NotifyCall};
