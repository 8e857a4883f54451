// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sitewatch validation engine

mod boot;
mod error;
mod job;
mod manager;
pub mod network;
pub mod script;
mod validation;

#[cfg(test)]
mod test_support;

pub use boot::{BootHook, SystemSignal};
pub use error::EngineError;
pub use job::{apply_retry_policy, JobOutcome, ValidationJob};
pub use manager::{
    CheckResult, HttpResponse, ManagerConfig, ManagerDeps, ScheduleOptions, Scheduled,
    ValidationManager, RIGHT_NOW,
};
pub use network::{BaseClientConfig, CertificateError, HttpClientFactory};
pub use script::{ScriptError, ScriptLimits, ScriptOutcome};
pub use validation::{ValidationStrategy, Verdict};
