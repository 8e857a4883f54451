// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Boot recovery hook
//!
//! The job table is empty after every process start, so schedules are
//! rebuilt from storage once the host reports it has booted.

use crate::error::EngineError;
use crate::manager::ValidationManager;
use std::fmt;
use std::sync::Arc;
use sw_adapters::{JobScheduler, NotifyAdapter};
use sw_core::Clock;

/// Signals delivered by the host process
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemSignal {
    BootCompleted,
    Other(String),
}

impl fmt::Display for SystemSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemSignal::BootCompleted => f.write_str("boot-completed"),
            SystemSignal::Other(name) => f.write_str(name),
        }
    }
}

pub struct BootHook<J, N, C> {
    manager: Arc<ValidationManager<J, N, C>>,
}

impl<J, N, C> BootHook<J, N, C>
where
    J: JobScheduler,
    N: NotifyAdapter,
    C: Clock,
{
    pub fn new(manager: Arc<ValidationManager<J, N, C>>) -> Self {
        Self { manager }
    }

    /// Reschedule every site after boot; returns how many were scheduled
    pub async fn on_receive(&self, signal: SystemSignal) -> Result<usize, EngineError> {
        if signal != SystemSignal::BootCompleted {
            return Err(EngineError::UnexpectedSignal(signal.to_string()));
        }
        tracing::info!("boot completed, restoring schedules");
        self.manager.ensure_scheduled_checks().await
    }
}

#[cfg(test)]
#[path = "boot_tests.rs"]
mod tests;
