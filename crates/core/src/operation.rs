// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operations for the write-ahead log
//!
//! One operation touches one row of one table. Sub-records are keyed by the
//! owning site's identifier.

use crate::site::{Header, RetryPolicy, SiteId, SiteSettings, ValidationResult};
use serde::{Deserialize, Serialize};

/// Operations that can be persisted to the WAL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Insert or update a row in `sites`
    SiteUpsert {
        id: SiteId,
        name: String,
        url: String,
        /// Comma-joined tag list
        #[serde(default)]
        tags: String,
    },

    /// Delete a row from `sites`
    SiteDelete { id: SiteId },

    /// Insert or update a row in `site_settings`
    SettingsUpsert {
        site_id: SiteId,
        settings: SiteSettings,
    },

    SettingsDelete { site_id: SiteId },

    /// Insert or update a row in `validation_results`
    ResultUpsert {
        site_id: SiteId,
        result: ValidationResult,
    },

    ResultDelete { site_id: SiteId },

    /// Insert or update a row in `retry_policies`
    RetryPolicyUpsert {
        site_id: SiteId,
        policy: RetryPolicy,
    },

    RetryPolicyDelete { site_id: SiteId },

    /// Replace every header row of a site
    HeadersReplace {
        site_id: SiteId,
        headers: Vec<Header>,
    },

    HeadersDelete { site_id: SiteId },
}

impl Operation {
    /// Site the operation belongs to
    pub fn site_id(&self) -> SiteId {
        match self {
            Operation::SiteUpsert { id, .. } | Operation::SiteDelete { id } => *id,
            Operation::SettingsUpsert { site_id, .. }
            | Operation::SettingsDelete { site_id }
            | Operation::ResultUpsert { site_id, .. }
            | Operation::ResultDelete { site_id }
            | Operation::RetryPolicyUpsert { site_id, .. }
            | Operation::RetryPolicyDelete { site_id }
            | Operation::HeadersReplace { site_id, .. }
            | Operation::HeadersDelete { site_id } => *site_id,
        }
    }

    /// Table the operation writes to
    pub fn table(&self) -> &'static str {
        match self {
            Operation::SiteUpsert { .. } | Operation::SiteDelete { .. } => "sites",
            Operation::SettingsUpsert { .. } | Operation::SettingsDelete { .. } => {
                "site_settings"
            }
            Operation::ResultUpsert { .. } | Operation::ResultDelete { .. } => {
                "validation_results"
            }
            Operation::RetryPolicyUpsert { .. } | Operation::RetryPolicyDelete { .. } => {
                "retry_policies"
            }
            Operation::HeadersReplace { .. } | Operation::HeadersDelete { .. } => "headers",
        }
    }
}

#[cfg(test)]
#[path = "operation_tests.rs"]
mod tests;
