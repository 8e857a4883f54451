// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state from WAL replay
//!
//! One map per table. `sites` is keyed by its primary key, every other table
//! by the owning site's identifier.

use std::collections::BTreeMap;
use sw_core::{
    parse_tags, Header, Operation, RetryPolicy, Site, SiteId, SiteSettings, ValidationResult,
};

/// Row of the `sites` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteRow {
    pub id: SiteId,
    pub name: String,
    pub url: String,
    pub tags: String,
}

/// Materialized state built from WAL operations
#[derive(Debug)]
pub struct MaterializedState {
    pub sites: BTreeMap<SiteId, SiteRow>,
    pub site_settings: BTreeMap<SiteId, SiteSettings>,
    pub validation_results: BTreeMap<SiteId, ValidationResult>,
    pub retry_policies: BTreeMap<SiteId, RetryPolicy>,
    pub headers: BTreeMap<SiteId, Vec<Header>>,
    /// Next identifier handed out on insert; never reused after a delete
    next_id: SiteId,
}

impl Default for MaterializedState {
    fn default() -> Self {
        Self {
            sites: BTreeMap::new(),
            site_settings: BTreeMap::new(),
            validation_results: BTreeMap::new(),
            retry_policies: BTreeMap::new(),
            headers: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl MaterializedState {
    /// Identifier the next inserted site will receive
    pub fn next_id(&self) -> SiteId {
        self.next_id
    }

    /// Join a site row with its sub-records
    pub fn hydrate(&self, id: SiteId) -> Option<Site> {
        let row = self.sites.get(&id)?;
        Some(Site {
            id: row.id,
            name: row.name.clone(),
            url: row.url.clone(),
            tags: parse_tags(&row.tags),
            headers: self.headers.get(&id).cloned().unwrap_or_default(),
            settings: self.site_settings.get(&id).cloned(),
            last_result: self.validation_results.get(&id).cloned(),
            retry_policy: self.retry_policies.get(&id).copied(),
        })
    }

    /// Every site, hydrated, ordered by identifier
    pub fn hydrate_all(&self) -> Vec<Site> {
        self.sites
            .keys()
            .filter_map(|id| self.hydrate(*id))
            .collect()
    }

    /// Apply an operation to update the state
    pub fn apply(&mut self, op: &Operation) {
        match op {
            Operation::SiteUpsert {
                id,
                name,
                url,
                tags,
            } => {
                self.sites.insert(
                    *id,
                    SiteRow {
                        id: *id,
                        name: name.clone(),
                        url: url.clone(),
                        tags: tags.clone(),
                    },
                );
                if *id >= self.next_id {
                    self.next_id = id + 1;
                }
            }

            Operation::SiteDelete { id } => {
                self.sites.remove(id);
            }

            Operation::SettingsUpsert { site_id, settings } => {
                self.site_settings.insert(*site_id, settings.clone());
            }

            Operation::SettingsDelete { site_id } => {
                self.site_settings.remove(site_id);
            }

            Operation::ResultUpsert { site_id, result } => {
                self.validation_results.insert(*site_id, result.clone());
            }

            Operation::ResultDelete { site_id } => {
                self.validation_results.remove(site_id);
            }

            Operation::RetryPolicyUpsert { site_id, policy } => {
                self.retry_policies.insert(*site_id, *policy);
            }

            Operation::RetryPolicyDelete { site_id } => {
                self.retry_policies.remove(site_id);
            }

            Operation::HeadersReplace { site_id, headers } => {
                self.headers.insert(*site_id, headers.clone());
            }

            Operation::HeadersDelete { site_id } => {
                self.headers.remove(site_id);
            }
        }
    }

    /// Minimal operation list that rebuilds this state.
    ///
    /// Sub-records whose site row is gone are dropped. The highest ever
    /// assigned identifier survives through the last `SiteUpsert` only when
    /// that site still exists, so a trailing tombstone pair keeps `next_id`.
    pub fn snapshot_ops(&self) -> Vec<Operation> {
        let mut ops = Vec::new();
        for (id, row) in &self.sites {
            ops.push(Operation::SiteUpsert {
                id: *id,
                name: row.name.clone(),
                url: row.url.clone(),
                tags: row.tags.clone(),
            });
            if let Some(settings) = self.site_settings.get(id) {
                ops.push(Operation::SettingsUpsert {
                    site_id: *id,
                    settings: settings.clone(),
                });
            }
            if let Some(result) = self.validation_results.get(id) {
                ops.push(Operation::ResultUpsert {
                    site_id: *id,
                    result: result.clone(),
                });
            }
            if let Some(policy) = self.retry_policies.get(id) {
                ops.push(Operation::RetryPolicyUpsert {
                    site_id: *id,
                    policy: *policy,
                });
            }
            if let Some(headers) = self.headers.get(id) {
                ops.push(Operation::HeadersReplace {
                    site_id: *id,
                    headers: headers.clone(),
                });
            }
        }

        let highest = self.next_id.saturating_sub(1);
        if highest > 0 && !self.sites.contains_key(&highest) {
            ops.push(Operation::SiteUpsert {
                id: highest,
                name: String::new(),
                url: String::new(),
                tags: String::new(),
            });
            ops.push(Operation::SiteDelete { id: highest });
        }

        ops
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
