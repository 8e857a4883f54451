// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Site store
//!
//! Every mutation is appended to the WAL and synced before it is applied to
//! the in-memory tables. Calls block on disk IO; async callers go through
//! `spawn_blocking`.

use crate::state::MaterializedState;
use crate::wal::{Wal, WalError};
use std::path::Path;
use std::sync::Mutex;
use sw_core::{Operation, Site, SiteId, ValidationResult};
use thiserror::Error;

/// Appends past the last compaction that trigger the next one
pub const DEFAULT_COMPACT_AFTER: u64 = 10_000;

/// Errors from site store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("site has no settings")]
    MissingSettings,
    #[error("site has not been saved")]
    Unsaved,
    #[error("site {0} not found")]
    NotFound(SiteId),
    #[error(transparent)]
    Wal(#[from] WalError),
}

struct Inner {
    wal: Wal,
    state: MaterializedState,
    compact_after: u64,
    /// WAL length right after the last compaction (or open)
    compacted_len: u64,
}

impl Inner {
    fn commit(&mut self, op: Operation) -> Result<(), StoreError> {
        self.wal.append(&op)?;
        self.state.apply(&op);
        Ok(())
    }

    fn compact(&mut self) -> Result<usize, StoreError> {
        let before = self.wal.sequence();
        let ops = self.state.snapshot_ops();
        self.wal.rewrite(&ops)?;
        self.compacted_len = ops.len() as u64;
        tracing::info!(before, after = ops.len(), "compacted site store");
        Ok(ops.len())
    }

    /// Compact once enough appends piled up; the mutation itself already landed
    fn compact_if_due(&mut self) {
        if self.wal.sequence() < self.compacted_len.saturating_add(self.compact_after) {
            return;
        }
        if let Err(e) = self.compact() {
            tracing::warn!(error = %e, "automatic compaction failed");
        }
    }

    /// Site row plus every present sub-record of `site`
    fn commit_site(&mut self, id: SiteId, site: &Site) -> Result<(), StoreError> {
        self.commit(Operation::SiteUpsert {
            id,
            name: site.name.clone(),
            url: site.url.clone(),
            tags: site.tags_joined(),
        })?;
        if let Some(settings) = &site.settings {
            self.commit(Operation::SettingsUpsert {
                site_id: id,
                settings: settings.clone(),
            })?;
        }
        if let Some(result) = &site.last_result {
            self.commit(Operation::ResultUpsert {
                site_id: id,
                result: result.clone(),
            })?;
        }
        if let Some(policy) = site.retry_policy {
            self.commit(Operation::RetryPolicyUpsert {
                site_id: id,
                policy,
            })?;
        }
        self.commit(Operation::HeadersReplace {
            site_id: id,
            headers: site.headers.clone(),
        })
    }
}

/// Durable storage for sites and their sub-records
pub struct SiteStore {
    inner: Mutex<Inner>,
}

impl SiteStore {
    /// Open the store, replaying the WAL at `path`
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let mut state = MaterializedState::default();
        let ops = Wal::replay(path)?;
        for op in &ops {
            state.apply(op);
        }
        let wal = Wal::open(path)?;
        tracing::debug!(path = %path.display(), ops = ops.len(), "site store opened");

        let compacted_len = wal.sequence();
        Ok(Self {
            inner: Mutex::new(Inner {
                wal,
                state,
                compact_after: DEFAULT_COMPACT_AFTER,
                compacted_len,
            }),
        })
    }

    /// Compact automatically after `ops` appends instead of the default
    pub fn with_compact_after(self, ops: u64) -> Self {
        let mut inner = self.inner.into_inner().unwrap_or_else(|e| e.into_inner());
        inner.compact_after = ops.max(1);
        Self {
            inner: Mutex::new(inner),
        }
    }

    /// Rewrite the WAL as the minimal set of operations for the current state
    pub fn compact(&self) -> Result<usize, StoreError> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .compact()
    }

    /// Every site, ordered by id, optionally restricted to one tag
    pub fn all(&self, tag: Option<&str>) -> Result<Vec<Site>, StoreError> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let sites = inner.state.hydrate_all();
        Ok(match tag {
            Some(tag) => sites.into_iter().filter(|s| s.has_tag(tag)).collect(),
            None => sites,
        })
    }

    pub fn get(&self, id: SiteId) -> Result<Option<Site>, StoreError> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Ok(inner.state.hydrate(id))
    }

    /// Insert a new site, returning it with its assigned id
    pub fn put(&self, site: &Site) -> Result<Site, StoreError> {
        if site.settings.is_none() {
            return Err(StoreError::MissingSettings);
        }
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let id = inner.state.next_id();
        inner.commit_site(id, site)?;
        inner.compact_if_due();
        inner.state.hydrate(id).ok_or(StoreError::NotFound(id))
    }

    /// Upsert the site row and each present sub-record; headers are replaced.
    ///
    /// A site without a retry policy drops the stored one.
    pub fn update(&self, site: &Site) -> Result<(), StoreError> {
        if !site.is_saved() {
            return Err(StoreError::Unsaved);
        }
        let id = site.id;
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if !inner.state.sites.contains_key(&id) {
            return Err(StoreError::NotFound(id));
        }
        inner.commit_site(id, site)?;
        if site.retry_policy.is_none() && inner.state.retry_policies.contains_key(&id) {
            inner.commit(Operation::RetryPolicyDelete { site_id: id })?;
        }
        inner.compact_if_due();
        Ok(())
    }

    /// Record a check outcome without touching the site's configuration.
    ///
    /// Writes the result row and, when the site still has a retry policy,
    /// that policy's `attempts` counter. Returns the site as now stored.
    pub fn record_result(
        &self,
        id: SiteId,
        result: &ValidationResult,
        retry_attempts: Option<u32>,
    ) -> Result<Site, StoreError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if !inner.state.sites.contains_key(&id) {
            return Err(StoreError::NotFound(id));
        }
        inner.commit(Operation::ResultUpsert {
            site_id: id,
            result: result.clone(),
        })?;
        let stored_policy = inner.state.retry_policies.get(&id).copied();
        if let (Some(policy), Some(attempts)) = (stored_policy, retry_attempts) {
            if policy.attempts != attempts {
                inner.commit(Operation::RetryPolicyUpsert {
                    site_id: id,
                    policy: policy.with_attempts(attempts),
                })?;
            }
        }
        inner.compact_if_due();
        inner.state.hydrate(id).ok_or(StoreError::NotFound(id))
    }

    /// Delete a site, sub-records first
    pub fn delete(&self, site: &Site) -> Result<(), StoreError> {
        if !site.is_saved() {
            return Err(StoreError::Unsaved);
        }
        let id = site.id;
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        if inner.state.headers.contains_key(&id) {
            inner.commit(Operation::HeadersDelete { site_id: id })?;
        }
        if inner.state.retry_policies.contains_key(&id) {
            inner.commit(Operation::RetryPolicyDelete { site_id: id })?;
        }
        if inner.state.validation_results.contains_key(&id) {
            inner.commit(Operation::ResultDelete { site_id: id })?;
        }
        if inner.state.site_settings.contains_key(&id) {
            inner.commit(Operation::SettingsDelete { site_id: id })?;
        }
        if inner.state.sites.contains_key(&id) {
            inner.commit(Operation::SiteDelete { id })?;
        }
        inner.compact_if_due();
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
