// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status broadcast
//!
//! Every state transition of a site is published on the bus. Listeners (the
//! socket server's `watch` connections) subscribe while attached and apply
//! the update to their own copy.

use crate::site::{Site, SiteId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;

/// Sender for event delivery
pub type EventSender = mpsc::UnboundedSender<Event>;
/// Receiver for event delivery
pub type EventReceiver = mpsc::UnboundedReceiver<Event>;
/// Handle returned by [`EventBus::subscribe`]
pub type SubscriberId = u64;

/// Broadcast payloads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// A site's status or configuration changed
    StatusUpdate { site: Site },
    /// A site was deleted
    SiteRemoved { id: SiteId },
}

impl Event {
    pub const STATUS_UPDATE: &'static str = "STATUS_UPDATE";
    pub const SITE_REMOVED: &'static str = "SITE_REMOVED";

    /// Action identifier carried with the event
    pub fn action(&self) -> &'static str {
        match self {
            Event::StatusUpdate { .. } => Self::STATUS_UPDATE,
            Event::SiteRemoved { .. } => Self::SITE_REMOVED,
        }
    }

    pub fn site_id(&self) -> SiteId {
        match self {
            Event::StatusUpdate { site } => site.id,
            Event::SiteRemoved { id } => *id,
        }
    }
}

/// The event bus fans events out to every live subscriber
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<RwLock<HashMap<SubscriberId, EventSender>>>,
    next_id: Arc<AtomicU64>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to all events
    pub fn subscribe(&self) -> (SubscriberId, EventReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        let mut subs = self.subscribers.write().unwrap_or_else(|e| e.into_inner());
        subs.insert(id, tx);

        (id, rx)
    }

    /// Unsubscribe from events
    pub fn unsubscribe(&self, id: SubscriberId) {
        let mut subs = self.subscribers.write().unwrap_or_else(|e| e.into_inner());
        subs.remove(&id);
    }

    /// Publish an event to all subscribers, dropping those whose receiver is gone
    pub fn publish(&self, event: Event) {
        let mut closed = Vec::new();
        {
            let subs = self.subscribers.read().unwrap_or_else(|e| e.into_inner());
            for (id, tx) in subs.iter() {
                if tx.send(event.clone()).is_err() {
                    closed.push(*id);
                }
            }
        }

        if !closed.is_empty() {
            let mut subs = self.subscribers.write().unwrap_or_else(|e| e.into_inner());
            for id in closed {
                subs.remove(&id);
            }
        }
    }

    /// Get count of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
