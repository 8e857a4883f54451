// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::site::SiteSettings;

fn make_event(id: SiteId) -> Event {
    Event::StatusUpdate {
        site: Site::new("api", "https://api.test", SiteSettings::default()).with_id(id),
    }
}

#[tokio::test]
async fn publish_reaches_every_subscriber() {
    let bus = EventBus::new();
    let (_, mut rx1) = bus.subscribe();
    let (_, mut rx2) = bus.subscribe();

    bus.publish(make_event(7));

    assert_eq!(rx1.recv().await.unwrap().site_id(), 7);
    assert_eq!(rx2.recv().await.unwrap().site_id(), 7);
}

#[test]
fn unsubscribe_removes_subscriber() {
    let bus = EventBus::new();
    let (id, _rx) = bus.subscribe();
    assert_eq!(bus.subscriber_count(), 1);

    bus.unsubscribe(id);
    assert_eq!(bus.subscriber_count(), 0);
}

#[test]
fn publish_prunes_dropped_receivers() {
    let bus = EventBus::new();
    let (_, rx) = bus.subscribe();
    let (_, _kept) = bus.subscribe();
    drop(rx);

    bus.publish(make_event(1));
    assert_eq!(bus.subscriber_count(), 1);
}

#[test]
fn events_carry_action_identifiers() {
    assert_eq!(make_event(1).action(), "STATUS_UPDATE");
    assert_eq!(Event::SiteRemoved { id: 2 }.action(), "SITE_REMOVED");
    assert_eq!(Event::SiteRemoved { id: 2 }.site_id(), 2);
}

#[test]
fn clones_share_subscribers() {
    let bus = EventBus::new();
    let clone = bus.clone();
    let (_, mut rx) = bus.subscribe();

    clone.publish(Event::SiteRemoved { id: 9 });
    assert_eq!(rx.try_recv().unwrap(), Event::SiteRemoved { id: 9 });
}
