//! Broadcast channel for cache replacement notices.
//!
//! [`CacheBus`] wraps a [`tokio::sync::broadcast`] channel. Every time a
//! push event replaces one of the caches, a [`CacheUpdate`] is published
//! so refresh callers can wait for the next replacement instead of
//! sleeping blindly.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

/// Which cache a push event replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheKind {
    /// The monitor snapshot (`monitorList`).
    Monitors,
    /// The notification list (`notificationList`).
    Notifications,
}

/// Notice published after a cache was replaced.
#[derive(Debug, Clone, Serialize)]
pub struct CacheUpdate {
    /// Replaced cache.
    pub kind: CacheKind,
    /// Number of records in the new contents.
    pub count: usize,
    /// When the replacement was applied.
    pub applied_at: DateTime<Utc>,
}

/// Broadcast bus for [`CacheUpdate`]s.
///
/// When the ring buffer is full, the oldest notices are dropped for
/// lagging receivers.
#[derive(Debug, Clone)]
pub struct CacheBus {
    sender: broadcast::Sender<CacheUpdate>,
}

impl CacheBus {
    /// Creates a new `CacheBus` with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes a notice to all subscribers.
    ///
    /// Returns the number of receivers that got it; with no receivers the
    /// notice is silently dropped.
    pub fn publish(&self, update: CacheUpdate) -> usize {
        self.sender.send(update).unwrap_or(0)
    }

    /// Creates a receiver for all future notices.
    ///
    /// Subscribe before sending the refresh request, otherwise a fast
    /// reply can be missed.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CacheUpdate> {
        self.sender.subscribe()
    }

    /// Returns the current number of active receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn update(kind: CacheKind) -> CacheUpdate {
        CacheUpdate {
            kind,
            count: 1,
            applied_at: Utc::now(),
        }
    }

    #[test]
    fn publish_without_receivers_returns_zero() {
        let bus = CacheBus::new(8);
        assert_eq!(bus.publish(update(CacheKind::Monitors)), 0);
    }

    #[tokio::test]
    async fn subscriber_receives_update() {
        let bus = CacheBus::new(8);
        let mut rx = bus.subscribe();
        assert_eq!(bus.publish(update(CacheKind::Notifications)), 1);

        let Ok(received) = rx.recv().await else {
            panic!("expected to receive update");
        };
        assert_eq!(received.kind, CacheKind::Notifications);
    }

    #[test]
    fn receiver_count_tracks_subscribers() {
        let bus = CacheBus::new(8);
        assert_eq!(bus.receiver_count(), 0);
        let rx1 = bus.subscribe();
        let _rx2 = bus.subscribe();
        assert_eq!(bus.receiver_count(), 2);
        drop(rx1);
        assert_eq!(bus.receiver_count(), 1);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let bus = CacheBus::new(0);
        let _rx = bus.subscribe();
        assert_eq!(bus.publish(update(CacheKind::Monitors)), 1);
    }
}
