//! Monitor snapshot and notification list rebuilt from push events.
//!
//! [`PushCache`] holds two independently locked caches. Each is replaced
//! wholesale (never merged) by the corresponding push event, so the most
//! recent `monitorList` / `notificationList` always wins. Reads take the
//! lock in shared mode and copy out, so no caller ever observes a cache
//! mid-replacement.
//!
//! Caches start empty and are left stale, not cleared, when the
//! connection ends.

use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::{RwLock, broadcast};

use super::cache_bus::{CacheBus, CacheKind, CacheUpdate};
use super::monitor::Monitor;
use super::notification::Notification;
use super::wire::WireRecord;
use crate::protocol::events::{MONITOR_LIST, NOTIFICATION_LIST};

/// Caches fed by push events.
#[derive(Debug)]
pub struct PushCache {
    monitors: RwLock<Map<String, Value>>,
    notifications: RwLock<Vec<Notification>>,
    bus: CacheBus,
}

impl PushCache {
    /// Creates empty caches whose update bus holds `bus_capacity` notices.
    #[must_use]
    pub fn new(bus_capacity: usize) -> Self {
        Self {
            monitors: RwLock::new(Map::new()),
            notifications: RwLock::new(Vec::new()),
            bus: CacheBus::new(bus_capacity),
        }
    }

    /// Applies one push event.
    ///
    /// Returns the replaced cache, or `None` when the event is not a cache
    /// event or its argument has the wrong shape (the cache is untouched).
    pub async fn apply(&self, event: &str, args: Vec<Value>) -> Option<CacheKind> {
        let first = args.into_iter().next();
        match (event, first) {
            (MONITOR_LIST, Some(Value::Object(snapshot))) => {
                self.replace_monitors(snapshot).await;
                Some(CacheKind::Monitors)
            }
            (NOTIFICATION_LIST, Some(Value::Array(items))) => {
                let list = items
                    .iter()
                    .filter_map(Value::as_object)
                    .map(Notification::from_wire)
                    .collect();
                self.replace_notifications(list).await;
                Some(CacheKind::Notifications)
            }
            (MONITOR_LIST | NOTIFICATION_LIST, _) => {
                tracing::warn!(event, "ignoring push with unexpected payload shape");
                None
            }
            _ => {
                tracing::trace!(event, "push event not cached");
                None
            }
        }
    }

    /// Replaces the monitor snapshot.
    pub async fn replace_monitors(&self, snapshot: Map<String, Value>) {
        let count = snapshot.len();
        *self.monitors.write().await = snapshot;
        tracing::debug!(count, "monitor snapshot replaced");
        self.publish(CacheKind::Monitors, count);
    }

    /// Replaces the notification list.
    pub async fn replace_notifications(&self, list: Vec<Notification>) {
        let count = list.len();
        *self.notifications.write().await = list;
        tracing::debug!(count, "notification list replaced");
        self.publish(CacheKind::Notifications, count);
    }

    fn publish(&self, kind: CacheKind, count: usize) {
        let _ = self.bus.publish(CacheUpdate {
            kind,
            count,
            applied_at: Utc::now(),
        });
    }

    /// Subscribes to replacement notices.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CacheUpdate> {
        self.bus.subscribe()
    }

    /// Looks a monitor up by id with a linear scan over the snapshot.
    pub async fn monitor(&self, id: i64) -> Option<Monitor> {
        let snapshot = self.monitors.read().await;
        snapshot
            .values()
            .filter_map(Value::as_object)
            .find(|record| WireRecord::new(record).int("id") == id)
            .map(Monitor::from_wire)
    }

    /// Decodes every record of the current snapshot.
    pub async fn monitors(&self) -> Vec<Monitor> {
        let snapshot = self.monitors.read().await;
        snapshot
            .values()
            .filter_map(Value::as_object)
            .map(Monitor::from_wire)
            .collect()
    }

    /// Copy of the raw snapshot as last pushed by the server.
    pub async fn monitor_snapshot(&self) -> Map<String, Value> {
        self.monitors.read().await.clone()
    }

    /// Copy of the notification list.
    pub async fn notifications(&self) -> Vec<Notification> {
        self.notifications.read().await.clone()
    }

    /// First notification matching `predicate`.
    pub async fn find_notification<F>(&self, predicate: F) -> Option<Notification>
    where
        F: Fn(&Notification) -> bool,
    {
        self.notifications
            .read()
            .await
            .iter()
            .find(|notification| predicate(notification))
            .cloned()
    }
}
