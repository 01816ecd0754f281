//! Domain layer: records, call correlation, and push-event caches.
//!
//! This module contains the client-side state shared between the read
//! loop and callers: the pending-call registry, the two push-fed caches
//! with their update bus, and the typed monitor / notification records.

pub mod cache_bus;
pub mod call_registry;
pub mod monitor;
pub mod notification;
pub mod push_cache;
pub mod wire;

pub use cache_bus::{CacheBus, CacheKind, CacheUpdate};
pub use call_registry::{CallRegistry, PendingCall};
pub use monitor::Monitor;
pub use notification::Notification;
pub use push_cache::PushCache;
pub use wire::WireRecord;
