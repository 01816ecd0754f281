//! Correlation of outgoing calls with inbound acknowledgments.
//!
//! [`CallRegistry`] owns the correlation-id counter and the map of pending
//! calls behind a single lock. An entry is removed exactly once: either by
//! [`CallRegistry::deliver`] (read loop, matching ack) or by
//! [`CallRegistry::remove`] (caller's timeout path). Whoever removes it
//! owns the response channel, so a result is delivered at most once.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::{Mutex, oneshot};

/// One caller waiting for an acknowledgment.
#[derive(Debug)]
pub struct PendingCall {
    /// Correlation id written in the outgoing frame.
    pub id: u64,
    /// Event name, for diagnostics.
    pub event: String,
    /// Registration time.
    pub created_at: DateTime<Utc>,
    responder: oneshot::Sender<Value>,
}

#[derive(Debug, Default)]
struct RegistryState {
    last_id: u64,
    pending: HashMap<u64, PendingCall>,
}

/// Map from correlation id to waiting caller.
#[derive(Debug, Default)]
pub struct CallRegistry {
    state: Mutex<RegistryState>,
}

impl CallRegistry {
    /// Creates an empty registry. The first allocated id is `1`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the next correlation id and registers a waiter for it.
    ///
    /// Ids are monotonic and never reused for the registry's lifetime.
    pub async fn register(&self, event: &str) -> (u64, oneshot::Receiver<Value>) {
        let (responder, receiver) = oneshot::channel();
        let mut state = self.state.lock().await;
        state.last_id = state.last_id.wrapping_add(1);
        let id = state.last_id;
        state.pending.insert(
            id,
            PendingCall {
                id,
                event: event.to_string(),
                created_at: Utc::now(),
                responder,
            },
        );
        (id, receiver)
    }

    /// Hands an acknowledgment to the caller registered under `id`.
    ///
    /// Returns `false` when no caller is waiting (unknown, already
    /// answered, or timed out); the payload is dropped.
    pub async fn deliver(&self, id: u64, data: Value) -> bool {
        let pending = self.state.lock().await.pending.remove(&id);
        let Some(call) = pending else {
            tracing::debug!(id, "dropping ack without a waiting caller");
            return false;
        };
        let waited_ms = (Utc::now() - call.created_at).num_milliseconds();
        tracing::debug!(id, event = %call.event, waited_ms, "ack delivered");
        // The receiver may already be gone if the caller was dropped.
        call.responder.send(data).is_ok()
    }

    /// Removes the entry for `id` without answering it.
    ///
    /// Returns `true` if an entry was still registered.
    pub async fn remove(&self, id: u64) -> bool {
        self.state.lock().await.pending.remove(&id).is_some()
    }

    /// Returns `true` if a caller is registered under `id`.
    pub async fn contains(&self, id: u64) -> bool {
        self.state.lock().await.pending.contains_key(&id)
    }

    /// Number of calls currently waiting.
    pub async fn len(&self) -> usize {
        self.state.lock().await.pending.len()
    }

    /// Returns `true` if no call is waiting.
    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.pending.is_empty()
    }
}
