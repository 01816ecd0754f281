//! Turns asynchronous push delivery into bounded, synchronous-looking reads.
//!
//! Two shapes:
//!
//! - [`refresh`]: subscribe to cache updates, emit the refresh request, then
//!   wait for the matching replacement. The wait is bounded; on a slow
//!   server the caller reads whatever the cache holds.
//! - [`poll_until`]: after a fire-and-forget mutation, probe the cache a
//!   fixed number of times at a fixed interval.

use std::future::Future;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::domain::{CacheKind, CacheUpdate, PushCache};
use crate::error::ClientError;
use crate::transport::Connection;

/// Waits for the next update of `kind`, at most `bound`.
///
/// Returns `false` on timeout or when the bus is gone. A lagged receiver
/// keeps waiting, since it only missed older notices.
pub async fn next_update(
    updates: &mut broadcast::Receiver<CacheUpdate>,
    kind: CacheKind,
    bound: Duration,
) -> bool {
    let wait = async {
        loop {
            match updates.recv().await {
                Ok(update) if update.kind == kind => return true,
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "cache update subscriber lagged");
                }
                Err(RecvError::Closed) => return false,
            }
        }
    };
    tokio::time::timeout(bound, wait).await.unwrap_or(false)
}

/// Emits `request_event` and waits for the resulting `kind` replacement.
///
/// Subscribing happens before the emit so a fast push cannot slip by.
/// Returns whether the push was observed within `bound`.
///
/// # Errors
///
/// Returns the emit error; an unobserved push is not an error.
pub async fn refresh(
    connection: &Connection,
    cache: &PushCache,
    request_event: &str,
    kind: CacheKind,
    bound: Duration,
) -> Result<bool, ClientError> {
    let mut updates = cache.subscribe();
    connection.emit(request_event, &Value::Null).await?;
    let observed = next_update(&mut updates, kind, bound).await;
    if !observed {
        tracing::debug!(event = request_event, "refresh not observed, serving cached data");
    }
    Ok(observed)
}

/// Probes up to `attempts` times, sleeping `interval` before each probe.
///
/// Returns the first `Some` produced by `probe`.
pub async fn poll_until<T, F, Fut>(attempts: u32, interval: Duration, mut probe: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    for attempt in 1..=attempts {
        tokio::time::sleep(interval).await;
        if let Some(found) = probe().await {
            tracing::debug!(attempt, "mutation observed in cache");
            return Some(found);
        }
    }
    None
}
