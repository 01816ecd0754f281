//! Typed facade over the Socket.IO session.
//!
//! [`KumaClient`] owns one [`Connection`] and the push caches it feeds.
//! Monitor creation is the only correlated mutation; every other mutation
//! is fire-and-forget and relies on the caches to observe the outcome.

use std::sync::Arc;

use serde_json::{Map, Value, json};

use super::convergence::{poll_until, refresh};
use crate::config::ClientConfig;
use crate::domain::{CacheKind, CallRegistry, Monitor, Notification, PushCache, WireRecord};
use crate::error::{ClientError, Entity};
use crate::protocol::events;
use crate::transport::{Connection, ConnectionState};

/// User id assumed when the login answer does not carry one.
pub const DEFAULT_USER_ID: i64 = 1;

/// Result of a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Session token returned by the server (empty if none).
    pub token: String,
    /// Authenticated user id.
    pub user_id: i64,
}

impl Session {
    /// Extracts the session from a login acknowledgment.
    #[must_use]
    pub fn from_login_response(response: &Map<String, Value>) -> Self {
        let record = WireRecord::new(response);
        let user_id = if record.get("userID").is_some() {
            record.int("userID")
        } else {
            DEFAULT_USER_ID
        };
        Self {
            token: record.string("token"),
            user_id,
        }
    }
}

/// Reads the new monitor id from an `add` acknowledgment.
///
/// The id is at the top level or nested under `msg`, depending on the
/// server version.
#[must_use]
pub fn monitor_id_from_ack(ack: &Map<String, Value>) -> Option<i64> {
    let top = WireRecord::new(ack).int("monitorID");
    if top > 0 {
        return Some(top);
    }
    let nested = ack
        .get("msg")
        .and_then(Value::as_object)
        .map(|msg| WireRecord::new(msg).int("monitorID"))?;
    (nested > 0).then_some(nested)
}

/// Authenticated client for one Uptime Kuma instance.
#[derive(Debug)]
pub struct KumaClient {
    config: ClientConfig,
    connection: Connection,
    cache: Arc<PushCache>,
    session: Session,
}

impl KumaClient {
    /// Connects, performs the handshake and logs in.
    ///
    /// Blocks for the login settle delay so the initial pushes can
    /// populate the caches.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Config`] for an unusable base URL.
    /// - [`ClientError::Connection`] if the socket cannot be opened.
    /// - [`ClientError::Authentication`] if the login is rejected.
    /// - [`ClientError::CallTimeout`] if the login is never answered.
    ///
    /// The connection is closed on every login failure.
    pub async fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        let registry = Arc::new(CallRegistry::new());
        let cache = Arc::new(PushCache::new(config.cache_bus_capacity));
        let connection = Connection::open(&config, registry, Arc::clone(&cache)).await?;

        let credentials = json!({
            "username": config.username,
            "password": config.password,
            "token": "",
        });
        let response = match connection.call(events::LOGIN, &credentials).await {
            Ok(response) => response,
            Err(e) => {
                connection.close().await;
                return Err(match e {
                    ClientError::Api { message } => ClientError::Authentication { message },
                    other => other,
                });
            }
        };
        let session = Session::from_login_response(&response);
        tracing::info!(user = %config.username, user_id = session.user_id, "logged in");

        tokio::time::sleep(config.login_settle).await;

        Ok(Self {
            config,
            connection,
            cache,
            session,
        })
    }

    /// Session token from the login answer.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.session.token
    }

    /// Authenticated user id.
    #[must_use]
    pub const fn user_id(&self) -> i64 {
        self.session.user_id
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Push caches fed by this client's connection.
    #[must_use]
    pub fn cache(&self) -> &PushCache {
        &self.cache
    }

    /// Connection lifecycle state.
    pub async fn state(&self) -> ConnectionState {
        self.connection.state().await
    }

    /// Returns `true` while the connection is usable.
    pub async fn is_connected(&self) -> bool {
        self.connection.is_connected().await
    }

    /// Number of calls awaiting an acknowledgment.
    pub async fn pending_calls(&self) -> usize {
        self.connection.pending_calls().await
    }

    /// Raw correlated call.
    ///
    /// # Errors
    ///
    /// See [`Connection::call`].
    pub async fn call(&self, event: &str, data: &Value) -> Result<Map<String, Value>, ClientError> {
        self.connection.call(event, data).await
    }

    /// Raw fire-and-forget event.
    ///
    /// # Errors
    ///
    /// See [`Connection::emit`].
    pub async fn emit(&self, event: &str, data: &Value) -> Result<(), ClientError> {
        self.connection.emit(event, data).await
    }

    // ---- monitors ----

    /// Requests a fresh monitor list and waits (bounded) for it to land.
    ///
    /// Returns whether the push was observed; a slow server is not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns the emit error.
    pub async fn refresh_monitors(&self) -> Result<bool, ClientError> {
        refresh(
            &self.connection,
            &self.cache,
            events::GET_MONITOR_LIST,
            CacheKind::Monitors,
            self.config.refresh_settle,
        )
        .await
    }

    /// Looks a monitor up in the current snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] if the snapshot has no such id.
    pub async fn get_monitor(&self, id: i64) -> Result<Monitor, ClientError> {
        self.cache
            .monitor(id)
            .await
            .ok_or(ClientError::NotFound {
                entity: Entity::Monitor,
                id,
            })
    }

    /// Refreshes, then returns every monitor in the snapshot.
    ///
    /// # Errors
    ///
    /// Returns the refresh emit error.
    pub async fn get_monitors(&self) -> Result<Vec<Monitor>, ClientError> {
        let _ = self.refresh_monitors().await?;
        Ok(self.cache.monitors().await)
    }

    /// Creates a monitor and returns it with its server-assigned id.
    ///
    /// When the acknowledgment carries no id, the refreshed snapshot is
    /// scanned for the highest id with the same name and URL.
    ///
    /// # Errors
    ///
    /// - Call errors from `add` ([`ClientError::Api`], timeouts).
    /// - [`ClientError::ConvergenceTimeout`] if the id cannot be recovered.
    pub async fn create_monitor(&self, monitor: &Monitor) -> Result<Monitor, ClientError> {
        let payload = Value::Object(monitor.to_payload(false));
        let ack = self.connection.call(events::ADD_MONITOR, &payload).await?;

        let id = match monitor_id_from_ack(&ack) {
            Some(id) => id,
            None => {
                tracing::debug!(name = %monitor.name, "add ack without id, scanning snapshot");
                tokio::time::sleep(self.config.mutation_settle).await;
                self.get_monitors()
                    .await?
                    .iter()
                    .filter(|m| m.name == monitor.name && m.url == monitor.url)
                    .map(|m| m.id)
                    .max()
                    .ok_or(ClientError::ConvergenceTimeout {
                        entity: Entity::Monitor,
                        action: "created",
                        attempts: 1,
                    })?
            }
        };

        tracing::info!(id, name = %monitor.name, "monitor created");
        Ok(Monitor {
            id,
            ..monitor.clone()
        })
    }

    /// Sends a monitor edit and waits the mutation settle delay.
    ///
    /// The edit is not confirmed; the returned monitor is the input.
    ///
    /// # Errors
    ///
    /// Returns the emit error.
    pub async fn update_monitor(&self, monitor: &Monitor) -> Result<Monitor, ClientError> {
        let payload = Value::Object(monitor.to_payload(true));
        self.connection.emit(events::EDIT_MONITOR, &payload).await?;
        tokio::time::sleep(self.config.mutation_settle).await;
        tracing::info!(id = monitor.id, "monitor update sent");
        Ok(monitor.clone())
    }

    /// Sends a monitor deletion.
    ///
    /// # Errors
    ///
    /// Returns the emit error.
    pub async fn delete_monitor(&self, id: i64) -> Result<(), ClientError> {
        self.connection.emit(events::DELETE_MONITOR, &json!(id)).await?;
        tracing::info!(id, "monitor deletion sent");
        Ok(())
    }

    // ---- notifications ----

    /// Requests a fresh notification list and waits (bounded) for it.
    ///
    /// # Errors
    ///
    /// Returns the emit error.
    pub async fn refresh_notifications(&self) -> Result<bool, ClientError> {
        refresh(
            &self.connection,
            &self.cache,
            events::GET_NOTIFICATION_LIST,
            CacheKind::Notifications,
            self.config.refresh_settle,
        )
        .await
    }

    /// Refreshes, then returns the notification list.
    ///
    /// # Errors
    ///
    /// Returns the refresh emit error.
    pub async fn get_notifications(&self) -> Result<Vec<Notification>, ClientError> {
        let _ = self.refresh_notifications().await?;
        Ok(self.cache.notifications().await)
    }

    /// Refreshes, then looks a notification up by id.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] if the list has no such id.
    pub async fn get_notification(&self, id: i64) -> Result<Notification, ClientError> {
        let _ = self.refresh_notifications().await?;
        self.cache
            .find_notification(|n| n.id == id)
            .await
            .ok_or(ClientError::NotFound {
                entity: Entity::Notification,
                id,
            })
    }

    /// Sends a notification creation and polls the cache for it by name.
    ///
    /// # Errors
    ///
    /// - The emit error.
    /// - [`ClientError::ConvergenceTimeout`] if the poll budget runs out.
    ///   The notification may still have been created.
    pub async fn create_notification(
        &self,
        notification: &Notification,
    ) -> Result<Notification, ClientError> {
        let payload = Value::Object(notification.to_payload(false));
        self.connection.emit(events::ADD_NOTIFICATION, &payload).await?;

        let cache = &*self.cache;
        let name = notification.name.as_str();
        let created = self
            .poll_notifications(move || async move {
                cache.find_notification(|n| n.name == name).await
            })
            .await
            .ok_or(ClientError::ConvergenceTimeout {
                entity: Entity::Notification,
                action: "created",
                attempts: self.config.poll_attempts,
            })?;

        tracing::info!(id = created.id, name, "notification created");
        Ok(created)
    }

    /// Sends a notification edit and polls the cache for its id.
    ///
    /// # Errors
    ///
    /// - The emit error.
    /// - [`ClientError::ConvergenceTimeout`] if the poll budget runs out.
    pub async fn update_notification(
        &self,
        notification: &Notification,
    ) -> Result<Notification, ClientError> {
        let payload = Value::Object(notification.to_payload(true));
        self.connection.emit(events::EDIT_NOTIFICATION, &payload).await?;

        let cache = &*self.cache;
        let id = notification.id;
        let updated = self
            .poll_notifications(move || async move { cache.find_notification(|n| n.id == id).await })
            .await
            .ok_or(ClientError::ConvergenceTimeout {
                entity: Entity::Notification,
                action: "updated",
                attempts: self.config.poll_attempts,
            })?;

        tracing::info!(id, "notification updated");
        Ok(updated)
    }

    async fn poll_notifications<F, Fut>(&self, probe: F) -> Option<Notification>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Option<Notification>>,
    {
        poll_until(self.config.poll_attempts, self.config.poll_interval, probe).await
    }

    /// Sends a notification deletion.
    ///
    /// # Errors
    ///
    /// Returns the emit error.
    pub async fn delete_notification(&self, id: i64) -> Result<(), ClientError> {
        self.connection.emit(events::DELETE_NOTIFICATION, &json!(id)).await?;
        tracing::info!(id, "notification deletion sent");
        Ok(())
    }

    /// Asks the server to send a test message through `notification`.
    ///
    /// # Errors
    ///
    /// Returns the emit error.
    pub async fn test_notification(&self, notification: &Notification) -> Result<(), ClientError> {
        let payload = Value::Object(notification.to_payload(false));
        self.connection.emit(events::TEST_NOTIFICATION, &payload).await
    }

    /// Closes the connection. Idempotent.
    pub async fn close(&self) {
        self.connection.close().await;
    }
}
