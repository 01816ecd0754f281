//! Notification provider record and its wire mapping.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::wire::WireRecord;

/// Structured notification as exposed by the facade.
///
/// `notification_type` and `apply_existing` are hoisted out of the nested
/// `config` document the server stores for each provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Server-assigned id; `0` before creation.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Provider type (`discord`, `smtp`, `webhook`, ...).
    #[serde(rename = "type")]
    pub notification_type: String,
    /// Attached to new monitors by default.
    pub is_default: bool,
    /// Attach to all existing monitors when saved.
    pub apply_existing: bool,
    /// Whether the provider is enabled.
    pub active: bool,
    /// Owning user.
    pub user_id: i64,
    /// Provider-specific settings, flattened into the payload on save.
    pub config: Map<String, Value>,
}

impl Notification {
    /// Decodes one element of a `notificationList` push.
    ///
    /// The `config` field arrives as a JSON-encoded string; an undecodable
    /// config leaves `config`, `notification_type` and `apply_existing`
    /// empty.
    #[must_use]
    pub fn from_wire(map: &Map<String, Value>) -> Self {
        let record = WireRecord::new(map);
        let config = match record.get("config") {
            Some(Value::String(raw)) => serde_json::from_str::<Map<String, Value>>(raw).ok(),
            Some(Value::Object(inline)) => Some(inline.clone()),
            _ => None,
        }
        .unwrap_or_default();
        let nested = WireRecord::new(&config);
        Self {
            id: record.int("id"),
            name: record.string("name"),
            notification_type: nested.string("type"),
            is_default: record.flag("isDefault"),
            apply_existing: nested.flag("applyExisting"),
            active: record.flag("active"),
            user_id: record.int("userId"),
            config,
        }
    }

    /// Builds the `addNotification` / `editNotification` /
    /// `testNotification` payload.
    ///
    /// Config entries are flattened into the top level and win over the
    /// structured fields on key collisions.
    #[must_use]
    pub fn to_payload(&self, with_id: bool) -> Map<String, Value> {
        let mut payload = Map::new();
        if with_id {
            payload.insert("id".into(), json!(self.id));
        }
        payload.insert("name".into(), json!(self.name));
        payload.insert("type".into(), json!(self.notification_type));
        payload.insert("isDefault".into(), json!(self.is_default));
        payload.insert("applyExisting".into(), json!(self.apply_existing));
        payload.extend(self.config.clone());
        payload
    }
}
