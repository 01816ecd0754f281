//! Monitor record and its wire mapping.
//!
//! Decoding is lenient (see [`super::wire`]); encoding applies the
//! server's expected defaults and then prunes empty fields.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::wire::WireRecord;

/// Accepted status codes sent when the caller leaves them empty.
pub const DEFAULT_ACCEPTED_STATUS_CODES: &[&str] = &["200-299"];

/// Numeric fields sent even when zero.
const ALWAYS_SENT: &[&str] = &["id", "port", "interval", "timeout"];

/// Structured monitor as exposed by the facade.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Monitor {
    /// Server-assigned id; `0` before creation.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Monitor type (`http`, `port`, `ping`, `keyword`, ...).
    #[serde(rename = "type")]
    pub monitor_type: String,
    /// Target URL for HTTP-style monitors.
    pub url: String,
    /// Target host for port/ping monitors.
    pub hostname: String,
    /// Target port.
    pub port: i64,
    /// Check interval in seconds.
    pub interval: i64,
    /// Request timeout in seconds.
    pub timeout: i64,
    /// Interval between retries in seconds.
    pub retry_interval: i64,
    /// Notification resend interval.
    pub resend_interval: i64,
    /// Retries before the monitor is marked down.
    pub max_retries: i64,
    /// Invert the up/down result.
    pub upside_down: bool,
    /// Redirects followed before failing.
    pub max_redirects: i64,
    /// Status code ranges considered up, e.g. `"200-299"`.
    pub accepted_status_codes: Vec<String>,
    /// Follow HTTP redirects.
    pub follow_redirect: bool,
    /// Notification providers attached to this monitor.
    pub notification_id_list: Vec<i64>,
    /// Whether the monitor is running.
    pub active: bool,
    /// Skip TLS verification.
    pub ignore_tls: bool,
    /// HTTP method.
    pub http_method: String,
    /// HTTP request body.
    pub body: String,
    /// Basic auth user name.
    pub basic_auth_user: String,
    /// Basic auth password.
    pub basic_auth_pass: String,
}

impl Monitor {
    /// Decodes one record of a `monitorList` snapshot.
    #[must_use]
    pub fn from_wire(map: &Map<String, Value>) -> Self {
        let record = WireRecord::new(map);
        let notification_id_list = match record.get("notificationIDList") {
            Some(Value::Object(_)) => record.id_set("notificationIDList"),
            _ => record.ids("notification_id_list"),
        };
        Self {
            id: record.int("id"),
            name: record.string("name"),
            monitor_type: record.string("type"),
            url: record.string("url"),
            hostname: record.string("hostname"),
            port: record.int("port"),
            interval: record.int("interval"),
            timeout: record.int("timeout"),
            retry_interval: record.int("retryInterval"),
            resend_interval: record.int("resendInterval"),
            max_retries: record.int("maxretries"),
            upside_down: record.flag("upsideDown"),
            max_redirects: record.int("maxredirects"),
            accepted_status_codes: record.strings("accepted_statuscodes"),
            follow_redirect: record.flag("follow_redirect"),
            notification_id_list,
            active: record.flag("active"),
            ignore_tls: record.flag("ignoreTls"),
            http_method: record.string("method"),
            body: record.string("body"),
            basic_auth_user: record.string("basic_auth_user"),
            basic_auth_pass: record.string("basic_auth_pass"),
        }
    }

    /// Builds the `add` / `editMonitor` payload.
    ///
    /// The id is only included when `with_id` is set (updates). Empty
    /// strings and zero numbers are pruned except for `id`, `port`,
    /// `interval` and `timeout`.
    #[must_use]
    pub fn to_payload(&self, with_id: bool) -> Map<String, Value> {
        let accepted: Vec<String> = if self.accepted_status_codes.is_empty() {
            DEFAULT_ACCEPTED_STATUS_CODES
                .iter()
                .map(|code| (*code).to_string())
                .collect()
        } else {
            self.accepted_status_codes.clone()
        };
        // The server expects a set-shaped map here, not an array.
        let notification_ids: Map<String, Value> = self
            .notification_id_list
            .iter()
            .map(|id| (id.to_string(), Value::Bool(true)))
            .collect();

        let mut payload = Map::new();
        if with_id {
            payload.insert("id".into(), json!(self.id));
        }
        let fields = [
            ("type", json!(self.monitor_type)),
            ("name", json!(self.name)),
            ("url", json!(self.url)),
            ("hostname", json!(self.hostname)),
            ("port", json!(self.port)),
            ("interval", json!(self.interval)),
            ("timeout", json!(self.timeout)),
            ("retryInterval", json!(self.retry_interval)),
            ("resendInterval", json!(self.resend_interval)),
            ("maxretries", json!(self.max_retries)),
            ("upsideDown", json!(self.upside_down)),
            ("maxredirects", json!(self.max_redirects)),
            ("accepted_statuscodes", json!(accepted)),
            ("method", json!(self.http_method)),
            ("body", json!(self.body)),
            ("headers", json!("")),
            ("authMethod", json!("")),
            ("basic_auth_user", json!(self.basic_auth_user)),
            ("basic_auth_pass", json!(self.basic_auth_pass)),
            ("ignoreTls", json!(self.ignore_tls)),
            ("active", json!(self.active)),
            ("notificationIDList", Value::Object(notification_ids)),
            ("httpBodyEncoding", json!("json")),
            ("expiryNotification", json!(false)),
            ("dns_resolve_server", json!("1.1.1.1")),
            ("dns_resolve_type", json!("A")),
            ("proxyId", Value::Null),
            ("mqttUsername", json!("")),
            ("mqttPassword", json!("")),
            ("mqttTopic", json!("")),
            ("mqttSuccessMessage", json!("")),
            ("keyword", json!("")),
            ("invertKeyword", json!(false)),
            ("packetSize", json!(56)),
        ];
        for (key, value) in fields {
            payload.insert(key.to_string(), value);
        }
        prune(&mut payload);
        payload
    }
}

/// Drops empty strings and zero numbers outside [`ALWAYS_SENT`].
fn prune(payload: &mut Map<String, Value>) {
    payload.retain(|key, value| {
        if ALWAYS_SENT.contains(&key.as_str()) {
            return true;
        }
        match value {
            Value::String(s) => !s.is_empty(),
            Value::Number(n) => n.as_i64() != Some(0),
            _ => true,
        }
    });
}
