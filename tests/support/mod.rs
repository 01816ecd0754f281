//! In-process mock of the Uptime Kuma Socket.IO endpoint.
//!
//! Serves `/socket.io/` over axum, answers the namespace connect, acks the
//! correlated calls the client makes (`login`, `add`) and pushes
//! `monitorList` / `notificationList` the way the real server does.
//! Calls for any other event are never acknowledged.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::sync::{Mutex, broadcast};

use kuma_socket::ClientConfig;

const OPEN_FRAME: &str =
    r#"0{"sid":"mock","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#;

/// Scripted server behaviour.
#[derive(Debug, Clone)]
pub struct Script {
    /// Result acked to `login`.
    pub login: Value,
    /// Result acked to `add`.
    pub add_ack: Value,
    /// Snapshot pushed after login and on every `getMonitorList`.
    pub monitors: Value,
    /// Initial notification records (server wire shape).
    pub notifications: Vec<Value>,
    /// Whether notification add/edit change the list and push it.
    pub apply_notification_mutations: bool,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            login: json!({"ok": true, "token": "abc"}),
            add_ack: json!({"ok": true, "msg": "Added Successfully.", "monitorID": 7}),
            monitors: json!({}),
            notifications: Vec::new(),
            apply_notification_mutations: true,
        }
    }
}

#[derive(Debug, Clone)]
enum Control {
    Send(String),
    Close,
}

#[derive(Debug)]
struct MockState {
    script: Script,
    notifications: Mutex<Vec<Value>>,
    received: Mutex<Vec<String>>,
    control: broadcast::Sender<Control>,
}

/// Handle on a running mock server.
#[derive(Debug, Clone)]
pub struct MockKuma {
    addr: SocketAddr,
    state: Arc<MockState>,
}

impl MockKuma {
    /// Binds a loopback port and starts serving `script`.
    pub async fn start(script: Script) -> Self {
        let (control, _) = broadcast::channel(16);
        let state = Arc::new(MockState {
            notifications: Mutex::new(script.notifications.clone()),
            script,
            received: Mutex::new(Vec::new()),
            control,
        });
        let app = Router::new()
            .route("/socket.io/", get(socket_handler))
            .with_state(Arc::clone(&state));

        let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
            panic!("failed to bind mock server");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("mock server has no local address");
        };
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Self { addr, state }
    }

    /// Client configuration pointing at this server, with short timings.
    pub fn config(&self) -> ClientConfig {
        let mut config = ClientConfig::new(format!("http://{}", self.addr), "admin", "secret");
        config.call_timeout = Duration::from_millis(300);
        config.handshake_settle = Duration::from_millis(10);
        config.login_settle = Duration::from_millis(50);
        config.refresh_settle = Duration::from_millis(200);
        config.mutation_settle = Duration::from_millis(20);
        config.poll_attempts = 5;
        config.poll_interval = Duration::from_millis(20);
        config
    }

    /// Writes a raw frame to the connected client.
    pub fn send(&self, frame: impl Into<String>) {
        let _ = self.state.control.send(Control::Send(frame.into()));
    }

    /// Sends a close frame and drops the socket.
    pub fn close_socket(&self) {
        let _ = self.state.control.send(Control::Close);
    }

    /// Every text frame received from the client, in order.
    pub async fn received(&self) -> Vec<String> {
        self.state.received.lock().await.clone()
    }

    /// Data arguments of every `event` the client sent (calls and emits).
    pub async fn payloads_of(&self, event: &str) -> Vec<Value> {
        self.received()
            .await
            .iter()
            .filter_map(|frame| parse_client_event(frame))
            .filter(|(_, name, _)| name == event)
            .map(|(_, _, data)| data)
            .collect()
    }

    /// Waits until the client has sent `frame`.
    pub async fn wait_for_frame(&self, frame: &str) -> bool {
        for _ in 0..50 {
            if self.received().await.iter().any(|f| f == frame) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }
}

async fn socket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<MockState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| run_session(socket, state))
}

async fn run_session(socket: WebSocket, state: Arc<MockState>) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut control_rx = state.control.subscribe();

    if ws_tx.send(Message::text(OPEN_FRAME)).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let text = text.as_str().to_owned();
                        state.received.lock().await.push(text.clone());
                        for reply in respond(&text, &state).await {
                            if ws_tx.send(Message::text(reply)).await.is_err() {
                                return;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
            control = control_rx.recv() => {
                match control {
                    Ok(Control::Send(frame)) => {
                        if ws_tx.send(Message::text(frame)).await.is_err() {
                            break;
                        }
                    }
                    Ok(Control::Close) | Err(_) => {
                        let _ = ws_tx.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
        }
    }
}

/// Splits `42[<id>][name, data]` into its parts.
fn parse_client_event(frame: &str) -> Option<(Option<u64>, String, Value)> {
    let body = frame.strip_prefix("42")?;
    let (digits, array) = body.split_at(body.find('[')?);
    let Ok(Value::Array(args)) = serde_json::from_str::<Value>(array) else {
        return None;
    };
    let mut args = args.into_iter();
    let name = args.next()?.as_str()?.to_string();
    let data = args.next().unwrap_or(Value::Null);
    Some((digits.parse().ok(), name, data))
}

fn ack(id: Option<u64>, result: &Value) -> Option<String> {
    id.map(|id| format!("43{id}{}", json!([result])))
}

fn push(event: &str, data: &Value) -> String {
    format!("42{}", json!([event, data]))
}

fn stored_notification(id: i64, payload: &Value) -> Value {
    json!({
        "id": id,
        "name": payload.get("name").cloned().unwrap_or(Value::Null),
        "active": true,
        "userId": 1,
        "isDefault": payload.get("isDefault").cloned().unwrap_or(json!(false)),
        "config": payload.to_string(),
    })
}

async fn respond(frame: &str, state: &MockState) -> Vec<String> {
    if frame == "40" {
        return vec![r#"40{"sid":"mock-ns"}"#.to_string()];
    }
    let Some((id, event, data)) = parse_client_event(frame) else {
        return Vec::new();
    };
    let script = &state.script;
    let mut replies = Vec::new();

    match event.as_str() {
        "login" => {
            replies.extend(ack(id, &script.login));
            if script.login.get("ok") == Some(&Value::Bool(true)) {
                replies.push(push("monitorList", &script.monitors));
                let list = state.notifications.lock().await.clone();
                replies.push(push("notificationList", &Value::Array(list)));
            }
        }
        "add" => replies.extend(ack(id, &script.add_ack)),
        "getMonitorList" => replies.push(push("monitorList", &script.monitors)),
        "getNotificationList" => {
            let list = state.notifications.lock().await.clone();
            replies.push(push("notificationList", &Value::Array(list)));
        }
        "addNotification" if script.apply_notification_mutations => {
            let mut list = state.notifications.lock().await;
            let next_id = list
                .iter()
                .filter_map(|n| n.get("id").and_then(Value::as_i64))
                .max()
                .unwrap_or(0)
                + 1;
            list.push(stored_notification(next_id, &data));
            replies.push(push("notificationList", &Value::Array(list.clone())));
        }
        "editNotification" if script.apply_notification_mutations => {
            let id = data.get("id").and_then(Value::as_i64).unwrap_or_default();
            let mut list = state.notifications.lock().await;
            for record in list.iter_mut() {
                if record.get("id").and_then(Value::as_i64) == Some(id) {
                    *record = stored_notification(id, &data);
                }
            }
            replies.push(push("notificationList", &Value::Array(list.clone())));
        }
        _ => {}
    }
    replies
}
