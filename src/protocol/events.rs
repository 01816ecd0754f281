//! Event names fixed by the server.

/// Correlated login call: `{username, password, token}`.
pub const LOGIN: &str = "login";

/// Correlated monitor create call.
pub const ADD_MONITOR: &str = "add";

/// Fire-and-forget monitor update.
pub const EDIT_MONITOR: &str = "editMonitor";

/// Fire-and-forget monitor delete, payload is the bare id.
pub const DELETE_MONITOR: &str = "deleteMonitor";

/// Asks the server to push a fresh `monitorList`.
pub const GET_MONITOR_LIST: &str = "getMonitorList";

/// Asks the server to push a fresh `notificationList`.
pub const GET_NOTIFICATION_LIST: &str = "getNotificationList";

/// Fire-and-forget notification create.
pub const ADD_NOTIFICATION: &str = "addNotification";

/// Fire-and-forget notification update.
pub const EDIT_NOTIFICATION: &str = "editNotification";

/// Fire-and-forget notification delete, payload is the bare id.
pub const DELETE_NOTIFICATION: &str = "deleteNotification";

/// Fire-and-forget test message through a notification provider.
pub const TEST_NOTIFICATION: &str = "testNotification";

/// Push carrying the full monitor snapshot keyed by id.
pub const MONITOR_LIST: &str = "monitorList";

/// Push carrying the full notification list.
pub const NOTIFICATION_LIST: &str = "notificationList";
