//! kuma-socket diagnostic entry point.
//!
//! Connects with the environment configuration, prints every monitor and
//! notification the server reports, then closes.

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use kuma_socket::{ClientConfig, KumaClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if std::env::var("KUMA_LOG_FORMAT").is_ok_and(|format| format == "json") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = ClientConfig::from_env().context("loading configuration")?;
    tracing::info!(url = %config.base_url, "connecting");

    let client = KumaClient::connect(config)
        .await
        .context("connecting to Uptime Kuma")?;

    let monitors = client.get_monitors().await.context("listing monitors")?;
    println!("monitors ({}):", monitors.len());
    for monitor in &monitors {
        println!(
            "  #{:<4} {:<30} {:<8} active={} {}",
            monitor.id,
            monitor.name,
            monitor.monitor_type,
            monitor.active,
            if monitor.url.is_empty() {
                &monitor.hostname
            } else {
                &monitor.url
            }
        );
    }

    let notifications = client
        .get_notifications()
        .await
        .context("listing notifications")?;
    println!("notifications ({}):", notifications.len());
    for notification in &notifications {
        println!(
            "  #{:<4} {:<30} {:<12} default={} config={}",
            notification.id,
            notification.name,
            notification.notification_type,
            notification.is_default,
            serde_json::Value::Object(notification.config.clone())
        );
    }

    client.close().await;
    Ok(())
}
