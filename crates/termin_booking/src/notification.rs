// --- File: crates/termin_booking/src/notification.rs ---

use async_trait::async_trait;
use std::sync::Arc;
use termin_common::http::client::post;
use termin_common::{NotificationError, NotificationEvent, NotificationSink};
use termin_common::logging::log_error;
use tracing::{info, warn};

/// Writes events to the log only.
#[derive(Debug, Default, Clone)]
pub struct LogNotificationSink;

#[async_trait]
impl NotificationSink for LogNotificationSink {
    async fn emit(&self, event: &NotificationEvent) -> Result<(), NotificationError> {
        info!(
            kind = ?event.kind,
            appointment_id = event.appointment_id,
            date = %event.date,
            "Notification event"
        );
        Ok(())
    }
}

/// POSTs each event as JSON to a fixed URL.
#[derive(Debug, Clone)]
pub struct WebhookNotificationSink {
    url: String,
    admin_emails: Vec<String>,
}

impl WebhookNotificationSink {
    pub fn new(url: impl Into<String>, admin_emails: Vec<String>) -> Self {
        Self {
            url: url.into(),
            admin_emails,
        }
    }
}

#[derive(serde::Serialize)]
struct WebhookPayload<'a> {
    #[serde(flatten)]
    event: &'a NotificationEvent,
    admin_emails: &'a [String],
}

#[async_trait]
impl NotificationSink for WebhookNotificationSink {
    async fn emit(&self, event: &NotificationEvent) -> Result<(), NotificationError> {
        let payload = WebhookPayload {
            event,
            admin_emails: &self.admin_emails,
        };
        let response = post(&self.url, &payload)
            .await
            .map_err(|e| NotificationError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NotificationError(format!(
                "webhook answered {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Hands events to a sink on a background task.
#[derive(Clone)]
pub struct NotificationDispatcher {
    sink: Arc<dyn NotificationSink>,
}

impl NotificationDispatcher {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    pub fn log_only() -> Self {
        Self::new(Arc::new(LogNotificationSink))
    }

    /// Returns immediately. Delivery failures are logged and otherwise ignored.
    pub fn dispatch(&self, event: NotificationEvent) -> tokio::task::JoinHandle<()> {
        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            if let Err(e) = sink.emit(&event).await {
                log_error(
                    e,
                    &format!(
                        "Failed to deliver {:?} for appointment {}",
                        event.kind, event.appointment_id
                    ),
                );
            }
        })
    }
}

impl std::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("NotificationDispatcher")
    }
}

/// Picks the sink from configuration: the webhook when enabled, the log otherwise.
pub fn dispatcher_from_config(config: &termin_config::AppConfig) -> NotificationDispatcher {
    let notifications = config.notifications.as_ref();
    match notifications.and_then(|n| n.webhook_url.as_deref()) {
        Some(url) if termin_common::is_notifications_enabled(config) => {
            info!("Notifications go to webhook {}", url);
            let admins = notifications.map(|n| n.admin_emails.clone()).unwrap_or_default();
            NotificationDispatcher::new(Arc::new(WebhookNotificationSink::new(url, admins)))
        }
        Some(_) => {
            warn!("Notification webhook configured but use_notifications is off, logging events only");
            NotificationDispatcher::log_only()
        }
        None => NotificationDispatcher::log_only(),
    }
}
