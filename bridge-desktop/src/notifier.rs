//! Notifications rendered as log events
//!
//! Desktop builds without a toast surface still want the user-facing
//! messages somewhere; this notifier routes them through `tracing` under the
//! `notification` target.

use bridge_traits::host::{Notification, NotificationSeverity, Notifier};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl TracingNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        let Notification {
            title,
            message,
            severity,
            duration_ms,
        } = notification;

        match severity {
            NotificationSeverity::Info | NotificationSeverity::Success => {
                info!(target: "notification", %severity, duration_ms, "{}: {}", title, message)
            }
            NotificationSeverity::Warning => {
                warn!(target: "notification", %severity, duration_ms, "{}: {}", title, message)
            }
            NotificationSeverity::Error => {
                error!(target: "notification", %severity, duration_ms, "{}: {}", title, message)
            }
        }
    }
}
