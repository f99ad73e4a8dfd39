//! System notifications via freedesktop D-Bus.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use zbus::{Connection, proxy};

const APP_NAME: &str = "Shotwire";
const DEFAULT_ICON: &str = "camera-photo";
const EXPIRE_TIMEOUT_MS: i32 = 3000;
const FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// D-Bus interface for freedesktop Notifications.
#[proxy(
    interface = "org.freedesktop.Notifications",
    default_service = "org.freedesktop.Notifications",
    default_path = "/org/freedesktop/Notifications"
)]
trait Notifications {
    /// Returns the notification id.
    #[allow(clippy::too_many_arguments)]
    fn notify(
        &self,
        app_name: &str,
        replaces_id: u32,
        app_icon: &str,
        summary: &str,
        body: &str,
        actions: Vec<&str>,
        hints: HashMap<&str, zbus::zvariant::Value<'_>>,
        expire_timeout: i32,
    ) -> zbus::Result<u32>;
}

/// Sink for user-visible desktop notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, summary: &str, body: &str);

    /// Wait (bounded) for queued notifications before the process exits.
    fn flush(&self) {}
}

/// Send a system notification.
pub async fn send_notification(summary: &str, body: &str) -> zbus::Result<u32> {
    let connection = Connection::session().await?;
    let proxy = NotificationsProxy::new(&connection).await?;
    proxy
        .notify(
            APP_NAME,
            0,
            DEFAULT_ICON,
            summary,
            body,
            vec![],
            HashMap::new(),
            EXPIRE_TIMEOUT_MS,
        )
        .await
}

/// Delivers notifications on the session bus without blocking the caller.
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    runtime: tokio::runtime::Handle,
    pending: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl DesktopNotifier {
    pub fn new(runtime: tokio::runtime::Handle) -> Self {
        Self {
            runtime,
            pending: Arc::default(),
        }
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, summary: &str, body: &str) {
        let summary = summary.to_string();
        let body = body.to_string();
        let task = self.runtime.spawn(async move {
            if let Err(e) = send_notification(&summary, &body).await {
                log::warn!("Failed to send notification: {}", e);
            }
        });
        if let Ok(mut pending) = self.pending.lock() {
            pending.retain(|task| !task.is_finished());
            pending.push(task);
        }
    }

    /// Must not be called from inside the runtime.
    fn flush(&self) {
        let tasks: Vec<_> = match self.pending.lock() {
            Ok(mut pending) => pending.drain(..).collect(),
            Err(_) => return,
        };
        if tasks.is_empty() {
            return;
        }
        let joined = self.runtime.block_on(async {
            tokio::time::timeout(FLUSH_TIMEOUT, futures::future::join_all(tasks)).await
        });
        if joined.is_err() {
            log::warn!("Timed out delivering desktop notifications");
        }
    }
}
