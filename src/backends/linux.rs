// Linux freedesktop notifications over D-Bus
// Structured content only; the notification server has no HTML document mode.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use futures::StreamExt;
use kodegen_native_permissions::{PermissionManager, PermissionStatus, PermissionType};
use parking_lot::Mutex;
use zbus::zvariant::Value;
use zbus::{Connection, proxy};

use crate::components::{
    EventKind, EventListener, EventListeners, InteractionCallback, NotificationContent,
    NotificationError, NotificationEvent, NotificationPlatform, NotificationResult,
    PermissionState, PlatformInstance,
};

const PLATFORM: &str = "Linux";

/// Action key the server reports when the notification body is clicked
const DEFAULT_ACTION: &str = "default";

#[proxy(
    interface = "org.freedesktop.Notifications",
    default_service = "org.freedesktop.Notifications",
    default_path = "/org/freedesktop/Notifications",
    gen_blocking = false
)]
trait Notifications {
    /// Send a notification to the desktop notification daemon
    #[allow(clippy::too_many_arguments)]
    fn notify(
        &self,
        app_name: &str,
        replaces_id: u32,
        app_icon: &str,
        summary: &str,
        body: &str,
        actions: &[&str],
        hints: HashMap<&str, Value<'_>>,
        expire_timeout: i32,
    ) -> zbus::Result<u32>;

    /// Close a notification
    fn close_notification(&self, id: u32) -> zbus::Result<()>;

    #[zbus(signal)]
    fn action_invoked(&self, id: u32, action_key: String) -> zbus::Result<()>;

    #[zbus(signal)]
    fn notification_closed(&self, id: u32, reason: u32) -> zbus::Result<()>;
}

/// Server id -> listeners of the live instance it was issued to
type Routes = Arc<DashMap<u32, Weak<EventListeners>>>;

/// Signal from the notification server, decoded from its D-Bus arguments
#[derive(Debug, Clone, PartialEq, Eq)]
enum ServerSignal {
    ActionInvoked { id: u32, action_key: String },
    Closed { id: u32, reason: u32 },
}

/// Deliver `signal` to the instance it names, returning the event emitted.
///
/// Only the default action counts as a click. A close ends the route.
fn dispatch(routes: &DashMap<u32, Weak<EventListeners>>, signal: ServerSignal) -> Option<NotificationEvent> {
    let (listeners, event) = match signal {
        ServerSignal::ActionInvoked { id, action_key } => {
            if action_key != DEFAULT_ACTION {
                return None;
            }
            let listeners = routes.get(&id).and_then(|entry| entry.value().upgrade())?;
            (listeners, NotificationEvent::Click)
        },
        ServerSignal::Closed { id, reason } => {
            let listeners = routes.remove(&id).and_then(|(_, weak)| weak.upgrade())?;
            tracing::debug!(id, reason, "notification closed by server");
            (listeners, NotificationEvent::Close)
        },
    };
    listeners.emit(&event);
    Some(event)
}

/// Server id a delivery should replace: the instance's own previous id, else
/// the last id issued under its coalescing key, else none (0).
fn replaces_id(previous: Option<u32>, replace_key: &str, slots: &DashMap<String, u32>) -> u32 {
    match previous {
        Some(id) => id,
        None if !replace_key.is_empty() => slots.get(replace_key).map(|entry| *entry.value()).unwrap_or(0),
        None => 0,
    }
}

/// Remember where signals for `id` go and which id now holds `replace_key`
fn record_delivery(
    routes: &DashMap<u32, Weak<EventListeners>>,
    slots: &DashMap<String, u32>,
    id: u32,
    replace_key: &str,
    listeners: &Arc<EventListeners>,
) {
    routes.insert(id, Arc::downgrade(listeners));
    if !replace_key.is_empty() {
        slots.insert(replace_key.to_string(), id);
    }
}

/// Notification platform backed by `org.freedesktop.Notifications`
pub struct LinuxPlatform {
    proxy: NotificationsProxy<'static>,
    app_name: String,
    routes: Routes,
    /// Coalescing id -> last server id issued under it
    slots: Arc<DashMap<String, u32>>,
}

impl LinuxPlatform {
    /// Connect to the session bus and start routing server signals
    pub async fn connect(app_name: impl Into<String>) -> NotificationResult<Self> {
        let connection = Connection::session().await.map_err(|e| {
            NotificationError::platform(PLATFORM, format!("failed to connect to D-Bus session: {e}"))
        })?;
        let proxy = NotificationsProxy::new(&connection).await.map_err(|e| {
            NotificationError::platform(PLATFORM, format!("failed to create D-Bus proxy: {e}"))
        })?;

        let routes: Routes = Arc::new(DashMap::new());
        spawn_signal_router(&proxy, Arc::clone(&routes)).await?;

        Ok(Self {
            proxy,
            app_name: app_name.into(),
            routes,
            slots: Arc::new(DashMap::new()),
        })
    }
}

async fn spawn_signal_router(
    proxy: &NotificationsProxy<'static>,
    routes: Routes,
) -> NotificationResult<()> {
    let mut invoked = proxy.receive_action_invoked().await.map_err(|e| {
        NotificationError::platform(PLATFORM, format!("failed to subscribe to ActionInvoked: {e}"))
    })?;
    let mut closed = proxy.receive_notification_closed().await.map_err(|e| {
        NotificationError::platform(
            PLATFORM,
            format!("failed to subscribe to NotificationClosed: {e}"),
        )
    })?;

    tokio::spawn(async move {
        loop {
            tokio::select! {
                Some(signal) = invoked.next() => {
                    let Ok(args) = signal.args() else { continue };
                    dispatch(&routes, ServerSignal::ActionInvoked {
                        id: *args.id(),
                        action_key: args.action_key().clone(),
                    });
                },
                Some(signal) = closed.next() => {
                    let Ok(args) = signal.args() else { continue };
                    dispatch(&routes, ServerSignal::Closed {
                        id: *args.id(),
                        reason: *args.reason(),
                    });
                },
                else => break,
            }
        }
        tracing::debug!("D-Bus notification signal streams ended");
    });
    Ok(())
}

impl NotificationPlatform for LinuxPlatform {
    fn name(&self) -> &'static str {
        PLATFORM
    }

    fn is_supported(&self) -> bool {
        true
    }

    fn query_permission(&self) -> PermissionState {
        match PermissionManager::new().check_permission(PermissionType::Notification) {
            Ok(PermissionStatus::Authorized) => PermissionState::Granted,
            Ok(PermissionStatus::NotDetermined) => PermissionState::Unknown,
            Ok(status) => {
                tracing::info!(status = ?status, "Notification permission not available");
                PermissionState::Denied
            },
            Err(e) => {
                tracing::warn!(error = %e, "Notification permission check failed");
                PermissionState::Denied
            },
        }
    }

    fn request_permission(&self) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("no tokio runtime, notification permission not requested");
            return;
        };
        let blocking = runtime.clone();
        // The permission request future is driven on a blocking thread so it
        // need not be Send.
        blocking.spawn_blocking(move || {
            let manager = PermissionManager::new();
            match runtime.block_on(manager.request_permission(PermissionType::Notification)) {
                Ok(status) => tracing::info!(status = ?status, "Notification permission request finished"),
                Err(e) => tracing::warn!(error = %e, "Notification permission request failed"),
            }
        });
    }

    fn on_next_interaction(&self, callback: InteractionCallback) {
        // Desktop sessions do not gate the request behind a gesture
        callback();
    }

    fn create_instance(
        &self,
        content: &NotificationContent,
    ) -> NotificationResult<Arc<dyn PlatformInstance>> {
        let NotificationContent::Structured { icon, title, body } = content else {
            return Err(NotificationError::creation(
                PLATFORM,
                "document notifications are not supported by org.freedesktop.Notifications",
            ));
        };

        let instance = Arc::new_cyclic(|this| LinuxInstance {
            this: this.clone(),
            proxy: self.proxy.clone(),
            app_name: self.app_name.clone(),
            icon: icon.clone(),
            summary: title.clone(),
            body: body.clone(),
            replace_id: Mutex::new(String::new()),
            native_id: Mutex::new(None),
            cancelled: AtomicBool::new(false),
            delivery: tokio::sync::Mutex::new(()),
            listeners: Arc::new(EventListeners::new()),
            routes: Arc::clone(&self.routes),
            slots: Arc::clone(&self.slots),
        });
        Ok(instance)
    }
}

/// One notification sent through the D-Bus server
pub struct LinuxInstance {
    this: Weak<LinuxInstance>,
    proxy: NotificationsProxy<'static>,
    app_name: String,
    icon: String,
    summary: String,
    body: String,
    replace_id: Mutex<String>,
    native_id: Mutex<Option<u32>>,
    cancelled: AtomicBool,
    /// Held across `Notify` so a re-show replaces the id the previous show got
    delivery: tokio::sync::Mutex<()>,
    listeners: Arc<EventListeners>,
    routes: Routes,
    slots: Arc<DashMap<String, u32>>,
}

impl LinuxInstance {
    async fn deliver(&self) {
        let _delivery = self.delivery.lock().await;
        let replace_key = self.replace_id.lock().clone();
        let previous = *self.native_id.lock();
        let replaces_id = replaces_id(previous, &replace_key, &self.slots);

        let mut hints = HashMap::new();
        hints.insert("desktop-entry", Value::from(self.app_name.as_str()));

        let result = self
            .proxy
            .notify(
                &self.app_name,
                replaces_id,
                &self.icon,
                &self.summary,
                &self.body,
                &[DEFAULT_ACTION, "Open"],
                hints,
                -1,
            )
            .await;

        match result {
            Ok(id) => {
                *self.native_id.lock() = Some(id);
                record_delivery(&self.routes, &self.slots, id, &replace_key, &self.listeners);
                self.listeners.emit(&NotificationEvent::Display);

                if self.cancelled.load(Ordering::SeqCst) {
                    self.close().await;
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "Failed to send D-Bus notification");
                self.listeners
                    .emit(&NotificationEvent::Error(format!("Failed to send D-Bus notification: {e}")));
            },
        }
    }

    async fn close(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        let native_id = *self.native_id.lock();
        let Some(id) = native_id else {
            return;
        };
        if let Err(e) = self.proxy.close_notification(id).await {
            tracing::debug!(id, error = %e, "Failed to close D-Bus notification");
        }
    }
}

impl PlatformInstance for LinuxInstance {
    fn show(&self) {
        if let Some(instance) = self.this.upgrade() {
            tokio::spawn(async move { instance.deliver().await });
        }
    }

    fn cancel(&self) {
        if let Some(instance) = self.this.upgrade() {
            tokio::spawn(async move { instance.close().await });
        }
    }

    fn add_event_listener(&self, kind: EventKind, listener: EventListener) {
        self.listeners.add(kind, listener);
    }

    fn set_replace_id(&self, replace_id: &str) {
        *self.replace_id.lock() = replace_id.to_string();
    }
}
