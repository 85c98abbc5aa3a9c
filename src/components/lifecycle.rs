// Per-notification lifecycle
// AwaitingPermission -> Denied | Failed | Ready -> Displayed -> Closed

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::task::AbortHandle;

use super::{
    EventKind, EventListener, NotificationError, NotificationEvent, NotificationId,
    NotificationOptions, NotificationPlatform, PermissionGate, PlatformInstance,
};

/// Observable lifecycle state of a [`NotificationHandle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleState {
    /// Waiting for the shared permission decision
    AwaitingPermission,
    /// Permission refused; the handle never materializes
    Denied,
    /// Permission granted but the platform refused to create the instance
    Failed,
    /// Instance exists and has not been shown
    Ready,
    Displayed,
    /// Cancelled, expired, or closed by the platform
    Closed,
}

impl LifecycleState {
    /// No further platform interaction can happen from this state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LifecycleState::Denied | LifecycleState::Failed | LifecycleState::Closed
        )
    }
}

/// Records a `show()` that arrived before the instance existed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ShowLatch {
    #[default]
    Idle,
    ShowRequested,
}

impl ShowLatch {
    fn request(&mut self) {
        *self = ShowLatch::ShowRequested;
    }

    /// Consume the latch, reporting whether a show was requested
    fn take(&mut self) -> bool {
        std::mem::take(self) == ShowLatch::ShowRequested
    }
}

enum Phase {
    AwaitingPermission,
    Denied,
    Failed,
    Ready(Arc<dyn PlatformInstance>),
    Displayed(Arc<dyn PlatformInstance>),
    Closed,
}

impl Phase {
    fn state(&self) -> LifecycleState {
        match self {
            Phase::AwaitingPermission => LifecycleState::AwaitingPermission,
            Phase::Denied => LifecycleState::Denied,
            Phase::Failed => LifecycleState::Failed,
            Phase::Ready(_) => LifecycleState::Ready,
            Phase::Displayed(_) => LifecycleState::Displayed,
            Phase::Closed => LifecycleState::Closed,
        }
    }

    fn instance(&self) -> Option<&Arc<dyn PlatformInstance>> {
        match self {
            Phase::Ready(instance) | Phase::Displayed(instance) => Some(instance),
            _ => None,
        }
    }
}

struct HandleState {
    phase: Phase,
    show_latch: ShowLatch,
    timeout: Option<Duration>,
    expiry: Option<AbortHandle>,
}

struct HandleInner {
    id: NotificationId,
    state: Mutex<HandleState>,
}

/// One requested notification.
///
/// The platform owns the visual lifetime; the handle owns the association to
/// the platform instance and its expiry timer. Clones share the same state.
///
/// ```no_run
/// # use std::sync::Arc;
/// # use kodegen_notify_gate::{MemoryPlatform, NotificationContent, NotificationHandle, NotificationOptions, PermissionGate};
/// # async fn demo() {
/// let gate = PermissionGate::new(Arc::new(MemoryPlatform::new()));
/// let options = NotificationOptions::new(NotificationContent::structured("avatar.png", "Title", "Message"));
/// // Displayed as soon as the user allows notifications
/// NotificationHandle::new(&gate, options).show();
/// # }
/// ```
#[derive(Clone)]
pub struct NotificationHandle {
    inner: Arc<HandleInner>,
}

impl NotificationHandle {
    /// Request a notification without observing the permission decision
    pub fn new(gate: &PermissionGate, options: NotificationOptions) -> Self {
        Self::with_callback(gate, options, |_| {})
    }

    /// Request a notification; `callback` receives the permission decision
    /// exactly once.
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_callback<F>(gate: &PermissionGate, options: NotificationOptions, callback: F) -> Self
    where
        F: FnOnce(bool) + Send + 'static,
    {
        let handle = Self {
            inner: Arc::new(HandleInner {
                id: NotificationId::generate(),
                state: Mutex::new(HandleState {
                    phase: Phase::AwaitingPermission,
                    show_latch: ShowLatch::default(),
                    timeout: options.effective_timeout(),
                    expiry: None,
                }),
            }),
        };
        tracing::debug!(
            notification_id = %handle.id(),
            mode = options.content.mode(),
            "notification requested"
        );

        let platform = Arc::clone(gate.platform());
        let pending = handle.clone();
        gate.resolve(move |granted| {
            pending.on_permission(granted, platform.as_ref(), options, callback);
        });
        handle
    }

    pub fn id(&self) -> NotificationId {
        self.inner.id
    }

    pub fn state(&self) -> LifecycleState {
        self.inner.state.lock().phase.state()
    }

    /// Display the notification, or remember to once permission resolves.
    ///
    /// A finite timeout (re)starts the expiry timer on every call.
    pub fn show(&self) -> &Self {
        let instance = {
            let mut state = self.inner.state.lock();
            match state.phase.state() {
                LifecycleState::AwaitingPermission => {
                    state.show_latch.request();
                    tracing::debug!(notification_id = %self.inner.id, "show deferred until permission resolves");
                    return self;
                },
                LifecycleState::Ready | LifecycleState::Displayed => {},
                _ => return self,
            }
            let Some(instance) = state.phase.instance().cloned() else {
                return self;
            };

            state.phase = Phase::Displayed(Arc::clone(&instance));
            if let Some(timeout) = state.timeout {
                if let Some(previous) = state.expiry.take() {
                    previous.abort();
                }
                let expiring = self.clone();
                let task = tokio::spawn(async move {
                    tokio::time::sleep(timeout).await;
                    tracing::debug!(notification_id = %expiring.inner.id, ?timeout, "notification timed out");
                    expiring.cancel();
                });
                state.expiry = Some(task.abort_handle());
            }
            instance
        };

        tracing::debug!(notification_id = %self.inner.id, "showing notification");
        instance.show();
        self
    }

    /// Close the notification. No effect before the instance exists or after
    /// it has closed.
    pub fn cancel(&self) -> &Self {
        let instance = {
            let mut state = self.inner.state.lock();
            let Some(instance) = state.phase.instance().cloned() else {
                return self;
            };
            state.phase = Phase::Closed;
            if let Some(expiry) = state.expiry.take() {
                expiry.abort();
            }
            instance
        };

        tracing::debug!(notification_id = %self.inner.id, "cancelling notification");
        instance.cancel();
        self
    }

    fn on_permission<F>(
        &self,
        granted: bool,
        platform: &dyn NotificationPlatform,
        options: NotificationOptions,
        callback: F,
    ) where
        F: FnOnce(bool),
    {
        if !granted {
            self.inner.state.lock().phase = Phase::Denied;
            tracing::debug!(
                notification_id = %self.inner.id,
                reason = %NotificationError::PermissionDenied,
                "notification will not be created"
            );
            callback(false);
            return;
        }

        match platform.create_instance(&options.content) {
            Ok(instance) => self.attach(instance, options),
            Err(error) => {
                tracing::warn!(
                    notification_id = %self.inner.id,
                    platform = platform.name(),
                    %error,
                    "platform refused to create notification"
                );
                self.inner.state.lock().phase = Phase::Failed;
                if let Some(on_error) = &options.callbacks.on_error {
                    on_error(&NotificationEvent::Error(error.to_string()));
                }
            },
        }
        callback(true);
    }

    fn attach(&self, instance: Arc<dyn PlatformInstance>, options: NotificationOptions) {
        let NotificationOptions {
            replace_id,
            callbacks,
            autoclose,
            ..
        } = options;

        if let Some(on_click) = callbacks.on_click {
            instance.add_event_listener(EventKind::Click, on_click);
        }
        if autoclose {
            let weak = Arc::downgrade(&self.inner);
            let dismiss: EventListener = Arc::new(move |_: &NotificationEvent| {
                if let Some(handle) = Self::upgrade(&weak) {
                    handle.cancel();
                }
            });
            instance.add_event_listener(EventKind::Click, dismiss);
        }
        if let Some(on_close) = callbacks.on_close {
            instance.add_event_listener(EventKind::Close, on_close);
        }
        if let Some(on_display) = callbacks.on_display {
            instance.add_event_listener(EventKind::Display, on_display);
        }
        if let Some(on_error) = callbacks.on_error {
            instance.add_event_listener(EventKind::Error, on_error);
        }

        let weak = Arc::downgrade(&self.inner);
        let closed: EventListener = Arc::new(move |_: &NotificationEvent| {
            if let Some(handle) = Self::upgrade(&weak) {
                handle.mark_closed();
            }
        });
        instance.add_event_listener(EventKind::Close, closed);
        instance.set_replace_id(replace_id.as_deref().unwrap_or(""));

        let show_requested = {
            let mut state = self.inner.state.lock();
            state.phase = Phase::Ready(instance);
            state.show_latch.take()
        };
        tracing::debug!(notification_id = %self.inner.id, show_requested, "notification ready");

        if show_requested {
            self.show();
        }
    }

    /// Platform reported the instance closed
    fn mark_closed(&self) {
        let mut state = self.inner.state.lock();
        if state.phase.instance().is_some() {
            state.phase = Phase::Closed;
            tracing::debug!(notification_id = %self.inner.id, "notification closed by platform");
        }
        if let Some(expiry) = state.expiry.take() {
            expiry.abort();
        }
    }

    fn upgrade(weak: &Weak<HandleInner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }
}

impl std::fmt::Debug for NotificationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("NotificationHandle")
            .field("id", &self.inner.id)
            .field("state", &state.phase.state())
            .field("show_latch", &state.show_latch)
            .field("timeout", &state.timeout)
            .finish()
    }
}
