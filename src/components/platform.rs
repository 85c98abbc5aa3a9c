// Notification Platform capability boundary
// The core never renders anything itself; it drives a host capability through
// these two traits and observes it through lifecycle events.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::{NotificationContent, NotificationResult, PermissionState};

/// Callback invoked once on the next qualifying user interaction
pub type InteractionCallback = Box<dyn FnOnce() + Send + 'static>;

/// Subscriber for a lifecycle event emitted by a platform instance
pub type EventListener = Arc<dyn Fn(&NotificationEvent) + Send + Sync + 'static>;

/// Host capability able to negotiate permission and materialize notifications.
///
/// Every method is synchronous. Backends that talk to an asynchronous service
/// spawn the work onto the ambient tokio runtime and report results through
/// instance events.
pub trait NotificationPlatform: Send + Sync {
    /// Short platform label used in logs and errors
    fn name(&self) -> &'static str;

    /// Whether the host exposes a notification capability at all
    fn is_supported(&self) -> bool;

    /// Synchronous read of the host's permission decision
    fn query_permission(&self) -> PermissionState;

    /// Ask the host to show its permission prompt. There is no completion
    /// callback; the answer is observed through `query_permission`.
    fn request_permission(&self);

    /// Register `callback` to run once on the next user interaction the host
    /// observes (click, key press). Hosts without gesture gating may run it
    /// immediately.
    fn on_next_interaction(&self, callback: InteractionCallback);

    /// Materialize a notification instance for `content`
    fn create_instance(
        &self,
        content: &NotificationContent,
    ) -> NotificationResult<Arc<dyn PlatformInstance>>;
}

/// One notification owned by the platform
pub trait PlatformInstance: Send + Sync {
    fn show(&self);

    fn cancel(&self);

    /// Subscribe to `kind`; several listeners per kind are kept and run in
    /// registration order.
    fn add_event_listener(&self, kind: EventKind, listener: EventListener);

    /// Coalescing id: a later notification with the same id may replace this one
    fn set_replace_id(&self, replace_id: &str);
}

/// Lifecycle event kinds an instance can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Click,
    Close,
    Display,
    Error,
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Click => "click",
            EventKind::Close => "close",
            EventKind::Display => "display",
            EventKind::Error => "error",
        }
    }
}

/// Lifecycle event delivered to listeners
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    Click,
    Close,
    Display,
    Error(String),
}

impl NotificationEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            NotificationEvent::Click => EventKind::Click,
            NotificationEvent::Close => EventKind::Close,
            NotificationEvent::Display => EventKind::Display,
            NotificationEvent::Error(_) => EventKind::Error,
        }
    }
}

/// Listener registry shared by backend instances
#[derive(Default)]
pub struct EventListeners {
    listeners: Mutex<Vec<(EventKind, EventListener)>>,
}

impl EventListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, kind: EventKind, listener: EventListener) {
        self.listeners.lock().push((kind, listener));
    }

    /// Run every listener registered for the event's kind.
    ///
    /// Listeners are collected before any of them runs, so a listener may add
    /// further listeners or re-enter the instance.
    pub fn emit(&self, event: &NotificationEvent) {
        let kind = event.kind();
        let matching: Vec<EventListener> = self
            .listeners
            .lock()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in matching {
            listener(event);
        }
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.listeners
            .lock()
            .iter()
            .filter(|(k, _)| *k == kind)
            .count()
    }
}

impl std::fmt::Debug for EventListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventListeners")
            .field("registered", &self.listeners.lock().len())
            .finish()
    }
}
