// Caller-supplied notification configuration

use std::sync::Arc;
use std::time::Duration;

use super::{ContentFields, EventListener, NotificationContent, NotificationEvent, NotificationResult};

/// Optional caller listeners, attached to the instance once it exists
#[derive(Clone, Default)]
pub struct EventCallbacks {
    pub on_click: Option<EventListener>,
    pub on_close: Option<EventListener>,
    pub on_display: Option<EventListener>,
    pub on_error: Option<EventListener>,
}

impl std::fmt::Debug for EventCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventCallbacks")
            .field("on_click", &self.on_click.is_some())
            .field("on_close", &self.on_close.is_some())
            .field("on_display", &self.on_display.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// Everything needed to create one notification
#[derive(Debug, Clone)]
pub struct NotificationOptions {
    pub content: NotificationContent,
    /// Coalescing id, analogous to a named window slot
    pub replace_id: Option<String>,
    pub callbacks: EventCallbacks,
    /// Dismiss on click. On by default because the platform close button is
    /// small and hard to hit.
    pub autoclose: bool,
    /// Forced dismissal after display; `None` keeps it until the user acts
    pub timeout: Option<Duration>,
}

impl NotificationOptions {
    pub fn new(content: NotificationContent) -> Self {
        Self {
            content,
            replace_id: None,
            callbacks: EventCallbacks::default(),
            autoclose: true,
            timeout: None,
        }
    }

    /// Build options from the raw url/icon/title/content bag
    pub fn from_fields(fields: ContentFields) -> NotificationResult<Self> {
        Ok(Self::new(fields.try_into()?))
    }

    pub fn with_replace_id(mut self, replace_id: impl Into<String>) -> Self {
        self.replace_id = Some(replace_id.into());
        self
    }

    pub fn with_autoclose(mut self, autoclose: bool) -> Self {
        self.autoclose = autoclose;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn on_click<F>(mut self, f: F) -> Self
    where
        F: Fn(&NotificationEvent) + Send + Sync + 'static,
    {
        self.callbacks.on_click = Some(Arc::new(f));
        self
    }

    pub fn on_close<F>(mut self, f: F) -> Self
    where
        F: Fn(&NotificationEvent) + Send + Sync + 'static,
    {
        self.callbacks.on_close = Some(Arc::new(f));
        self
    }

    pub fn on_display<F>(mut self, f: F) -> Self
    where
        F: Fn(&NotificationEvent) + Send + Sync + 'static,
    {
        self.callbacks.on_display = Some(Arc::new(f));
        self
    }

    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&NotificationEvent) + Send + Sync + 'static,
    {
        self.callbacks.on_error = Some(Arc::new(f));
        self
    }

    /// Timeout actually enforced; zero means unlimited
    pub fn effective_timeout(&self) -> Option<Duration> {
        self.timeout.filter(|timeout| !timeout.is_zero())
    }
}
