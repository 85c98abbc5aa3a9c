// Platform-independent notification core: permission negotiation, content,
// per-notification lifecycle and the capability boundary backends implement.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod config;
pub mod content;
pub mod lifecycle;
pub mod options;
pub mod permission;
pub mod platform;
pub mod serde_time;

pub use config::{GateConfig, PromptTrigger};
pub use content::{ContentFields, NotificationContent};
pub use lifecycle::{LifecycleState, NotificationHandle};
pub use options::{EventCallbacks, NotificationOptions};
pub use permission::{PermissionGate, PermissionState};
pub use platform::{
    EventKind, EventListener, EventListeners, InteractionCallback, NotificationEvent,
    NotificationPlatform, PlatformInstance,
};

/// Unique identifier carried by every notification handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationId(Uuid);

impl NotificationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for NotificationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for NotificationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Error taxonomy for the notification core
///
/// Permission outcomes (`CapabilityAbsent`, `PermissionDenied`) reach callers as
/// `callback(false)`; they exist as errors so backends and logs can name them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotificationError {
    /// The host exposes no notification capability at all
    #[error("notification capability is not available on this host")]
    CapabilityAbsent,
    /// The user declined, now or in an earlier session
    #[error("notification permission was denied")]
    PermissionDenied,
    /// Caller supplied inconsistent notification options
    #[error("invalid notification configuration in {field}: {message}")]
    Configuration { field: String, message: String },
    /// Permission was granted but the platform refused to materialize an instance
    #[error("{platform} refused to create notification: {message}")]
    PlatformCreation { platform: String, message: String },
    /// Transport or API failure inside a backend
    #[error("platform error on {platform}: {message}")]
    Platform { platform: String, message: String },
}

impl NotificationError {
    pub fn configuration(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn creation(platform: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PlatformCreation {
            platform: platform.into(),
            message: message.into(),
        }
    }

    pub fn platform(platform: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Platform {
            platform: platform.into(),
            message: message.into(),
        }
    }
}

/// Type alias for notification results
pub type NotificationResult<T> = Result<T, NotificationError>;
