// Concrete notification platforms and capability detection

#[cfg(target_os = "linux")]
pub mod linux;
pub mod memory;

use std::sync::Arc;

use crate::components::{
    InteractionCallback, NotificationContent, NotificationError, NotificationPlatform,
    NotificationResult, PermissionState, PlatformInstance,
};

pub use memory::{MemoryInstance, MemoryPlatform};

/// Host without a notification capability.
///
/// Every permission query answers denied and nothing is ever prompted.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedPlatform;

impl NotificationPlatform for UnsupportedPlatform {
    fn name(&self) -> &'static str {
        "unsupported"
    }

    fn is_supported(&self) -> bool {
        false
    }

    fn query_permission(&self) -> PermissionState {
        PermissionState::Denied
    }

    fn request_permission(&self) {}

    fn on_next_interaction(&self, _callback: InteractionCallback) {}

    fn create_instance(
        &self,
        _content: &NotificationContent,
    ) -> NotificationResult<Arc<dyn PlatformInstance>> {
        Err(NotificationError::CapabilityAbsent)
    }
}

/// Factory for the platform of the current host
pub struct PlatformBackendFactory;

impl PlatformBackendFactory {
    /// Detect the host's notification capability.
    ///
    /// Falls back to [`UnsupportedPlatform`] when the host has none or it
    /// cannot be reached, so callers always get a usable platform.
    pub async fn native(app_name: &str) -> Arc<dyn NotificationPlatform> {
        #[cfg(target_os = "linux")]
        {
            match linux::LinuxPlatform::connect(app_name).await {
                Ok(platform) => return Arc::new(platform),
                Err(e) => tracing::warn!(error = %e, "D-Bus notifications unavailable"),
            }
        }

        #[cfg(not(target_os = "linux"))]
        tracing::debug!(app_name, "no notification backend for this OS");

        Arc::new(UnsupportedPlatform)
    }
}
