//! Shared fixtures for component tests

use std::sync::Arc;
use std::time::Duration;

use kodegen_notify_gate::{MemoryPlatform, NotificationContent, NotificationOptions, PermissionGate};
use parking_lot::Mutex;

/// Poll period the gate uses by default
pub const POLL: Duration = Duration::from_millis(200);

/// Collects values pushed from callbacks
#[derive(Clone)]
pub struct Recorder<T>(Arc<Mutex<Vec<T>>>);

impl<T: Clone> Recorder<T> {
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(Vec::new())))
    }

    pub fn push(&self, value: T) {
        self.0.lock().push(value);
    }

    pub fn values(&self) -> Vec<T> {
        self.0.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().len()
    }
}

pub fn gate(platform: &Arc<MemoryPlatform>) -> PermissionGate {
    PermissionGate::new(platform.clone())
}

pub fn structured() -> NotificationOptions {
    NotificationOptions::new(NotificationContent::structured(
        "avatar.png",
        "Build finished",
        "cargo build --release succeeded",
    ))
}

/// Let spawned tasks run without reaching the next poll tick
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

/// Sleep past the next poll tick
pub async fn next_poll() {
    tokio::time::sleep(POLL + Duration::from_millis(50)).await;
}
