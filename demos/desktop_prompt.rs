//! Example: request a notification before permission is known
//!
//! Connects to the desktop notification server when one is reachable and
//! falls back to the in-memory platform otherwise, answering its prompt
//! automatically.
//!
//! Run with: cargo run --example desktop_prompt

use std::sync::Arc;
use std::time::Duration;

use kodegen_notify_gate::{
    GateConfig, MemoryPlatform, NotificationContent, NotificationOptions, PermissionGate,
    PermissionState, PromptTrigger, create_notification,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let config = GateConfig::default()
        .with_prompt(PromptTrigger::Immediate)
        .with_max_wait(Duration::from_secs(30))
        .with_app_name("kodegen-demo");

    let native = PermissionGate::native(config.clone()).await;
    let gate = if native.platform().is_supported() {
        native
    } else {
        tracing::info!("no desktop notification server, using in-memory platform");
        let memory = MemoryPlatform::new();
        memory.answer_prompt_with(PermissionState::Granted);
        PermissionGate::with_config(Arc::new(memory), config)
    };

    let options = NotificationOptions::new(NotificationContent::structured(
        "dialog-information",
        "Build finished",
        "cargo build --release completed in 45.2s",
    ))
    .with_replace_id("build-status")
    .with_timeout(Duration::from_secs(10))
    .on_click(|_| tracing::info!("notification clicked"))
    .on_close(|_| tracing::info!("notification closed"))
    .on_error(|event| tracing::warn!(?event, "notification failed"));

    let handle = create_notification(&gate, options, |allowed| {
        tracing::info!(allowed, "permission resolved");
    });
    handle.show();

    let allowed = gate.permission().await;
    tracing::info!(allowed, state = ?handle.state(), "waiting for the notification to expire");

    tokio::time::sleep(Duration::from_secs(11)).await;
    tracing::info!(state = ?handle.state(), "done");
    Ok(())
}
