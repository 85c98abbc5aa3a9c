//! Permission-gated desktop notifications
//!
//! Hosts that guard notifications behind a user permission answer that
//! question asynchronously, often only after a user gesture. This crate keeps
//! one shared decision per [`PermissionGate`]: any number of notifications may
//! be requested before the answer exists, and each of them is told the answer
//! exactly once, in request order.
//!
//! Rendering belongs to the host. The core drives it through the
//! [`NotificationPlatform`] capability; [`backends`] provides a D-Bus backend
//! on Linux and an in-memory one for headless use.
//!
//! ```no_run
//! use kodegen_notify_gate::{
//!     GateConfig, NotificationContent, NotificationOptions, PermissionGate, create_notification,
//! };
//!
//! # async fn demo() {
//! let gate = PermissionGate::native(GateConfig::default()).await;
//! let options = NotificationOptions::new(NotificationContent::structured(
//!     "avatar.png",
//!     "Title",
//!     "Message",
//! ))
//! .on_click(|_| println!("clicked"));
//!
//! create_notification(&gate, options, |allowed| {
//!     if !allowed {
//!         println!("notifications are not allowed");
//!     }
//! })
//! .show();
//! # }
//! ```

pub mod backends;
pub mod components;

// Re-export all components for convenience
pub use backends::*;
pub use components::*;
pub use url::Url;

/// Request a notification through `gate`.
///
/// `callback` fires exactly once with the permission decision. The returned
/// handle can be shown or cancelled right away; a `show` issued before the
/// decision is replayed once the instance exists.
pub fn create_notification<F>(
    gate: &PermissionGate,
    options: NotificationOptions,
    callback: F,
) -> NotificationHandle
where
    F: FnOnce(bool) + Send + 'static,
{
    gate.create_notification(options, callback)
}
