//! Tests for components/lifecycle.rs

use std::sync::Arc;
use std::time::Duration;

use kodegen_notify_gate::{
    EventKind, LifecycleState, MemoryPlatform, NotificationEvent, NotificationHandle, NotificationId,
    PermissionState,
};

use crate::support::{Recorder, gate, next_poll, settle, structured};

fn granted() -> Arc<MemoryPlatform> {
    Arc::new(MemoryPlatform::with_permission(PermissionState::Granted))
}

#[tokio::test(start_paused = true)]
async fn show_before_permission_is_replayed_once_granted() {
    let platform = Arc::new(MemoryPlatform::new());
    let gate = gate(&platform);

    let handle = NotificationHandle::new(&gate, structured());
    handle.show();
    assert_eq!(handle.state(), LifecycleState::AwaitingPermission);
    assert!(platform.instances().is_empty());

    platform.interact();
    platform.set_permission(PermissionState::Granted);
    next_poll().await;

    let instance = platform.instance(0).expect("instance created");
    assert_eq!(instance.show_count(), 1);
    assert!(instance.is_open());
    assert_eq!(handle.state(), LifecycleState::Displayed);
}

#[tokio::test(start_paused = true)]
async fn handle_waits_in_ready_until_shown() {
    let platform = granted();
    let gate = gate(&platform);

    let handle = NotificationHandle::new(&gate, structured());
    settle().await;

    let instance = platform.instance(0).expect("instance created");
    assert_eq!(handle.state(), LifecycleState::Ready);
    assert_eq!(instance.show_count(), 0);

    handle.show();
    assert_eq!(handle.state(), LifecycleState::Displayed);
    assert_eq!(instance.show_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn timeout_cancels_after_display() {
    let platform = granted();
    let gate = gate(&platform);

    let handle = NotificationHandle::new(&gate, structured().with_timeout(Duration::from_millis(1000)));
    settle().await;
    handle.show();
    let instance = platform.instance(0).expect("instance created");

    tokio::time::sleep(Duration::from_millis(999)).await;
    assert_eq!(instance.cancel_count(), 0);
    assert_eq!(handle.state(), LifecycleState::Displayed);

    tokio::time::sleep(Duration::from_millis(2)).await;
    assert_eq!(instance.cancel_count(), 1);
    assert!(!instance.is_open());
    assert_eq!(handle.state(), LifecycleState::Closed);
}

#[tokio::test(start_paused = true)]
async fn zero_timeout_never_expires() {
    let platform = granted();
    let gate = gate(&platform);

    let handle = NotificationHandle::new(&gate, structured().with_timeout(Duration::ZERO));
    settle().await;
    handle.show();

    tokio::time::sleep(Duration::from_secs(3600)).await;
    let instance = platform.instance(0).expect("instance created");
    assert_eq!(instance.cancel_count(), 0);
    assert_eq!(handle.state(), LifecycleState::Displayed);
}

#[tokio::test(start_paused = true)]
async fn showing_again_restarts_the_timer() {
    let platform = granted();
    let gate = gate(&platform);

    let handle = NotificationHandle::new(&gate, structured().with_timeout(Duration::from_secs(1)));
    settle().await;
    handle.show();
    tokio::time::sleep(Duration::from_millis(600)).await;
    handle.show();

    tokio::time::sleep(Duration::from_millis(600)).await;
    let instance = platform.instance(0).expect("instance created");
    assert_eq!(instance.cancel_count(), 0);
    assert_eq!(instance.show_count(), 2);

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(instance.cancel_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn denied_handle_is_inert() {
    let platform = Arc::new(MemoryPlatform::new());
    let gate = gate(&platform);
    let decisions = Recorder::new();

    let recorded = decisions.clone();
    let handle = gate.create_notification(structured(), move |granted| recorded.push(granted));
    handle.show();

    platform.set_permission(PermissionState::Denied);
    next_poll().await;

    assert_eq!(decisions.values(), vec![false]);
    assert_eq!(handle.state(), LifecycleState::Denied);
    handle.show().cancel();
    assert_eq!(handle.state(), LifecycleState::Denied);
    assert!(platform.instances().is_empty());
}

#[tokio::test(start_paused = true)]
async fn click_runs_caller_listener_then_autocloses() {
    let platform = granted();
    let gate = gate(&platform);
    let events = Recorder::new();

    let clicks = events.clone();
    let closes = events.clone();
    let options = structured()
        .on_click(move |event: &NotificationEvent| clicks.push(event.kind()))
        .on_close(move |event: &NotificationEvent| closes.push(event.kind()));
    let handle = NotificationHandle::new(&gate, options);
    settle().await;
    handle.show();

    let instance = platform.instance(0).expect("instance created");
    instance.click();

    assert_eq!(events.values(), vec![EventKind::Click, EventKind::Close]);
    assert_eq!(instance.cancel_count(), 1);
    assert_eq!(handle.state(), LifecycleState::Closed);
}

#[tokio::test(start_paused = true)]
async fn autoclose_off_leaves_notification_open() {
    let platform = granted();
    let gate = gate(&platform);
    let clicks = Recorder::new();

    let recorded = clicks.clone();
    let options = structured()
        .with_autoclose(false)
        .on_click(move |_: &NotificationEvent| recorded.push(()));
    let handle = NotificationHandle::new(&gate, options);
    settle().await;
    handle.show();

    let instance = platform.instance(0).expect("instance created");
    instance.click();

    assert_eq!(clicks.len(), 1);
    assert_eq!(instance.cancel_count(), 0);
    assert!(instance.is_open());
    assert_eq!(handle.state(), LifecycleState::Displayed);
    assert_eq!(instance.listener_count(EventKind::Click), 1);
}

#[tokio::test(start_paused = true)]
async fn platform_dismissal_closes_handle_and_stops_timer() {
    let platform = granted();
    let gate = gate(&platform);

    let handle = NotificationHandle::new(&gate, structured().with_timeout(Duration::from_secs(1)));
    settle().await;
    handle.show();
    let instance = platform.instance(0).expect("instance created");

    tokio::time::sleep(Duration::from_millis(500)).await;
    instance.dismiss();
    assert_eq!(handle.state(), LifecycleState::Closed);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(instance.cancel_count(), 0);

    // Closed handles ignore further requests
    handle.show();
    assert_eq!(instance.show_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn creation_failure_reports_error_but_grants() {
    let platform = granted();
    platform.fail_creation(Some("renderer unavailable"));
    let gate = gate(&platform);
    let errors = Recorder::new();
    let decisions = Recorder::new();

    let recorded = errors.clone();
    let options = structured().on_error(move |event: &NotificationEvent| {
        if let NotificationEvent::Error(message) = event {
            recorded.push(message.clone());
        }
    });
    let decided = decisions.clone();
    let handle = gate.create_notification(options, move |granted| decided.push(granted));
    handle.show();
    settle().await;

    assert_eq!(decisions.values(), vec![true]);
    assert_eq!(handle.state(), LifecycleState::Failed);
    let errors = errors.values();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("renderer unavailable"));
    assert!(platform.instances().is_empty());
}

#[tokio::test(start_paused = true)]
async fn platform_error_event_reaches_caller() {
    let platform = granted();
    let gate = gate(&platform);
    let errors = Recorder::new();

    let recorded = errors.clone();
    let options = structured().on_error(move |event: &NotificationEvent| recorded.push(event.clone()));
    let _handle = NotificationHandle::new(&gate, options);
    settle().await;

    platform.instance(0).expect("instance created").fail("icon missing");
    assert_eq!(
        errors.values(),
        vec![NotificationEvent::Error("icon missing".to_string())]
    );
}

#[tokio::test(start_paused = true)]
async fn replace_id_is_forwarded_to_the_instance() {
    let platform = granted();
    let gate = gate(&platform);

    let _tagged = NotificationHandle::new(&gate, structured().with_replace_id("build-status"));
    let _plain = NotificationHandle::new(&gate, structured());
    settle().await;

    let instances = platform.instances();
    assert_eq!(instances.len(), 2);
    assert_eq!(instances[0].replace_id(), "build-status");
    assert_eq!(instances[1].replace_id(), "");
}

#[tokio::test(start_paused = true)]
async fn cancel_before_permission_keeps_pending_show() {
    let platform = Arc::new(MemoryPlatform::new());
    let gate = gate(&platform);

    let handle = NotificationHandle::new(&gate, structured());
    handle.show().cancel();
    assert_eq!(handle.state(), LifecycleState::AwaitingPermission);

    platform.set_permission(PermissionState::Granted);
    next_poll().await;

    let instance = platform.instance(0).expect("instance created");
    assert_eq!(instance.show_count(), 1);
    assert_eq!(instance.cancel_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn dropped_handle_still_shows_when_granted() {
    let platform = Arc::new(MemoryPlatform::new());
    let gate = gate(&platform);

    NotificationHandle::new(&gate, structured()).show();

    platform.set_permission(PermissionState::Granted);
    next_poll().await;

    let instance = platform.instance(0).expect("instance created");
    assert_eq!(instance.show_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn display_listener_fires_on_show() {
    let platform = granted();
    let gate = gate(&platform);
    let displays = Recorder::new();

    let recorded = displays.clone();
    let handle = NotificationHandle::new(
        &gate,
        structured().on_display(move |_: &NotificationEvent| recorded.push(())),
    );
    settle().await;
    assert_eq!(displays.len(), 0);

    handle.show();
    assert_eq!(displays.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn handles_have_distinct_ids() {
    let platform = granted();
    let gate = gate(&platform);

    let first = NotificationHandle::new(&gate, structured());
    let second = NotificationHandle::new(&gate, structured());
    assert_ne!(first.id(), second.id());
    assert_eq!(first.clone().id(), first.id());
}

#[tokio::test(start_paused = true)]
async fn handle_id_survives_text_and_uuid_forms() -> anyhow::Result<()> {
    let platform = granted();
    let gate = gate(&platform);
    let id = NotificationHandle::new(&gate, structured()).id();

    let parsed: NotificationId = id.to_string().parse()?;
    assert_eq!(parsed, id);
    assert_eq!(NotificationId::from_uuid(id.as_uuid()), id);
    assert!("not-a-uuid".parse::<NotificationId>().is_err());
    Ok(())
}
