// Permission negotiation: one shared, memoized, asynchronously discovered
// permission decision for every notification created through a gate.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tokio::time::{Instant, MissedTickBehavior};

use crate::backends::PlatformBackendFactory;

use super::{
    GateConfig, NotificationError, NotificationHandle, NotificationOptions, NotificationPlatform,
    PromptTrigger,
};

/// Continuation waiting for the permission decision
pub type PermissionContinuation = Box<dyn FnOnce(bool) + Send + 'static>;

/// The host's three-valued answer to "may this process show notifications"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PermissionState {
    /// Not decided yet, or the prompt has not been shown
    #[default]
    Unknown,
    Denied,
    Granted,
}

impl PermissionState {
    pub fn is_decided(&self) -> bool {
        !matches!(self, PermissionState::Unknown)
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionState::Granted)
    }

    pub fn name(&self) -> &'static str {
        match self {
            PermissionState::Unknown => "unknown",
            PermissionState::Denied => "denied",
            PermissionState::Granted => "granted",
        }
    }
}

impl std::fmt::Display for PermissionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// FIFO of continuations waiting for the same decision
#[derive(Default)]
struct PendingQueue {
    entries: VecDeque<PermissionContinuation>,
}

impl PendingQueue {
    fn push(&mut self, continuation: PermissionContinuation) {
        self.entries.push_back(continuation);
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    /// Empty the queue, handing every entry to the caller in insertion order
    fn take(&mut self) -> VecDeque<PermissionContinuation> {
        std::mem::take(&mut self.entries)
    }
}

struct GateState {
    /// Cached decision; never returns to Unknown once decided
    permission: PermissionState,
    queue: PendingQueue,
    /// Prompt has been armed; it is issued at most once per gate
    prompt_armed: bool,
    /// A polling loop is running
    polling: bool,
}

struct GateInner {
    platform: Arc<dyn NotificationPlatform>,
    config: GateConfig,
    state: Mutex<GateState>,
}

impl GateInner {
    /// Read the decision, consulting the platform only while it is still open
    fn refresh(&self, state: &mut GateState) -> PermissionState {
        if state.permission.is_decided() {
            return state.permission;
        }

        let observed = if self.platform.is_supported() {
            self.platform.query_permission()
        } else {
            tracing::debug!(
                platform = self.platform.name(),
                reason = %NotificationError::CapabilityAbsent,
                "notifications unsupported, answering denied"
            );
            PermissionState::Denied
        };

        if observed.is_decided() {
            tracing::info!(
                platform = self.platform.name(),
                state = %observed,
                "notification permission decided"
            );
            state.permission = observed;
        }
        observed
    }

    async fn poll_until_decided(self: Arc<Self>) {
        let period = self.config.effective_poll_interval();
        let started = Instant::now();
        let mut ticker = tokio::time::interval_at(started + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let (granted, drained) = {
                let mut state = self.state.lock();
                let observed = self.refresh(&mut state);
                let granted = if observed.is_decided() {
                    observed.is_granted()
                } else if self
                    .config
                    .max_wait
                    .is_some_and(|max_wait| started.elapsed() >= max_wait)
                {
                    tracing::warn!(
                        platform = self.platform.name(),
                        pending = state.queue.len(),
                        "no permission answer within max_wait, answering denied"
                    );
                    false
                } else {
                    continue;
                };
                state.polling = false;
                (granted, state.queue.take())
            };

            tracing::debug!(pending = drained.len(), granted, "draining permission queue");
            for continuation in drained {
                continuation(granted);
            }
            return;
        }
    }
}

/// Serializes and memoizes the permission decision for every notification
/// created through it.
///
/// Cloning is cheap and shares the same state. Each gate is independent, so
/// tests and embedders can hold as many as they like; an application normally
/// keeps one for its lifetime.
#[derive(Clone)]
pub struct PermissionGate {
    inner: Arc<GateInner>,
}

impl PermissionGate {
    pub fn new(platform: Arc<dyn NotificationPlatform>) -> Self {
        Self::with_config(platform, GateConfig::default())
    }

    pub fn with_config(platform: Arc<dyn NotificationPlatform>, config: GateConfig) -> Self {
        let inner = GateInner {
            platform,
            config,
            state: Mutex::new(GateState {
                permission: PermissionState::Unknown,
                queue: PendingQueue::default(),
                prompt_armed: false,
                polling: false,
            }),
        };
        // Pick up a decision the platform remembers from an earlier session
        inner.refresh(&mut inner.state.lock());

        Self {
            inner: Arc::new(inner),
        }
    }

    /// Gate over the host's native platform, labelled with `config.app_name`.
    ///
    /// Hosts without a reachable notification capability get a gate that
    /// answers every request with `false`.
    pub async fn native(config: GateConfig) -> Self {
        let platform = PlatformBackendFactory::native(&config.app_name).await;
        Self::with_config(platform, config)
    }

    pub fn platform(&self) -> &Arc<dyn NotificationPlatform> {
        &self.inner.platform
    }

    pub fn config(&self) -> &GateConfig {
        &self.inner.config
    }

    /// Last decision the gate has observed, without asking the platform
    pub fn state(&self) -> PermissionState {
        self.inner.state.lock().permission
    }

    /// Current decision, asking the platform if none is cached yet
    pub fn current_state(&self) -> PermissionState {
        let mut state = self.inner.state.lock();
        self.inner.refresh(&mut state)
    }

    /// Continuations waiting for the decision
    pub fn pending(&self) -> usize {
        self.inner.state.lock().queue.len()
    }

    pub fn is_polling(&self) -> bool {
        self.inner.state.lock().polling
    }

    pub fn is_prompt_armed(&self) -> bool {
        self.inner.state.lock().prompt_armed
    }

    /// Deliver the permission decision to `continuation` exactly once.
    ///
    /// A known decision is delivered on a fresh task. Otherwise the
    /// continuation is queued behind earlier requests; the first pending
    /// request arms the platform prompt and starts the polling loop, which
    /// drains the whole queue in order once the decision appears.
    ///
    /// Must be called from within a tokio runtime.
    pub fn resolve<F>(&self, continuation: F)
    where
        F: FnOnce(bool) + Send + 'static,
    {
        let (arm_prompt, start_polling) = {
            let mut state = self.inner.state.lock();
            let observed = self.inner.refresh(&mut state);
            if observed.is_decided() {
                drop(state);
                let granted = observed.is_granted();
                tokio::spawn(async move { continuation(granted) });
                return;
            }

            state.queue.push(Box::new(continuation));
            let arm_prompt = !std::mem::replace(&mut state.prompt_armed, true);
            let start_polling = !std::mem::replace(&mut state.polling, true);
            tracing::debug!(pending = state.queue.len(), "permission request queued");
            (arm_prompt, start_polling)
        };

        if arm_prompt {
            self.arm_prompt();
        }
        if start_polling {
            tokio::spawn(Arc::clone(&self.inner).poll_until_decided());
        }
    }

    /// Wait for the permission decision
    pub async fn permission(&self) -> bool {
        let (tx, rx) = oneshot::channel();
        self.resolve(move |granted| {
            let _ = tx.send(granted);
        });
        rx.await.unwrap_or(false)
    }

    /// Create a notification whose `callback` receives the permission decision
    pub fn create_notification<F>(&self, options: NotificationOptions, callback: F) -> NotificationHandle
    where
        F: FnOnce(bool) + Send + 'static,
    {
        NotificationHandle::with_callback(self, options, callback)
    }

    fn arm_prompt(&self) {
        let platform = Arc::clone(&self.inner.platform);
        match self.inner.config.prompt {
            PromptTrigger::Immediate => {
                tracing::debug!(platform = platform.name(), "requesting notification permission");
                platform.request_permission();
            },
            PromptTrigger::NextInteraction => {
                tracing::debug!(
                    platform = platform.name(),
                    "permission prompt armed for next user interaction"
                );
                let requester = Arc::clone(&platform);
                platform.on_next_interaction(Box::new(move || {
                    tracing::debug!(
                        platform = requester.name(),
                        "user interaction observed, requesting notification permission"
                    );
                    requester.request_permission();
                }));
            },
        }
    }
}

impl std::fmt::Debug for PermissionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("PermissionGate")
            .field("platform", &self.inner.platform.name())
            .field("permission", &state.permission)
            .field("pending", &state.queue.len())
            .field("prompt_armed", &state.prompt_armed)
            .field("polling", &state.polling)
            .finish()
    }
}
