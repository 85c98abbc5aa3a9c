// In-process notification platform
// Scriptable stand-in for a host capability: headless embedders and tests
// decide permission, simulate user gestures and drive instance events.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::components::{
    EventKind, EventListener, EventListeners, InteractionCallback, NotificationContent,
    NotificationError, NotificationEvent, NotificationPlatform, NotificationResult,
    PermissionState, PlatformInstance,
};

struct MemoryState {
    supported: bool,
    permission: PermissionState,
    /// Decision applied when the prompt is requested, if scripted
    prompt_answer: Option<PermissionState>,
    permission_requests: usize,
    interaction_waiters: Vec<InteractionCallback>,
    creation_failure: Option<String>,
    instances: Vec<Arc<MemoryInstance>>,
}

/// Scriptable [`NotificationPlatform`] held entirely in memory
pub struct MemoryPlatform {
    state: Mutex<MemoryState>,
}

impl Default for MemoryPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPlatform {
    /// Supported platform with an undecided permission
    pub fn new() -> Self {
        Self::with_permission(PermissionState::Unknown)
    }

    /// Supported platform that already remembers `permission`
    pub fn with_permission(permission: PermissionState) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                supported: true,
                permission,
                prompt_answer: None,
                permission_requests: 0,
                interaction_waiters: Vec::new(),
                creation_failure: None,
                instances: Vec::new(),
            }),
        }
    }

    /// Host without any notification capability
    pub fn unsupported() -> Self {
        let platform = Self::new();
        platform.state.lock().supported = false;
        platform
    }

    /// Change the permission decision, as if the user answered a prompt
    pub fn set_permission(&self, permission: PermissionState) {
        self.state.lock().permission = permission;
    }

    /// Answer every future prompt with `answer` as soon as it is requested
    pub fn answer_prompt_with(&self, answer: PermissionState) {
        self.state.lock().prompt_answer = Some(answer);
    }

    /// Make `create_instance` fail with `message`, or succeed again with `None`
    pub fn fail_creation(&self, message: Option<&str>) {
        self.state.lock().creation_failure = message.map(str::to_string);
    }

    /// Simulate a user gesture; runs every callback waiting for one
    pub fn interact(&self) {
        let waiters = std::mem::take(&mut self.state.lock().interaction_waiters);
        for waiter in waiters {
            waiter();
        }
    }

    pub fn permission_requests(&self) -> usize {
        self.state.lock().permission_requests
    }

    pub fn interaction_waiters(&self) -> usize {
        self.state.lock().interaction_waiters.len()
    }

    pub fn instances(&self) -> Vec<Arc<MemoryInstance>> {
        self.state.lock().instances.clone()
    }

    pub fn instance(&self, index: usize) -> Option<Arc<MemoryInstance>> {
        self.state.lock().instances.get(index).cloned()
    }
}

impl NotificationPlatform for MemoryPlatform {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn is_supported(&self) -> bool {
        self.state.lock().supported
    }

    fn query_permission(&self) -> PermissionState {
        self.state.lock().permission
    }

    fn request_permission(&self) {
        let mut state = self.state.lock();
        state.permission_requests += 1;
        if let Some(answer) = state.prompt_answer {
            state.permission = answer;
        }
    }

    fn on_next_interaction(&self, callback: InteractionCallback) {
        self.state.lock().interaction_waiters.push(callback);
    }

    fn create_instance(
        &self,
        content: &NotificationContent,
    ) -> NotificationResult<Arc<dyn PlatformInstance>> {
        let mut state = self.state.lock();
        if !state.supported {
            return Err(NotificationError::CapabilityAbsent);
        }
        if let Some(message) = &state.creation_failure {
            return Err(NotificationError::creation("memory", message.clone()));
        }

        let instance = Arc::new(MemoryInstance::new(content.clone()));
        state.instances.push(Arc::clone(&instance));
        Ok(instance)
    }
}

/// Instance created by [`MemoryPlatform`], with counters for every call the
/// core makes on it
pub struct MemoryInstance {
    content: NotificationContent,
    replace_id: Mutex<String>,
    listeners: EventListeners,
    shows: AtomicUsize,
    cancels: AtomicUsize,
    open: AtomicBool,
}

impl MemoryInstance {
    fn new(content: NotificationContent) -> Self {
        Self {
            content,
            replace_id: Mutex::new(String::new()),
            listeners: EventListeners::new(),
            shows: AtomicUsize::new(0),
            cancels: AtomicUsize::new(0),
            open: AtomicBool::new(false),
        }
    }

    pub fn content(&self) -> &NotificationContent {
        &self.content
    }

    pub fn replace_id(&self) -> String {
        self.replace_id.lock().clone()
    }

    pub fn show_count(&self) -> usize {
        self.shows.load(Ordering::SeqCst)
    }

    pub fn cancel_count(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.count(kind)
    }

    /// Simulate the user clicking the notification body
    pub fn click(&self) {
        self.listeners.emit(&NotificationEvent::Click);
    }

    /// Simulate the user closing the notification from platform chrome
    pub fn dismiss(&self) {
        if self.open.swap(false, Ordering::SeqCst) {
            self.listeners.emit(&NotificationEvent::Close);
        }
    }

    /// Simulate a rendering failure reported by the platform
    pub fn fail(&self, message: impl Into<String>) {
        self.listeners.emit(&NotificationEvent::Error(message.into()));
    }
}

impl PlatformInstance for MemoryInstance {
    fn show(&self) {
        self.shows.fetch_add(1, Ordering::SeqCst);
        self.open.store(true, Ordering::SeqCst);
        self.listeners.emit(&NotificationEvent::Display);
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        if self.open.swap(false, Ordering::SeqCst) {
            self.listeners.emit(&NotificationEvent::Close);
        }
    }

    fn add_event_listener(&self, kind: EventKind, listener: EventListener) {
        self.listeners.add(kind, listener);
    }

    fn set_replace_id(&self, replace_id: &str) {
        *self.replace_id.lock() = replace_id.to_string();
    }
}

impl std::fmt::Debug for MemoryInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryInstance")
            .field("content", &self.content)
            .field("shows", &self.show_count())
            .field("cancels", &self.cancel_count())
            .field("open", &self.is_open())
            .finish()
    }
}
