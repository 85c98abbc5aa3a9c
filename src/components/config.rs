// Permission gate configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Period between permission polls while the decision is pending
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// When the platform permission prompt is issued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptTrigger {
    /// Wait for the next user interaction the host reports. Hosts that only
    /// show their prompt from a user gesture need this.
    #[default]
    NextInteraction,
    /// Request permission as soon as the first notification asks for it
    Immediate,
}

/// Configuration for a [`PermissionGate`](super::PermissionGate)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    #[serde(
        rename = "poll_interval_ms",
        serialize_with = "super::serde_time::serialize_millis",
        deserialize_with = "super::serde_time::deserialize_millis"
    )]
    pub poll_interval: Duration,
    /// Upper bound on how long polling waits for an answer. `None` polls until
    /// the user decides, however long that takes.
    #[serde(
        rename = "max_wait_ms",
        serialize_with = "super::serde_time::serialize_millis_option",
        deserialize_with = "super::serde_time::deserialize_millis_option"
    )]
    pub max_wait: Option<Duration>,
    pub prompt: PromptTrigger,
    /// Application label for backends that show one
    pub app_name: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_wait: None,
            prompt: PromptTrigger::default(),
            app_name: "kodegen".to_string(),
        }
    }
}

impl GateConfig {
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    pub fn with_prompt(mut self, prompt: PromptTrigger) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = app_name.into();
        self
    }

    /// Poll period clamped away from zero, which tokio intervals reject
    pub(crate) fn effective_poll_interval(&self) -> Duration {
        self.poll_interval.max(Duration::from_millis(1))
    }
}
