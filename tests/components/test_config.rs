//! Tests for components/config.rs

use std::time::Duration;

use kodegen_notify_gate::{GateConfig, PromptTrigger};

#[test]
fn empty_json_uses_defaults() -> anyhow::Result<()> {
    let config: GateConfig = serde_json::from_str("{}")?;
    assert_eq!(config, GateConfig::default());
    assert_eq!(config.poll_interval, Duration::from_millis(200));
    assert_eq!(config.max_wait, None);
    assert_eq!(config.prompt, PromptTrigger::NextInteraction);
    Ok(())
}

#[test]
fn json_fields_are_in_milliseconds() -> anyhow::Result<()> {
    let config: GateConfig = serde_json::from_str(
        r#"{"poll_interval_ms": 50, "max_wait_ms": 30000, "prompt": "immediate", "app_name": "ci"}"#,
    )?;

    assert_eq!(config.poll_interval, Duration::from_millis(50));
    assert_eq!(config.max_wait, Some(Duration::from_secs(30)));
    assert_eq!(config.prompt, PromptTrigger::Immediate);
    assert_eq!(config.app_name, "ci");
    Ok(())
}

#[test]
fn null_max_wait_means_unbounded() -> anyhow::Result<()> {
    let config: GateConfig = serde_json::from_str(r#"{"max_wait_ms": null}"#)?;
    assert_eq!(config.max_wait, None);
    Ok(())
}

#[test]
fn serialized_config_round_trips() -> anyhow::Result<()> {
    let config = GateConfig::default()
        .with_poll_interval(Duration::from_millis(75))
        .with_max_wait(Duration::from_secs(5))
        .with_prompt(PromptTrigger::Immediate)
        .with_app_name("kodegen-cli");

    let json = serde_json::to_value(&config)?;
    assert_eq!(json["poll_interval_ms"], 75);
    assert_eq!(json["max_wait_ms"], 5000);
    assert_eq!(json["prompt"], "immediate");

    let parsed: GateConfig = serde_json::from_value(json)?;
    assert_eq!(parsed, config);
    Ok(())
}
