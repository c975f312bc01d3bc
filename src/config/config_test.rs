use serial_test::serial;
use temp_env::with_vars;

use crate::CompilerConfig;
use crate::QueueConfig;
use crate::Settings;
use crate::ValidationConfig;

#[test]
#[serial]
fn test_defaults_load_without_any_file() {
    let settings = Settings::load(None).expect("defaults should load");

    assert_eq!(settings.compiler.watch_poll_interval_ms, 500);
    assert!(!settings.compiler.strict_directives);
    assert_eq!(settings.queue.drain_log_every, 100);
    assert!(settings.validation.client_echo_enabled);
    assert_eq!(settings.validation.unobtrusive_prefix, "data-val-");
}

#[test]
#[serial]
fn test_environment_overrides_defaults() {
    with_vars(
        vec![
            ("PAGELIFT__COMPILER__MAX_TEMPLATE_BYTES", Some("4096")),
            ("PAGELIFT__QUEUE__CONSUMER_SHUTDOWN_GRACE_MS", Some("250")),
        ],
        || {
            let settings = Settings::load(None).expect("env overlay should load");

            assert_eq!(settings.compiler.max_template_bytes, 4096);
            assert_eq!(settings.queue.consumer_shutdown_grace_ms, 250);
        },
    );
}

#[test]
fn test_invalid_poll_interval() {
    let mut config = CompilerConfig::default();
    config.watch_poll_interval_ms = 0;

    assert!(config.validate().is_err());
}

#[test]
fn test_invalid_max_template_bytes() {
    let config = CompilerConfig {
        max_template_bytes: 0,
        ..Default::default()
    };

    assert!(config.validate().is_err());
}

#[test]
fn test_invalid_drain_log_every() {
    let config = QueueConfig {
        drain_log_every: 0,
        ..Default::default()
    };

    assert!(config.validate().is_err());
}

#[test]
fn test_empty_prefix_rejected_only_when_echo_enabled() {
    let enabled = ValidationConfig {
        client_echo_enabled: true,
        unobtrusive_prefix: String::new(),
    };
    assert!(enabled.validate().is_err());

    let disabled = ValidationConfig {
        client_echo_enabled: false,
        unobtrusive_prefix: String::new(),
    };
    assert!(disabled.validate().is_ok());
}
