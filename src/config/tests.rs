//! Tests for config functionality.

use crate::config::Config;
use crate::locks::LockOptions;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.lock_stale_minutes, 5);
    assert_eq!(config.lock_poll_interval_ms, 100);
    assert_eq!(config.lock_max_poll_interval_ms, 1000);
    assert_eq!(config.lock_timeout_secs, 30);
    assert_eq!(config.cell_id_prefix, "cell");
    assert_eq!(config.target_format_minor, 5);
    assert!(config.validate().is_ok());
}

#[test]
fn test_parse_minimal_yaml() {
    let config = Config::from_yaml("").unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_parse_partial_yaml() {
    let yaml = r#"
lock_stale_minutes: 15
cell_id_prefix: blk
"#;
    let config = Config::from_yaml(yaml).unwrap();

    assert_eq!(config.lock_stale_minutes, 15);
    assert_eq!(config.cell_id_prefix, "blk");
    assert_eq!(config.lock_poll_interval_ms, 100);
    assert_eq!(config.target_format_minor, 5);
}

#[test]
fn test_unknown_fields_ignored() {
    let yaml = r#"
lock_timeout_secs: 3
future_setting: true
"#;
    let config = Config::from_yaml(yaml).unwrap();
    assert_eq!(config.lock_timeout(), Duration::from_secs(3));
}

#[test]
fn test_validate_zero_stale_minutes_fails() {
    let err = Config::from_yaml("lock_stale_minutes: 0").unwrap_err();
    assert!(err.to_string().contains("lock_stale_minutes"));
}

#[test]
fn test_validate_backoff_bounds() {
    let err = Config::from_yaml("lock_poll_interval_ms: 0").unwrap_err();
    assert!(err.to_string().contains("lock_poll_interval_ms"));

    let yaml = r#"
lock_poll_interval_ms: 500
lock_max_poll_interval_ms: 100
"#;
    let err = Config::from_yaml(yaml).unwrap_err();
    assert!(err.to_string().contains("lock_max_poll_interval_ms"));
}

#[test]
fn test_validate_prefix() {
    assert!(Config::from_yaml("cell_id_prefix: ''").is_err());
    assert!(Config::from_yaml("cell_id_prefix: Cell").is_err());
    assert!(Config::from_yaml("cell_id_prefix: a-b").is_err());
    assert!(Config::from_yaml("cell_id_prefix: c2").is_ok());
}

#[test]
fn test_yaml_roundtrip() {
    let mut config = Config::default();
    config.lock_stale_minutes = 42;
    let yaml = config.to_yaml().unwrap();
    assert_eq!(Config::from_yaml(&yaml).unwrap(), config);
}

#[test]
fn test_load_or_default() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.yaml");

    assert_eq!(Config::load_or_default(&path).unwrap(), Config::default());

    std::fs::write(&path, "lock_stale_minutes: 9\n").unwrap();
    assert_eq!(Config::load_or_default(&path).unwrap().lock_stale_minutes, 9);

    std::fs::write(&path, "lock_stale_minutes: [").unwrap();
    assert!(Config::load_or_default(&path).is_err());
}

#[test]
fn test_lock_options_from_config() {
    let config = Config::from_yaml("lock_stale_minutes: 7\nlock_poll_interval_ms: 20").unwrap();
    let options = LockOptions::from(&config);

    assert_eq!(options.stale_after, chrono::Duration::minutes(7));
    assert_eq!(options.poll_interval, Duration::from_millis(20));
    assert_eq!(options.max_poll_interval, Duration::from_millis(1000));
}
