//! Tests for Config serialization, defaults, and load/save

use std::path::PathBuf;
use std::time::Duration;

use tempfile::TempDir;
use tidybox_config::{
    AccessConfig, Config, ConflictPolicy, GatewayConfig, LedgerConfig, WatcherConfig,
};

fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

#[test]
fn test_config_defaults() {
    let config = Config::default();

    assert!(config.inbox.watch);
    assert!(!config.inbox.path.is_empty());

    assert!(config.access.include_drives);
    assert!(config.access.extra_roots.is_empty());
    assert_eq!(config.access.max_path_len, 4096);
    assert_eq!(config.access.max_name_len, 255);

    assert_eq!(config.watcher.debounce_ms, 1500);
    assert_eq!(config.watcher.sweep_interval_ms, 250);
    assert_eq!(config.watcher.channel_capacity, 64);
    assert!(config.watcher.extra_temp_suffixes.is_empty());

    assert_eq!(config.gateway.on_conflict, ConflictPolicy::Reject);
    assert_eq!(config.ledger.recents_cap, 5);
}

#[test]
fn test_section_defaults_match_root_defaults() {
    let access = AccessConfig::default();
    assert_eq!(access.max_path_len, 4096);

    let gateway = GatewayConfig::default();
    assert_eq!(gateway.on_conflict, ConflictPolicy::Reject);

    let ledger = LedgerConfig::default();
    assert_eq!(ledger.recents_cap, 5);
}

#[test]
fn test_watcher_durations() {
    let watcher = WatcherConfig {
        debounce_ms: 800,
        sweep_interval_ms: 100,
        ..Default::default()
    };
    assert_eq!(watcher.debounce(), Duration::from_millis(800));
    assert_eq!(watcher.sweep_interval(), Duration::from_millis(100));
}

#[test]
fn test_zero_sweep_interval_is_clamped() {
    let watcher = WatcherConfig {
        sweep_interval_ms: 0,
        ..Default::default()
    };
    assert_eq!(watcher.sweep_interval(), Duration::from_millis(1));
}

#[test]
fn test_partial_json_fills_defaults() {
    let json = r#"{ "inbox": { "path": "/data/incoming" }, "ledger": {} }"#;
    let config: Config = serde_json::from_str(json).expect("Should parse");

    assert_eq!(config.inbox.path, "/data/incoming");
    assert!(config.inbox.watch);
    assert_eq!(config.ledger.recents_cap, 5);
    assert_eq!(config.watcher.debounce_ms, 1500);
}

#[test]
fn test_conflict_policy_serialization() {
    let json = serde_json::to_string(&ConflictPolicy::Overwrite).unwrap();
    assert_eq!(json, "\"overwrite\"");

    let parsed: GatewayConfig = serde_json::from_str(r#"{"on_conflict":"reject"}"#).unwrap();
    assert_eq!(parsed.on_conflict, ConflictPolicy::Reject);

    let bad: Result<GatewayConfig, _> = serde_json::from_str(r#"{"on_conflict":"merge"}"#);
    assert!(bad.is_err());
}

#[test]
fn test_inbox_path_expands_tilde() {
    let mut config = Config::default();
    config.inbox.path = "~/Incoming".to_string();

    let home = dirs::home_dir().expect("Should have home dir");
    assert_eq!(config.inbox_path(), home.join("Incoming"));

    config.inbox.path = "/srv/inbox".to_string();
    assert_eq!(config.inbox_path(), PathBuf::from("/srv/inbox"));
}

#[test]
fn test_extra_roots_expand() {
    let mut config = Config::default();
    config.access.extra_roots = vec!["/mnt/archive".to_string(), "~".to_string()];

    let roots = config.extra_roots();
    assert_eq!(roots[0], PathBuf::from("/mnt/archive"));
    assert_eq!(roots[1], dirs::home_dir().unwrap());
}

#[tokio::test]
async fn test_save_and_load_roundtrip() {
    let dir = temp_dir();
    let path = dir.path().join("nested").join("config.json");

    let mut config = Config::default();
    config.inbox.path = "/tmp/inbox".to_string();
    config.access.include_drives = false;
    config.gateway.on_conflict = ConflictPolicy::Overwrite;
    config.watcher.extra_temp_suffixes = vec![".dlpart".to_string()];

    config.save_to(&path).await.expect("Failed to save");
    assert!(path.exists());

    let loaded = Config::load_from(&path).await.expect("Failed to load");
    assert_eq!(loaded.inbox.path, "/tmp/inbox");
    assert!(!loaded.access.include_drives);
    assert_eq!(loaded.gateway.on_conflict, ConflictPolicy::Overwrite);
    assert_eq!(loaded.watcher.extra_temp_suffixes, vec![".dlpart"]);
}

#[tokio::test]
async fn test_load_missing_file_uses_defaults() {
    let dir = temp_dir();
    let path = dir.path().join("absent.json");

    let loaded = Config::load_from(&path).await.expect("Should default");
    assert_eq!(loaded.ledger.recents_cap, 5);
}

#[tokio::test]
async fn test_load_invalid_json_fails() {
    let dir = temp_dir();
    let path = dir.path().join("config.json");
    tokio::fs::write(&path, "{ not json").await.unwrap();

    let result = Config::load_from(&path).await;
    assert!(matches!(result, Err(tidybox_config::ConfigError::Json(_))));
}
