use std::path::PathBuf;

use tempfile::TempDir;

use dragnet::config::DragnetConfig;
use dragnet::correlate::EntityCategory;

#[test]
fn test_default_config() {
    let config = DragnetConfig::default();

    assert_eq!(config.engine.max_concurrent_probes, 50);
    assert_eq!(config.engine.probe_deadline_secs, 0);
    assert!(config.engine.probe_deadline().is_none());
    assert_eq!(config.engine.progress_interval, 10);

    assert_eq!(config.correlation.categories, EntityCategory::ALL.to_vec());

    assert_eq!(config.report.output_dir, PathBuf::from("reports"));
    assert!(config.report.pretty);

    // Notification config defaults
    assert!(config.notification.enabled);
    assert!(config.notification.desktop);
    assert!(config.notification.event_log);
    assert!(config.notification.hook_command.is_none());
}

#[test]
fn test_config_clone() {
    let config = DragnetConfig::default();
    let cloned = config.clone();

    assert_eq!(
        config.engine.max_concurrent_probes,
        cloned.engine.max_concurrent_probes
    );
    assert_eq!(config.report.output_dir, cloned.report.output_dir);
}

#[tokio::test]
async fn test_load_missing_file_returns_defaults() {
    let temp = TempDir::new().unwrap();
    let config = DragnetConfig::load(&temp.path().join("dragnet.toml"))
        .await
        .unwrap();

    assert_eq!(config.engine.max_concurrent_probes, 50);
}

#[tokio::test]
async fn test_save_and_load_round_trip() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("dragnet.toml");

    let mut config = DragnetConfig::default();
    config.engine.max_concurrent_probes = 8;
    config.engine.probe_deadline_secs = 30;
    config.notification.hook_command = Some("notify-send dragnet".to_string());
    config.save(&path).await.unwrap();

    let loaded = DragnetConfig::load(&path).await.unwrap();
    assert_eq!(loaded.engine.max_concurrent_probes, 8);
    assert_eq!(loaded.engine.probe_deadline_secs, 30);
    assert_eq!(
        loaded.notification.hook_command.as_deref(),
        Some("notify-send dragnet")
    );
}

#[tokio::test]
async fn test_partial_file_fills_defaults() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("dragnet.toml");
    tokio::fs::write(
        &path,
        r#"
[engine]
max_concurrent_probes = 4

[correlation]
categories = ["email"]
"#,
    )
    .await
    .unwrap();

    let config = DragnetConfig::load(&path).await.unwrap();

    assert_eq!(config.engine.max_concurrent_probes, 4);
    assert_eq!(config.engine.progress_interval, 10);
    assert_eq!(config.correlation.categories, vec![EntityCategory::Email]);
    assert!(config.notification.enabled);
}

#[tokio::test]
async fn test_invalid_toml_is_an_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("dragnet.toml");
    tokio::fs::write(&path, "max_concurrent_probes = [not toml")
        .await
        .unwrap();

    let err = DragnetConfig::load(&path).await.unwrap_err();
    assert!(err.to_string().contains("TOML"));
}
