//! Configuration file resolution and graceful degradation
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate CCM_CONFIG are marked with #[serial].

mod helpers;

use ccm_common::config::{
    load_or_default, load_toml_config, resolve_config_path, ConfigOrigin, LoggingConfig,
    TomlConfig, CONFIG_ENV_VAR,
};
use ccm_common::Error;
use helpers::log_capture::LogCapture;
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;
use tracing::Level;

#[test]
#[serial]
fn test_env_var_used_without_cli_arg() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/from-env.toml");

    let resolved = resolve_config_path(None);
    assert_eq!(resolved, Some(PathBuf::from("/tmp/from-env.toml")));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_cli_arg_beats_env_var() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/from-env.toml");

    let cli = PathBuf::from("/tmp/from-cli.toml");
    assert_eq!(resolve_config_path(Some(&cli)), Some(cli.clone()));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_blank_env_var_falls_back_to_platform_dir() {
    env::set_var(CONFIG_ENV_VAR, "   ");

    let resolved = resolve_config_path(None);
    if let Some(path) = resolved {
        assert!(path.ends_with("ccm/config.toml"));
    }

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
fn test_missing_file_degrades_to_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");

    let loaded = load_or_default(Some(&path)).unwrap();
    assert_eq!(loaded.config, TomlConfig::default());
    assert_eq!(loaded.config.logging.level, "info");
    assert_eq!(loaded.origin, ConfigOrigin::Missing(path));
}

#[test]
fn test_missing_file_warning_is_logged_on_request() {
    let dir = TempDir::new().unwrap();
    let loaded = load_or_default(Some(&dir.path().join("absent.toml"))).unwrap();

    // Loading itself stays silent; logging may not be initialized yet
    let capture = LogCapture::default();
    capture.capture(|| load_or_default(Some(&dir.path().join("absent.toml"))).unwrap());
    assert!(capture.records().is_empty());

    capture.capture(|| loaded.log_origin());
    let warnings = capture.matching(Level::WARN, "absent.toml not found");
    assert_eq!(warnings.len(), 1, "records: {:?}", capture.records());
}

#[test]
fn test_no_path_degrades_to_defaults() {
    let loaded = load_or_default(None).unwrap();
    assert_eq!(loaded.config, TomlConfig::default());
    assert_eq!(loaded.origin, ConfigOrigin::Unresolved);

    let capture = LogCapture::default();
    capture.capture(|| loaded.log_origin());
    assert_eq!(capture.matching(Level::WARN, "built-in defaults").len(), 1);
}

#[test]
fn test_partial_file_keeps_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[ingest]\nfuzzy_threshold = 0.8\n").unwrap();

    let loaded = load_or_default(Some(&path)).unwrap();
    assert_eq!(loaded.origin, ConfigOrigin::File(path.clone()));

    let config = loaded.config;
    assert_eq!(config.logging, LoggingConfig::default());
    assert_eq!(config.ingest.fuzzy_threshold, Some(0.8));
    assert_eq!(config.ingest.mods_folder, None);
    assert_eq!(config.ingest.verify_payloads, None);
}

#[test]
fn test_malformed_file_is_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[ingest\nfuzzy_threshold = ").unwrap();

    match load_or_default(Some(&path)) {
        Err(Error::Config(msg)) => assert!(msg.contains("config.toml")),
        other => panic!("Expected Config error, got {other:?}"),
    }
}

#[test]
fn test_wrong_type_is_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[ingest]\nverify_payloads = \"sometimes\"\n").unwrap();

    assert!(matches!(load_toml_config(&path), Err(Error::Config(_))));
}

#[test]
fn test_full_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[logging]
level = "debug"

[ingest]
content_extension = ".package"
mods_folder = "Mods"
fuzzy_threshold = 0.75
verify_payloads = true
progress_interval = 250
"#,
    )
    .unwrap();

    let config = load_toml_config(&path).unwrap();
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.ingest.content_extension.as_deref(), Some(".package"));
    assert_eq!(config.ingest.mods_folder.as_deref(), Some("Mods"));
    assert_eq!(config.ingest.fuzzy_threshold, Some(0.75));
    assert_eq!(config.ingest.verify_payloads, Some(true));
    assert_eq!(config.ingest.progress_interval, Some(250));
}
