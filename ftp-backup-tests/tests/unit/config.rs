//! Unit tests for configuration loading and validation

use ftp_backup::config::{load_config, parse_config, ConfigError, DatabaseBackend};
use std::path::PathBuf;
use test_utils::{full_config_toml, ConfigBuilder, ResultAssertions, TestContext};

#[test]
fn test_config_loading_valid() {
    let (path, _config, _temp) = ConfigBuilder::minimal()
        .with_retention(3)
        .write_to_file("ftp-backup.toml");

    let loaded = load_config(&path).assert_ok();
    assert_eq!(loaded.backup_policy.name, "nightly");
    assert_eq!(loaded.backup_policy.retention_count, 3);
    assert!(loaded.has_notification());
}

#[test]
fn test_full_config_values() {
    let config = parse_config(full_config_toml()).assert_ok();

    assert_eq!(config.transfer_server.port, 2121);
    assert_eq!(config.transfer_server.timeout_seconds, 30);
    assert_eq!(config.backup_policy.dump_timeout_seconds, 600);

    let database = config.database.as_ref().unwrap();
    assert_eq!(
        database.backend.parse::<DatabaseBackend>().unwrap(),
        DatabaseBackend::Postgresql
    );
    assert_eq!(database.database.as_deref(), Some("shop"));

    let notification = config.notification.as_ref().unwrap();
    assert_eq!(notification.relay_host, "mail.internal");
    assert_eq!(notification.relay_port, 2525);
    // Unset optional keys fall back to defaults
    assert_eq!(notification.timeout_seconds, 10);

    assert_eq!(config.logging.log_directory, PathBuf::from("/var/log/ftp-backup"));
    assert_eq!(config.logging.log_max_files, 3);
}

#[test]
fn test_config_file_not_found() {
    let ctx = TestContext::new();
    let result = load_config(&ctx.temp_dir().join("missing.toml"));
    assert!(matches!(result, Err(ConfigError::ReadError(_))));
}

#[test]
fn test_config_invalid_toml() {
    let ctx = TestContext::new();
    let path = ctx.create_file("ftp-backup.toml", "[transfer_server\nhost = ");
    assert!(matches!(load_config(&path), Err(ConfigError::ParseError(_))));
}

#[test]
fn test_config_missing_backup_policy() {
    let content = r#"
[transfer_server]
host = "ftp.example.com"
port = 21
username = "backup"
password = "secret"
"#;
    parse_config(content).assert_err_contains("no 'backup_policy' section");
}

#[test]
fn test_config_missing_retention_option() {
    let content = r#"
[transfer_server]
host = "ftp.example.com"
port = 21
username = "backup"
password = "secret"

[backup_policy]
name = "nightly"
"#;
    match parse_config(content) {
        Err(ConfigError::MissingOption { section, option }) => {
            assert_eq!(section, "backup_policy");
            assert_eq!(option, "retention_count");
        }
        other => panic!("Expected MissingOption, got {:?}", other),
    }
}

#[test]
fn test_config_unsupported_backend() {
    let content = full_config_toml().replace("\"postgresql\"", "\"oracle\"");
    parse_config(&content).assert_err_contains("oracle");
}

#[test]
fn test_config_zero_timeout_rejected() {
    let content = full_config_toml().replace("timeout_seconds = 30", "timeout_seconds = 0");
    assert!(matches!(
        parse_config(&content),
        Err(ConfigError::ValidationError(_))
    ));
}

#[test]
fn test_required_notification() {
    let (path, _config, _temp) = ConfigBuilder::new()
        .requiring_notification()
        .write_to_file("ftp-backup.toml");

    load_config(&path).assert_err_contains("notification");
}

#[test]
fn test_debug_output_masks_passwords() {
    let config = parse_config(full_config_toml()).assert_ok();
    let debug = format!("{:?}", config);

    assert!(!debug.contains("ftp-secret"));
    assert!(!debug.contains("db-secret"));
}
