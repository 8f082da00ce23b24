use super::types::*;
use std::fs;
use std::path::Path;

pub const SECTION_TRANSFER_SERVER: &str = "transfer_server";
pub const SECTION_BACKUP_POLICY: &str = "backup_policy";
pub const SECTION_DATABASE: &str = "database";
pub const SECTION_NOTIFICATION: &str = "notification";

const TRANSFER_SERVER_OPTIONS: &[&str] = &["host", "port", "username", "password"];
const BACKUP_POLICY_OPTIONS: &[&str] = &["name", "retention_count"];
const DATABASE_OPTIONS: &[&str] = &["backend", "host", "port", "username", "password"];
const NOTIFICATION_OPTIONS: &[&str] = &["subject", "from", "to", "body"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid config file (no '{0}' section)")]
    MissingSection(String),

    #[error("Invalid config file (section '{section}' has no '{option}' option)")]
    MissingOption { section: String, option: String },

    #[error("Unsupported database backend: '{0}'")]
    UnsupportedBackend(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Load and validate configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parse and validate configuration from TOML text
pub fn parse_config(contents: &str) -> Result<Config> {
    let table: toml::Table = contents.parse()?;
    check_structure(&table)?;

    let config: Config = toml::from_str(contents)?;
    validate_config(&config)?;
    Ok(config)
}

/// Check required sections and options before typed deserialization,
/// so the error names what is missing instead of a serde message
fn check_structure(table: &toml::Table) -> Result<()> {
    require_section(table, SECTION_TRANSFER_SERVER, TRANSFER_SERVER_OPTIONS)?;
    require_section(table, SECTION_BACKUP_POLICY, BACKUP_POLICY_OPTIONS)?;

    if table.contains_key(SECTION_DATABASE) {
        require_section(table, SECTION_DATABASE, DATABASE_OPTIONS)?;
    }
    if table.contains_key(SECTION_NOTIFICATION) {
        require_section(table, SECTION_NOTIFICATION, NOTIFICATION_OPTIONS)?;
    }

    Ok(())
}

fn require_section(table: &toml::Table, section: &str, options: &[&str]) -> Result<()> {
    let values = table
        .get(section)
        .and_then(|v| v.as_table())
        .ok_or_else(|| ConfigError::MissingSection(section.to_string()))?;

    for option in options {
        if !values.contains_key(*option) {
            return Err(ConfigError::MissingOption {
                section: section.to_string(),
                option: option.to_string(),
            });
        }
    }

    Ok(())
}

/// Validate the configuration
fn validate_config(config: &Config) -> Result<()> {
    let server = &config.transfer_server;
    if server.host.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "transfer_server.host must not be empty".to_string(),
        ));
    }
    if server.port == 0 {
        return Err(ConfigError::ValidationError(
            "transfer_server.port must not be 0".to_string(),
        ));
    }
    if server.timeout_seconds == 0 {
        return Err(ConfigError::ValidationError(
            "transfer_server.timeout_seconds must be greater than 0".to_string(),
        ));
    }

    if config.backup_policy.name.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "backup_policy.name must not be empty".to_string(),
        ));
    }

    if let Some(ref database) = config.database {
        database
            .backend
            .parse::<DatabaseBackend>()
            .map_err(ConfigError::UnsupportedBackend)?;
    }

    if config.backup_policy.require_notification && config.notification.is_none() {
        return Err(ConfigError::MissingSection(SECTION_NOTIFICATION.to_string()));
    }

    Ok(())
}
