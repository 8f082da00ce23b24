//! Test fixtures and sample data
//!
//! Provides pre-built remote listings and config templates for testing.

/// Remote names for `days` consecutive nightly runs of one kind, oldest first
pub fn dated_artifacts(name: &str, extension: &str, days: u32) -> Vec<String> {
    (1..=days)
        .map(|day| format!("{}_2024-01-{:02}_03:00:00.{}", name, day, extension))
        .collect()
}

/// A remote directory holding two backup families and both artifact kinds
pub fn mixed_remote_listing() -> Vec<String> {
    let mut listing = Vec::new();
    for day in 1..=3 {
        listing.push(format!("nightly_2024-01-{:02}_03:00:00.zip", day));
        listing.push(format!("nightly_2024-01-{:02}_03:00:00.sql", day));
        listing.push(format!("weekly_2024-01-{:02}_04:00:00.zip", day));
    }
    listing.push("README.txt".to_string());
    listing
}

/// Minimal valid config TOML template
///
/// Placeholders: `{host}`, `{port}`, `{temp_dir}`, `{log_dir}`.
pub fn minimal_config_toml() -> &'static str {
    r#"
[transfer_server]
host = "{host}"
port = {port}
username = "backup"
password = "ftp-secret"
timeout_seconds = 1

[backup_policy]
name = "nightly"
retention_count = 3
temp_directory = "{temp_dir}"

[logging]
log_directory = "{log_dir}"
log_level = "debug"
"#
}

/// Config TOML with every optional section present
pub fn full_config_toml() -> &'static str {
    r#"
[transfer_server]
host = "ftp.example.com"
port = 2121
username = "backup"
password = "ftp-secret"
timeout_seconds = 30

[backup_policy]
name = "nightly"
retention_count = 7
temp_directory = "/var/tmp/ftp-backup"
dump_timeout_seconds = 600
require_notification = true

[database]
backend = "postgresql"
host = "db.internal"
port = 5432
username = "postgres"
password = "db-secret"
database = "shop"

[notification]
subject = "Nightly backup"
from = "backup@example.com"
to = "ops@example.com"
body = "Backup finished successfully"
relay_host = "mail.internal"
relay_port = 2525

[logging]
log_directory = "/var/log/ftp-backup"
log_level = "warn"
log_max_files = 3
"#
}

/// Fill the placeholders of [`minimal_config_toml`]
pub fn render_minimal_config(host: &str, port: u16, temp_dir: &str, log_dir: &str) -> String {
    minimal_config_toml()
        .replace("{host}", host)
        .replace("{port}", &port.to_string())
        .replace("{temp_dir}", temp_dir)
        .replace("{log_dir}", log_dir)
}
