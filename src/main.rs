use clap::Parser;
use ftp_backup::config::{self, Config};
use ftp_backup::error::UsageError;
use ftp_backup::managers::backup::BackupOrchestrator;
use ftp_backup::managers::logging::{init_console_logging, init_logging, LoggingConfig};
use ftp_backup::job::BackupRequest;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

const EXIT_FAILED: u8 = 1;
const EXIT_USAGE: u8 = 2;

#[derive(Parser)]
#[command(name = "ftp-backup")]
#[command(about = "Archive a directory and/or database and upload it to an FTP server", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "ftp-backup.toml")]
    config: PathBuf,

    /// Show debug output on the console
    #[arg(short, long)]
    verbose: bool,

    /// Directory to archive
    #[arg(short, long)]
    directory: Option<PathBuf>,

    /// Backup name (overrides backup_policy.name)
    #[arg(short, long)]
    name: Option<String>,

    /// Notification recipient (overrides notification.to)
    #[arg(short, long)]
    email: Option<String>,

    /// Dump the configured database
    #[arg(long)]
    database: bool,

    /// List remote backups, optionally only those of one backup name
    #[arg(
        long,
        value_name = "NAME",
        num_args = 0..=1,
        conflicts_with_all = ["directory", "database"]
    )]
    list_backups: Option<Option<String>>,
}

impl Cli {
    fn request(&self) -> BackupRequest {
        BackupRequest {
            directory: self.directory.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            use_database: self.database,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.list_backups.is_none() && cli.directory.is_none() && !cli.database {
        init_console_logging(cli.verbose);
        error!("{}", UsageError::NoOperationSelected);
        return ExitCode::from(EXIT_USAGE);
    }

    let config = match config::load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            // No [logging] section to honour yet
            init_console_logging(cli.verbose);
            error!("Configuration error in {:?}: {}", cli.config, e);
            return ExitCode::from(EXIT_USAGE);
        }
    };

    let logging_config = LoggingConfig::from_settings(&config.logging, cli.verbose);
    let _log_guard = match init_logging(&logging_config) {
        Ok(guard) => Some(guard),
        Err(e) => {
            init_console_logging(cli.verbose);
            error!("File logging unavailable, logging to console only: {:#}", e);
            None
        }
    };

    match cli.list_backups {
        Some(ref name) => list_backups(config, name.as_deref()),
        None => run_backup(config, &cli.request()),
    }
}

fn run_backup(config: Config, request: &BackupRequest) -> ExitCode {
    let orchestrator = BackupOrchestrator::new(config);

    match orchestrator.run(request) {
        Ok(report) if report.succeeded() => {
            println!("✓ Backup completed successfully");
            for name in &report.uploaded {
                println!("  uploaded {}", name);
            }
            ExitCode::SUCCESS
        }
        Ok(report) => {
            let reason = report.failure.map(|f| f.message()).unwrap_or("unknown error");
            eprintln!("✗ Backup failed: {}", reason);
            ExitCode::from(EXIT_FAILED)
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::from(EXIT_USAGE)
        }
    }
}

fn list_backups(config: Config, name: Option<&str>) -> ExitCode {
    let orchestrator = BackupOrchestrator::new(config);

    match orchestrator.list_remote(name) {
        Ok(entries) => {
            info!("{} remote backup(s) found", entries.len());
            if entries.is_empty() {
                println!("No backups found");
            }
            for entry in &entries {
                println!("{}", entry);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to list remote backups: {}", e);
            ExitCode::from(EXIT_FAILED)
        }
    }
}
