//! Directory archiving and database dump routines

use super::executor::CommandExecutor;
use crate::config::{DatabaseBackend, DatabaseConfig};
use crate::error::ArchiveError;
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Compress the tree under `source` into a zip file at `destination`
///
/// Entries are added in sorted path order with a fixed timestamp, so the same
/// tree always yields the same archive.
pub fn zip_directory(source: &Path, destination: &Path) -> Result<(), ArchiveError> {
    let metadata = fs::metadata(source).map_err(|e| ArchiveError::SourceUnreadable {
        path: source.to_path_buf(),
        message: e.to_string(),
    })?;
    if !metadata.is_dir() {
        return Err(ArchiveError::SourceUnreadable {
            path: source.to_path_buf(),
            message: "not a directory".to_string(),
        });
    }

    ensure_parent(destination)?;
    let file = File::create(destination).map_err(|e| ArchiveError::DestinationUnwritable {
        path: destination.to_path_buf(),
        source: e,
    })?;

    // Both sides canonical, so the archive being written is skipped when it
    // sits inside the source tree
    let source = fs::canonicalize(source).map_err(|e| ArchiveError::SourceUnreadable {
        path: source.to_path_buf(),
        message: e.to_string(),
    })?;
    let own_output =
        fs::canonicalize(destination).map_err(|e| ArchiveError::DestinationUnwritable {
            path: destination.to_path_buf(),
            source: e,
        })?;

    info!("Archiving {:?} to {:?}", source, destination);

    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
        .unix_permissions(0o644);
    let dir_options = options.unix_permissions(0o755);

    let mut file_count = 0usize;
    let entries = WalkDir::new(&source)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.path() != own_output);
    for entry in entries {
        let entry = entry.map_err(|e| ArchiveError::SourceUnreadable {
            path: e.path().unwrap_or(&source).to_path_buf(),
            message: e.to_string(),
        })?;

        let relative = match entry.path().strip_prefix(&source) {
            Ok(rel) if !rel.as_os_str().is_empty() => rel,
            _ => continue,
        };
        let name = entry_name(relative);

        if entry.file_type().is_dir() {
            zip.add_directory(name, dir_options)?;
        } else if entry.file_type().is_file() {
            let mut input = File::open(entry.path()).map_err(|e| ArchiveError::SourceUnreadable {
                path: entry.path().to_path_buf(),
                message: e.to_string(),
            })?;
            zip.start_file(name, options)?;
            io::copy(&mut input, &mut zip).map_err(|e| ArchiveError::DestinationUnwritable {
                path: destination.to_path_buf(),
                source: e,
            })?;
            file_count += 1;
        } else {
            debug!("Skipping special file {:?}", entry.path());
        }
    }

    let mut writer = zip.finish()?;
    io::Write::flush(&mut writer).map_err(|e| ArchiveError::DestinationUnwritable {
        path: destination.to_path_buf(),
        source: e,
    })?;

    info!("Archived {} file(s) into {:?}", file_count, destination);
    Ok(())
}

/// Zip entry name with `/` separators regardless of platform
fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn ensure_parent(destination: &Path) -> Result<(), ArchiveError> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(|e| ArchiveError::DestinationUnwritable {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}

/// Program, arguments and environment for one backend's dump
pub struct DumpCommand {
    pub program: &'static str,
    pub args: Vec<String>,
    pub envs: Vec<(&'static str, String)>,
}

/// Build the dump invocation; the password travels in the environment
pub fn dump_command(
    backend: DatabaseBackend,
    spec: &DatabaseConfig,
    destination: &Path,
) -> DumpCommand {
    let output = destination.to_string_lossy().into_owned();
    let port = spec.port.to_string();

    match backend {
        DatabaseBackend::Mysql => {
            let mut args = vec![
                format!("--host={}", spec.host),
                format!("--port={}", port),
                format!("--user={}", spec.username),
                format!("--result-file={}", output),
                "--single-transaction".to_string(),
            ];
            match spec.database {
                Some(ref db) => args.push(db.clone()),
                None => args.push("--all-databases".to_string()),
            }
            DumpCommand {
                program: "mysqldump",
                args,
                envs: vec![("MYSQL_PWD", spec.password.clone())],
            }
        }
        DatabaseBackend::Postgresql => {
            let mut args = vec![
                format!("--host={}", spec.host),
                format!("--port={}", port),
                format!("--username={}", spec.username),
                format!("--file={}", output),
                "--no-password".to_string(),
            ];
            let program = match spec.database {
                Some(ref db) => {
                    args.push(db.clone());
                    "pg_dump"
                }
                None => "pg_dumpall",
            };
            DumpCommand {
                program,
                args,
                envs: vec![("PGPASSWORD", spec.password.clone())],
            }
        }
    }
}

/// Dump the configured database into `destination`
pub fn dump_database(
    executor: &dyn CommandExecutor,
    spec: &DatabaseConfig,
    destination: &Path,
    timeout: Duration,
) -> Result<(), ArchiveError> {
    let backend: DatabaseBackend = spec
        .backend
        .parse()
        .map_err(ArchiveError::UnsupportedBackend)?;

    ensure_parent(destination)?;

    let command = dump_command(backend, spec, destination);
    info!(
        "Dumping {} database on {}:{} to {:?}",
        backend, spec.host, spec.port, destination
    );

    let args: Vec<&str> = command.args.iter().map(String::as_str).collect();
    let envs: Vec<(&str, &str)> = command
        .envs
        .iter()
        .map(|(k, v)| (*k, v.as_str()))
        .collect();

    executor
        .run_command(command.program, &args, &envs, Some(timeout))
        .map_err(|e| ArchiveError::Dump {
            backend: backend.to_string(),
            message: e.to_string(),
        })?;

    info!("Database dump written to {:?}", destination);
    Ok(())
}
