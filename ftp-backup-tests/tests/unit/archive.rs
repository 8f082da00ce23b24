//! Unit tests for artifact production

use ftp_backup::config::DatabaseConfig;
use ftp_backup::error::ArchiveError;
use ftp_backup::job::ArtifactKind;
use ftp_backup::utils::archive::zip_directory;
use ftp_backup::utils::archive_ops::RealArchiver;
use std::fs::File;
use std::io::Read;
use std::time::Duration;
use test_utils::{ArchiveProducer, MockExecutor, MockResponse, TestContext};

fn mysql() -> DatabaseConfig {
    DatabaseConfig {
        backend: "mysql".to_string(),
        host: "localhost".to_string(),
        port: 3306,
        username: "root".to_string(),
        password: "db-secret".to_string(),
        database: Some("shop".to_string()),
    }
}

#[test]
fn test_zip_extracts_to_source_tree() {
    let ctx = TestContext::new();
    let site = ctx.create_source_tree();
    let destination = ctx.temp_dir().join("out/site.zip");

    zip_directory(&site, &destination).unwrap();

    let mut archive = zip::ZipArchive::new(File::open(&destination).unwrap()).unwrap();
    let mut contents = String::new();
    archive
        .by_name("css/style.css")
        .unwrap()
        .read_to_string(&mut contents)
        .unwrap();
    assert_eq!(contents, "body {}");
    assert!(archive.by_name("index.html").is_ok());
    assert!(archive.by_name("uploads/logo.png").is_ok());
}

#[test]
fn test_zip_missing_source() {
    let ctx = TestContext::new();
    let result = zip_directory(&ctx.temp_dir().join("nope"), &ctx.temp_dir().join("x.zip"));
    assert!(matches!(result, Err(ArchiveError::SourceUnreadable { .. })));
}

#[test]
fn test_real_archiver_names_artifact() {
    let ctx = TestContext::new();
    let site = ctx.create_source_tree();
    let prefix = ctx.temp_dir().join("staging/nightly_2024-01-05_03:00:00");

    let artifact = RealArchiver::new()
        .produce_directory_archive(&site, &prefix)
        .unwrap();

    assert_eq!(artifact.kind, ArtifactKind::Zip);
    assert_eq!(artifact.remote_name, "nightly_2024-01-05_03:00:00.zip");
    assert!(artifact.local_path.exists());
}

#[test]
fn test_dump_runs_through_executor() {
    let ctx = TestContext::new();
    let executor = MockExecutor::new();
    let archiver = RealArchiver::with_executor(Box::new(executor.clone()));
    let prefix = ctx.temp_dir().join("nightly_2024-01-05_03:00:00");

    let artifact = archiver
        .produce_database_dump(&mysql(), &prefix, Duration::from_secs(60))
        .unwrap();

    assert_eq!(artifact.remote_name, "nightly_2024-01-05_03:00:00.sql");
    let calls = executor.get_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].program, "mysqldump");
    assert!(calls[0].args.iter().all(|a| !a.contains("db-secret")));
    assert!(calls[0].env_keys.contains(&"MYSQL_PWD".to_string()));
}

#[test]
fn test_dump_failure() {
    let ctx = TestContext::new();
    let executor = MockExecutor::new().with_default_response(MockResponse::Failure {
        stderr: "Access denied".to_string(),
        exit_code: 2,
    });
    let archiver = RealArchiver::with_executor(Box::new(executor));

    let result = archiver.produce_database_dump(
        &mysql(),
        &ctx.temp_dir().join("nightly"),
        Duration::from_secs(60),
    );

    assert!(matches!(result, Err(ArchiveError::Dump { .. })));
}

#[test]
fn test_staging_inside_source_round_trips() {
    let ctx = TestContext::new();
    let site = ctx.create_source_tree();
    let prefix = site.join("staging/nightly_2024-01-05_03:00:00");

    let artifact = RealArchiver::new()
        .produce_directory_archive(&site, &prefix)
        .unwrap();

    let archive = zip::ZipArchive::new(File::open(&artifact.local_path).unwrap()).unwrap();
    let mut files: Vec<&str> = archive.file_names().filter(|n| !n.ends_with('/')).collect();
    files.sort();
    assert_eq!(files, vec!["css/style.css", "index.html", "uploads/logo.png"]);
}
