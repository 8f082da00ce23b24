//! Tests for a backup run
//!
//! A run archives, uploads, rotates and notifies; failures end it early
//! with exactly one failure notification.

use ftp_backup::error::{FailureKind, JobError};
use ftp_backup::job::BackupRequest;
use ftp_backup::managers::backup::RunState;
use test_utils::{
    dated_artifacts, ArchiveCall, ConfigBuilder, Harness, MockArchiver, MockFailure,
    MockMailRelay, MockTransferClient, TestContext, TransferCall,
};

fn directory_request(ctx: &TestContext) -> BackupRequest {
    BackupRequest {
        directory: Some(ctx.create_source_tree()),
        ..Default::default()
    }
}

fn both_request(ctx: &TestContext) -> BackupRequest {
    BackupRequest {
        use_database: true,
        ..directory_request(ctx)
    }
}

#[test]
fn test_run_directory_backup() {
    let ctx = TestContext::from_builder(ConfigBuilder::minimal().with_retention(3));
    let harness = ctx.harness(MockTransferClient::new());
    let job = harness.job_on(&directory_request(&ctx), 5);

    let report = harness.orchestrator.run_job(&job);

    assert!(report.succeeded());
    assert_eq!(report.uploaded, vec!["nightly_2024-01-05_03:00:00.zip"]);
    assert_eq!(harness.relay.sent_count(), 1);
    assert_eq!(harness.relay.sent()[0].body, "Backup finished successfully");
}

#[test]
fn test_run_uploads_zip_before_dump() {
    let ctx = TestContext::from_builder(ConfigBuilder::minimal().with_mysql(None));
    let harness = ctx.harness(MockTransferClient::new());
    let job = harness.job_on(&both_request(&ctx), 5);

    let report = harness.orchestrator.run_job(&job);

    assert!(report.succeeded());
    let uploads: Vec<TransferCall> = harness
        .transfer
        .get_calls()
        .into_iter()
        .filter(|c| matches!(c, TransferCall::Upload { .. }))
        .collect();
    assert_eq!(
        uploads,
        vec![
            TransferCall::Upload {
                name: "nightly_2024-01-05_03:00:00.zip".to_string()
            },
            TransferCall::Upload {
                name: "nightly_2024-01-05_03:00:00.sql".to_string()
            },
        ]
    );
    assert!(matches!(
        harness.archiver.get_calls()[1],
        ArchiveCall::Dump { .. }
    ));
}

#[test]
fn test_run_rotates_old_remote_copies() {
    let ctx = TestContext::from_builder(ConfigBuilder::minimal().with_retention(3));
    let transfer =
        MockTransferClient::new().with_remote_files(dated_artifacts("nightly", "zip", 4));
    let harness = ctx.harness(transfer);
    let job = harness.job_on(&directory_request(&ctx), 5);

    let report = harness.orchestrator.run_job(&job);

    assert!(report.states.contains(&RunState::Rotating));
    assert_eq!(report.rotated.len(), 2);
    let remote = harness.transfer.remote_files();
    assert_eq!(remote.len(), 3);
    assert_eq!(remote.last().unwrap(), "nightly_2024-01-05_03:00:00.zip");
}

#[test]
fn test_rotation_failure_does_not_fail_run() {
    let listing = dated_artifacts("nightly", "zip", 4);
    let ctx = TestContext::from_builder(ConfigBuilder::minimal().with_retention(1));
    let transfer = MockTransferClient::new()
        .with_remote_files(listing.clone())
        .with_failing_delete(&listing[0]);
    let harness = ctx.harness(transfer);

    let report = harness
        .orchestrator
        .run_job(&harness.job_on(&directory_request(&ctx), 5));

    assert!(report.succeeded());
    // The other expired copies are still deleted and reported
    assert_eq!(report.rotated, listing[1..].to_vec());
    assert!(harness.transfer.remote_files().contains(&listing[0]));
}

#[test]
fn test_run_name_override() {
    let ctx = TestContext::from_builder(ConfigBuilder::minimal());
    let harness = ctx.harness(MockTransferClient::new());
    let request = BackupRequest {
        name: Some("weekly".to_string()),
        ..directory_request(&ctx)
    };

    let report = harness.orchestrator.run_job(&harness.job_on(&request, 5));

    assert_eq!(report.uploaded, vec!["weekly_2024-01-05_03:00:00.zip"]);
}

#[test]
fn test_run_email_override() {
    let ctx = TestContext::from_builder(ConfigBuilder::minimal());
    let harness = ctx.harness(MockTransferClient::new());
    let request = BackupRequest {
        email: Some("oncall@example.com".to_string()),
        ..directory_request(&ctx)
    };

    harness.orchestrator.run_job(&harness.job_on(&request, 5));

    let sent = harness.relay.sent();
    assert_eq!(sent[0].to.email.to_string(), "oncall@example.com");
    assert_eq!(sent[0].subject, "Backup report");
}

#[test]
fn test_run_database_without_section() {
    let ctx = TestContext::from_builder(ConfigBuilder::minimal());
    let harness = ctx.harness(MockTransferClient::new());
    let request = BackupRequest {
        use_database: true,
        ..Default::default()
    };

    let result = harness.orchestrator.run(&request);

    assert!(matches!(result, Err(JobError::Config(_))));
    assert!(!harness.transfer.connect_called());
}

#[test]
fn test_run_without_sources() {
    let ctx = TestContext::from_builder(ConfigBuilder::minimal());
    let harness = ctx.harness(MockTransferClient::new());

    let result = harness.orchestrator.run(&BackupRequest::default());

    assert!(matches!(result, Err(JobError::Usage(_))));
}

#[test]
fn test_upload_failure_keeps_artifacts() {
    let ctx = TestContext::from_builder(ConfigBuilder::minimal().with_mysql(None));
    let transfer = MockTransferClient::new().with_failing_upload(".sql", MockFailure::Refused);
    let harness = ctx.harness(transfer);

    let report = harness
        .orchestrator
        .run_job(&harness.job_on(&both_request(&ctx), 5));

    assert_eq!(report.state(), RunState::Failed);
    assert_eq!(report.failure, Some(FailureKind::Upload));
    assert_eq!(report.uploaded, vec!["nightly_2024-01-05_03:00:00.zip"]);
    assert!(report.artifacts.iter().all(|a| a.local_path.exists()));
    assert_eq!(harness.relay.sent_count(), 1);
    assert_eq!(harness.relay.sent()[0].body, "error while uploading file");
    assert!(!harness.transfer.list_called());
}

#[test]
fn test_connect_timeout_message() {
    let ctx = TestContext::from_builder(ConfigBuilder::minimal());
    let transfer = MockTransferClient::new().with_failing_connect(MockFailure::Timeout);
    let harness = ctx.harness(transfer);

    let report = harness
        .orchestrator
        .run_job(&harness.job_on(&directory_request(&ctx), 5));

    assert_eq!(report.failure, Some(FailureKind::Timeout));
    assert_eq!(
        harness.relay.sent()[0].body,
        "ftp connection timeout exceeded"
    );
}

#[test]
fn test_archive_failure_message() {
    let (config, _temp) = ConfigBuilder::minimal().persist();
    let ctx = TestContext::new();
    let harness = Harness::new(
        config,
        MockArchiver::new().with_failing_directory(),
        MockTransferClient::new(),
        MockMailRelay::new(),
    );

    let report = harness
        .orchestrator
        .run_job(&harness.job_on(&directory_request(&ctx), 5));

    assert_eq!(
        report.states,
        vec![
            RunState::Init,
            RunState::Configured,
            RunState::Archiving,
            RunState::Failed
        ]
    );
    assert_eq!(harness.relay.sent()[0].body, "error while creating backup");
    assert!(harness.transfer.get_calls().is_empty());
}

#[test]
fn test_failure_without_notification_section() {
    let ctx = TestContext::from_builder(ConfigBuilder::new());
    let transfer = MockTransferClient::new().with_failing_connect(MockFailure::Refused);
    let harness = ctx.harness(transfer);

    let report = harness
        .orchestrator
        .run_job(&harness.job_on(&directory_request(&ctx), 5));

    assert_eq!(report.state(), RunState::Failed);
    assert!(!report.notified);
    assert_eq!(harness.relay.sent_count(), 0);
}
