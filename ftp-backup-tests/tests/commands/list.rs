//! Tests for remote backup listing

use test_utils::{mixed_remote_listing, MockFailure, MockTransferClient, TestContext, TransferCall};

#[test]
fn test_list_all_backups() {
    let ctx = TestContext::with_minimal_config();
    let harness = ctx.harness(MockTransferClient::new().with_remote_files(mixed_remote_listing()));

    let entries = harness.orchestrator.list_remote(None).unwrap();

    // Without a name the whole remote directory is listed, in server order
    assert_eq!(entries.len(), 10);
    assert_eq!(entries[0].name, "nightly_2024-01-01_03:00:00.zip");
    assert_eq!(entries[9].name, "README.txt");
}

#[test]
fn test_list_one_family_with_sizes() {
    let ctx = TestContext::with_minimal_config();
    let transfer = MockTransferClient::new()
        .with_remote_files(mixed_remote_listing())
        .with_size("weekly_2024-01-02_04:00:00.zip", 2048);
    let harness = ctx.harness(transfer);

    let entries = harness.orchestrator.list_remote(Some("weekly")).unwrap();

    assert_eq!(entries.len(), 3);
    assert_eq!(entries[1].size, Some(2048));
    assert_eq!(
        entries[1].to_string(),
        "weekly_2024-01-02_04:00:00.zip\t2048 bytes"
    );
}

#[test]
fn test_list_without_size_support() {
    let ctx = TestContext::with_minimal_config();
    let transfer = MockTransferClient::new()
        .with_remote_files(mixed_remote_listing())
        .without_size_support();
    let harness = ctx.harness(transfer);

    let entries = harness.orchestrator.list_remote(Some("nightly")).unwrap();

    assert_eq!(entries.len(), 6);
    assert!(entries.iter().all(|e| e.size.is_none()));
    assert!(entries[0].to_string().ends_with("? bytes"));
}

#[test]
fn test_list_empty_directory() {
    let ctx = TestContext::with_minimal_config();
    let harness = ctx.harness(MockTransferClient::new());

    let entries = harness.orchestrator.list_remote(None).unwrap();

    assert!(entries.is_empty());
    assert_eq!(harness.transfer.close_count(), 1);
}

#[test]
fn test_list_connection_refused() {
    let ctx = TestContext::with_minimal_config();
    let harness = ctx.harness(MockTransferClient::new().with_failing_connect(MockFailure::Refused));

    assert!(harness.orchestrator.list_remote(None).is_err());
    assert_eq!(harness.transfer.close_count(), 0);
}

#[test]
fn test_list_failure_still_closes_session() {
    let ctx = TestContext::with_minimal_config();
    let harness = ctx.harness(MockTransferClient::new().with_failing_list());

    assert!(harness.orchestrator.list_remote(None).is_err());
    assert_eq!(
        harness.transfer.count(|c| matches!(c, TransferCall::Close)),
        1
    );
}
