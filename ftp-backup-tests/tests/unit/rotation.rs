//! Unit tests for retention selection and remote rotation

use ftp_backup::config::ServerEndpoint;
use ftp_backup::job::{ArtifactKind, NamePattern};
use ftp_backup::managers::rotation::{select_expired, RotationPolicy};
use rstest::rstest;
use test_utils::{
    dated_artifacts, mixed_remote_listing, MockTransferClient, TransferCall, TransferClient,
};

fn endpoint() -> ServerEndpoint {
    ServerEndpoint {
        host: "ftp.test".to_string(),
        port: 21,
        username: "backup".to_string(),
        password: "secret".to_string(),
        timeout_seconds: 5,
    }
}

#[rstest]
#[case(0, 0, 0)]
#[case(5, 0, 0)]
#[case(2, 3, 0)]
#[case(3, 3, 0)]
#[case(4, 3, 1)]
#[case(10, 3, 7)]
#[case(10, 1, 9)]
fn test_select_expired(#[case] listed: u32, #[case] retention: u32, #[case] expected: usize) {
    let listing = dated_artifacts("nightly", "zip", listed);
    let expired = select_expired(&listing, retention);

    assert_eq!(expired.len(), expected);
    // Always the oldest, in listing order
    assert_eq!(expired, listing[..expected].to_vec());
}

#[rstest]
#[case(ArtifactKind::Zip, vec!["nightly_2024-01-01_03:00:00.zip"])]
#[case(ArtifactKind::Dump, vec!["nightly_2024-01-01_03:00:00.sql"])]
fn test_rotation_only_touches_one_family_and_kind(
    #[case] kind: ArtifactKind,
    #[case] expected: Vec<&str>,
) {
    let client = MockTransferClient::new().with_remote_files(mixed_remote_listing());
    let mut session = client.connect(&endpoint()).unwrap();

    let deleted = RotationPolicy::new(2)
        .rotate(session.as_mut(), &NamePattern::new("nightly", Some(kind)))
        .unwrap();

    assert_eq!(deleted, expected);
    let remote = client.remote_files();
    assert_eq!(remote.iter().filter(|f| f.starts_with("weekly_")).count(), 3);
    assert!(remote.contains(&"README.txt".to_string()));
}

#[test]
fn test_rotation_with_retention_above_listing() {
    let client =
        MockTransferClient::new().with_remote_files(dated_artifacts("nightly", "zip", 2));
    let mut session = client.connect(&endpoint()).unwrap();

    let deleted = RotationPolicy::new(5)
        .rotate(session.as_mut(), &NamePattern::new("nightly", Some(ArtifactKind::Zip)))
        .unwrap();

    assert!(deleted.is_empty());
    assert_eq!(client.count(|c| matches!(c, TransferCall::Delete { .. })), 0);
}

#[test]
fn test_rotation_list_failure() {
    let client = MockTransferClient::new().with_failing_list();
    let mut session = client.connect(&endpoint()).unwrap();

    let result = RotationPolicy::new(3)
        .rotate(session.as_mut(), &NamePattern::new("nightly", Some(ArtifactKind::Zip)));

    assert!(result.is_err());
}
