//! Deployment log reading over bundles on disk

mod common;

use bundlediag::bundle::{BundleError, FsLogsReader, LineFilter, PodLogsReader, contains};
use common::BundleBuilder;

fn logs_reader(fixture: &BundleBuilder) -> FsLogsReader {
    FsLogsReader::new(fixture.path().join("logs"))
}

#[tokio::test]
async fn filter_keeps_matching_lines_in_file_order() {
    let fixture = BundleBuilder::new();
    fixture.log(
        "ns",
        "x-5d9c7b8f4-abcde",
        "manager",
        &[
            "starting manager",
            "reconciling foo/first",
            "nothing to do",
            "reconciling bar",
            "done with foo/second",
        ],
    );

    let lines = logs_reader(&fixture)
        .logs_from_deployment("x", "ns", &[contains("foo")])
        .await
        .unwrap();

    assert_eq!(lines, vec!["reconciling foo/first", "done with foo/second"]);
}

#[tokio::test]
async fn every_filter_must_accept_a_line() {
    let fixture = BundleBuilder::new();
    fixture.log(
        "capt-system",
        "capt-controller-manager-7d4-x1",
        "manager",
        &[
            "machine=a state=ready",
            "machine=b state=error",
            "machine=a state=error",
        ],
    );

    let filters: Vec<LineFilter> = vec![contains("machine=a"), contains("error")];
    let lines = logs_reader(&fixture)
        .logs_from_deployment("capt-controller-manager", "capt-system", &filters)
        .await
        .unwrap();
    assert_eq!(lines, vec!["machine=a state=error"]);

    let all = logs_reader(&fixture)
        .logs_from_deployment("capt-controller-manager", "capt-system", &[])
        .await
        .unwrap();
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn pods_are_read_in_name_order_and_others_ignored() {
    let fixture = BundleBuilder::new();
    fixture
        .log("ns", "x-b", "manager", &["from b"])
        .log("ns", "x-a", "manager", &["from a"])
        .log("ns", "y-a", "manager", &["from another deployment"]);

    let lines = logs_reader(&fixture)
        .logs_from_deployment("x", "ns", &[])
        .await
        .unwrap();
    assert_eq!(lines, vec!["from a", "from b"]);
}

#[tokio::test]
async fn pod_with_several_log_files_is_unsupported() {
    let fixture = BundleBuilder::new();
    fixture
        .log("ns", "x-a", "manager", &["one"])
        .log("ns", "x-a", "kube-rbac-proxy", &["two"]);

    let err = logs_reader(&fixture)
        .logs_from_deployment("x", "ns", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, BundleError::UnsupportedLogFormat { files: 2, .. }));
}

#[tokio::test]
async fn missing_namespace_is_an_io_error() {
    let fixture = BundleBuilder::new();
    fixture.log("ns", "x-a", "manager", &["one"]);

    let err = logs_reader(&fixture)
        .logs_from_deployment("x", "other", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, BundleError::Io { .. }));
}
