//! End-to-end runs against a local status server

use std::time::Duration;

use pageup::{DescriptionDocument, Harness, HarnessOptions, Outcome};
use pageup_testkit::{DescriptionDir, RecordingReporter, StatusServer, unreachable_url};

fn dogfood(server: &StatusServer) -> DescriptionDocument {
    DescriptionDocument::new(server.base_url())
        .with_endpoint("/401", 401)
        .with_endpoint("/404", 404)
        .with_endpoint("/500", 500)
        .with_ok("/")
        .with_ok("/200")
}

#[tokio::test]
async fn test_dogfood_description_file() {
    let server = StatusServer::start().await;
    let dir = DescriptionDir::new();
    dir.write("sample.description.json", &dogfood(&server));

    let harness =
        Harness::from_options(HarnessOptions::default().with_file(dir.pattern("*.json")));
    let reporter = RecordingReporter::new();

    let summary = harness.run(&reporter).await.unwrap();

    assert_eq!(summary.total, 5);
    assert!(summary.all_passed());
    assert!(reporter.completed_once());
    assert_eq!(reporter.done_calls(), vec![None]);
    assert_eq!(server.hits(), 5);

    for status in [401, 404, 500] {
        let result = reporter
            .result_for(server.url(&format!("/{status}")).as_str())
            .unwrap();
        assert_eq!(result.error, None);
        assert_eq!(result.actual_status, Some(status));
        assert_eq!(result.expected_status, status);
    }
}

#[tokio::test]
async fn test_mismatch_is_reported_not_raised() {
    let server = StatusServer::start().await;
    let harness = Harness::from_options(HarnessOptions::default().with_description(
        DescriptionDocument::new(server.base_url()).with_endpoint("/500", 200),
    ));
    let reporter = RecordingReporter::new();

    let summary = harness.run(&reporter).await.unwrap();

    assert_eq!(summary.mismatched, 1);
    let result = &reporter.results()[0];
    assert_eq!(result.error, None);
    assert_eq!(result.actual_status, Some(500));
    assert_eq!(result.expected_status, 200);
    assert_eq!(result.outcome, Outcome::Mismatch);
    assert_eq!(reporter.done_calls(), vec![None]);
}

#[tokio::test]
async fn test_unreachable_target_is_transport_error() {
    let server = StatusServer::start().await;
    let unreachable = unreachable_url();
    let harness = Harness::from_options(
        HarnessOptions::default()
            .with_description(DescriptionDocument::new(server.base_url()).with_ok("/"))
            .with_descriptions(vec![
                DescriptionDocument::new(unreachable.as_str()).with_endpoint("/", 404),
            ]),
    );
    let reporter = RecordingReporter::new();

    let summary = harness.run(&reporter).await.unwrap();

    assert_eq!(summary.total, 2);
    assert_eq!(summary.passed, 1);
    assert_eq!(summary.errored, 1);

    let failed = reporter.result_for(unreachable.as_str()).unwrap();
    assert!(failed.error.is_some());
    assert_eq!(failed.actual_status, None);
    assert_eq!(failed.expected_status, 404);
    assert!(reporter.completed_once());
}

#[tokio::test]
async fn test_timeout_is_transport_error() {
    let server = StatusServer::start().await;
    let harness = Harness::from_options(
        HarnessOptions::default()
            .with_description(DescriptionDocument::new(server.base_url()).with_ok("/slow"))
            .with_timeout(Duration::from_millis(200)),
    );
    let reporter = RecordingReporter::new();

    let summary = harness.run(&reporter).await.unwrap();

    assert_eq!(summary.errored, 1);
    let result = &reporter.results()[0];
    assert!(result.error.as_deref().unwrap().contains("timed out"));
    assert_eq!(result.actual_status, None);
    assert!(reporter.completed_once());
}

#[tokio::test]
async fn test_redirect_followed_by_default() {
    let server = StatusServer::start().await;
    let harness = Harness::from_options(HarnessOptions::default().with_description(
        DescriptionDocument::new(server.base_url()).with_ok("/redirect"),
    ));
    let reporter = RecordingReporter::new();

    let summary = harness.run(&reporter).await.unwrap();

    assert!(summary.all_passed());
    let result = reporter
        .result_for(server.url("/redirect").as_str())
        .unwrap();
    assert_eq!(result.actual_status, Some(200));
    // The redirect and its target
    assert_eq!(server.hits(), 2);
}

#[tokio::test]
async fn test_redirect_reported_when_not_followed() {
    let server = StatusServer::start().await;
    let harness = Harness::from_options(
        HarnessOptions::default()
            .with_description(
                DescriptionDocument::new(server.base_url()).with_endpoint("/redirect", 301),
            )
            .with_follow_redirects(false),
    );
    let reporter = RecordingReporter::new();

    let summary = harness.run(&reporter).await.unwrap();

    assert!(summary.all_passed());
    assert_eq!(server.hits(), 1);
}

#[tokio::test]
async fn test_malformed_file_sends_nothing() {
    let server = StatusServer::start().await;
    let dir = DescriptionDir::new();
    dir.write("a.json", &dogfood(&server));
    dir.write_raw("b.json", "{ \"baseurl\": ");

    let harness = Harness::from_options(
        HarnessOptions::default()
            .with_description(DescriptionDocument::new(server.base_url()).with_ok("/"))
            .with_file(dir.pattern("*.json")),
    );
    let reporter = RecordingReporter::new();

    assert!(harness.run(&reporter).await.is_err());

    assert!(reporter.results().is_empty());
    let done = reporter.done_calls();
    assert_eq!(done.len(), 1);
    assert!(done[0].as_deref().unwrap().contains("parse"));
    assert_eq!(server.hits(), 0);
}

#[tokio::test]
async fn test_files_override_inline_and_each_other() {
    let server = StatusServer::start().await;
    let dir = DescriptionDir::new();
    dir.write(
        "a.json",
        &DescriptionDocument::new(server.base_url()).with_endpoint("/404", 200),
    );
    dir.write(
        "b.json",
        &DescriptionDocument::new(server.base_url()).with_endpoint("/404", 404),
    );

    let harness = Harness::from_options(
        HarnessOptions::default()
            .with_description(DescriptionDocument::new(server.base_url()).with_endpoint("/404", 500))
            .with_files([dir.pattern("b.json"), dir.pattern("*.json")]),
    );
    let reporter = RecordingReporter::new();

    let summary = harness.run(&reporter).await.unwrap();

    assert_eq!(summary.total, 1);
    assert_eq!(reporter.results()[0].expected_status, 404);
    assert!(summary.all_passed());
}

#[tokio::test]
async fn test_file_without_expectations_sends_nothing() {
    let dir = DescriptionDir::new();
    dir.write_value(
        "empty.json",
        &serde_json::json!({ "baseurl": "http://localhost:3000" }),
    );

    let harness =
        Harness::from_options(HarnessOptions::default().with_file(dir.pattern("*.json")));
    let reporter = RecordingReporter::new();

    let summary = harness.run(&reporter).await.unwrap();

    assert_eq!(summary.total, 0);
    assert!(reporter.results().is_empty());
    assert!(reporter.completed_once());
}

#[tokio::test]
async fn test_runs_are_independent() {
    let server = StatusServer::start().await;
    let mut harness = Harness::from_options(
        HarnessOptions::default()
            .with_description(DescriptionDocument::new(server.base_url()).with_ok("/")),
    );

    let first = RecordingReporter::new();
    harness.run(&first).await.unwrap();

    harness.configure(HarnessOptions::default().with_description(
        DescriptionDocument::new(server.base_url()).with_endpoint("/404", 404),
    ));
    let second = RecordingReporter::new();
    harness.run(&second).await.unwrap();

    assert_eq!(first.results().len(), 1);
    assert_eq!(second.results().len(), 1);
    assert_eq!(second.results()[0].url, server.url("/404").as_str());
    assert!(first.completed_once() && second.completed_once());
}
