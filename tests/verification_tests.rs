mod fixtures;

use std::sync::Arc;

use fixtures::mock_gateway::{MockGateway, MockGatewayBuilder};
use fixtures::mock_sandbox::{MockSandbox, TierOutcome};
use testforge::config::PipelineConfig;
use testforge::gateway::ModelGateway;
use testforge::pipeline::PipelineState;
use testforge::verification::{Sandbox, TestVerifier};

const SUGGESTION_KEY: &str = "test quality reviewer";

fn suggestion_reply() -> String {
    r#"```json
["add a boundary assertion", "mock the file system"]
```"#
        .to_string()
}

fn state_with_tests(count: usize) -> PipelineState {
    PipelineState {
        source_code: Some("def add(a, b):\n    return a + b\n".into()),
        generated_tests: (0..count)
            .map(|i| format!("def test_{}(): pass", i))
            .collect(),
        ..PipelineState::new("app/calculator.py")
    }
}

fn verifier(sandbox: &Arc<MockSandbox>, gateway: &Arc<MockGateway>) -> TestVerifier {
    TestVerifier::new(
        Arc::clone(sandbox) as Arc<dyn Sandbox>,
        Arc::clone(gateway) as Arc<dyn ModelGateway>,
        &PipelineConfig::default(),
    )
}

#[tokio::test]
async fn test_all_tiers_pass() {
    let sandbox = Arc::new(MockSandbox::all_passing());
    let gateway = Arc::new(
        MockGatewayBuilder::new()
            .text_response(SUGGESTION_KEY, suggestion_reply())
            .build(),
    );

    let reports = verifier(&sandbox, &gateway)
        .verify_all(&state_with_tests(2))
        .await;

    assert_eq!(reports.len(), 2);
    for (i, report) in reports.iter().enumerate() {
        assert_eq!(report.test_index, i);
        assert!(report.build_passed);
        assert!(report.tests_passed);
        assert!((report.coverage_percentage - 85.0).abs() < f64::EPSILON);
        assert!(report.infrastructure_failure.is_none());
        assert_eq!(report.suggestions.len(), 2);
        assert!(report.is_clean());
    }

    assert_eq!(sandbox.build_calls(), 2);
    assert_eq!(sandbox.run_calls(), 2);
    assert_eq!(sandbox.coverage_calls(), 2);
    gateway.assert_called(SUGGESTION_KEY, 2);
}

#[tokio::test]
async fn test_build_failure_short_circuits_run_and_coverage() {
    let sandbox = Arc::new(MockSandbox::new(
        TierOutcome::Fail,
        TierOutcome::Pass,
        TierOutcome::Pass,
    ));
    let gateway = Arc::new(
        MockGatewayBuilder::new()
            .text_response(SUGGESTION_KEY, suggestion_reply())
            .build(),
    );

    let reports = verifier(&sandbox, &gateway)
        .verify_all(&state_with_tests(1))
        .await;

    let report = &reports[0];
    assert!(!report.build_passed);
    assert!(!report.tests_passed);
    assert_eq!(report.coverage_percentage, 0.0);
    assert!(report.build_errors[0].contains("SyntaxError"));

    // The expensive tiers never ran, but diagnosis still did.
    assert_eq!(sandbox.run_calls(), 0);
    assert_eq!(sandbox.coverage_calls(), 0);
    assert!(!report.suggestions.is_empty());
    gateway.assert_called(SUGGESTION_KEY, 1);
}

#[tokio::test]
async fn test_run_failure_short_circuits_coverage_only() {
    let sandbox = Arc::new(MockSandbox::new(
        TierOutcome::Pass,
        TierOutcome::Fail,
        TierOutcome::Pass,
    ));
    let gateway = Arc::new(
        MockGatewayBuilder::new()
            .text_response(SUGGESTION_KEY, suggestion_reply())
            .build(),
    );

    let reports = verifier(&sandbox, &gateway)
        .verify_all(&state_with_tests(1))
        .await;

    let report = &reports[0];
    assert!(report.build_passed);
    assert!(!report.tests_passed);
    assert!(report.test_failures[0].contains("AssertionError"));
    assert_eq!(report.coverage_percentage, 0.0);
    assert!(report.infrastructure_failure.is_none());

    assert_eq!(sandbox.run_calls(), 1);
    assert_eq!(sandbox.coverage_calls(), 0);
}

#[tokio::test]
async fn test_infrastructure_failure_is_distinct_from_test_failure() {
    let sandbox = Arc::new(MockSandbox::new(
        TierOutcome::Infrastructure,
        TierOutcome::Pass,
        TierOutcome::Pass,
    ));
    let gateway = Arc::new(
        MockGatewayBuilder::new()
            .text_response(SUGGESTION_KEY, suggestion_reply())
            .build(),
    );

    let reports = verifier(&sandbox, &gateway)
        .verify_all(&state_with_tests(1))
        .await;

    let report = &reports[0];
    assert!(!report.build_passed);
    assert!(!report.tests_passed);
    assert!(report.infrastructure_failure.is_some());
    // A broken sandbox is not a test failure.
    assert!(report.build_errors.is_empty());
    assert!(report.test_failures.is_empty());
    // Suggestions are still attempted for a totally broken pass.
    assert!(!report.suggestions.is_empty());

    assert_eq!(sandbox.run_calls(), 0);
    assert_eq!(sandbox.coverage_calls(), 0);
}

#[tokio::test]
async fn test_empty_generated_tests_yields_no_reports() {
    let sandbox = Arc::new(MockSandbox::all_passing());
    let gateway = Arc::new(MockGateway::new());

    let reports = verifier(&sandbox, &gateway)
        .verify_all(&state_with_tests(0))
        .await;

    assert!(reports.is_empty());
    assert_eq!(sandbox.build_calls(), 0);
    assert_eq!(gateway.total_calls(), 0);
}

#[tokio::test]
async fn test_unparseable_suggestion_reply_degrades_to_empty_list() {
    let sandbox = Arc::new(MockSandbox::all_passing());
    let gateway = Arc::new(
        MockGatewayBuilder::new()
            .text_response(SUGGESTION_KEY, "I have no structured suggestions.")
            .build(),
    );

    let reports = verifier(&sandbox, &gateway)
        .verify_all(&state_with_tests(1))
        .await;

    assert!(reports[0].suggestions.is_empty());
    // The degraded suggestion pass did not affect the check results.
    assert!(reports[0].is_clean());
}

#[tokio::test]
async fn test_reports_are_ordered_by_test_position() {
    let sandbox = Arc::new(MockSandbox::all_passing());
    let gateway = Arc::new(
        MockGatewayBuilder::new()
            .text_response(SUGGESTION_KEY, suggestion_reply())
            .build(),
    );

    let reports = verifier(&sandbox, &gateway)
        .verify_all(&state_with_tests(3))
        .await;

    let indices: Vec<_> = reports.iter().map(|r| r.test_index).collect();
    assert_eq!(indices, [0, 1, 2]);
}
