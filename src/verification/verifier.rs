//! Three-tier verification with short-circuiting and unconditional
//! suggestion generation.

use std::sync::Arc;

use tracing::{info, warn};

use super::report::VerificationReport;
use super::sandbox::{Sandbox, TestSubject};
use crate::config::PipelineConfig;
use crate::extract;
use crate::gateway::{ChatRequest, ModelGateway};
use crate::pipeline::PipelineState;

const SUGGESTION_PROMPT_TEMPLATE: &str = r#"You are a {language} test quality reviewer. Given a generated test, the source code it targets, and the verification results so far, suggest concrete improvements.

If the test failed to build or run, focus the suggestions on fixing the failure. Otherwise focus on assertion quality, edge case coverage, and maintainability.

Return ONLY a valid JSON array of suggestion strings:
["suggestion 1", "suggestion 2"]"#;

pub struct TestVerifier {
    sandbox: Arc<dyn Sandbox>,
    gateway: Arc<dyn ModelGateway>,
    language: String,
}

impl TestVerifier {
    pub fn new(
        sandbox: Arc<dyn Sandbox>,
        gateway: Arc<dyn ModelGateway>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            sandbox,
            gateway,
            language: config.language.clone(),
        }
    }

    /// Verify every generated test in order, one report per test.
    pub async fn verify_all(&self, state: &PipelineState) -> Vec<VerificationReport> {
        if state.generated_tests.is_empty() {
            info!("No tests to verify");
            return Vec::new();
        }

        let source_code = state.source_code.as_deref().unwrap_or_default();
        let source_file_name = state
            .file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "source_under_test".into());

        let mut reports = Vec::with_capacity(state.generated_tests.len());
        for (index, test_code) in state.generated_tests.iter().enumerate() {
            info!(
                test = index + 1,
                total = state.generated_tests.len(),
                "Verifying generated test"
            );
            let subject = TestSubject {
                test_code,
                source_code,
                source_file_name: &source_file_name,
            };
            reports.push(self.verify_one(index, subject).await);
        }
        reports
    }

    /// One pass over one test: build, then run, then coverage, each tier
    /// gated on the previous one passing. Suggestions are generated
    /// unconditionally at the end — diagnosis is always attempted, the
    /// expensive tiers are not.
    async fn verify_one(&self, index: usize, subject: TestSubject<'_>) -> VerificationReport {
        let mut report = VerificationReport::new(index);

        match self.sandbox.build_check(subject).await {
            Ok(out) => {
                report.build_passed = out.passed;
                report.build_errors = out.diagnostics;
            }
            Err(e) => {
                warn!(test = index + 1, error = %e, "Sandbox failed during build check");
                report.infrastructure_failure = Some(e.to_string());
            }
        }

        if report.build_passed {
            match self.sandbox.run_check(subject).await {
                Ok(out) => {
                    report.tests_passed = out.passed;
                    report.test_failures = out.diagnostics;
                }
                Err(e) => {
                    warn!(test = index + 1, error = %e, "Sandbox failed during run check");
                    report.infrastructure_failure = Some(e.to_string());
                }
            }
        }

        if report.tests_passed {
            match self.sandbox.coverage_check(subject).await {
                Ok(out) => {
                    report.coverage_percentage = out.percentage;
                    report.coverage_report = out.report;
                }
                Err(e) => {
                    warn!(test = index + 1, error = %e, "Sandbox failed during coverage check");
                    report.infrastructure_failure = Some(e.to_string());
                }
            }
        }

        report.suggestions = self.generate_suggestions(subject, &report).await;
        info!(test = index + 1, summary = %report.summary(), "Verification pass complete");
        report
    }

    async fn generate_suggestions(
        &self,
        subject: TestSubject<'_>,
        report: &VerificationReport,
    ) -> Vec<String> {
        let results = serde_json::json!({
            "build_passed": report.build_passed,
            "tests_passed": report.tests_passed,
            "coverage_percentage": report.coverage_percentage,
            "build_errors": report.build_errors,
            "test_failures": report.test_failures,
            "infrastructure_failure": report.infrastructure_failure,
        });

        let system = SUGGESTION_PROMPT_TEMPLATE.replace("{language}", &self.language);
        let user = format!(
            "Generated test:\n```{lang}\n{test}\n```\n\nSource code:\n```{lang}\n{source}\n```\n\nVerification results:\n{results}",
            lang = self.language,
            test = subject.test_code,
            source = subject.source_code,
            results = results
        );

        match self.gateway.complete(ChatRequest::new(system, user)).await {
            Ok(reply) => match extract::extract_as::<Vec<String>>(&reply) {
                Ok(suggestions) => suggestions,
                Err(e) => {
                    warn!(error = %e, "Unparseable suggestion reply, using empty list");
                    Vec::new()
                }
            },
            Err(e) => {
                warn!(error = %e, "Suggestion model call failed, using empty list");
                Vec::new()
            }
        }
    }
}
