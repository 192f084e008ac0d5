//! Mock sandbox with per-tier programmable outcomes and call counters.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::json;

use testforge::verification::{
    CheckOutput, CoverageOutput, Sandbox, SandboxError, TestSubject,
};

/// What a tier should report when reached.
#[derive(Debug, Clone, Copy)]
pub enum TierOutcome {
    Pass,
    Fail,
    Infrastructure,
}

pub struct MockSandbox {
    pub build: TierOutcome,
    pub run: TierOutcome,
    pub coverage: TierOutcome,
    pub coverage_percentage: f64,
    build_calls: AtomicUsize,
    run_calls: AtomicUsize,
    coverage_calls: AtomicUsize,
}

impl MockSandbox {
    pub fn new(build: TierOutcome, run: TierOutcome, coverage: TierOutcome) -> Self {
        Self {
            build,
            run,
            coverage,
            coverage_percentage: 85.0,
            build_calls: AtomicUsize::new(0),
            run_calls: AtomicUsize::new(0),
            coverage_calls: AtomicUsize::new(0),
        }
    }

    pub fn all_passing() -> Self {
        Self::new(TierOutcome::Pass, TierOutcome::Pass, TierOutcome::Pass)
    }

    pub fn build_calls(&self) -> usize {
        self.build_calls.load(Ordering::SeqCst)
    }

    pub fn run_calls(&self) -> usize {
        self.run_calls.load(Ordering::SeqCst)
    }

    pub fn coverage_calls(&self) -> usize {
        self.coverage_calls.load(Ordering::SeqCst)
    }

    fn check(outcome: TierOutcome, failure_message: &str) -> Result<CheckOutput, SandboxError> {
        match outcome {
            TierOutcome::Pass => Ok(CheckOutput {
                passed: true,
                diagnostics: Vec::new(),
            }),
            TierOutcome::Fail => Ok(CheckOutput {
                passed: false,
                diagnostics: vec![failure_message.to_string()],
            }),
            TierOutcome::Infrastructure => Err(SandboxError::Timeout {
                name: "mock",
                secs: 1,
            }),
        }
    }
}

#[async_trait]
impl Sandbox for MockSandbox {
    async fn build_check(&self, _subject: TestSubject<'_>) -> Result<CheckOutput, SandboxError> {
        self.build_calls.fetch_add(1, Ordering::SeqCst);
        Self::check(self.build, "SyntaxError: invalid syntax")
    }

    async fn run_check(&self, _subject: TestSubject<'_>) -> Result<CheckOutput, SandboxError> {
        self.run_calls.fetch_add(1, Ordering::SeqCst);
        Self::check(self.run, "AssertionError: expected 3, got 4")
    }

    async fn coverage_check(
        &self,
        _subject: TestSubject<'_>,
    ) -> Result<CoverageOutput, SandboxError> {
        self.coverage_calls.fetch_add(1, Ordering::SeqCst);
        match self.coverage {
            TierOutcome::Infrastructure => Err(SandboxError::Timeout {
                name: "mock",
                secs: 1,
            }),
            _ => Ok(CoverageOutput {
                percentage: self.coverage_percentage,
                report: json!({"totals": {"percent_covered": self.coverage_percentage}}),
            }),
        }
    }
}
