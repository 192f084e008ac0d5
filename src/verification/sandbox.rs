//! Build/run/coverage collaborator for candidate tests.

use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::VerificationConfig;
use crate::utils::truncate_with_marker;

const MAX_DIAGNOSTIC_BYTES: usize = 4000;

/// A candidate test paired with the source it exercises. The source keeps
/// its original file name inside the sandbox so the test's imports resolve.
#[derive(Debug, Clone, Copy)]
pub struct TestSubject<'a> {
    pub test_code: &'a str,
    pub source_code: &'a str,
    pub source_file_name: &'a str,
}

/// Sandbox-level failure: the check never ran to a verdict. Distinct from
/// a check that ran and failed.
#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("sandbox I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("{name} check timed out after {secs}s")]
    Timeout { name: &'static str, secs: u64 },
}

#[derive(Debug, Clone)]
pub struct CheckOutput {
    pub passed: bool,
    /// Empty when the check passed.
    pub diagnostics: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CoverageOutput {
    pub percentage: f64,
    pub report: Value,
}

#[async_trait]
pub trait Sandbox: Send + Sync {
    async fn build_check(&self, subject: TestSubject<'_>) -> Result<CheckOutput, SandboxError>;
    async fn run_check(&self, subject: TestSubject<'_>) -> Result<CheckOutput, SandboxError>;
    async fn coverage_check(&self, subject: TestSubject<'_>)
        -> Result<CoverageOutput, SandboxError>;
}

/// Runs configured shell commands against the subject materialized in a
/// fresh temporary directory per check.
pub struct ProcessSandbox {
    config: VerificationConfig,
}

impl ProcessSandbox {
    pub fn new(config: VerificationConfig) -> Self {
        Self { config }
    }

    async fn materialize(&self, subject: TestSubject<'_>) -> Result<tempfile::TempDir, SandboxError> {
        let dir = tempfile::tempdir()?;
        tokio::fs::write(dir.path().join(subject.source_file_name), subject.source_code).await?;
        tokio::fs::write(dir.path().join(&self.config.test_file_name), subject.test_code).await?;
        Ok(dir)
    }

    fn expand(&self, template: &str, subject: TestSubject<'_>) -> String {
        template
            .replace("{test}", &self.config.test_file_name)
            .replace("{source}", subject.source_file_name)
    }

    async fn run_command(
        &self,
        name: &'static str,
        cmd: &str,
        working_dir: &Path,
    ) -> Result<std::process::Output, SandboxError> {
        let start = Instant::now();
        let timeout = Duration::from_secs(self.config.command_timeout_secs);
        debug!(check = name, cmd, dir = %working_dir.display(), "Running sandbox command");

        let mut command = Command::new("sh");
        command.args(["-c", cmd]).current_dir(working_dir);

        match tokio::time::timeout(timeout, command.output()).await {
            Ok(Ok(output)) => {
                debug!(
                    check = name,
                    status = %output.status,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Sandbox command finished"
                );
                Ok(output)
            }
            Ok(Err(e)) => {
                warn!(check = name, error = %e, "Sandbox command failed to run");
                Err(SandboxError::Io(e))
            }
            Err(_) => {
                warn!(check = name, timeout_secs = timeout.as_secs(), "Sandbox command timed out");
                Err(SandboxError::Timeout {
                    name,
                    secs: timeout.as_secs(),
                })
            }
        }
    }

    fn check_output(output: std::process::Output) -> CheckOutput {
        let passed = output.status.success();
        let diagnostics = if passed {
            Vec::new()
        } else {
            let combined = format!(
                "{}\n{}",
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
            vec![truncate_with_marker(combined.trim(), MAX_DIAGNOSTIC_BYTES)]
        };
        CheckOutput { passed, diagnostics }
    }

    async fn read_coverage_report(&self, dir: &Path) -> Option<Value> {
        if self.config.coverage_json.is_empty() {
            return None;
        }
        let path = dir.join(&self.config.coverage_json);
        let content = tokio::fs::read_to_string(&path).await.ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Coverage percentage: prefer the JSON report's totals, fall back to
    /// the last percentage printed on stdout.
    fn coverage_percentage(report: Option<&Value>, stdout: &str) -> f64 {
        if let Some(percent) = report
            .and_then(|r| r.pointer("/totals/percent_covered"))
            .and_then(Value::as_f64)
        {
            return percent;
        }

        let pattern = Regex::new(r"(\d+(?:\.\d+)?)%").ok();
        pattern
            .and_then(|re| {
                re.captures_iter(stdout)
                    .last()
                    .and_then(|c| c.get(1))
                    .and_then(|m| m.as_str().parse::<f64>().ok())
            })
            .unwrap_or(0.0)
    }
}

#[async_trait]
impl Sandbox for ProcessSandbox {
    async fn build_check(&self, subject: TestSubject<'_>) -> Result<CheckOutput, SandboxError> {
        let dir = self.materialize(subject).await?;
        let cmd = self.expand(&self.config.build_cmd, subject);
        let output = self.run_command("build", &cmd, dir.path()).await?;
        Ok(Self::check_output(output))
    }

    async fn run_check(&self, subject: TestSubject<'_>) -> Result<CheckOutput, SandboxError> {
        let dir = self.materialize(subject).await?;
        let cmd = self.expand(&self.config.run_cmd, subject);
        let output = self.run_command("run", &cmd, dir.path()).await?;
        Ok(Self::check_output(output))
    }

    async fn coverage_check(
        &self,
        subject: TestSubject<'_>,
    ) -> Result<CoverageOutput, SandboxError> {
        let dir = self.materialize(subject).await?;
        let cmd = self.expand(&self.config.coverage_cmd, subject);
        let output = self.run_command("coverage", &cmd, dir.path()).await?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let report = self.read_coverage_report(dir.path()).await;
        let percentage = Self::coverage_percentage(report.as_ref(), &stdout);

        Ok(CoverageOutput {
            percentage,
            report: report.unwrap_or_else(|| json!({ "stdout": stdout })),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject<'a>() -> TestSubject<'a> {
        TestSubject {
            test_code: "assert True",
            source_code: "x = 1",
            source_file_name: "calculator.py",
        }
    }

    fn sandbox(build: &str, run: &str) -> ProcessSandbox {
        ProcessSandbox::new(VerificationConfig {
            build_cmd: build.into(),
            run_cmd: run.into(),
            coverage_cmd: "echo 'TOTAL 12 3 75%' # {test}".into(),
            coverage_json: String::new(),
            test_file_name: "test_generated.py".into(),
            command_timeout_secs: 10,
        })
    }

    #[test]
    fn test_template_expansion() {
        let sb = sandbox("check {test} against {source}", "true # {test}");
        let cmd = sb.expand(&sb.config.build_cmd, subject());
        assert_eq!(cmd, "check test_generated.py against calculator.py");
    }

    #[test]
    fn test_coverage_percentage_prefers_report_totals() {
        let report = serde_json::json!({"totals": {"percent_covered": 91.3}});
        let percent = ProcessSandbox::coverage_percentage(Some(&report), "TOTAL 50%");
        assert!((percent - 91.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_coverage_percentage_falls_back_to_stdout() {
        let percent = ProcessSandbox::coverage_percentage(None, "lines 10\nTOTAL   75%\n");
        assert!((percent - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_coverage_percentage_defaults_to_zero() {
        assert_eq!(ProcessSandbox::coverage_percentage(None, "no numbers here"), 0.0);
    }

    #[tokio::test]
    async fn test_build_check_passes_for_successful_command() {
        let sb = sandbox("true # {test}", "true # {test}");
        let out = sb.build_check(subject()).await.unwrap();
        assert!(out.passed);
        assert!(out.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_build_check_captures_diagnostics_on_failure() {
        let sb = sandbox("echo boom >&2; false # {test}", "true # {test}");
        let out = sb.build_check(subject()).await.unwrap();
        assert!(!out.passed);
        assert!(out.diagnostics[0].contains("boom"));
    }

    #[tokio::test]
    async fn test_run_check_sees_materialized_files() {
        let sb = sandbox("true # {test}", "test -f {test} && test -f {source}");
        let out = sb.run_check(subject()).await.unwrap();
        assert!(out.passed);
    }

    #[tokio::test]
    async fn test_coverage_check_parses_stdout_percentage() {
        let sb = sandbox("true # {test}", "true # {test}");
        let out = sb.coverage_check(subject()).await.unwrap();
        assert!((out.percentage - 75.0).abs() < f64::EPSILON);
        assert!(out.report.get("stdout").is_some());
    }

    #[tokio::test]
    async fn test_command_timeout_is_infrastructure_failure() {
        let sb = ProcessSandbox::new(VerificationConfig {
            build_cmd: "sleep 5 # {test}".into(),
            run_cmd: "true # {test}".into(),
            coverage_cmd: "true # {test}".into(),
            coverage_json: String::new(),
            test_file_name: "test_generated.py".into(),
            command_timeout_secs: 1,
        });
        let result = sb.build_check(subject()).await;
        assert!(matches!(result, Err(SandboxError::Timeout { .. })));
    }
}
