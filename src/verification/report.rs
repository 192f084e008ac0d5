use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of one verification pass over one generated test. Fully
/// populated within a single pass and never mutated afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    /// Position of the test in `generated_tests`.
    pub test_index: usize,
    pub build_passed: bool,
    pub tests_passed: bool,
    /// 0.0 when the coverage tier was never reached.
    pub coverage_percentage: f64,
    pub build_errors: Vec<String>,
    pub test_failures: Vec<String>,
    /// Collaborator-defined shape, carried opaquely.
    pub coverage_report: Value,
    pub suggestions: Vec<String>,
    /// Set when the sandbox itself failed (spawn error, timeout, I/O)
    /// rather than the test under check; `tests_passed` stays false, but
    /// the two cases remain distinguishable downstream.
    pub infrastructure_failure: Option<String>,
    pub verified_at: DateTime<Utc>,
}

impl VerificationReport {
    pub fn new(test_index: usize) -> Self {
        Self {
            test_index,
            build_passed: false,
            tests_passed: false,
            coverage_percentage: 0.0,
            build_errors: Vec::new(),
            test_failures: Vec::new(),
            coverage_report: Value::Null,
            suggestions: Vec::new(),
            infrastructure_failure: None,
            verified_at: Utc::now(),
        }
    }

    /// True when every tier ran and passed with the sandbox healthy.
    pub fn is_clean(&self) -> bool {
        self.build_passed && self.tests_passed && self.infrastructure_failure.is_none()
    }

    pub fn summary(&self) -> String {
        if let Some(failure) = &self.infrastructure_failure {
            format!("test {}: sandbox failure: {}", self.test_index + 1, failure)
        } else if !self.build_passed {
            format!("test {}: build failed", self.test_index + 1)
        } else if !self.tests_passed {
            format!("test {}: run failed", self.test_index + 1)
        } else {
            format!(
                "test {}: passed, {:.1}% coverage",
                self.test_index + 1,
                self.coverage_percentage
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_report_defaults() {
        let report = VerificationReport::new(2);
        assert_eq!(report.test_index, 2);
        assert!(!report.build_passed);
        assert!(!report.tests_passed);
        assert_eq!(report.coverage_percentage, 0.0);
        assert!(report.suggestions.is_empty());
        assert!(report.infrastructure_failure.is_none());
        assert!(!report.is_clean());
    }

    #[test]
    fn test_clean_report() {
        let mut report = VerificationReport::new(0);
        report.build_passed = true;
        report.tests_passed = true;
        report.coverage_percentage = 87.5;
        assert!(report.is_clean());
        assert!(report.summary().contains("87.5%"));
    }

    #[test]
    fn test_infrastructure_failure_is_not_clean() {
        let mut report = VerificationReport::new(0);
        report.build_passed = true;
        report.tests_passed = true;
        report.infrastructure_failure = Some("sandbox died".into());
        assert!(!report.is_clean());
        assert!(report.summary().contains("sandbox failure"));
    }

    #[test]
    fn test_summary_names_the_failed_tier() {
        let report = VerificationReport::new(0);
        assert!(report.summary().contains("build failed"));

        let mut report = VerificationReport::new(0);
        report.build_passed = true;
        assert!(report.summary().contains("run failed"));
    }
}
