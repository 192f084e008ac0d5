//! Batch driver: walk a source tree, run the pipeline per file, collect
//! outcomes.
//!
//! Files are independent, isolatable units — each gets a fresh
//! `PipelineState`, and no failure in one file aborts the batch.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ignore::WalkBuilder;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::ForgeConfig;
use crate::error::{ForgeError, Result};
use crate::gateway::ModelGateway;
use crate::output::ArtifactWriter;
use crate::pipeline::{PipelineState, Scheduler};
use crate::verification::{Sandbox, TestVerifier, VerificationReport};

#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub source_path: String,
    pub artifact_path: Option<String>,
    pub scenarios: usize,
    pub tests_written: usize,
    pub verification: Vec<VerificationReport>,
    pub error: Option<String>,
}

impl FileOutcome {
    /// A file counts as succeeded when at least one test was generated and
    /// its artifact landed on disk.
    pub fn succeeded(&self) -> bool {
        self.error.is_none() && self.tests_written > 0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub outcomes: Vec<FileOutcome>,
}

pub struct Driver {
    config: ForgeConfig,
    gateway: Arc<dyn ModelGateway>,
    scheduler: Scheduler,
    verifier: Option<TestVerifier>,
    artifacts: ArtifactWriter,
}

impl Driver {
    pub fn new(config: ForgeConfig, gateway: Arc<dyn ModelGateway>) -> Self {
        let scheduler = Scheduler::new(Arc::clone(&gateway), &config.pipeline);
        let artifacts = ArtifactWriter::new(&config.output);
        Self {
            config,
            gateway,
            scheduler,
            verifier: None,
            artifacts,
        }
    }

    /// Enable the verification pass over every generated test.
    pub fn with_sandbox(mut self, sandbox: Arc<dyn Sandbox>) -> Self {
        self.verifier = Some(TestVerifier::new(
            sandbox,
            Arc::clone(&self.gateway),
            &self.config.pipeline,
        ));
        self
    }

    /// Collect eligible source files under a root, sorted for a stable
    /// processing order. Test artifacts, cache directories, and package
    /// initializers are excluded.
    pub fn discover(&self, root: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkBuilder::new(root)
            .build()
            .flatten()
            .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
            .map(|entry| entry.into_path())
            .filter(|path| self.is_eligible(path))
            .collect();
        files.sort();
        files
    }

    fn is_eligible(&self, path: &Path) -> bool {
        let driver = &self.config.driver;

        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        if ext != driver.source_extension {
            return false;
        }

        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        if driver.skip_files.iter().any(|f| f == name) {
            return false;
        }

        // Anything already recognizable as a test artifact is skipped.
        let stem = name.trim_end_matches(&format!(".{}", ext));
        if name.contains("test_") || stem.ends_with("test") {
            return false;
        }

        !path.components().any(|component| {
            driver
                .skip_dirs
                .iter()
                .any(|dir| component.as_os_str() == dir.as_str())
        })
    }

    /// Run the pipeline over a single file or every eligible file under a
    /// directory.
    pub async fn run(&self, root: &Path) -> Result<RunSummary> {
        let files = if root.is_file() {
            vec![root.to_path_buf()]
        } else {
            self.discover(root)
        };
        if files.is_empty() {
            return Err(ForgeError::NoSourceFiles(root.display().to_string()));
        }

        info!(files = files.len(), "Starting test generation run");

        let mut outcomes = Vec::with_capacity(files.len());
        for (index, file) in files.iter().enumerate() {
            info!(
                file = %file.display(),
                index = index + 1,
                total = files.len(),
                "Processing source file"
            );
            outcomes.push(self.process_file(file).await);
        }

        let succeeded = outcomes.iter().filter(|o| o.succeeded()).count();
        Ok(RunSummary {
            processed: outcomes.len(),
            succeeded,
            failed: outcomes.len() - succeeded,
            outcomes,
        })
    }

    async fn process_file(&self, file: &Path) -> FileOutcome {
        let state = self.scheduler.run(PipelineState::new(file)).await;

        let mut outcome = FileOutcome {
            source_path: file.display().to_string(),
            artifact_path: None,
            scenarios: state.test_scenarios.len(),
            tests_written: state.generated_tests.len(),
            verification: Vec::new(),
            error: None,
        };

        if state.generated_tests.is_empty() {
            warn!(file = %file.display(), "No tests generated");
            return outcome;
        }

        match self.artifacts.write(&state).await {
            Ok(path) => outcome.artifact_path = Some(path.display().to_string()),
            Err(e) => {
                warn!(file = %file.display(), error = %e, "Failed to write test artifact");
                outcome.error = Some(e.to_string());
                return outcome;
            }
        }

        if let Some(verifier) = &self.verifier {
            outcome.verification = verifier.verify_all(&state).await;
        }

        outcome
    }
}
