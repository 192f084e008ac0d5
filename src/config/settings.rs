use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::{ForgeError, Result};

pub const CONFIG_FILE_NAME: &str = "testforge.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ForgeConfig {
    pub gateway: GatewayConfig,
    pub pipeline: PipelineConfig,
    pub verification: VerificationConfig,
    pub output: OutputConfig,
    pub driver: DriverConfig,
}

impl ForgeConfig {
    /// Load from the given path, falling back to defaults when the file
    /// does not exist.
    pub async fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let content = fs::read_to_string(path).await?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        let content =
            toml::to_string_pretty(self).map_err(|e| ForgeError::Config(e.to_string()))?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Validate configuration values for consistency and safety.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.gateway.model.is_empty() {
            errors.push("gateway.model must not be empty");
        }
        if self.gateway.api_key_env.is_empty() {
            errors.push("gateway.api_key_env must not be empty");
        }
        if self.gateway.timeout_secs == 0 {
            errors.push("gateway.timeout_secs must be greater than 0");
        }
        if !(0.0..=2.0).contains(&self.gateway.temperature) {
            errors.push("gateway.temperature must be between 0.0 and 2.0");
        }

        if self.pipeline.language.is_empty() {
            errors.push("pipeline.language must not be empty");
        }
        if self.pipeline.framework.is_empty() {
            errors.push("pipeline.framework must not be empty");
        }
        if self.pipeline.path_snippet_chars == 0 {
            errors.push("pipeline.path_snippet_chars must be greater than 0");
        }
        if self.pipeline.writer_snippet_chars == 0 {
            errors.push("pipeline.writer_snippet_chars must be greater than 0");
        }

        if self.verification.command_timeout_secs == 0 {
            errors.push("verification.command_timeout_secs must be greater than 0");
        }
        if !self.verification.build_cmd.contains("{test}") {
            errors.push("verification.build_cmd must reference the {test} placeholder");
        }
        if !self.verification.run_cmd.contains("{test}") {
            errors.push("verification.run_cmd must reference the {test} placeholder");
        }
        if self.verification.test_file_name.is_empty() {
            errors.push("verification.test_file_name must not be empty");
        }

        if self.output.dir.is_empty() {
            errors.push("output.dir must not be empty");
        }
        if self.output.extension.is_empty() {
            errors.push("output.extension must not be empty");
        }

        if self.driver.source_extension.is_empty() {
            errors.push("driver.source_extension must not be empty");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ForgeError::Config(errors.join("; ")))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// OpenAI-compatible endpoint root.
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    /// Environment variable holding the API credential.
    pub api_key_env: String,
    /// Per-call timeout. A slow or hung call degrades that stage instead
    /// of stalling the whole batch.
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".into(),
            model: "gpt-4".into(),
            temperature: 0.1,
            api_key_env: "OPENAI_API_KEY".into(),
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Language of the sources under analysis; also names the code fence
    /// tag expected in writer replies.
    pub language: String,
    /// Test framework named in the writer prompt. The emitted code is
    /// treated as opaque text either way.
    pub framework: String,
    /// Character budget for the source snippet sent to the path mapper.
    pub path_snippet_chars: usize,
    /// Character budget for the source snippet sent to the test writer.
    pub writer_snippet_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            language: "python".into(),
            framework: "pytest".into(),
            path_snippet_chars: 2000,
            writer_snippet_chars: 1500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    /// Build/syntax check command. `{test}` and `{source}` expand to the
    /// candidate test and source file names inside the sandbox directory.
    pub build_cmd: String,
    /// Test execution command.
    pub run_cmd: String,
    /// Coverage measurement command.
    pub coverage_cmd: String,
    /// JSON coverage report the coverage command leaves in the sandbox,
    /// if any.
    pub coverage_json: String,
    /// File name the candidate test is materialized under.
    pub test_file_name: String,
    pub command_timeout_secs: u64,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            build_cmd: "python -m py_compile {test}".into(),
            run_cmd: "python -m pytest {test} -q".into(),
            coverage_cmd: "python -m pytest {test} -q --cov --cov-report=json".into(),
            coverage_json: "coverage.json".into(),
            test_file_name: "test_generated.py".into(),
            command_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory generated test files are written to. Kept distinct from
    /// the input tree.
    pub dir: String,
    /// Extension of generated test files.
    pub extension: String,
    /// Line-comment prefix for provenance headers.
    pub comment_prefix: String,
    /// Lines written between the provenance header and the first test.
    pub preamble: Vec<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: "generated_tests".into(),
            extension: "py".into(),
            comment_prefix: "#".into(),
            preamble: vec![
                "import pytest".into(),
                "from unittest.mock import Mock, patch".into(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Extension of eligible source files.
    pub source_extension: String,
    /// Directories skipped entirely while walking.
    pub skip_dirs: Vec<String>,
    /// Exact file names that are never eligible (package initializers).
    pub skip_files: Vec<String>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            source_extension: "py".into(),
            skip_dirs: vec!["__pycache__".into()],
            skip_files: vec!["__init__.py".into()],
        }
    }
}
