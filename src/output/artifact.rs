use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::config::OutputConfig;
use crate::error::Result;
use crate::pipeline::PipelineState;

/// Writes the per-source-file test artifact: every successfully generated
/// test blob in order, each under a provenance comment, below a file
/// header and the configured preamble lines.
pub struct ArtifactWriter {
    dir: PathBuf,
    extension: String,
    comment_prefix: String,
    preamble: Vec<String>,
}

impl ArtifactWriter {
    pub fn new(config: &OutputConfig) -> Self {
        Self {
            dir: PathBuf::from(&config.dir),
            extension: config.extension.clone(),
            comment_prefix: config.comment_prefix.clone(),
            preamble: config.preamble.clone(),
        }
    }

    pub fn artifact_path(&self, source: &Path) -> PathBuf {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "source".into());
        self.dir.join(format!("test_{}.{}", stem, self.extension))
    }

    pub async fn write(&self, state: &PipelineState) -> Result<PathBuf> {
        let path = self.artifact_path(&state.file_path);
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, self.render(state)).await?;
        Ok(path)
    }

    fn render(&self, state: &PipelineState) -> String {
        let p = &self.comment_prefix;
        let mut content = String::new();

        content.push_str(&format!("{} Auto-generated tests\n", p));
        content.push_str(&format!("{} Source file: {}\n", p, state.file_path.display()));
        content.push_str(&format!(
            "{} Generated by testforge on {}\n\n",
            p,
            Utc::now().format("%Y-%m-%d %H:%M UTC")
        ));

        for line in &self.preamble {
            content.push_str(line);
            content.push('\n');
        }
        if !self.preamble.is_empty() {
            content.push('\n');
        }

        for (index, test) in state.generated_tests.iter().enumerate() {
            content.push_str(&format!("{} Test {}\n", p, index + 1));
            content.push_str(test);
            content.push_str("\n\n");
        }

        content
    }
}
