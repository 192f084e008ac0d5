//! Source file access for the pipeline.

use std::path::Path;

use thiserror::Error;
use tracing::debug;

/// Typed read failure. The pipeline stores the display form in
/// `PipelineState::source_code` instead of propagating it, so downstream
/// stages always see a well-typed state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReadFailure {
    #[error("Error: file not found at '{0}'")]
    NotFound(String),

    #[error("Error: could not decode '{0}', file may be binary")]
    Undecodable(String),

    #[error("Error: could not read '{path}': {reason}")]
    Unreadable { path: String, reason: String },
}

pub struct SourceReader;

impl SourceReader {
    /// Read the full content of a source file as UTF-8 text.
    pub async fn read(path: &Path) -> Result<String, ReadFailure> {
        debug!(path = %path.display(), "Reading source file");

        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ReadFailure::NotFound(path.display().to_string()));
            }
            Err(e) => {
                return Err(ReadFailure::Unreadable {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                });
            }
        };

        String::from_utf8(bytes)
            .map_err(|_| ReadFailure::Undecodable(path.display().to_string()))
    }
}
