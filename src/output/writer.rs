use std::io::{self, Write};

use serde::Serialize;

use crate::cli::OutputFormat;
use crate::driver::RunSummary;

/// Emits run results in the configured output format.
///
/// Supports three output modes:
/// - Text: Human-readable formatted output (default)
/// - Json: Single JSON object at completion
/// - Stream: NDJSON streaming (one JSON object per line)
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Emit the final run summary.
    pub fn emit_summary(&self, summary: &RunSummary) {
        match self.format {
            OutputFormat::Text => self.print_text_summary(summary),
            OutputFormat::Json => self.write_json(summary),
            OutputFormat::Stream => {
                for outcome in &summary.outcomes {
                    self.write_json(outcome);
                }
                self.write_json(&StreamTotals::from(summary));
            }
        }
    }

    /// Emit a simple message.
    pub fn emit_message(&self, message: &str) {
        match self.format {
            OutputFormat::Text => println!("{}", message),
            OutputFormat::Json | OutputFormat::Stream => {
                self.write_json(&MessageOutput {
                    message: message.to_string(),
                });
            }
        }
    }

    fn write_json<T: Serialize>(&self, value: &T) {
        if let Ok(json) = serde_json::to_string(value) {
            let mut stdout = io::stdout().lock();
            let _ = writeln!(stdout, "{}", json);
            let _ = stdout.flush();
        }
    }

    fn print_text_summary(&self, summary: &RunSummary) {
        println!();
        println!(
            "Processed {} file(s): {} succeeded, {} failed",
            summary.processed, summary.succeeded, summary.failed
        );

        for outcome in &summary.outcomes {
            println!();
            println!("{}", outcome.source_path);
            println!(
                "  Scenarios: {}  Tests written: {}",
                outcome.scenarios, outcome.tests_written
            );
            if let Some(path) = &outcome.artifact_path {
                println!("  Saved to: {}", path);
            }
            if let Some(error) = &outcome.error {
                println!("  Error: {}", error);
            }
            for report in &outcome.verification {
                println!("  {}", report.summary());
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct StreamTotals {
    processed: usize,
    succeeded: usize,
    failed: usize,
}

impl From<&RunSummary> for StreamTotals {
    fn from(summary: &RunSummary) -> Self {
        Self {
            processed: summary.processed,
            succeeded: summary.succeeded,
            failed: summary.failed,
        }
    }
}

#[derive(Debug, Serialize)]
struct MessageOutput {
    message: String,
}
