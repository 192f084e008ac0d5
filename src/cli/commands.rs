use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "testforge")]
#[command(author, version, about = "LLM-powered unit test generator", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(short, long, global = true, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Path to testforge.toml (default: ./testforge.toml)
    #[arg(long, global = true, env = "TESTFORGE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Output format for CLI results.
/// - Text: Human-readable text output (default)
/// - Json: Single JSON object at completion
/// - Stream: NDJSON streaming (one JSON object per line)
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Stream,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default testforge.toml in the current directory
    Init,

    /// Generate tests for a source file or directory tree
    Generate {
        /// Source file or directory
        path: PathBuf,

        /// Output directory for generated test files
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Verify each generated test (build, run, coverage) after writing
        #[arg(long)]
        verify: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Reset to defaults
    Reset,
}
