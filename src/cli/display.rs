use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::driver::RunSummary;
use crate::utils::truncate_at_boundary;

pub struct Display;

impl Display {
    pub fn new() -> Self {
        Self
    }

    pub fn print_header(&self, text: &str) {
        println!();
        println!("{}", style(text).bold().cyan());
        println!("{}", style("═".repeat(60)).dim());
        println!();
    }

    pub fn print_success(&self, message: &str) {
        println!("{} {}", style("✓").green().bold(), message);
    }

    pub fn print_error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red().bold(), message);
    }

    pub fn print_warning(&self, message: &str) {
        println!("{} {}", style("!").yellow().bold(), message);
    }

    pub fn print_info(&self, message: &str) {
        println!("{} {}", style("·").dim(), message);
    }

    pub fn create_spinner(&self, message: &str) -> ProgressBar {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(std::time::Duration::from_millis(100));
        spinner
    }

    pub fn print_run_summary(&self, summary: &RunSummary) {
        self.print_header("Test Generation Summary");

        println!(
            "{:<48} {:>10} {:>7} {:>10}",
            "Source", "Scenarios", "Tests", "Status"
        );
        println!("{}", style("-".repeat(78)).dim());

        for outcome in &summary.outcomes {
            let source = truncate_at_boundary(&outcome.source_path, 46);
            let status = if outcome.succeeded() {
                style("ok").green()
            } else {
                style("failed").red()
            };
            println!(
                "{:<48} {:>10} {:>7} {:>10}",
                source, outcome.scenarios, outcome.tests_written, status
            );
        }

        println!();
        if summary.failed == 0 {
            self.print_success(&format!("All {} file(s) processed", summary.processed));
        } else {
            self.print_warning(&format!(
                "{}/{} file(s) produced no tests",
                summary.failed, summary.processed
            ));
        }
    }
}

impl Default for Display {
    fn default() -> Self {
        Self::new()
    }
}
