//! Operator-facing sweep output

use colored::Colorize;
use monocyte_cloud::{DeleteOutcome, HandlerReport, SweepObserver};

/// Prints sweep progress to stdout as it happens
pub struct ConsoleObserver;

impl SweepObserver for ConsoleObserver {
    fn on_handler_start(&mut self, service: &str) {
        println!("\n---- checking {} resources", service.cyan());
    }

    fn on_violation(&mut self, _service: &str, description: &str, region: &str) {
        println!(
            "\n{}\n\t{}",
            description,
            format!("WARNING: region '{}' not allowed!", region)
                .yellow()
                .bold()
        );
    }

    fn on_delete(&mut self, _service: &str, _resource_id: &str, outcome: &DeleteOutcome) {
        let line = match outcome {
            DeleteOutcome::Deleted => "deleted".red().bold(),
            DeleteOutcome::DryRun { .. } => outcome.to_string().blue(),
            DeleteOutcome::Skipped { .. } => outcome.to_string().dimmed(),
            DeleteOutcome::Failed { .. } => outcome.to_string().red(),
        };
        println!("\t{}", line);
    }

    fn on_handler_finished(&mut self, report: &HandlerReport) {
        if !report.is_success() {
            return;
        }
        println!(
            "{} {} inspected, {} violations ({}ms)",
            "✓".green(),
            report.inspected,
            report.violations.len(),
            report.duration_ms
        );
    }

    fn on_handler_failed(&mut self, service: &str, error: &str) {
        eprintln!("{} {}: {}", "✗".red().bold(), service, error);
    }
}
