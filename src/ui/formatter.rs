//! Pure formatting functions for UI output.
//!
//! This module contains all display/formatting logic separated from user interaction.
//! Styling goes through `console`, which drops colors when the output is not a terminal.

use console::style;

use crate::pipeline::{Outcome, Stage, StageOutcome, STAGES};
use crate::version::{Diagnostic, Version};

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Format and print a non-fatal warning to stderr.
pub fn display_warning(message: &str) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), message);
}

/// Warn about something odd found while reading the manifest version.
pub fn display_diagnostic(diagnostic: &Diagnostic) {
    display_warning(&format!("manifest: {}", diagnostic));
}

/// Echo an external command before it runs.
pub fn display_command(command_line: &str) {
    println!("  {} {}", style("$").dim(), style(command_line).cyan());
}

/// Print the heading for a stage, e.g. `[3/10] Updating primary manifest`.
pub fn display_stage(stage: Stage) {
    println!(
        "\n{} {}",
        style(format!("[{}/{}]", stage.number(), STAGES.len())).dim(),
        style(stage.description()).bold()
    );
}

/// Show the version transition.
///
/// # Arguments
/// * `current` - Version found in the manifest
/// * `next` - Version that will be released
pub fn display_version_change(current: &Version, next: &Version) {
    println!("  From: {}", style(current).red());
    println!("  To:   {}", style(next).green());
}

/// Single-line label for a recorded outcome.
pub fn outcome_label(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Completed(detail) => format!("done     {}", detail),
        Outcome::Simulated(detail) => format!("dry run  {}", detail),
        Outcome::Skipped(reason) => format!("skipped  {}", reason),
        Outcome::Failed(reason) => format!("FAILED   {}", reason),
    }
}

/// Print one line per stage that ran, followed by the stages that never ran.
///
/// # Arguments
/// * `outcomes` - Recorded outcomes in execution order
pub fn display_release_summary(outcomes: &[StageOutcome]) {
    println!("\n{}", style("Release summary:").bold());
    for recorded in outcomes {
        let line = format!("  {:<26} {}", recorded.stage.name(), outcome_label(&recorded.outcome));
        match recorded.outcome {
            Outcome::Failed(_) => println!("{}", style(line).red()),
            Outcome::Skipped(_) | Outcome::Simulated(_) => println!("{}", style(line).dim()),
            Outcome::Completed(_) => println!("{}", line),
        }
    }
    for descriptor in STAGES.iter().skip(outcomes.len()) {
        println!(
            "{}",
            style(format!("  {:<26} not run", descriptor.stage.name())).dim()
        );
    }
}
