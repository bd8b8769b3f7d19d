//! The one-shot `scan` command

use colored::Colorize;

use super::Pipeline;
use crate::cli::Cli;
use crate::error::Result;

/// Reconcile every drawing in the downloads folder once.
pub async fn run_scan(cli: &Cli) -> Result<()> {
    let pipeline = Pipeline::build(cli)?;
    let summary = pipeline.watcher.scan().await;
    let snapshot = pipeline.stats.flush();
    let summary = summary?;

    let marker = if summary.failed == 0 {
        "OK".green().bold()
    } else {
        "FAILED".red().bold()
    };
    println!(
        "{} {} drawings reconciled, {} files promoted, {} backups created, {} failed",
        marker,
        summary.bases,
        snapshot.files_processed,
        snapshot.backups_created,
        summary.failed
    );

    summary.into_result()?;
    Ok(())
}
