//! The long-running `watch` command

use tracing::info;

use super::Pipeline;
use crate::cli::Cli;
use crate::error::Result;

/// Scan, then watch until SIGINT/SIGTERM.
pub async fn run_watch(cli: &Cli) -> Result<()> {
    let pipeline = Pipeline::build(cli)?;
    let flusher = pipeline
        .stats
        .spawn_periodic_flush(pipeline.config.stats_interval);

    let outcome: Result<()> = tokio::select! {
        result = pipeline.watcher.run() => result.map_err(Into::into),
        signal = shutdown_signal() => signal
            .map(|name| info!("Received {}, shutting down", name))
            .map_err(Into::into),
    };

    flusher.abort();
    pipeline.watcher.aggregator().cancel_all();
    pipeline.stats.flush();
    outcome
}

#[cfg(unix)]
async fn shutdown_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = sigint.recv() => Ok("SIGINT"),
        _ = sigterm.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("Ctrl-C")
}
