//! Core module - telemetry context, logging and shutdown plumbing

mod telemetry;

pub use telemetry::{MemoryProbe, MetricsSnapshot, StageMetrics, StageStats, Telemetry};

use anyhow::Result;
use tokio::sync::broadcast;
use tracing::{info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Install the process-wide tracing subscriber.
///
/// `RUST_LOG` wins over `level` when set.
pub fn init_tracing(level: Level, verbose: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(verbose)
        .with_file(verbose)
        .with_line_number(verbose)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Broadcast Ctrl-C to every subscriber of `shutdown`
pub fn spawn_ctrl_c(shutdown: broadcast::Sender<()>) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received, cleaning up...");
                let _ = shutdown.send(());
            }
            Err(e) => warn!("Ctrl-C handler unavailable: {}", e),
        }
    });
}
