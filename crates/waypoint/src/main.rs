//! Waypoint CLI binary.

use anyhow::Result;
use tracing_subscriber::EnvFilter;
use waypoint::cli::Cli;

/// Main entry point for the waypoint CLI.
///
/// Commands run their I/O sequentially, so a current-thread runtime is enough.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Controlled via RUST_LOG, e.g. RUST_LOG=waypoint=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("waypoint=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Starting waypoint CLI");

    let cli = Cli::parse_args();
    cli.execute().await?;

    tracing::debug!("Waypoint CLI completed successfully");
    Ok(())
}
