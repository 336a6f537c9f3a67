//! Background task that expires idle sessions.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;
use tracing::info;

use scivault_core::config::SessionConfig;

use super::manager::SessionManager;

/// Runs the expiry sweep loop until the shutdown signal flips to `true`.
///
/// Expiry happens only here. Sessions that pass their deadline stay in
/// the table untouched until the next tick picks them up, so a `join`
/// arriving in between still succeeds and refreshes the deadline.
pub async fn run_sweeper(
    manager: Arc<SessionManager>,
    config: SessionConfig,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = time::interval(Duration::from_millis(config.sweep_interval_ms));
    // The first tick fires immediately; skip it so startup stays quiet.
    interval.tick().await;

    info!(
        interval_ms = config.sweep_interval_ms,
        "Session sweeper started"
    );

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            }
            _ = interval.tick() => {
                manager.sweep().await;
            }
        }
    }

    info!("Session sweeper stopped");
}
