//! SciVault Server: multi-tenant scientific data platform core.
//!
//! Main entry point that wires the directory, identity store, session
//! manager, and credential recovery together and runs the background
//! expiry sweeper until shutdown.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tracing;
use tracing_subscriber::{EnvFilter, fmt};

use scivault_auth::{
    CredentialRecovery, GroupRegistry, MemoryIdentityStore, SessionManager, run_sweeper,
};
use scivault_core::config::{AppConfig, AuthConfig};
use scivault_core::error::AppError;
use scivault_core::events::{DomainEvent, EventBus};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("SCIVAULT_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting SciVault v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Event bus ────────────────────────────────────────
    let events = EventBus::default();

    // ── Step 2: Directory and root account ───────────────────────
    let registry = Arc::new(GroupRegistry::new(config.auth.clone(), events.clone()));
    let (system_group, root) = registry.bootstrap().await?;
    tracing::info!(
        group = %system_group.name,
        username = %root.username,
        "Directory bootstrapped"
    );

    // ── Step 3: Identity store ───────────────────────────────────
    let identity = Arc::new(MemoryIdentityStore::new(config.auth.clone()));
    identity.register_account(root.id, &root.username, &config.auth.root_secret, None)?;
    if config.auth.root_secret == AuthConfig::default().root_secret {
        tracing::warn!(
            "The root account still uses the shipped default secret; override auth.root_secret"
        );
    }

    // ── Step 4: Session manager ──────────────────────────────────
    let sessions = Arc::new(SessionManager::new(
        Arc::clone(&registry),
        identity.clone(),
        events.clone(),
        config.session.clone(),
    ));

    // ── Step 5: Credential recovery ──────────────────────────────
    let recovery = Arc::new(CredentialRecovery::new(
        Arc::clone(&registry),
        identity.clone(),
        Arc::clone(&sessions),
        events.clone(),
        config.recovery.clone(),
    ));
    tracing::info!(enabled = config.recovery.enabled, "Credential recovery configured");

    // ── Step 6: Shutdown channel ─────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Step 7: Background tasks ─────────────────────────────────
    let sweeper_handle = tokio::spawn(run_sweeper(
        Arc::clone(&sessions),
        config.session.clone(),
        shutdown_rx.clone(),
    ));
    let event_log_handle = tokio::spawn(run_event_log(events.subscribe(), shutdown_rx.clone()));

    tracing::info!("SciVault core ready");

    // ── Step 8: Graceful shutdown ────────────────────────────────
    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown...");
    let _ = shutdown_tx.send(true);

    let _ = tokio::time::timeout(std::time::Duration::from_secs(10), sweeper_handle).await;
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), event_log_handle).await;

    tracing::info!(
        active_sessions = sessions.active_session_count(),
        reset_requests = recovery.recent_requests(config.recovery.max_log_entries).len(),
        "SciVault server shut down gracefully"
    );
    Ok(())
}

/// Drain the domain-event bus into the log until shutdown.
async fn run_event_log(
    mut events: broadcast::Receiver<DomainEvent>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            }
            received = events.recv() => match received {
                Ok(event) => {
                    tracing::debug!(event_id = %event.id, payload = ?event.payload, "Domain event");
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(missed = missed, "Event log fell behind the bus");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
