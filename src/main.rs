use lighting_sync::{config::Config, Notice, SyncEngine};
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lighting_sync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting lighting-sync monitor");

    // Load configuration
    let config_path =
        std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/config.yaml".to_string());

    let config = Config::load_or_default(&config_path)?;
    info!(
        api = %config.api.base_url,
        push = %config.push.ws_url,
        window = %config.sync.energy_window_hours,
        "Configuration loaded from: {}",
        config_path
    );

    let engine = SyncEngine::connect(&config)?;
    let mut snapshots = engine.subscribe();
    let mut notices = engine.notices();

    engine.start();

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                info!(link = ?engine.link_state(), "{}", engine.dashboard().headline());
            }
            notice = notices.recv() => match notice {
                Ok(Notice::ControlFailed { device_id, color, reason }) => {
                    error!(%device_id, %color, %reason, "control failed");
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "missed notices");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    engine.shutdown().await;
    info!("Monitor shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully");
        },
    }
}
