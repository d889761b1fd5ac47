//! nodeselector-mutator - mutating admission webhook for zone placement.
//!
//! This is the main entry point that:
//! - Reads `MUTATOR_*` configuration from the environment
//! - Initializes structured logging
//! - Starts the health server and the TLS webhook server
//! - Drains in-flight requests on SIGTERM/SIGINT

use std::sync::Arc;
use std::time::Duration;

use axum_server::Handle;
use tokio::signal;
use tracing::{error, info};

use nodeselector_mutator::health::{HealthState, run_health_server};
use nodeselector_mutator::{WebhookConfig, WebhookState, run_webhook_server};

/// Grace period for in-flight admission requests to complete during shutdown
const SHUTDOWN_GRACE_PERIOD_SECS: u64 = 5;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = WebhookConfig::from_env()?;

    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(config.log_directive().parse()?)
                .add_directive("axum_server=warn".parse()?),
        )
        .json()
        .init();

    info!(
        bind = %config.bind,
        health_bind = %config.health_bind,
        cert = %config.cert_path.display(),
        workload_kinds = ?config.workload_kinds,
        "Starting nodeselector-mutator"
    );

    // Create shared health state
    let health_state = Arc::new(HealthState::new());

    // Start health server immediately (liveness should work before TLS is up)
    let health_handle = {
        let health_state = health_state.clone();
        let addr = config.health_bind;
        tokio::spawn(async move {
            if let Err(e) = run_health_server(health_state, addr).await {
                error!("Health server error: {}", e);
            }
        })
    };

    let server_handle = Handle::new();

    // Mark ready once the TLS listener is bound
    {
        let health_state = health_state.clone();
        let server_handle = server_handle.clone();
        tokio::spawn(async move {
            if let Some(addr) = server_handle.listening().await {
                info!(addr = %addr, "Webhook ready");
                health_state.set_ready(true).await;
            }
        });
    }

    let mut webhook_handle = {
        let state = Arc::new(WebhookState::new(config.policy(), health_state.clone()));
        let config = config.clone();
        let server_handle = server_handle.clone();
        tokio::spawn(async move { run_webhook_server(&config, state, server_handle).await })
    };

    // Wait for any task to complete (or fail), or shutdown signal
    tokio::select! {
        result = &mut webhook_handle => {
            match result {
                Ok(Ok(())) => info!("Webhook server exited"),
                Ok(Err(e)) => {
                    error!("Webhook server error: {}", e);
                    return Err(e.into());
                }
                Err(e) => error!("Webhook server task panicked: {}", e),
            }
        }
        result = health_handle => {
            if let Err(e) = result {
                error!("Health server task panicked: {}", e);
            }
        }
        // Handle graceful shutdown on SIGTERM or SIGINT
        _ = shutdown_signal() => {
            info!("Received shutdown signal, initiating graceful shutdown...");

            // Mark as not ready to stop receiving new work
            health_state.set_ready(false).await;
            info!("Marked webhook as not ready");

            server_handle.graceful_shutdown(Some(Duration::from_secs(SHUTDOWN_GRACE_PERIOD_SECS)));
            match webhook_handle.await {
                Ok(Ok(())) => info!("In-flight admission requests drained"),
                Ok(Err(e)) => error!("Webhook server error during shutdown: {}", e),
                Err(e) => error!("Webhook server task panicked: {}", e),
            }
        }
    }

    info!("nodeselector-mutator stopped");
    Ok(())
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
///
/// Note: Signal handler setup failures are fatal - the webhook cannot shut down
/// gracefully without them. Using expect() here is intentional.
#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
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
