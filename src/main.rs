use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

mod api;
mod config;
mod error;
mod server;
mod shutdown;

use config::Config;
use server::{ConcurrencyPolicy, Lifecycle, Server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // The subscriber is process-global; this is the only place it is set.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "placeholder_api=info,tower_http=warn".into()),
        )
        .init();

    let config = Config::from_env().context("invalid service configuration")?;

    let handle = Server::new(api::router(Arc::new(api::HealthRoutes)))
        .with_policy(ConcurrencyPolicy::Unbounded)
        .start(&config.host, config.port)
        .await
        .with_context(|| format!("failed to start server on {config}"))?;

    info!(
        host = %config.host,
        port = config.port,
        local_addr = %handle.local_addr(),
        state = ?handle.lifecycle(),
        "Starting placeholder API"
    );

    let mut lifecycle = handle.subscribe();
    tokio::select! {
        () = shutdown::shutdown_signal() => {
            info!("Received shutdown request.");
        }
        _ = lifecycle.wait_for(|state| *state == Lifecycle::Stopped) => {
            warn!("accept loop exited unexpectedly");
        }
    }

    handle.stop().await.context("server did not stop cleanly")?;
    info!("Server stopped cleanly.");

    Ok(())
}
