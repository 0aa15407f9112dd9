//! multisearch server entry point

use anyhow::Result;
use multisearch::{
    config,
    network::HttpClient,
    sources::SourceLoader,
    web::{create_router, AppState},
};
use std::net::SocketAddr;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter};

/// `RUST_LOG` wins; otherwise `debug` or `info`
fn log_filter(debug: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "info" }))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logging comes up before settings load so the settings path is logged.
    let (filter, filter_handle) = reload::Layer::new(log_filter(false));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();

    let settings = config::load()?;
    if settings.general.debug {
        filter_handle.reload(log_filter(true))?;
    }

    info!("Starting multisearch v{}", multisearch::VERSION);
    info!("Loaded configuration for instance: {}", settings.general.instance_name);

    let client = HttpClient::with_settings(&settings.outgoing)?;
    let registry = SourceLoader::load(&settings, &client);
    if registry.is_empty() {
        warn!("No data sources configured. Add sources to settings.yml or set SLACK_TOKEN.");
    }
    registry.connect_all().await?;

    let addr = SocketAddr::new(settings.server.bind_address.parse()?, settings.server.port);
    let state = AppState::new(settings, registry.clone());
    let app = create_router(state);

    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down");
    registry.disconnect_all().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
