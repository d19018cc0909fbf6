// src/main.rs
use anyhow::Result;
use api_service_monitor::{
    config::{self, Config},
    server::{RequestHandler, ServerBuilder},
};
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_service_monitor=info".parse()?)
                .add_directive("hyper=info".parse()?),
        )
        .init();

    // Load configuration, falling back to the built-in defaults
    let config = match std::env::args().nth(1) {
        Some(config_path) => {
            info!("Loading configuration from: {}", config_path);
            config::load_config(&config_path).await?
        }
        None => {
            info!("No configuration file given, using defaults");
            let config = Config::default();
            config.validate()?;
            config
        }
    };

    let handler = RequestHandler::from_config(&config)?;

    info!(
        endpoint = %config.monitor.api_endpoint,
        timeout = ?config.monitor.timeout(),
        "Starting API service monitor on {}",
        config.server.listen_addr
    );

    ServerBuilder::new(config.server.listen_addr)
        .with_handler(handler)
        .with_shutdown(shutdown_signal())
        .serve()
        .await?;

    info!("API service monitor stopped");
    Ok(())
}

// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
