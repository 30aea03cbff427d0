use anyhow::Context;
use std::net::SocketAddr;
use tokio::signal;

use forensics_backend::{config, middleware, routes, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::Settings::new().context("failed to load configuration")?;

    middleware::init_logging(&config.log_level, &config.log_format)
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    tracing::info!("Starting forensics backend v{}", env!("CARGO_PKG_VERSION"));

    let addr: SocketAddr = config
        .bind_address
        .parse()
        .with_context(|| format!("invalid bind address '{}'", config.bind_address))?;

    let app_state = AppState::new(config)
        .await
        .context("failed to initialize application state")?;

    // Finish role changes interrupted by a previous crash
    match app_state.role_manager.resume_pending().await {
        Ok(0) => {}
        Ok(count) => tracing::info!("Resumed {} interrupted role change(s)", count),
        Err(e) => tracing::warn!("Could not check for interrupted role changes: {}", e),
    }

    let app = routes::create_router(app_state);

    tracing::info!("Server starting on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
