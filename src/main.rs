//! Message Relay Server - Binary Entry Point

use std::sync::Arc;

use log::{error, info, warn, LevelFilter};
use simplelog::{ColorChoice, TermLogger, TerminalMode};
use tokio::net::TcpListener;

use message_relay::api::http::create_router;
use message_relay::{AppState, Config, DbConfig, Hub, PgMessageStore};

#[tokio::main]
async fn main() {
    if let Err(e) = TermLogger::init(
        LevelFilter::Info,
        simplelog::Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    ) {
        eprintln!("failed to initialize logger: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run().await {
        error!("[Server] fatal: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    if dotenvy::dotenv().is_err() {
        warn!("[Server] no .env file found, using process environment");
    }

    let config = Config::from_env()?;
    let db_config = DbConfig::from_env()?;

    let store = Arc::new(PgMessageStore::connect(&db_config).await?);
    let hub = Hub::spawn(store.clone());

    let state = Arc::new(AppState::new(hub.clone(), store.clone(), &config));
    let app = create_router(state);

    let listener = TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!("[Server] listening on port {}", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("[Server] shutting down");
    if tokio::time::timeout(config.shutdown_timeout, hub.shutdown())
        .await
        .is_err()
    {
        warn!("[Server] hub did not drain within the shutdown timeout");
    }
    store.close().await;
    info!("[Server] exiting");
    Ok(())
}

/// Resolve on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("[Server] failed to listen for ctrl-c: {}", e);
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
                error!("[Server] failed to listen for SIGTERM: {}", e);
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
}
