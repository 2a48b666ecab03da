//! # Message Board Binary
//!
//! Assembles the store, the board service and the HTTP router from
//! configuration, then serves until SIGINT/SIGTERM.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use api_adapters::{build_router, AppState};
use configs::{AppConfig, DatabaseConfig, LogConfig, LogFormat};
use domains::ThreadStore;
use services::{BoardRules, BoardService};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        match fatal_sink() {
            FatalSink::Tracing => error!("Fatal error: {e:#}"),
            FatalSink::Stderr => eprintln!("Fatal error: {e:#}"),
        }
        std::process::exit(1);
    }
}

#[derive(Debug, PartialEq, Eq)]
enum FatalSink {
    Tracing,
    Stderr,
}

/// Configuration errors happen before the subscriber is installed.
fn fatal_sink() -> FatalSink {
    let installed = tracing::dispatcher::get_default(|dispatch| {
        !dispatch.is::<tracing::subscriber::NoSubscriber>()
    });
    if installed {
        FatalSink::Tracing
    } else {
        FatalSink::Stderr
    }
}

async fn run() -> Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.log)?;

    info!("Starting message-board");
    config.log_summary();

    let store = open_store(&config.database).await?;

    let rules = BoardRules {
        recent_thread_limit: config.board.recent_thread_limit,
        preview_reply_count: config.board.preview_reply_count,
    };
    let service = BoardService::new(store, rules);

    let default_board = config.board.default_board_name()?;
    service
        .ensure_board(&default_board)
        .await
        .context("Failed to create default board")?;
    info!(board = %default_board, "Default board ready");

    let app = build_router(AppState::new(service), &config.server.cors_origins);

    let bind = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    info!(address = %bind, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutdown complete");
    Ok(())
}

#[cfg(feature = "db-sqlite")]
async fn open_store(config: &DatabaseConfig) -> Result<Arc<dyn ThreadStore>> {
    use secrecy::ExposeSecret;
    use storage_adapters::SqliteThreadStore;

    let store = SqliteThreadStore::connect(config.url.expose_secret(), config.max_connections)
        .await
        .context("Failed to open database")?;
    store.migrate().await.context("Failed to run migrations")?;
    info!(max_connections = config.max_connections, "Database initialized");
    Ok(Arc::new(store))
}

#[cfg(not(feature = "db-sqlite"))]
async fn open_store(_config: &DatabaseConfig) -> Result<Arc<dyn ThreadStore>> {
    tracing::warn!("Built without db-sqlite; posts are kept in memory only");
    Ok(Arc::new(storage_adapters::MemoryThreadStore::new()))
}

fn init_tracing(config: &LogConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.filter))?;

    match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init(),
    }
    .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
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
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutting down...");
}
