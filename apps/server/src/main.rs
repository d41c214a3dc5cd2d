//! # Reparto Server Binary
//!
//! Boots the HTTP API: tracing, configuration, database, router,
//! graceful shutdown.

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use reparto_db::{migrations, Database, DbConfig};
use reparto_server::config::ServerConfig;
use reparto_server::{routes, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("Starting Reparto server...");

    let config = ServerConfig::load()?;
    info!(
        addr = %config.bind_address(),
        db_path = %config.database_path,
        "Config loaded"
    );

    if config.uses_dev_secret() {
        warn!("JWT_SECRET is not set; running on the development secret");
    }

    // Connect to the database; migrations run inside Database::new
    let db = Database::new(DbConfig::new(&config.database_path)).await?;
    let (total, applied) = migrations::migration_status(db.pool()).await?;
    info!(applied, total, "Database ready");

    // Build shared state and the router
    let state = AppState::new(db.clone(), config.clone());
    let app = routes::router(state);

    // Bind the listener
    let listener = TcpListener::bind(config.bind_address()).await?;
    info!(addr = %config.bind_address(), "Server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Bye");
    Ok(())
}

/// Structured logging to stdout. `RUST_LOG` overrides the default
/// filter, e.g. `RUST_LOG=reparto_db=trace`; without it the reparto
/// crates log at debug and everything else at info.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,reparto_server=debug,reparto_db=debug,sqlx=warn")
    });

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Resolves when SIGINT or SIGTERM arrives, letting axum drain
/// in-flight requests before the database closes.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}
