use std::sync::Arc;

use tokio::{net::TcpListener, signal};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use todo_server::config::{Config, StorageBackend};
use todo_server::{FileStore, ItemStore, PostgresStore, ServerError};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(error) = start().await {
        tracing::error!(%error, "server stopped with an error");
        std::process::exit(1);
    }
}

async fn start() -> Result<(), ServerError> {
    let config = Config::from_env()?;
    let listener = TcpListener::bind(config.listen_addr).await?;

    match config.storage {
        StorageBackend::File(path) => serve(listener, FileStore::open(path).await?).await,
        StorageBackend::Postgres(options) => {
            serve(listener, PostgresStore::connect(&options).await?).await
        }
    }
}

async fn serve<S: ItemStore>(listener: TcpListener, store: S) -> Result<(), ServerError> {
    let addr = listener.local_addr()?;
    tracing::info!(%addr, backend = store.backend(), "listening");
    tracing::info!("API endpoint: http://{addr}/api/todos");

    todo_server::serve(listener, Arc::new(store), shutdown_signal()).await?;
    tracing::info!("server shutdown complete");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::warn!(%error, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::warn!(%error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
