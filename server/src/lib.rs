//! REST backend for the todo list.
//!
//! # Overview
//! Five JSON endpoints under `/api/todos` plus a `/health` probe, backed by an
//! [`ItemStore`] that is either a JSON file or a PostgreSQL table.
//!
//! # Design
//! - The router is generic over the store; the binary chooses the backend
//!   once from configuration and never switches it.
//! - Handlers own validation and status mapping; stores only persist.
//! - The store is shared as `Arc<S>` and closed after the server drains.

pub mod api;
pub mod config;
pub mod error;
pub mod item;
pub mod store;

use std::future::Future;
use std::sync::Arc;

use axum::{
    routing::{get, patch, put},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use error::{ApiError, ServerError};
pub use item::{Item, ItemChanges};
pub use store::{FileStore, ItemStore, PostgresStore, StoreError};

pub fn app<S: ItemStore>(store: Arc<S>) -> Router {
    Router::new()
        .route(
            "/api/todos",
            get(api::list_items::<S>).post(api::create_item::<S>),
        )
        .route("/api/todos/reorder", put(api::reorder_items::<S>))
        .route(
            "/api/todos/{id}",
            patch(api::update_item::<S>).delete(api::delete_item::<S>),
        )
        .route("/health", get(api::health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(store)
}

/// Serve until `shutdown` resolves, then close the store.
pub async fn serve<S: ItemStore>(
    listener: TcpListener,
    store: Arc<S>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    axum::serve(listener, app(Arc::clone(&store)))
        .with_graceful_shutdown(shutdown)
        .await?;
    store.close().await;
    Ok(())
}

/// Serve forever.
pub async fn run<S: ItemStore>(listener: TcpListener, store: Arc<S>) -> Result<(), std::io::Error> {
    serve(listener, store, std::future::pending()).await
}
