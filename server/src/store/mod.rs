//! Item persistence.
//!
//! # Design
//! `ItemStore` is the one seam between the HTTP layer and storage. The two
//! implementations, [`FileStore`] and [`PostgresStore`], are interchangeable;
//! the binary picks one at startup and the router is generic over it, so no
//! handler ever branches on the backend.

pub mod file;
pub mod postgres;

use std::future::Future;

use thiserror::Error;

use crate::item::{Item, ItemChanges};

pub use file::FileStore;
pub use postgres::{PostgresOptions, PostgresStore};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Persistence contract for todo items.
pub trait ItemStore: Send + Sync + 'static {
    /// All items, ascending by `order`, newest first on ties.
    fn list_all(&self) -> impl Future<Output = Result<Vec<Item>, StoreError>> + Send;

    /// Persist a fully formed item and hand it back unchanged.
    fn create(&self, item: Item) -> impl Future<Output = Result<Item, StoreError>> + Send;

    /// Apply `changes` to the item with `id`. `None` when no item matches or
    /// `changes` is empty.
    fn update(
        &self,
        id: &str,
        changes: ItemChanges,
    ) -> impl Future<Output = Result<Option<Item>, StoreError>> + Send;

    /// Remove the item with `id`; `false` when there was none.
    fn delete(&self, id: &str) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Release backend resources. Called once, after the server has drained.
    fn close(&self) -> impl Future<Output = ()> + Send {
        async {}
    }

    /// Short backend name for logs.
    fn backend(&self) -> &'static str;
}
