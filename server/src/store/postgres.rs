//! PostgreSQL backend.
//!
//! # Table Schema
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS todos (
//!     id TEXT PRIMARY KEY,
//!     text TEXT NOT NULL,
//!     completed BOOLEAN DEFAULT false,
//!     created_at BIGINT NOT NULL,
//!     display_order BIGINT DEFAULT 0
//! );
//! ```
//!
//! The pool is owned by [`PostgresStore`] and closed through
//! [`ItemStore::close`] when the server shuts down.

use std::str::FromStr;

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgSslMode};
use sqlx::{FromRow, Postgres, QueryBuilder};

use super::{ItemStore, StoreError};
use crate::item::{Item, ItemChanges};

const CREATE_TABLE: &str = "\
CREATE TABLE IF NOT EXISTS todos (
    id TEXT PRIMARY KEY,
    text TEXT NOT NULL,
    completed BOOLEAN DEFAULT false,
    created_at BIGINT NOT NULL,
    display_order BIGINT DEFAULT 0
)";

const COLUMNS: &str = "id, text, completed, created_at, display_order";

const LIST_ALL: &str = "\
SELECT id, text, completed, created_at, display_order FROM todos
ORDER BY COALESCE(display_order, 0) ASC, created_at DESC";

/// Connection settings for [`PostgresStore::connect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresOptions {
    pub url: String,
    /// Require TLS without verifying the server certificate. When false, TLS
    /// is disabled.
    pub require_tls: bool,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

#[derive(Debug, FromRow)]
struct ItemRow {
    id: String,
    text: String,
    completed: Option<bool>,
    created_at: i64,
    display_order: Option<i64>,
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Self {
            id: row.id,
            text: row.text,
            completed: row.completed.unwrap_or(false),
            created_at: row.created_at,
            order: row.display_order.unwrap_or(0),
        }
    }
}

impl PostgresStore {
    /// Open a pool and make sure the `todos` table exists.
    pub async fn connect(options: &PostgresOptions) -> Result<Self, StoreError> {
        let ssl_mode = if options.require_tls {
            PgSslMode::Require
        } else {
            PgSslMode::Disable
        };
        let connect_options = PgConnectOptions::from_str(&options.url)?.ssl_mode(ssl_mode);
        let pool = PgPoolOptions::new()
            .max_connections(options.max_connections)
            .connect_with(connect_options)
            .await?;
        sqlx::query(CREATE_TABLE).execute(&pool).await?;
        Ok(Self { pool })
    }
}

/// `UPDATE` assigning only the columns present in `changes`; `None` when
/// there is nothing to assign.
fn update_query(id: &str, changes: ItemChanges) -> Option<QueryBuilder<'static, Postgres>> {
    if changes.is_empty() {
        return None;
    }
    let mut builder = QueryBuilder::new("UPDATE todos SET ");
    {
        let mut assignments = builder.separated(", ");
        if let Some(text) = changes.text {
            assignments.push("text = ").push_bind_unseparated(text);
        }
        if let Some(completed) = changes.completed {
            assignments.push("completed = ").push_bind_unseparated(completed);
        }
        if let Some(order) = changes.order {
            assignments.push("display_order = ").push_bind_unseparated(order);
        }
    }
    builder
        .push(" WHERE id = ")
        .push_bind(id.to_string())
        .push(" RETURNING ")
        .push(COLUMNS);
    Some(builder)
}

impl ItemStore for PostgresStore {
    async fn list_all(&self) -> Result<Vec<Item>, StoreError> {
        let rows: Vec<ItemRow> = sqlx::query_as(LIST_ALL).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Item::from).collect())
    }

    async fn create(&self, item: Item) -> Result<Item, StoreError> {
        sqlx::query(
            "INSERT INTO todos (id, text, completed, created_at, display_order) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&item.id)
        .bind(&item.text)
        .bind(item.completed)
        .bind(item.created_at)
        .bind(item.order)
        .execute(&self.pool)
        .await?;
        Ok(item)
    }

    async fn update(&self, id: &str, changes: ItemChanges) -> Result<Option<Item>, StoreError> {
        let Some(mut query) = update_query(id, changes) else {
            return Ok(None);
        };
        let row = query
            .build_query_as::<ItemRow>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Item::from))
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM todos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn close(&self) {
        self.pool.close().await;
        tracing::info!("database pool closed");
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_sets_only_supplied_columns() {
        let changes = ItemChanges {
            completed: Some(true),
            ..ItemChanges::default()
        };
        let query = update_query("abc", changes).unwrap();
        assert_eq!(
            query.sql(),
            "UPDATE todos SET completed = $1 WHERE id = $2 \
             RETURNING id, text, completed, created_at, display_order"
        );
    }

    #[test]
    fn update_numbers_parameters_in_column_order() {
        let changes = ItemChanges {
            text: Some("New".to_string()),
            completed: Some(false),
            order: Some(4),
        };
        let query = update_query("abc", changes).unwrap();
        assert!(query.sql().starts_with(
            "UPDATE todos SET text = $1, completed = $2, display_order = $3 WHERE id = $4"
        ));
    }

    #[test]
    fn empty_update_builds_nothing() {
        assert!(update_query("abc", ItemChanges::default()).is_none());
    }

    #[test]
    fn null_columns_read_back_as_defaults() {
        let item = Item::from(ItemRow {
            id: "x".to_string(),
            text: "Legacy".to_string(),
            completed: None,
            created_at: 42,
            display_order: None,
        });
        assert!(!item.completed);
        assert_eq!(item.order, 0);
        assert_eq!(item.created_at, 42);
    }
}
