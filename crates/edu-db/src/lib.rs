//! # edu-db
//!
//! libSQL-backed stores and the enrollment consistency engine.
//!
//! Three independent stores, each in its own database:
//! - the relationship store ([`graph`]): User and Course nodes joined by
//!   `enrolled_in` edges;
//! - the document store ([`documents`]): course documents carrying the
//!   denormalized `enrolled_count`;
//! - the audit sink ([`audit`]): an append-only action log.
//!
//! There is no transaction spanning stores. The [`coordinator`] keeps them
//! consistent with an ordered two-step protocol (edge first, counter second)
//! and [`reconcile`] repairs any counter drift left behind by a failed second
//! step.

pub mod audit;
pub mod coordinator;
pub mod counter;
pub mod documents;
pub mod error;
pub mod graph;
pub mod helpers;
pub mod lifecycle;
pub mod listing;
mod migrations;
pub mod reconcile;
pub mod resolver;
pub mod retry;
pub mod service;

#[doc(hidden)]
pub mod test_support;

use std::path::Path;

use error::DatabaseError;
use libsql::Builder;
use libsql::params::IntoParams;
pub use migrations::Schema;
use retry::{RetryConfig, with_retry};

/// Database handle shared by one store.
///
/// Wraps a libSQL database and connection. Provides ID generation and
/// retrying statement helpers.
pub struct EduDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
    retry: RetryConfig,
}

impl EduDb {
    /// Open a local database at the given path and apply `schema`.
    ///
    /// `":memory:"` opens a private in-memory database. For file paths the
    /// parent directory is created if needed.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(
        path: &str,
        schema: Schema,
        retry: RetryConfig,
    ) -> Result<Self, DatabaseError> {
        if path != ":memory:"
            && let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| DatabaseError::Other(e.into()))?;
        }

        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        let edu_db = Self { db, conn, retry };
        edu_db.run_migrations(schema).await?;
        tracing::debug!(path, ?schema, "opened store database");
        Ok(edu_db)
    }

    /// Open a private in-memory database with `schema`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if migrations fail.
    pub async fn open_in_memory(schema: Schema) -> Result<Self, DatabaseError> {
        Self::open_local(":memory:", schema, RetryConfig::no_retry()).await
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Retry policy applied by [`execute_with`](Self::execute_with) and
    /// [`query_with`](Self::query_with).
    #[must_use]
    pub const fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Generate a prefixed ID via libSQL. Returns e.g., `"cou-a3f8b2c1"`.
    ///
    /// Uses `randomblob(4)` in SQL to produce 8-char hex, then prepends the prefix.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or returns no rows.
    pub async fn generate_id(&self, prefix: &str) -> Result<String, DatabaseError> {
        let mut rows = self
            .query_with("SELECT ?1 || '-' || lower(hex(randomblob(4)))", || {
                [prefix]
            })
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<String>(0)?)
    }

    /// Execute a statement, retrying on transient lock contention.
    ///
    /// `params` is a factory because a retried attempt needs fresh parameters.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` once retries are exhausted or on a permanent error.
    pub async fn execute_with<F, P>(&self, sql: &str, params: F) -> Result<u64, DatabaseError>
    where
        F: Fn() -> P,
        P: IntoParams,
    {
        let conn = &self.conn;
        with_retry(&self.retry, DatabaseError::is_transient, || {
            let p = params();
            async move { conn.execute(sql, p).await.map_err(DatabaseError::from) }
        })
        .await
    }

    /// Run a query, retrying on transient lock contention.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` once retries are exhausted or on a permanent error.
    pub async fn query_with<F, P>(&self, sql: &str, params: F) -> Result<libsql::Rows, DatabaseError>
    where
        F: Fn() -> P,
        P: IntoParams,
    {
        let conn = &self.conn;
        with_retry(&self.retry, DatabaseError::is_transient, || {
            let p = params();
            async move { conn.query(sql, p).await.map_err(DatabaseError::from) }
        })
        .await
    }
}
