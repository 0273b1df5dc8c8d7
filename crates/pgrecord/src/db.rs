//! Process-wide database facade.
//!
//! [`DB`] holds one lazily created [`Connection`] for code that does not want
//! to pass a handle around:
//!
//! ```ignore
//! use pgrecord::{DB, DbConfig, values};
//!
//! DB::config(DbConfig::from_env()?)?;
//!
//! let users = DB::table("users")?.filter("status", "active").get().await?;
//! DB::table("users")?.insert(values! { "email" => "a@example.com" }).await?;
//! ```

use crate::client::GenericClient;
use crate::collection::Collection;
use crate::config::DbConfig;
use crate::connection::Connection;
use crate::error::{DbError, DbResult};
use crate::query_builder::QueryBuilder;
use crate::row::ResultSet;
use crate::transaction::{Transaction, TxFuture};
use std::sync::{OnceLock, RwLock};
use tokio_postgres::types::ToSql;

static CONFIG: RwLock<Option<DbConfig>> = RwLock::new(None);
static CONNECTION: OnceLock<Connection> = OnceLock::new();

/// Static entry point to the shared [`Connection`].
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy)]
pub struct DB;

impl DB {
    /// Store the configuration used to create the shared connection.
    ///
    /// Replacing the configuration after the connection exists is a
    /// [`DbError::Config`] error.
    pub fn config(config: DbConfig) -> DbResult<()> {
        config.validate()?;
        let mut slot = CONFIG.write().map_err(|_| poisoned())?;
        // Checked under the write lock: `connection()` initializes while
        // holding the read lock, so the two cannot interleave.
        if CONNECTION.get().is_some() {
            return Err(DbError::config(
                "the shared connection already exists; configuration can no longer change",
            ));
        }
        *slot = Some(config);
        Ok(())
    }

    /// The stored configuration, if any.
    pub fn current_config() -> Option<DbConfig> {
        CONFIG.read().ok().and_then(|slot| slot.clone())
    }

    /// The shared connection, created on first use.
    pub fn connection() -> DbResult<&'static Connection> {
        if let Some(conn) = CONNECTION.get() {
            return Ok(conn);
        }

        let slot = CONFIG.read().map_err(|_| poisoned())?;
        let config = slot.as_ref().ok_or(DbError::NotConfigured)?;
        if let Some(conn) = CONNECTION.get() {
            return Ok(conn);
        }
        let conn = Connection::new(config)?;

        #[cfg(feature = "tracing")]
        tracing::info!(max_pool_size = config.max_pool_size, "created shared database connection");

        // Concurrent callers all built from `config`; the first one stored wins.
        Ok(CONNECTION.get_or_init(|| conn))
    }

    /// Whether the shared connection has been created.
    pub fn is_connected() -> bool {
        CONNECTION.get().is_some()
    }

    /// Start a fluent query against `table` on the shared connection.
    pub fn table(table: &str) -> DbResult<QueryBuilder<'static, Connection>> {
        Ok(Self::connection()?.table(table))
    }

    /// Run a query and collect its rows.
    pub async fn select(sql: &str, params: &[&(dyn ToSql + Sync)]) -> DbResult<Collection> {
        Self::connection()?.select(sql, params).await
    }

    /// Run a query and return its first row.
    pub async fn select_one(
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> DbResult<Option<ResultSet>> {
        Self::connection()?.select_one(sql, params).await
    }

    /// Run a statement and return the number of affected rows.
    pub async fn execute(sql: &str, params: &[&(dyn ToSql + Sync)]) -> DbResult<u64> {
        Self::connection()?.execute(sql, params).await
    }

    /// Run an INSERT statement.
    pub async fn insert(sql: &str, params: &[&(dyn ToSql + Sync)]) -> DbResult<u64> {
        Self::connection()?.insert(sql, params).await
    }

    /// Run an UPDATE statement.
    pub async fn update(sql: &str, params: &[&(dyn ToSql + Sync)]) -> DbResult<u64> {
        Self::connection()?.update(sql, params).await
    }

    /// Run a DELETE statement.
    pub async fn delete(sql: &str, params: &[&(dyn ToSql + Sync)]) -> DbResult<u64> {
        Self::connection()?.delete(sql, params).await
    }

    /// Start a transaction on the shared connection.
    pub async fn begin_transaction() -> DbResult<Transaction> {
        Self::connection()?.begin_transaction().await
    }

    /// Run `f` inside a transaction on the shared connection.
    pub async fn transaction<T, F>(f: F) -> DbResult<T>
    where
        T: Send,
        F: for<'t> FnOnce(&'t Transaction) -> TxFuture<'t, T> + Send,
    {
        Self::connection()?.transaction(f).await
    }
}

fn poisoned() -> DbError {
    DbError::Other("database configuration lock poisoned".to_string())
}
