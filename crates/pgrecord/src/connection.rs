//! Pooled connection handle.

use crate::client::GenericClient;
use crate::config::DbConfig;
use crate::error::{DbError, DbResult};
use crate::row::ResultSet;
use crate::transaction::{Transaction, TxFuture};
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod};
use tokio_postgres::NoTls;
use tokio_postgres::types::ToSql;

/// A handle to the database.
///
/// Wraps a `deadpool_postgres::Pool`; cloning is cheap and clones share the pool.
/// Each statement checks a client out of the pool, so use a [`Transaction`]
/// when several statements must see the same session.
///
/// ```ignore
/// use pgrecord::{Connection, DbConfig, GenericClient};
///
/// let conn = Connection::new(&DbConfig::from_env()?)?;
/// let admins = conn.table("users").filter("role", "admin").get().await?;
/// let total = conn.select_one("SELECT COUNT(*) AS n FROM users", &[]).await?;
/// ```
#[derive(Clone)]
pub struct Connection {
    pool: Pool,
}

impl Connection {
    /// Build a connection pool from `config`.
    ///
    /// No connection is opened until the first statement runs.
    pub fn new(config: &DbConfig) -> DbResult<Self> {
        let pg_config = config.pg_config()?;
        let manager = Manager::from_config(
            pg_config,
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );
        let pool = Pool::builder(manager)
            .max_size(config.max_pool_size)
            .build()
            .map_err(|e| DbError::Pool(e.to_string()))?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: Pool) -> Self {
        Self { pool }
    }

    /// The underlying pool, for operations this type does not cover.
    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Check a raw client out of the pool.
    pub async fn client(&self) -> DbResult<Object> {
        Ok(self.pool.get().await?)
    }

    /// Run `SELECT 1` to verify the database is reachable.
    pub async fn ping(&self) -> DbResult<()> {
        self.execute("SELECT 1", &[]).await?;
        Ok(())
    }

    /// Start a transaction on a dedicated pooled client.
    pub async fn begin_transaction(&self) -> DbResult<Transaction> {
        Transaction::begin(self.client().await?).await
    }

    /// Run `f` inside a transaction.
    ///
    /// Commits when `f` returns `Ok`; otherwise rolls back and returns the
    /// error from `f`.
    ///
    /// ```ignore
    /// let id = conn
    ///     .transaction(|tx| {
    ///         Box::pin(async move {
    ///             tx.table("users").insert(values! { "email" => "a@example.com" }).await?;
    ///             let row = tx.select_one("SELECT lastval() AS id", &[]).await?;
    ///             Ok(row.map(|r| r["id"].clone()))
    ///         })
    ///     })
    ///     .await?;
    /// ```
    pub async fn transaction<T, F>(&self, f: F) -> DbResult<T>
    where
        T: Send,
        F: for<'t> FnOnce(&'t Transaction) -> TxFuture<'t, T> + Send,
    {
        let tx = self.begin_transaction().await?;
        let result = f(&tx).await;
        match result {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(error) => match tx.rollback().await {
                Ok(()) => Err(error),
                Err(rollback_err) => Err(DbError::Other(format!(
                    "{error} (rollback failed: {rollback_err})"
                ))),
            },
        }
    }
}

impl GenericClient for Connection {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> DbResult<Vec<ResultSet>> {
        let client = self.client().await?;
        GenericClient::query(&client, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> DbResult<u64> {
        let client = self.client().await?;
        GenericClient::execute(&client, sql, params).await
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = self.pool.status();
        f.debug_struct("Connection")
            .field("max_size", &status.max_size)
            .field("size", &status.size)
            .field("available", &status.available)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_builds_lazily() {
        let conn = Connection::new(&DbConfig::new("postgres://app@127.0.0.1:1/app").max_pool_size(3))
            .unwrap();
        let status = conn.pool().status();
        assert_eq!(status.max_size, 3);
        assert_eq!(status.size, 0);
    }

    #[test]
    fn clones_share_the_pool() {
        let conn = Connection::new(&DbConfig::new("postgres://app@localhost/app")).unwrap();
        let other = conn.clone();
        assert_eq!(other.pool().status().max_size, conn.pool().status().max_size);
        assert!(format!("{conn:?}").starts_with("Connection"));
    }

    #[test]
    fn invalid_config_is_rejected() {
        assert!(matches!(
            Connection::new(&DbConfig::new("")),
            Err(DbError::Config(_))
        ));
    }

    #[test]
    fn builder_renders_without_a_database() {
        let conn = Connection::new(&DbConfig::new("postgres://app@localhost/app")).unwrap();
        let sql = conn
            .table("users")
            .filter("id", 1_i64)
            .to_sql()
            .unwrap();
        assert_eq!(sql, "SELECT * FROM users WHERE id = $1");
    }

    #[tokio::test]
    async fn unreachable_server_surfaces_an_error() {
        // Port 1 is reserved; nothing accepts connections there.
        let conn = Connection::new(&DbConfig::new("postgres://app@127.0.0.1:1/app")).unwrap();
        let err = conn.ping().await.unwrap_err();
        assert!(matches!(err, DbError::Pool(_)));
    }
}
