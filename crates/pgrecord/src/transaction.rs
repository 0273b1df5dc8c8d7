//! Transactions on a pooled connection.
//!
//! A [`Transaction`] holds one pooled client for its whole lifetime and
//! implements [`GenericClient`], so everything that runs against a
//! [`Connection`](crate::Connection) also runs inside a transaction.
//!
//! For ergonomic commit/rollback handling use
//! [`Connection::transaction`](crate::Connection::transaction) or the
//! [`transaction!`] macro:
//!
//! ```ignore
//! use pgrecord::{GenericClient, values};
//!
//! pgrecord::transaction!(conn, tx, {
//!     tx.table("accounts").filter("id", 1_i64).update(values! { "balance" => 0_i64 }).await?;
//!     tx.table("audit").insert(values! { "action" => "reset" }).await?;
//!     Ok(())
//! })?;
//! ```

use crate::client::{GenericClient, log_sql};
use crate::error::{DbError, DbResult};
use crate::row::ResultSet;
use deadpool_postgres::Object;
use std::future::Future;
use std::pin::Pin;
use tokio_postgres::types::ToSql;

/// Boxed future returned by a [`Connection::transaction`](crate::Connection::transaction) callback.
pub type TxFuture<'t, T> = Pin<Box<dyn Future<Output = DbResult<T>> + Send + 't>>;

/// Runs the given block inside a database transaction.
///
/// - Begins a transaction via `$conn.begin_transaction().await`.
/// - Commits on `Ok(_)`.
/// - Rolls back on `Err(_)` and returns the original error.
///
/// The block must evaluate to `pgrecord::DbResult<T>`.
#[macro_export]
macro_rules! transaction {
    ($conn:expr, $tx:ident, $body:block) => {{
        let $tx = ($conn).begin_transaction().await?;

        let __pgrecord_tx_body_result = async { $body }.await;
        match __pgrecord_tx_body_result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(error) => match $tx.rollback().await {
                Ok(()) => Err(error),
                Err(rollback_err) => Err($crate::DbError::Other(format!(
                    "{error} (rollback failed: {rollback_err})"
                ))),
            },
        }
    }};
}

/// An open transaction.
///
/// Finish it with [`commit`](Transaction::commit) or
/// [`rollback`](Transaction::rollback). Dropping an open transaction rolls it
/// back in the background.
pub struct Transaction {
    client: Option<Object>,
}

impl Transaction {
    /// Issue `BEGIN` on `client` and wrap it.
    pub async fn begin(client: Object) -> DbResult<Self> {
        log_sql("BEGIN", 0);
        client
            .batch_execute("BEGIN")
            .await
            .map_err(DbError::from_db_error)?;
        Ok(Self {
            client: Some(client),
        })
    }

    /// Whether the transaction has not been committed or rolled back yet.
    pub fn is_active(&self) -> bool {
        self.client.is_some()
    }

    /// Make the transaction's changes permanent.
    pub async fn commit(mut self) -> DbResult<()> {
        self.finish("COMMIT").await
    }

    /// Discard the transaction's changes.
    pub async fn rollback(mut self) -> DbResult<()> {
        self.finish("ROLLBACK").await
    }

    async fn finish(&mut self, statement: &str) -> DbResult<()> {
        let client = self.client.take().ok_or_else(finished)?;
        log_sql(statement, 0);
        let result = client.batch_execute(statement).await;
        match result {
            Ok(()) => Ok(()),
            Err(err) => {
                // The session state is unknown; keep it out of the pool.
                drop(Object::take(client));
                Err(DbError::from_db_error(err))
            }
        }
    }

    fn client(&self) -> DbResult<&tokio_postgres::Client> {
        self.client.as_deref().map(|c| &**c).ok_or_else(finished)
    }
}

fn finished() -> DbError {
    DbError::Other("transaction already finished".to_string())
}

impl Drop for Transaction {
    fn drop(&mut self) {
        let Some(client) = self.client.take() else {
            return;
        };

        #[cfg(feature = "tracing")]
        tracing::warn!("transaction dropped without commit or rollback; rolling back");

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    let result = client.batch_execute("ROLLBACK").await;
                    if result.is_err() {
                        drop(Object::take(client));
                    }
                });
            }
            Err(_) => drop(Object::take(client)),
        }
    }
}

impl GenericClient for Transaction {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> DbResult<Vec<ResultSet>> {
        GenericClient::query(self.client()?, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> DbResult<u64> {
        GenericClient::execute(self.client()?, sql, params).await
    }
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("active", &self.is_active())
            .finish()
    }
}
