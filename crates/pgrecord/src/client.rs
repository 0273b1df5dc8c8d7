//! Generic client trait for unified database access.

use crate::collection::Collection;
use crate::error::{DbError, DbResult};
use crate::query_builder::QueryBuilder;
use crate::row::{FromRow, ResultSet};
use tokio_postgres::types::ToSql;

#[cfg(feature = "tracing")]
const LOGGED_SQL_MAX_BYTES: usize = 200;

/// A trait that unifies pooled connections, raw clients and transactions.
///
/// Implementors only provide [`query`](GenericClient::query) and
/// [`execute`](GenericClient::execute); the row-mapping helpers and the query
/// builder entry point come for free. Repository code written against
/// `&impl GenericClient` runs unchanged inside a transaction.
pub trait GenericClient: Send + Sync {
    /// Run a statement and return every row.
    fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = DbResult<Vec<ResultSet>>> + Send;

    /// Run a statement and return the number of affected rows.
    fn execute(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = DbResult<u64>> + Send;

    /// Start a fluent query against `table`.
    fn table(&self, table: &str) -> QueryBuilder<'_, Self>
    where
        Self: Sized,
    {
        QueryBuilder::new(self, table)
    }

    /// Run a query and collect its rows.
    fn select(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = DbResult<Collection>> + Send {
        async move { Ok(Collection::from(self.query(sql, params).await?)) }
    }

    /// Run a query and map every row to `T`.
    fn select_as<T: FromRow + Send>(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = DbResult<Collection<T>>> + Send {
        async move {
            self.query(sql, params)
                .await?
                .into_iter()
                .map(T::from_row)
                .collect()
        }
    }

    /// Run a query and return the first row, or `None` when it returns nothing.
    fn select_one(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = DbResult<Option<ResultSet>>> + Send {
        async move { Ok(self.query(sql, params).await?.into_iter().next()) }
    }

    /// Run a query and map the first row, if any, to `T`.
    fn select_one_as<T: FromRow + Send>(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = DbResult<Option<T>>> + Send {
        async move {
            self.select_one(sql, params)
                .await?
                .map(T::from_row)
                .transpose()
        }
    }

    /// Run an INSERT and return the number of inserted rows.
    fn insert(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = DbResult<u64>> + Send {
        self.execute(sql, params)
    }

    /// Run an UPDATE and return the number of updated rows.
    fn update(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = DbResult<u64>> + Send {
        self.execute(sql, params)
    }

    /// Run a DELETE and return the number of deleted rows.
    fn delete(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = DbResult<u64>> + Send {
        self.execute(sql, params)
    }
}

impl GenericClient for tokio_postgres::Client {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> DbResult<Vec<ResultSet>> {
        log_sql(sql, params.len());
        let rows = tokio_postgres::Client::query(self, sql, params)
            .await
            .map_err(DbError::from_db_error)?;
        rows.iter().map(ResultSet::from_pg_row).collect()
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> DbResult<u64> {
        log_sql(sql, params.len());
        tokio_postgres::Client::execute(self, sql, params)
            .await
            .map_err(DbError::from_db_error)
    }
}

impl GenericClient for deadpool_postgres::Object {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> DbResult<Vec<ResultSet>> {
        let client: &tokio_postgres::Client = self;
        GenericClient::query(client, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> DbResult<u64> {
        let client: &tokio_postgres::Client = self;
        GenericClient::execute(client, sql, params).await
    }
}

#[cfg(feature = "tracing")]
fn truncate_sql(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
pub(crate) fn log_sql(sql: &str, param_count: usize) {
    #[cfg(feature = "tracing")]
    tracing::debug!(
        target: "pgrecord.sql",
        param_count,
        sql = %truncate_sql(sql, LOGGED_SQL_MAX_BYTES),
        "executing statement"
    );
}

#[cfg(all(test, feature = "tracing"))]
mod tests {
    use super::truncate_sql;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_sql("SELECT 1", 200), "SELECT 1");
        assert_eq!(truncate_sql("SELECT 'é'", 9), "SELECT '");
    }
}
