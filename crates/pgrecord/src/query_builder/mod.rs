//! Fluent query builder.
//!
//! A [`QueryBuilder`] accumulates a table name, a column projection, WHERE
//! predicates, ORDER BY columns and LIMIT/OFFSET, then renders a parameterized
//! statement (`$1, $2, ...`) and hands it to the client it was created from.
//!
//! ```ignore
//! use pgrecord::{GenericClient, Op, values};
//!
//! let active = conn
//!     .table("users")
//!     .filter("status", "active")
//!     .filter_op("age", Op::Gte, 18_i32)
//!     .sort_by_desc("created_at")
//!     .take(20)
//!     .get()
//!     .await?;
//!
//! conn.table("users")
//!     .insert(values! { "email" => "a@example.com", "status" => "active" })
//!     .await?;
//!
//! conn.table("users")
//!     .filter("id", 7_i64)
//!     .update(values! { "status" => "disabled" })
//!     .await?;
//! ```

mod condition;
mod param;
mod render;


pub use condition::{Condition, Op, SortOrder};
pub use param::{Param, ParamList, Values};
pub use render::BuiltQuery;

use crate::client::GenericClient;
use crate::collection::Collection;
use crate::error::{DbError, DbResult};
use crate::row::{FromRow, ResultSet};
use std::fmt;
use std::marker::PhantomData;
use tokio_postgres::types::ToSql;

/// Chainable SELECT/INSERT/UPDATE/DELETE builder bound to a client.
///
/// `R` is the row type produced by [`get`](QueryBuilder::get) and
/// [`first`](QueryBuilder::first); change it with [`as_row`](QueryBuilder::as_row).
pub struct QueryBuilder<'c, C, R = ResultSet> {
    client: &'c C,
    table: String,
    columns: Vec<String>,
    conditions: Vec<Condition>,
    order: Vec<(String, SortOrder)>,
    limit: Option<u64>,
    offset: Option<u64>,
    allow_delete_all: bool,
    row: PhantomData<fn() -> R>,
}

impl<'c, C> QueryBuilder<'c, C> {
    /// Create a builder for `table`. Usually reached through [`GenericClient::table`].
    pub fn new(client: &'c C, table: &str) -> Self {
        Self {
            client,
            table: table.to_string(),
            columns: Vec::new(),
            conditions: Vec::new(),
            order: Vec::new(),
            limit: None,
            offset: None,
            allow_delete_all: false,
            row: PhantomData,
        }
    }
}

impl<'c, C, R> QueryBuilder<'c, C, R> {
    /// The target table.
    pub fn table_name(&self) -> &str {
        &self.table
    }

    // ==================== WHERE ====================

    /// Add WHERE: column = value
    pub fn filter<T: ToSql + Send + Sync + 'static>(self, column: &str, value: T) -> Self {
        self.filter_condition(Condition::eq(column, value))
    }

    /// Add WHERE: column <op> value
    pub fn filter_op<T: ToSql + Send + Sync + 'static>(
        self,
        column: &str,
        op: Op,
        value: T,
    ) -> Self {
        self.filter_condition(Condition::new(column, op, value))
    }

    /// Add a prepared predicate.
    pub fn filter_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Add several predicates, in order.
    pub fn filter_all(mut self, conditions: impl IntoIterator<Item = Condition>) -> Self {
        self.conditions.extend(conditions);
        self
    }

    /// Add WHERE: column = value
    pub fn eq<T: ToSql + Send + Sync + 'static>(self, column: &str, value: T) -> Self {
        self.filter_op(column, Op::Eq, value)
    }

    /// Add WHERE: column != value
    pub fn ne<T: ToSql + Send + Sync + 'static>(self, column: &str, value: T) -> Self {
        self.filter_op(column, Op::Ne, value)
    }

    /// Add WHERE: column > value
    pub fn gt<T: ToSql + Send + Sync + 'static>(self, column: &str, value: T) -> Self {
        self.filter_op(column, Op::Gt, value)
    }

    /// Add WHERE: column >= value
    pub fn gte<T: ToSql + Send + Sync + 'static>(self, column: &str, value: T) -> Self {
        self.filter_op(column, Op::Gte, value)
    }

    /// Add WHERE: column < value
    pub fn lt<T: ToSql + Send + Sync + 'static>(self, column: &str, value: T) -> Self {
        self.filter_op(column, Op::Lt, value)
    }

    /// Add WHERE: column <= value
    pub fn lte<T: ToSql + Send + Sync + 'static>(self, column: &str, value: T) -> Self {
        self.filter_op(column, Op::Lte, value)
    }

    /// Add WHERE: column LIKE pattern
    pub fn like<T: ToSql + Send + Sync + 'static>(self, column: &str, pattern: T) -> Self {
        self.filter_op(column, Op::Like, pattern)
    }

    /// Add WHERE: column ILIKE pattern
    pub fn ilike<T: ToSql + Send + Sync + 'static>(self, column: &str, pattern: T) -> Self {
        self.filter_op(column, Op::ILike, pattern)
    }

    /// Add WHERE: column IS NULL
    pub fn is_null(self, column: &str) -> Self {
        self.filter_condition(Condition::is_null(column))
    }

    /// Add WHERE: column IS NOT NULL
    pub fn is_not_null(self, column: &str) -> Self {
        self.filter_condition(Condition::is_not_null(column))
    }

    /// Add WHERE: column = ANY(values)
    pub fn in_list<T>(self, column: &str, values: Vec<T>) -> Self
    where
        Vec<T>: ToSql + Send + Sync + 'static,
    {
        self.filter_condition(Condition::in_list(column, values))
    }

    // ==================== Projection, ordering, paging ====================

    /// Set the SELECT columns. An empty list selects `*`.
    pub fn select(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Add ORDER BY column ASC.
    pub fn sort_by(self, column: &str) -> Self {
        self.sort_by_order(column, SortOrder::Asc)
    }

    /// Add ORDER BY column DESC.
    pub fn sort_by_desc(self, column: &str) -> Self {
        self.sort_by_order(column, SortOrder::Desc)
    }

    /// Add ORDER BY with an explicit direction.
    ///
    /// Sorting by a column again replaces its direction but keeps its position.
    pub fn sort_by_order(mut self, column: &str, order: SortOrder) -> Self {
        match self.order.iter_mut().find(|(c, _)| c == column) {
            Some(entry) => entry.1 = order,
            None => self.order.push((column.to_string(), order)),
        }
        self
    }

    /// Set LIMIT.
    pub fn limit(mut self, amount: u64) -> Self {
        self.limit = Some(amount);
        self
    }

    /// Alias for [`limit`](QueryBuilder::limit).
    pub fn take(self, amount: u64) -> Self {
        self.limit(amount)
    }

    /// Set OFFSET.
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Allow [`delete`](QueryBuilder::delete) without WHERE predicates.
    pub fn allow_delete_all(mut self) -> Self {
        self.allow_delete_all = true;
        self
    }

    /// Materialize rows as `T` instead of the current row type.
    pub fn as_row<T>(self) -> QueryBuilder<'c, C, T> {
        QueryBuilder {
            client: self.client,
            table: self.table,
            columns: self.columns,
            conditions: self.conditions,
            order: self.order,
            limit: self.limit,
            offset: self.offset,
            allow_delete_all: self.allow_delete_all,
            row: PhantomData,
        }
    }
}

impl<'c, C, R> QueryBuilder<'c, C, R>
where
    C: GenericClient,
    R: FromRow + Send,
{
    /// Run the SELECT and collect every row.
    pub async fn get(&self) -> DbResult<Collection<R>> {
        let built = self.build_select()?;
        self.client
            .select_as::<R>(&built.sql, &built.params_ref())
            .await
    }

    /// Run the SELECT with `LIMIT 1` and return the row, if any.
    ///
    /// The builder's own LIMIT is left untouched.
    pub async fn first(&self) -> DbResult<Option<R>> {
        let built = self.build_first()?;
        self.client
            .select_one_as::<R>(&built.sql, &built.params_ref())
            .await
    }

    /// Like [`first`](QueryBuilder::first), but an empty result is [`DbError::NotFound`].
    pub async fn first_or_fail(&self) -> DbResult<R> {
        self.first()
            .await?
            .ok_or_else(|| DbError::not_found(format!("no row in '{}' matched", self.table)))
    }
}

impl<'c, C: GenericClient, R> QueryBuilder<'c, C, R> {
    /// Count the rows matching the WHERE predicates.
    pub async fn count(&self) -> DbResult<i64> {
        let built = self.build_count()?;
        let row = self
            .client
            .select_one(&built.sql, &built.params_ref())
            .await?
            .ok_or_else(|| DbError::Other("COUNT(*) returned no row".to_string()))?;
        row.get_as("count")
    }

    /// Insert one row and return the number of inserted rows.
    pub async fn insert(&self, values: Values) -> DbResult<u64> {
        let built = self.build_insert(&values)?;
        self.client.insert(&built.sql, &built.params_ref()).await
    }

    /// Update the matching rows and return how many changed.
    pub async fn update(&self, values: Values) -> DbResult<u64> {
        let built = self.build_update(&values)?;
        self.client.update(&built.sql, &built.params_ref()).await
    }

    /// Delete the matching rows and return how many were removed.
    pub async fn delete(&self) -> DbResult<u64> {
        let built = self.build_delete()?;
        self.client.delete(&built.sql, &built.params_ref()).await
    }
}

impl<C, R> Clone for QueryBuilder<'_, C, R> {
    fn clone(&self) -> Self {
        Self {
            client: self.client,
            table: self.table.clone(),
            columns: self.columns.clone(),
            conditions: self.conditions.clone(),
            order: self.order.clone(),
            limit: self.limit,
            offset: self.offset,
            allow_delete_all: self.allow_delete_all,
            row: PhantomData,
        }
    }
}

impl<C, R> fmt::Debug for QueryBuilder<'_, C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("table", &self.table)
            .field("columns", &self.columns)
            .field("conditions", &self.conditions)
            .field("order", &self.order)
            .field("limit", &self.limit)
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}
