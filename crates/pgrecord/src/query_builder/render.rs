//! SQL rendering for [`QueryBuilder`].

use super::QueryBuilder;
use super::param::{ParamList, Values};
use crate::error::{DbError, DbResult};
use crate::ident::Ident;
use tokio_postgres::types::ToSql;

/// A rendered statement and its bound parameters.
#[derive(Clone, Debug)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: ParamList,
}

impl BuiltQuery {
    /// Parameters as references for tokio-postgres.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.as_refs()
    }
}

impl<C, R> QueryBuilder<'_, C, R> {
    /// Render the SELECT statement `get()` would run.
    pub fn to_sql(&self) -> DbResult<String> {
        Ok(self.build_select()?.sql)
    }

    /// `SELECT cols FROM t [WHERE] [ORDER BY] [LIMIT] [OFFSET]`
    pub fn build_select(&self) -> DbResult<BuiltQuery> {
        self.render_select(self.limit)
    }

    /// The SELECT used by `first()`: same as [`build_select`](Self::build_select) with `LIMIT 1`.
    pub fn build_first(&self) -> DbResult<BuiltQuery> {
        self.render_select(Some(1))
    }

    /// `SELECT COUNT(*) AS count FROM t [WHERE]`
    pub fn build_count(&self) -> DbResult<BuiltQuery> {
        let mut params = ParamList::new();
        let mut sql = format!("SELECT COUNT(*) AS count FROM {}", self.table_sql()?);
        self.push_where(&mut sql, &mut params)?;
        Ok(BuiltQuery { sql, params })
    }

    /// `INSERT INTO t (a, b) VALUES ($1, $2)`
    pub fn build_insert(&self, values: &Values) -> DbResult<BuiltQuery> {
        if values.is_empty() {
            return Err(DbError::validation("INSERT requires at least one value"));
        }
        let mut params = ParamList::new();
        let mut columns = Vec::with_capacity(values.len());
        let mut placeholders = Vec::with_capacity(values.len());
        for (column, value) in values.entries() {
            columns.push(Ident::parse(column)?.to_string());
            placeholders.push(format!("${}", params.push(value.clone())));
        }
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table_sql()?,
            columns.join(", "),
            placeholders.join(", ")
        );
        Ok(BuiltQuery { sql, params })
    }

    /// `UPDATE t SET a = $1, b = $2 [WHERE]`; SET values bind before WHERE values.
    pub fn build_update(&self, values: &Values) -> DbResult<BuiltQuery> {
        if values.is_empty() {
            return Err(DbError::validation("UPDATE requires at least one value"));
        }
        let mut params = ParamList::new();
        let mut assignments = Vec::with_capacity(values.len());
        for (column, value) in values.entries() {
            let column = Ident::parse(column)?;
            assignments.push(format!("{column} = ${}", params.push(value.clone())));
        }
        let mut sql = format!(
            "UPDATE {} SET {}",
            self.table_sql()?,
            assignments.join(", ")
        );
        self.push_where(&mut sql, &mut params)?;
        Ok(BuiltQuery { sql, params })
    }

    /// `DELETE FROM t WHERE ...`
    ///
    /// Without predicates this is an error unless `allow_delete_all()` was called.
    pub fn build_delete(&self) -> DbResult<BuiltQuery> {
        if self.conditions.is_empty() && !self.allow_delete_all {
            return Err(DbError::validation(format!(
                "DELETE FROM {} has no WHERE predicates; call allow_delete_all() to delete every row",
                self.table
            )));
        }
        let mut params = ParamList::new();
        let mut sql = format!("DELETE FROM {}", self.table_sql()?);
        self.push_where(&mut sql, &mut params)?;
        Ok(BuiltQuery { sql, params })
    }

    fn render_select(&self, limit: Option<u64>) -> DbResult<BuiltQuery> {
        let projection = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns
                .iter()
                .map(|c| Ident::parse_projection(c))
                .collect::<DbResult<Vec<_>>>()?
                .join(", ")
        };

        let mut params = ParamList::new();
        let mut sql = format!("SELECT {} FROM {}", projection, self.table_sql()?);
        self.push_where(&mut sql, &mut params)?;

        if !self.order.is_empty() {
            let order = self
                .order
                .iter()
                .map(|(column, dir)| Ok(format!("{} {}", Ident::parse(column)?, dir.as_sql())))
                .collect::<DbResult<Vec<_>>>()?;
            sql.push_str(" ORDER BY ");
            sql.push_str(&order.join(", "));
        }
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }
        Ok(BuiltQuery { sql, params })
    }

    fn table_sql(&self) -> DbResult<String> {
        Ok(Ident::parse(&self.table)?.to_string())
    }

    fn push_where(&self, sql: &mut String, params: &mut ParamList) -> DbResult<()> {
        if self.conditions.is_empty() {
            return Ok(());
        }
        let predicates = self
            .conditions
            .iter()
            .map(|c| c.render(params))
            .collect::<DbResult<Vec<_>>>()?;
        sql.push_str(" WHERE ");
        sql.push_str(&predicates.join(" AND "));
        Ok(())
    }
}
