//! WHERE predicates and ORDER BY directions.

use super::param::{Param, ParamList};
use crate::error::{DbError, DbResult};
use crate::ident::Ident;
use std::fmt;
use std::str::FromStr;
use tokio_postgres::types::ToSql;

/// Comparison operator of a WHERE predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    NotLike,
    ILike,
    NotILike,
}

impl Op {
    /// SQL spelling of the operator.
    pub fn as_sql(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "!=",
            Op::Gt => ">",
            Op::Gte => ">=",
            Op::Lt => "<",
            Op::Lte => "<=",
            Op::Like => "LIKE",
            Op::NotLike => "NOT LIKE",
            Op::ILike => "ILIKE",
            Op::NotILike => "NOT ILIKE",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for Op {
    type Err = DbError;

    /// Parse an operator. Keywords are case-insensitive and inner whitespace is collapsed.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");
        let op = match normalized.to_ascii_uppercase().as_str() {
            "=" | "==" => Op::Eq,
            "!=" | "<>" => Op::Ne,
            ">" => Op::Gt,
            ">=" => Op::Gte,
            "<" => Op::Lt,
            "<=" => Op::Lte,
            "LIKE" => Op::Like,
            "NOT LIKE" => Op::NotLike,
            "ILIKE" => Op::ILike,
            "NOT ILIKE" => Op::NotILike,
            _ => {
                return Err(DbError::validation(format!(
                    "Unsupported operator '{s}'"
                )));
            }
        };
        Ok(op)
    }
}

#[derive(Clone, Debug)]
enum Predicate {
    Compare(Op, Param),
    IsNull,
    IsNotNull,
    AnyOf(Param),
}

/// One WHERE predicate on a column.
///
/// Predicates of a query are joined with `AND`.
#[derive(Clone, Debug)]
pub struct Condition {
    column: String,
    predicate: Predicate,
}

impl Condition {
    /// `column <op> value`
    pub fn new<T: ToSql + Send + Sync + 'static>(column: &str, op: Op, value: T) -> Self {
        Self {
            column: column.to_string(),
            predicate: Predicate::Compare(op, Param::new(value)),
        }
    }

    /// `column = value`
    pub fn eq<T: ToSql + Send + Sync + 'static>(column: &str, value: T) -> Self {
        Self::new(column, Op::Eq, value)
    }

    /// `column IS NULL`
    pub fn is_null(column: &str) -> Self {
        Self {
            column: column.to_string(),
            predicate: Predicate::IsNull,
        }
    }

    /// `column IS NOT NULL`
    pub fn is_not_null(column: &str) -> Self {
        Self {
            column: column.to_string(),
            predicate: Predicate::IsNotNull,
        }
    }

    /// `column = ANY($n)`, binding `values` as one array parameter.
    ///
    /// An empty list matches no rows.
    pub fn in_list<T>(column: &str, values: Vec<T>) -> Self
    where
        Vec<T>: ToSql + Send + Sync + 'static,
    {
        Self {
            column: column.to_string(),
            predicate: Predicate::AnyOf(Param::new(values)),
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    /// Render the predicate, pushing its bound value (if any) onto `params`.
    pub(crate) fn render(&self, params: &mut ParamList) -> DbResult<String> {
        let column = Ident::parse(&self.column)?;
        Ok(match &self.predicate {
            Predicate::Compare(op, value) => {
                let idx = params.push(value.clone());
                format!("{column} {op} ${idx}")
            }
            Predicate::IsNull => format!("{column} IS NULL"),
            Predicate::IsNotNull => format!("{column} IS NOT NULL"),
            Predicate::AnyOf(values) => {
                let idx = params.push(values.clone());
                format!("{column} = ANY(${idx})")
            }
        })
    }
}

/// ORDER BY direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASC" => Ok(SortOrder::Asc),
            "DESC" => Ok(SortOrder::Desc),
            _ => Err(DbError::validation(format!("Unsupported sort order '{s}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn op_parsing() {
        assert_eq!("=".parse::<Op>().unwrap(), Op::Eq);
        assert_eq!("<>".parse::<Op>().unwrap(), Op::Ne);
        assert_eq!("like".parse::<Op>().unwrap(), Op::Like);
        assert_eq!("not   ilike".parse::<Op>().unwrap(), Op::NotILike);
        assert!("; DROP".parse::<Op>().is_err());
        assert!("IS".parse::<Op>().is_err());
    }

    #[test]
    fn sort_order_parsing() {
        assert_eq!("desc".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert_eq!(" Asc ".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert!("sideways".parse::<SortOrder>().is_err());
    }

    #[test]
    fn render_numbers_placeholders_from_list_length() {
        let mut params = ParamList::new();
        params.push(Param::new("already bound"));

        let sql = Condition::new("age", Op::Gte, 18_i32)
            .render(&mut params)
            .unwrap();
        assert_eq!(sql, "age >= $2");

        let sql = Condition::in_list("id", vec![1_i64, 2, 3])
            .render(&mut params)
            .unwrap();
        assert_eq!(sql, "id = ANY($3)");
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn null_checks_bind_nothing() {
        let mut params = ParamList::new();
        assert_eq!(
            Condition::is_null("deleted_at").render(&mut params).unwrap(),
            "deleted_at IS NULL"
        );
        assert_eq!(
            Condition::is_not_null("email").render(&mut params).unwrap(),
            "email IS NOT NULL"
        );
        assert!(params.is_empty());
    }

    #[test]
    fn render_rejects_bad_column() {
        let mut params = ParamList::new();
        let err = Condition::eq("id = 1 OR 1", 1_i32)
            .render(&mut params)
            .unwrap_err();
        assert!(err.is_validation());
        assert!(params.is_empty());
    }
}
