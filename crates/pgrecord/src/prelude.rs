//! Convenient imports for typical `pgrecord` usage.
//!
//! ```ignore
//! use pgrecord::prelude::*;
//! ```

pub use crate::{
    Collection, Condition, Connection, DB, DbConfig, DbError, DbResult, FromRow, GenericClient, Op,
    QueryBuilder, ResultSet, SortOrder, Transaction, Values, transaction, values,
};
