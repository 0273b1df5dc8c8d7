//! # pgrecord
//!
//! A small active-record style toolkit for PostgreSQL.
//!
//! ## Features
//!
//! - **Prepared statements**: every value is bound as a `$n` parameter
//! - **Fluent builder**: `table(..).filter(..).sort_by(..).take(..).get()`
//! - **Dynamic rows**: [`ResultSet`] behaves like an ordered JSON object
//! - **Typed rows**: any `serde::Deserialize` type works as a row class
//! - **Transaction-friendly**: a [`Transaction`] is a [`GenericClient`] too
//! - **Safe defaults**: DELETE requires WHERE, identifiers are validated
//! - **Static facade**: [`DB`] for code that does not pass a handle around
//!
//! ## Quick start
//!
//! ```ignore
//! use pgrecord::{Connection, DbConfig, GenericClient, values};
//!
//! let conn = Connection::new(&DbConfig::from_env()?)?;
//!
//! // SELECT
//! let users = conn
//!     .table("users")
//!     .filter("status", "active")
//!     .sort_by_desc("created_at")
//!     .take(10)
//!     .get()
//!     .await?;
//! println!("{}", users.to_json()?);
//!
//! // Typed rows
//! #[derive(serde::Deserialize)]
//! struct User { id: i64, email: String }
//! let user = conn.table("users").as_row::<User>().filter("id", 1_i64).first().await?;
//!
//! // INSERT / UPDATE / DELETE
//! conn.table("users").insert(values! { "email" => "a@example.com" }).await?;
//! conn.table("users").filter("id", 1_i64).update(values! { "status" => "inactive" }).await?;
//! conn.table("users").filter("id", 1_i64).delete().await?;
//!
//! // Raw SQL
//! let rows = conn.select("SELECT id FROM users WHERE email = $1", &[&"a@example.com"]).await?;
//! ```

pub mod client;
pub mod collection;
pub mod config;
pub mod connection;
pub mod db;
mod decode;
pub mod error;
pub mod ident;
pub mod prelude;
pub mod query_builder;
pub mod row;
pub mod transaction;

pub use client::GenericClient;
pub use collection::Collection;
pub use config::DbConfig;
pub use connection::Connection;
pub use db::DB;
pub use error::{DbError, DbResult};
pub use ident::Ident;
pub use query_builder::{
    BuiltQuery, Condition, Op, Param, ParamList, QueryBuilder, SortOrder, Values,
};
pub use row::{FromRow, ResultSet};
pub use transaction::{Transaction, TxFuture};

// Re-exported so callers can name parameter types without a direct dependency.
pub use deadpool_postgres;
pub use tokio_postgres;
