//! Errors returned by every pgrecord operation.
//!
//! Driver failures are classified by SQLSTATE where the caller is likely to
//! branch on them (constraint violations); everything else keeps the original
//! `tokio_postgres::Error` in [`DbError::Query`].

use thiserror::Error;
use tokio_postgres::error::SqlState;

/// Shorthand for `Result<T, DbError>`.
pub type DbResult<T> = Result<T, DbError>;

/// Everything that can go wrong between building a statement and reading its rows.
#[derive(Debug, Error)]
pub enum DbError {
    /// The server could not be reached or the URL is malformed.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The server rejected the statement.
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// A required row was absent (`first_or_fail`).
    #[error("Not found: {0}")]
    NotFound(String),

    /// SQLSTATE 23505.
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// SQLSTATE 23503.
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// SQLSTATE 23514.
    #[error("Check constraint violation: {0}")]
    CheckViolation(String),

    /// A column value could not be converted.
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// A builder or argument was rejected before reaching the server.
    #[error("Validation error: {0}")]
    Validation(String),

    /// JSON conversion of a row or collection failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// No pooled connection could be checked out.
    #[error("Pool error: {0}")]
    Pool(String),

    /// [`DbConfig`](crate::DbConfig) is unusable or could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),

    /// [`DB`](crate::DB) was used before `DB::config`.
    #[error("No database configuration is set")]
    NotConfigured,

    #[error("{0}")]
    Other(String),
}

impl DbError {
    /// A [`DbError::Decode`] attributed to `column`.
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// True for a duplicate key (SQLSTATE 23505).
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }

    /// True when `first_or_fail` (or a caller) found no row.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// True when the statement never reached the server because its input was invalid.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Classify a driver error.
    ///
    /// Constraint violations become their own variants carrying
    /// `"<constraint>: <server message>"`; anything else is [`DbError::Query`].
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let detail = format!(
                "{}: {}",
                db_err.constraint().unwrap_or("unknown"),
                db_err.message()
            );
            let code = db_err.code();
            if *code == SqlState::UNIQUE_VIOLATION {
                return Self::UniqueViolation(detail);
            }
            if *code == SqlState::FOREIGN_KEY_VIOLATION {
                return Self::ForeignKeyViolation(detail);
            }
            if *code == SqlState::CHECK_VIOLATION {
                return Self::CheckViolation(detail);
            }
        }
        Self::Query(err)
    }
}

impl From<deadpool_postgres::PoolError> for DbError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_names_column() {
        let err = DbError::decode("price", "unsupported type numeric");
        assert_eq!(
            err.to_string(),
            "Decode error on column 'price': unsupported type numeric"
        );
    }

    #[test]
    fn classification_helpers() {
        assert!(DbError::not_found("x").is_not_found());
        assert!(DbError::validation("x").is_validation());
        assert!(!DbError::NotConfigured.is_validation());
        assert!(DbError::UniqueViolation("users_email_key".into()).is_unique_violation());
    }

    #[test]
    fn messages_name_the_failure() {
        assert_eq!(
            DbError::NotConfigured.to_string(),
            "No database configuration is set"
        );
        assert_eq!(
            DbError::config("max_pool_size must be at least 1").to_string(),
            "Configuration error: max_pool_size must be at least 1"
        );
    }

    #[test]
    fn serde_errors_become_serialization() {
        let err: DbError = serde_json::from_str::<i32>("nope").unwrap_err().into();
        assert!(matches!(err, DbError::Serialization(_)));
    }
}
