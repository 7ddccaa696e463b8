//! Error types for PostgreSQL operations.

use atlas_query::{ErrorCode, QueryError};
use thiserror::Error;

/// Result type for PostgreSQL operations.
pub type PgResult<T> = Result<T, PgError>;

/// Errors that can occur during PostgreSQL operations.
#[derive(Error, Debug)]
pub enum PgError {
    /// PostgreSQL error.
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// The blocking runtime could not be started.
    #[error("runtime error: {0}")]
    Runtime(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Connection error.
    #[error("connection error: {0}")]
    Connection(String),

    /// The adapter was closed.
    #[error("connection is closed")]
    Closed,

    /// Row deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Type conversion error.
    #[error("type conversion error: {0}")]
    TypeConversion(String),
}

impl PgError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a deserialization error.
    pub fn deserialization(message: impl Into<String>) -> Self {
        Self::Deserialization(message.into())
    }

    /// Create a type conversion error.
    pub fn type_conversion(message: impl Into<String>) -> Self {
        Self::TypeConversion(message.into())
    }

    /// Check if this is a connection error.
    pub fn is_connection_error(&self) -> bool {
        match self {
            Self::Connection(_) | Self::Closed => true,
            Self::Postgres(e) => e.is_closed(),
            _ => false,
        }
    }
}

impl From<PgError> for QueryError {
    fn from(err: PgError) -> Self {
        match err {
            PgError::Postgres(e) => {
                let message = match e.as_db_error() {
                    Some(db) => db.message().to_string(),
                    None => e.to_string(),
                };
                let code = e.code().map(|state| match state.code() {
                    "23505" => ErrorCode::UniqueConstraint,
                    "23503" => ErrorCode::ForeignKeyConstraint,
                    "23502" => ErrorCode::NotNullConstraint,
                    "23514" => ErrorCode::CheckConstraint,
                    "42601" => ErrorCode::SqlSyntax,
                    "57014" => ErrorCode::QueryTimeout,
                    _ => ErrorCode::DatabaseError,
                });
                match code {
                    Some(code) => QueryError::new(code, message).with_source(e),
                    None if e.is_closed() => QueryError::connection(message).with_source(e),
                    None => QueryError::database(message).with_source(e),
                }
            }
            PgError::Runtime(e) => QueryError::internal(e.to_string()).with_source(e),
            PgError::Config(msg) => QueryError::configuration(msg),
            PgError::Connection(msg) => QueryError::connection(msg),
            PgError::Closed => QueryError::connection("connection is closed"),
            PgError::Deserialization(msg) => QueryError::deserialization(msg),
            PgError::TypeConversion(msg) => QueryError::serialization(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = PgError::config("invalid URL");
        assert!(matches!(err, PgError::Config(_)));
        assert!(PgError::connection("refused").is_connection_error());
        assert!(PgError::Closed.is_connection_error());
        assert!(!PgError::type_conversion("bad").is_connection_error());
    }

    #[test]
    fn test_into_query_error() {
        let query_err: QueryError = PgError::Closed.into();
        assert!(query_err.is_connection_error());

        let query_err: QueryError = PgError::config("bad url").into();
        assert_eq!(query_err.code, ErrorCode::InvalidConfiguration);

        let query_err: QueryError = PgError::deserialization("oops").into();
        assert_eq!(query_err.code, ErrorCode::DeserializationError);
    }
}
