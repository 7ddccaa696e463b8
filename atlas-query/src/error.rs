//! Error types for query building and execution.
//!
//! Two layers of errors exist:
//! - [`BuildError`] is recorded by the fluent [`crate::Query`] methods while a
//!   query is assembled. Nothing fails until a terminal method runs.
//! - [`QueryError`] is what every fallible operation returns. It carries an
//!   [`ErrorCode`], a message and an [`ErrorContext`].
//!
//! # Error Codes
//!
//! Error codes follow a pattern: A{category}{number}
//! - 1xxx: Query errors (not found, invalid clause, bad update)
//! - 2xxx: Constraint violations (unique, foreign key, not null)
//! - 3xxx: Connection errors
//! - 5xxx: Execution errors (syntax, parameters, database)
//! - 6xxx: Data errors (type conversion, GeoJSON)
//! - 7xxx: Configuration errors
//! - 8xxx: Schema registration errors
//! - 9xxx: Internal errors
//!
//! ```rust
//! use atlas_query::{ErrorCode, QueryError};
//!
//! let err = QueryError::not_found("CarTest");
//! assert_eq!(err.code, ErrorCode::RecordNotFound);
//! assert_eq!(err.code.code(), "A1001");
//! ```

use std::fmt;

use atlas_schema::SchemaError;
use thiserror::Error;

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Query errors (1xxx)
    /// Record not found (A1001).
    RecordNotFound = 1001,
    /// The query failed validation while it was built (A1002).
    InvalidQuery = 1002,
    /// More than one record passed to an update (A1003).
    MultipleRecordUpdate = 1003,
    /// An update has neither a filter nor primary keys (A1004).
    MissingPrimaryKey = 1004,
    /// A write was given no records (A1005).
    EmptyInput = 1005,
    /// An update leaves no column to set (A1006).
    NothingToUpdate = 1006,

    // Constraint errors (2xxx)
    /// Unique constraint violation (A2001).
    UniqueConstraint = 2001,
    /// Foreign key constraint violation (A2002).
    ForeignKeyConstraint = 2002,
    /// Check constraint violation (A2003).
    CheckConstraint = 2003,
    /// Not null constraint violation (A2004).
    NotNullConstraint = 2004,

    // Connection errors (3xxx)
    /// Failed to connect (A3001).
    ConnectionFailed = 3001,
    /// Connection timeout (A3003).
    ConnectionTimeout = 3003,
    /// Authentication failed (A3004).
    AuthenticationFailed = 3004,

    // Execution errors (5xxx)
    /// Query timeout (A5001).
    QueryTimeout = 5001,
    /// SQL syntax error (A5002).
    SqlSyntax = 5002,
    /// Invalid parameter (A5003).
    InvalidParameter = 5003,
    /// General database error (A5005).
    DatabaseError = 5005,

    // Data errors (6xxx)
    /// Invalid data type (A6001).
    InvalidDataType = 6001,
    /// Serialization error (A6002).
    SerializationError = 6002,
    /// Deserialization error (A6003).
    DeserializationError = 6003,

    // Configuration errors (7xxx)
    /// Invalid configuration (A7001).
    InvalidConfiguration = 7001,
    /// Invalid connection string (A7003).
    InvalidConnectionString = 7003,

    // Schema errors (8xxx)
    /// Model name is not registered (A8001).
    SchemaNotRegistered = 8001,
    /// Model cannot be persisted (A8002).
    UnsupportedModel = 8002,
    /// Two fields share a column (A8003).
    DuplicateColumn = 8003,

    // Internal errors (9xxx)
    /// Internal error (A9001).
    Internal = 9001,
    /// Unknown error (A9999).
    Unknown = 9999,
}

impl ErrorCode {
    /// Get the error code string (e.g., "A1001").
    pub fn code(&self) -> String {
        format!("A{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::RecordNotFound => "Record not found",
            Self::InvalidQuery => "Invalid query",
            Self::MultipleRecordUpdate => "Multiple records passed to update",
            Self::MissingPrimaryKey => "Update without filter or primary key",
            Self::EmptyInput => "No records given",
            Self::NothingToUpdate => "No columns to update",
            Self::UniqueConstraint => "Unique constraint violation",
            Self::ForeignKeyConstraint => "Foreign key constraint violation",
            Self::CheckConstraint => "Check constraint violation",
            Self::NotNullConstraint => "Not null constraint violation",
            Self::ConnectionFailed => "Database connection failed",
            Self::ConnectionTimeout => "Connection timeout",
            Self::AuthenticationFailed => "Authentication failed",
            Self::QueryTimeout => "Query timeout",
            Self::SqlSyntax => "SQL syntax error",
            Self::InvalidParameter => "Invalid parameter",
            Self::DatabaseError => "Database error",
            Self::InvalidDataType => "Invalid data type",
            Self::SerializationError => "Serialization error",
            Self::DeserializationError => "Deserialization error",
            Self::InvalidConfiguration => "Invalid configuration",
            Self::InvalidConnectionString => "Invalid connection string",
            Self::SchemaNotRegistered => "Schema not registered",
            Self::UnsupportedModel => "Unsupported model",
            Self::DuplicateColumn => "Duplicate column",
            Self::Internal => "Internal error",
            Self::Unknown => "Unknown error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A validation failure recorded while a query is being built.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    /// Selected, omitted or referenced columns do not exist.
    #[error("missing cols: {}", .0.join(","))]
    ColumnsNotFound(Vec<String>),

    /// A clause references unknown columns or is not applicable to their types.
    #[error("invalid clause of type: {0}")]
    InvalidClause(String),

    /// An order references an unknown column or is not applicable to its type.
    #[error("invalid order clause: {0}")]
    InvalidOrder(String),

    /// A join is not valid for this query.
    #[error("invalid join of type: {0}")]
    InvalidJoin(String),

    /// The joined model is not registered.
    #[error("failed to find join schema: {0}")]
    JoinSchemaNotFound(String),

    /// A spatial shorthand was used on a schema with zero or several spatial fields.
    #[error("multiple or no spatial fields in schema `{0}`, please specify the column")]
    AmbiguousSpatialColumn(String),

    /// A `*_model` shorthand names a model that has not been joined.
    #[error("target model `{0}` is not joined")]
    TargetModelNotJoined(String),

    /// The query was started for an unregistered model.
    #[error("schema `{0}` is not registered")]
    SchemaNotRegistered(String),
}

/// Suggestion for fixing an error.
#[derive(Debug, Clone)]
pub struct Suggestion {
    /// The suggestion text.
    pub text: String,
    /// Optional code example.
    pub code: Option<String>,
}

impl Suggestion {
    /// Create a new suggestion.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            code: None,
        }
    }

    /// Add a code example.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// Additional context for an error.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The operation that was being performed.
    pub operation: Option<String>,
    /// The model involved.
    pub model: Option<String>,
    /// The field involved.
    pub field: Option<String>,
    /// The SQL statement (if available).
    pub sql: Option<String>,
    /// Suggestions for fixing the error.
    pub suggestions: Vec<Suggestion>,
    /// Help text.
    pub help: Option<String>,
    /// Individual messages folded into this error.
    pub related: Vec<String>,
}

/// Errors that can occur during query operations.
#[derive(Error, Debug)]
pub struct QueryError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// Additional context.
    pub context: ErrorContext,
    /// The source error (if any).
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl QueryError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Add context about the operation.
    pub fn with_context(mut self, operation: impl Into<String>) -> Self {
        self.context.operation = Some(operation.into());
        self
    }

    /// Add a suggestion for fixing the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context.suggestions.push(Suggestion::new(suggestion));
        self
    }

    /// Add a code suggestion.
    pub fn with_code_suggestion(mut self, text: impl Into<String>, code: impl Into<String>) -> Self {
        self.context
            .suggestions
            .push(Suggestion::new(text).with_code(code));
        self
    }

    /// Add help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.context.help = Some(help.into());
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.context.model = Some(model.into());
        self
    }

    /// Set the field.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.context.field = Some(field.into());
        self
    }

    /// Set the SQL statement.
    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.context.sql = Some(sql.into());
        self
    }

    /// Set the source error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // ============== Constructor Functions ==============

    /// Fold the build errors of a query into one error.
    ///
    /// The message is the comma-joined list of individual messages.
    pub fn build(errors: &[BuildError]) -> Self {
        let related: Vec<String> = errors.iter().map(ToString::to_string).collect();
        let mut err = Self::new(ErrorCode::InvalidQuery, related.join(","))
            .with_help("the query was not sent; fix the reported clauses and columns");
        err.context.related = related;
        err
    }

    /// Create a not found error.
    pub fn not_found(model: impl Into<String>) -> Self {
        let model = model.into();
        Self::new(
            ErrorCode::RecordNotFound,
            format!("No {} record found matching the query", model),
        )
        .with_model(&model)
        .with_code_suggestion(
            "Use all() to get an empty list instead of an error",
            format!("db.model(\"{}\").r#where(...).all::<{}>()", model, model),
        )
    }

    /// Create an error for an update given several records.
    pub fn multiple_record_update(model: impl Into<String>, count: usize) -> Self {
        let model = model.into();
        Self::new(
            ErrorCode::MultipleRecordUpdate,
            format!("Can only update 1 {} record each time, got {}", model, count),
        )
        .with_model(model)
    }

    /// Create an error for an update that cannot be targeted.
    pub fn missing_primary_key(model: impl Into<String>) -> Self {
        let model = model.into();
        Self::new(
            ErrorCode::MissingPrimaryKey,
            format!("Cannot update {} without a filter: the model has no primary key", model),
        )
        .with_model(model)
        .with_suggestion("Add a where clause, or mark a field with #[atlas(primary_key)]")
    }

    /// Create an error for a write without records.
    pub fn empty_input(model: impl Into<String>) -> Self {
        let model = model.into();
        Self::new(ErrorCode::EmptyInput, format!("No {} records to write", model)).with_model(model)
    }

    /// Create an error for an update whose SET list would be empty.
    pub fn nothing_to_update(model: impl Into<String>) -> Self {
        let model = model.into();
        Self::new(
            ErrorCode::NothingToUpdate,
            format!("No {} columns left to update", model),
        )
        .with_model(model)
        .with_suggestion("Every column is a primary key or omitted; select a column to change")
    }

    /// Create an error for an unregistered model.
    pub fn schema_not_registered(model: impl Into<String>) -> Self {
        let model = model.into();
        Self::new(
            ErrorCode::SchemaNotRegistered,
            format!("Schema `{}` is not registered", model),
        )
        .with_model(&model)
        .with_code_suggestion(
            "Register the model before using it",
            format!("db.register_model::<{}>()?", model),
        )
    }

    /// Create a constraint violation error.
    pub fn constraint_violation(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(code, message.into())
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConnectionFailed, message.into())
            .with_suggestion("Check that the database server is running and reachable")
    }

    /// Create a timeout error.
    pub fn timeout(duration_ms: u64) -> Self {
        Self::new(
            ErrorCode::QueryTimeout,
            format!("Operation timed out after {}ms", duration_ms),
        )
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidConfiguration, message.into())
    }

    /// Create an SQL syntax error.
    pub fn sql_syntax(message: impl Into<String>, sql: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(ErrorCode::SqlSyntax, format!("SQL syntax error: {}", message))
            .with_sql(sql)
            .with_suggestion("Check the generated SQL for errors")
    }

    /// Create a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SerializationError, message.into())
    }

    /// Create a deserialization error.
    pub fn deserialization(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(
            ErrorCode::DeserializationError,
            format!("Failed to deserialize result: {}", message),
        )
        .with_suggestion("Check that the model matches the database schema")
    }

    /// Create a general database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, format!("Internal error: {}", message.into()))
    }

    // ============== Error Checks ==============

    /// Check if this is a not found error.
    pub fn is_not_found(&self) -> bool {
        self.code == ErrorCode::RecordNotFound
    }

    /// Check if this error was raised while building the query.
    pub fn is_build_error(&self) -> bool {
        self.code == ErrorCode::InvalidQuery
    }

    /// Check if this is a constraint violation.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::UniqueConstraint
                | ErrorCode::ForeignKeyConstraint
                | ErrorCode::CheckConstraint
                | ErrorCode::NotNullConstraint
        )
    }

    /// Check if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(self.code, ErrorCode::QueryTimeout | ErrorCode::ConnectionTimeout)
    }

    /// Check if this is a connection error.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::ConnectionFailed
                | ErrorCode::ConnectionTimeout
                | ErrorCode::AuthenticationFailed
        )
    }

    // ============== Display Functions ==============

    /// Display the full error with all context and suggestions.
    pub fn display_full(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Error [{}]: {}\n", self.code.code(), self.message));

        if let Some(ref op) = self.context.operation {
            output.push_str(&format!("  → While: {}\n", op));
        }
        if let Some(ref model) = self.context.model {
            output.push_str(&format!("  → Model: {}\n", model));
        }
        if let Some(ref field) = self.context.field {
            output.push_str(&format!("  → Field: {}\n", field));
        }
        if let Some(ref sql) = self.context.sql {
            let sql_display = if sql.chars().count() > 200 {
                format!("{}...", sql.chars().take(200).collect::<String>())
            } else {
                sql.clone()
            };
            output.push_str(&format!("  → SQL: {}\n", sql_display));
        }
        for related in &self.context.related {
            output.push_str(&format!("  - {}\n", related));
        }

        if !self.context.suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for (i, suggestion) in self.context.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion.text));
                if let Some(ref code) = suggestion.code {
                    output.push_str(&format!("     ```\n     {}\n     ```\n", code.replace('\n', "\n     ")));
                }
            }
        }

        if let Some(ref help) = self.context.help {
            output.push_str(&format!("\nHelp: {}\n", help));
        }

        output
    }
}

impl From<SchemaError> for QueryError {
    fn from(err: SchemaError) -> Self {
        let code = match &err {
            SchemaError::UnsupportedDataType { .. } | SchemaError::ModelMismatch { .. } => {
                ErrorCode::UnsupportedModel
            }
            SchemaError::DuplicateColumn { .. } | SchemaError::DuplicateField { .. } => {
                ErrorCode::DuplicateColumn
            }
            SchemaError::TypeMismatch { .. } => ErrorCode::DeserializationError,
            SchemaError::GeoJson { .. } => ErrorCode::SerializationError,
        };
        Self::new(code, err.to_string()).with_source(err)
    }
}

impl From<BuildError> for QueryError {
    fn from(err: BuildError) -> Self {
        Self::build(std::slice::from_ref(&err))
    }
}

/// Helper for creating errors with context.
#[macro_export]
macro_rules! query_error {
    ($code:expr, $msg:expr) => {
        $crate::error::QueryError::new($code, $msg)
    };
    ($code:expr, $msg:expr, $($key:ident = $value:expr),+ $(,)?) => {{
        let mut err = $crate::error::QueryError::new($code, $msg);
        $(
            err = err.$key($value);
        )+
        err
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_error_code_format() {
        assert_eq!(ErrorCode::RecordNotFound.code(), "A1001");
        assert_eq!(ErrorCode::UniqueConstraint.code(), "A2001");
        assert_eq!(ErrorCode::SchemaNotRegistered.code(), "A8001");
    }

    #[test]
    fn test_build_error_messages_are_comma_joined() {
        let err = QueryError::build(&[
            BuildError::ColumnsNotFound(vec!["x".into(), "y".into()]),
            BuildError::InvalidClause("LIKE".into()),
        ]);
        assert!(err.is_build_error());
        assert_eq!(err.message, "missing cols: x,y,invalid clause of type: LIKE");
        assert_eq!(err.context.related.len(), 2);
        assert_eq!(
            err.to_string(),
            "[A1002] missing cols: x,y,invalid clause of type: LIKE"
        );
    }

    #[test]
    fn test_not_found_error() {
        let err = QueryError::not_found("CarTest");
        assert!(err.is_not_found());
        assert!(err.message.contains("CarTest"));
        assert_eq!(err.context.model.as_deref(), Some("CarTest"));
    }

    #[test]
    fn test_schema_error_conversion() {
        let err: QueryError = SchemaError::UnsupportedDataType {
            model: "Empty".into(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::UnsupportedModel);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_display_full() {
        let err = QueryError::build(&[BuildError::AmbiguousSpatialColumn("CarTest".into())])
            .with_context("counting cars")
            .with_sql("SELECT 1;");

        let output = err.display_full();
        assert!(output.contains("A1002"));
        assert!(output.contains("While: counting cars"));
        assert!(output.contains("SQL: SELECT 1;"));
        assert!(output.contains("Help:"));
    }

    #[test]
    fn test_error_macro() {
        let err = query_error!(
            ErrorCode::InvalidParameter,
            "Invalid distance",
            with_field = "location",
            with_suggestion = "Use a non-negative range"
        );

        assert_eq!(err.code, ErrorCode::InvalidParameter);
        assert_eq!(err.context.field, Some("location".to_string()));
    }
}
