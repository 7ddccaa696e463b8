//! The boundary between the query compiler and a database driver.

use std::fmt;

use atlas_schema::{Row, Value};

use crate::error::QueryResult;

/// How positional parameters are written in SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaceholderStyle {
    /// `?` for every parameter.
    #[default]
    Question,
    /// `$1`, `$2`, ... numbered from one.
    Dollar,
}

impl PlaceholderStyle {
    /// The placeholder for the parameter at a one-based position.
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Self::Question => "?".to_string(),
            Self::Dollar => format!("${}", index),
        }
    }
}

/// Spatial SQL extension available on the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpatialExtension {
    /// No spatial functions; spatial predicates are rejected.
    #[default]
    None,
    /// PostGIS (`ST_*` functions, `geography` columns).
    PostGis,
}

/// SQL dialect, selecting DDL column types and qualifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatabaseType {
    /// PostgreSQL.
    #[default]
    PostgreSQL,
}

impl fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PostgreSQL => f.write_str("postgresql"),
        }
    }
}

/// Dialect characteristics consulted while validating and compiling queries.
pub trait AdapterInfo {
    /// Placeholder convention for positional parameters.
    fn placeholder(&self) -> PlaceholderStyle;

    /// Available spatial extension.
    fn spatial_type(&self) -> SpatialExtension;

    /// SQL dialect.
    fn database_type(&self) -> DatabaseType;
}

/// A blocking database connection.
///
/// Implementations receive fully compiled statements whose placeholders are
/// already in the adapter's [`PlaceholderStyle`].
pub trait Adapter: AdapterInfo + Send {
    /// Execute a statement that returns no rows. Returns the affected row count.
    fn exec(&self, sql: &str, params: &[Value]) -> QueryResult<u64>;

    /// Execute a statement and collect its rows.
    fn query(&self, sql: &str, params: &[Value]) -> QueryResult<Vec<Row>>;

    /// Close the connection. Further calls fail.
    fn close(&self) -> QueryResult<()>;
}
