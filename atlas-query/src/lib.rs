//! # atlas-query
//!
//! Query building and SQL compilation for the Atlas ORM.
//!
//! This crate provides:
//! - [`Clause`], [`Order`] and [`Join`] trees that validate and render themselves
//! - The plain-data [`Builder`] and the [`compile_sql`] compiler, plus table and
//!   spatial index DDL
//! - The fluent [`Query`] façade with deferred error reporting
//! - [`Database`], the owner of an [`Adapter`] and the schema registry
//!
//! ## Clauses
//!
//! ```rust
//! use atlas_query::{Clause, Order};
//! use atlas_schema::Location;
//!
//! let filter = Clause::equal("designated_zone", "north")
//!     .and_then(Clause::within_range_of("location", [Location::new(0.0, 0.0)], 500.0));
//! assert_eq!(filter.condition(), "AND");
//!
//! let nearest = Order::distance("location", Location::new(1.0, 2.0), false);
//! assert_eq!(nearest.column(), "location");
//! ```
//!
//! ## Compiling without a connection
//!
//! ```rust
//! use atlas_query::{Builder, Clause, PlaceholderStyle, SchemaInfo, compile_sql};
//! use atlas_query::adapter::{AdapterInfo, DatabaseType, SpatialExtension};
//! use atlas_schema::{DataType, FieldDef, Schema, Value};
//!
//! struct Postgres;
//!
//! impl AdapterInfo for Postgres {
//!     fn placeholder(&self) -> PlaceholderStyle { PlaceholderStyle::Dollar }
//!     fn spatial_type(&self) -> SpatialExtension { SpatialExtension::PostGis }
//!     fn database_type(&self) -> DatabaseType { DatabaseType::PostgreSQL }
//! }
//!
//! let schema = Schema::from_defs(
//!     "ModelTest",
//!     "model_test",
//!     vec![FieldDef::new("a", DataType::Int), FieldDef::new("b", DataType::Int)],
//! )
//! .unwrap();
//!
//! let mut builder = Builder::new();
//! builder.clause(Clause::equal("a", 1i64));
//!
//! let (sql, params) = compile_sql(&builder, &SchemaInfo::new(&schema, &Postgres));
//! assert_eq!(sql, "SELECT model_test.a, model_test.b FROM model_test WHERE model_test.a = $1;");
//! assert_eq!(params, vec![Value::Int(1)]);
//! ```

pub mod adapter;
pub mod builder;
pub mod clause;
pub mod compiler;
pub mod database;
pub mod error;
pub mod info;
pub mod join;
pub mod logging;
pub mod order;
pub mod query;
pub mod sql;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(test)]
mod testing;

pub use adapter::{Adapter, AdapterInfo, DatabaseType, PlaceholderStyle, SpatialExtension};
pub use builder::{Builder, QueryType};
pub use clause::{Clause, SpatialTarget, Target};
pub use compiler::{compile_index_creation, compile_sql, compile_table_creation};
pub use database::Database;
pub use error::{BuildError, ErrorCode, ErrorContext, QueryError, QueryResult, Suggestion};
pub use info::{QueryInfo, SchemaInfo};
pub use join::{Join, JoinType};
pub use logging::{get_log_format, get_log_level, init as init_logging, init_with_level, is_debug_enabled};
pub use order::Order;
pub use query::Query;
pub use sql::{SqlBuilder, replace_placeholders};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::clause::Clause;
    pub use crate::database::Database;
    pub use crate::error::{QueryError, QueryResult};
    pub use crate::join::JoinType;
    pub use crate::order::Order;
    pub use crate::query::Query;
}
