//! # Atlas
//!
//! A spatially aware ORM and query compiler for PostgreSQL/PostGIS.
//!
//! Atlas provides:
//! - Model schemas derived from plain structs with `#[derive(Model)]`
//! - A fluent, validated query builder with deferred error reporting
//! - Spatial predicates and orderings over `Location` and `Region` values
//! - Table and GiST index DDL generated from the model
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use atlas_orm::prelude::*;
//!
//! #[derive(Model, Default, Debug)]
//! struct CarTest {
//!     #[atlas(primary_key, auto_increment)]
//!     car_id: i32,
//!     location: Location,
//!     designated_zone: String,
//! }
//!
//! fn main() -> Result<(), QueryError> {
//!     let mut db = atlas_orm::connect_with_dsn(
//!         DatabaseType::PostgreSQL,
//!         "postgres://postgres@localhost/gis",
//!     )?;
//!     db.register_model::<CarTest>()?;
//!     db.create_table("CarTest", true)?;
//!
//!     let nearby: Vec<CarTest> = db
//!         .model("CarTest")
//!         .r#where(Clause::equal("designated_zone", "north"))
//!         .within_range_of([Location::new(0.0, 0.0)], 500.0)
//!         .order_by_nearest_to(Location::new(0.0, 0.0), false)
//!         .limit(10)
//!         .all()?;
//!     println!("{nearby:?}");
//!
//!     db.disconnect()
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub use atlas_codegen::Model;
pub use atlas_schema::Model;
pub use atlas_schema::*;

pub use atlas_query::{
    Adapter, AdapterInfo, Builder, BuildError, Clause, Database, DatabaseType, ErrorCode,
    Join, JoinType, Order, PlaceholderStyle, Query, QueryError, QueryInfo, QueryResult,
    QueryType, SchemaInfo, SpatialExtension, SpatialTarget, Target, compile_index_creation,
    compile_sql, compile_table_creation, replace_placeholders,
};

/// Query building, compilation and the database handle.
pub mod query {
    pub use atlas_query::*;
}

/// The PostgreSQL/PostGIS adapter.
#[cfg(feature = "postgres")]
#[cfg_attr(docsrs, doc(cfg(feature = "postgres")))]
pub mod postgres {
    pub use atlas_postgres::*;
}

/// Logging setup.
pub mod logging {
    pub use atlas_query::logging::*;
}

/// Connect to a database by dialect and connection string.
///
/// The returned [`Database`] has no models registered yet.
#[cfg(feature = "postgres")]
#[cfg_attr(docsrs, doc(cfg(feature = "postgres")))]
pub fn connect_with_dsn(database_type: DatabaseType, dsn: &str) -> QueryResult<Database> {
    tracing::debug!(database = %database_type, "connecting");
    match database_type {
        DatabaseType::PostgreSQL => Ok(Database::new(atlas_postgres::connect(dsn)?)),
    }
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{
        Clause, Database, DatabaseType, FromRow, JoinType, Location, Model, Order, Query,
        QueryError, QueryResult, Region, Row, Value,
    };
}
