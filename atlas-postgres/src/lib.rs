//! # atlas-postgres
//!
//! PostgreSQL/PostGIS adapter for the Atlas ORM.
//!
//! The adapter wraps a single `tokio-postgres` connection behind the blocking
//! [`atlas_query::Adapter`] interface. Statements use `$N` placeholders,
//! geography columns are written with `ST_GeomFromGeoJSON` and read back as
//! GeoJSON text.
//!
//! ## Example
//!
//! ```rust,no_run
//! use atlas_postgres::{PgAdapter, PgConfig};
//! use atlas_query::Database;
//!
//! let config = PgConfig::from_url("postgres://postgres@localhost/gis")?;
//! let db = Database::new(PgAdapter::connect(&config)?);
//! let rows = db.query("SELECT PostGIS_Version() AS version", &[])?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod adapter;
pub mod config;
pub mod error;
pub mod row;
pub mod types;

pub use adapter::{DEFAULT_STATEMENT_CACHE_SIZE, PgAdapter};
pub use config::{PgConfig, PgConfigBuilder, SslMode};
pub use error::{PgError, PgResult};

use atlas_query::QueryResult;

/// Connect to a `postgres://` URL, reporting failures as [`atlas_query::QueryError`].
pub fn connect(dsn: &str) -> QueryResult<PgAdapter> {
    Ok(PgAdapter::connect_url(dsn)?)
}

/// Connect using `ATLAS_DATABASE_URL` or `DATABASE_URL`.
pub fn connect_from_env() -> QueryResult<PgAdapter> {
    let config = PgConfig::from_env()?;
    Ok(PgAdapter::connect(&config)?)
}
