//! # atlas-schema
//!
//! Schema model and value types for the Atlas ORM.
//!
//! This crate provides:
//! - [`Schema`] and [`Field`], the resolved persisted shape of a model type
//! - The [`Model`], [`SqlType`] and [`FromRow`] contracts that `#[derive(Model)]` implements
//! - [`Value`], the currency for bound parameters and result rows
//! - Spatial value types ([`Location`], [`Region`]) with GeoJSON encoding
//! - [`Set`], an insertion-ordered name set used for column bookkeeping
//!
//! ## Example
//!
//! ```rust
//! use atlas_schema::{DataType, FieldDef, Schema};
//!
//! let schema = Schema::from_defs(
//!     "CarTest",
//!     "car_test",
//!     vec![
//!         FieldDef::new("car_id", DataType::Int).primary_key().auto_increment(),
//!         FieldDef::new("location", DataType::Location),
//!     ],
//! )
//! .unwrap();
//!
//! assert_eq!(schema.db_names(), vec!["car_id", "location"]);
//! assert_eq!(schema.single_spatial_field(), Some("CarTest.location"));
//! ```

pub mod error;
pub mod field;
pub mod model;
pub mod row;
pub mod schema;
pub mod set;
pub mod spatial;
pub mod types;
pub mod value;

pub use error::{SchemaError, SchemaResult};
pub use field::{Field, FieldDef};
pub use model::{Model, parse_object, parse_type};
pub use row::{FromRow, Row};
pub use schema::Schema;
pub use set::Set;
pub use spatial::{Location, Region, SpatialObject};
pub use types::DataType;
pub use value::{SqlType, Value};
