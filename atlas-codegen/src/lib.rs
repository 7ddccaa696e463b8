//! Procedural macros for the Atlas ORM.
//!
//! # Example
//!
//! ```rust,ignore
//! use atlas_orm::{Location, Model};
//!
//! #[derive(Model, Default)]
//! struct CarTest {
//!     #[atlas(primary_key, auto_increment)]
//!     car_id: i32,
//!     location: Location,
//!     designated_zone: String,
//! }
//! ```

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod generators;

/// Derive the `Model` and `FromRow` traits for a struct with named fields.
///
/// Every non-skipped field type must implement `SqlType`, and `Default`
/// so that unselected columns can be filled in when scanning rows.
///
/// # Attributes
///
/// ## Struct-level
/// - `#[atlas(table = "table_name")]` - Override the snake_case table name
/// - `#[atlas(crate = "path")]` - Path to the crate exporting the model traits (default `::atlas_orm`)
///
/// ## Field-level
/// - `#[atlas(primary_key)]` (or `primarykey`) - Part of the primary key
/// - `#[atlas(auto_increment)]` (or `autoincrement`) - Generated by the database
/// - `#[atlas(not_null)]` - `NOT NULL` constraint
/// - `#[atlas(unique)]` - `UNIQUE` constraint
/// - `#[atlas(default)]` - Column default, captured from a sample record at registration
/// - `#[atlas(default = expr)]` - Column default given inline
/// - `#[atlas(column = "col_name")]` - Map to a different column
/// - `#[atlas(type = "name")]` - Override the column data type
/// - `#[atlas(skip)]` - Do not persist this field
///
/// # Example
///
/// ```rust,ignore
/// #[derive(atlas_orm::Model, Default)]
/// #[atlas(table = "zones")]
/// struct ZoneTest {
///     #[atlas(primary_key, auto_increment)]
///     zone_id: i32,
///
///     #[atlas(unique, default = "unnamed")]
///     name: String,
///
///     region: atlas_orm::Region,
/// }
/// ```
#[proc_macro_derive(Model, attributes(atlas))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match generators::derive_model_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
