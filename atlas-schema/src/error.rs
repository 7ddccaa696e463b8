//! Error types for schema registration and value conversion.

// These warnings are false positives - the fields are used by derive macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

use crate::types::DataType;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors that can occur while describing models and converting their values.
#[derive(Error, Debug, Diagnostic)]
pub enum SchemaError {
    /// The model declares no persistable field.
    #[error("unsupported data type: `{model}` has no persistable fields")]
    #[diagnostic(
        code(atlas::schema::unsupported_data_type),
        help("annotate at least one field that implements `SqlType`")
    )]
    UnsupportedDataType { model: String },

    /// Two fields resolve to the same physical column.
    #[error("duplicate column `{column}` in `{model}`: declared by `{first}` and `{second}`")]
    #[diagnostic(
        code(atlas::schema::duplicate_column),
        help("use `#[atlas(column = \"...\")]` to give one of the fields a distinct column name")
    )]
    DuplicateColumn {
        model: String,
        column: String,
        first: String,
        second: String,
    },

    /// A field name was declared twice.
    #[error("duplicate field `{model}.{field}`")]
    #[diagnostic(code(atlas::schema::duplicate_field))]
    DuplicateField { model: String, field: String },

    /// The records handed to a schema belong to a different model.
    #[error("model mismatch: expected `{expected}` records, got `{found}`")]
    #[diagnostic(code(atlas::schema::model_mismatch))]
    ModelMismatch { expected: String, found: String },

    /// A value could not be converted into the declared data type.
    #[error("cannot convert {found} into `{expected}` for column `{column}`")]
    #[diagnostic(code(atlas::schema::type_mismatch))]
    TypeMismatch {
        column: String,
        expected: DataType,
        found: String,
    },

    /// A spatial value could not be encoded or decoded as GeoJSON.
    #[error("invalid GeoJSON: {message}")]
    #[diagnostic(code(atlas::schema::geojson))]
    GeoJson {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },
}

impl SchemaError {
    /// Create a type mismatch error for a column.
    pub fn type_mismatch(
        column: impl Into<String>,
        expected: DataType,
        found: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            column: column.into(),
            expected,
            found: found.into(),
        }
    }

    /// Create a GeoJSON error without an underlying parser error.
    pub fn geojson(message: impl Into<String>) -> Self {
        Self::GeoJson {
            message: message.into(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for SchemaError {
    fn from(err: serde_json::Error) -> Self {
        Self::GeoJson {
            message: err.to_string(),
            source: Some(err),
        }
    }
}
