//! Field descriptors.

use smol_str::SmolStr;

use crate::types::DataType;
use crate::value::Value;

/// Static description of one model field, as declared on the model type.
///
/// This is what `#[derive(Model)]` emits; [`crate::Schema::parse`] turns a
/// list of these into resolved [`Field`]s.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    /// Logical (Rust) name.
    pub name: &'static str,
    /// Explicit column name, if overridden.
    pub column: Option<&'static str>,
    /// Logical type.
    pub data_type: DataType,
    /// Part of the primary key.
    pub primary_key: bool,
    /// Generated by the database.
    pub auto_increment: bool,
    /// Declared `NOT NULL`.
    pub not_null: bool,
    /// Declared `UNIQUE`.
    pub unique: bool,
    /// Has a column default.
    pub has_default: bool,
    /// The default value, when declared inline.
    pub default_value: Option<Value>,
}

impl FieldDef {
    /// Describe a field with no attributes.
    pub fn new(name: &'static str, data_type: DataType) -> Self {
        Self {
            name,
            column: None,
            data_type,
            primary_key: false,
            auto_increment: false,
            not_null: false,
            unique: false,
            has_default: false,
            default_value: None,
        }
    }

    /// Override the column name.
    pub fn column(mut self, column: &'static str) -> Self {
        self.column = Some(column);
        self
    }

    /// Override the data type by name.
    pub fn type_override(mut self, name: &str) -> Self {
        self.data_type = DataType::parse(name);
        self
    }

    /// Mark as primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Mark as auto-increment.
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Mark as not null.
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Mark as unique.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Declare a default whose value is captured later from a sample record.
    pub fn has_default(mut self) -> Self {
        self.has_default = true;
        self
    }

    /// Declare a default value.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.has_default = true;
        self.default_value = Some(value.into());
        self
    }
}

/// A resolved, persisted field of a registered schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Logical name.
    pub name: SmolStr,
    /// Physical column name.
    pub db_name: SmolStr,
    /// Logical type.
    pub data_type: DataType,
    /// Part of the primary key.
    pub primary_key: bool,
    /// Generated by the database.
    pub auto_increment: bool,
    /// Declared `NOT NULL`.
    pub not_null: bool,
    /// Declared `UNIQUE`.
    pub unique: bool,
    /// Has a column default.
    pub has_default: bool,
    /// Captured default value; `None` renders as `DEFAULT NULL`.
    pub default_value: Option<Value>,
    /// Logical name of the owning schema.
    pub schema: SmolStr,
    /// Table of the owning schema.
    pub table: SmolStr,
}

impl Field {
    /// `Schema.field`, the name used in selections and clauses across joins.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }

    /// `table.column`, the name rendered into SQL.
    pub fn full_db_name(&self) -> String {
        format!("{}.{}", self.table, self.db_name)
    }

    /// Whether the field holds a location or region.
    pub fn is_spatial(&self) -> bool {
        self.data_type.is_spatial()
    }
}
