//! Registered schemas.

use convert_case::{Case, Casing};
use indexmap::IndexMap;
use smol_str::SmolStr;
use tracing::debug;

use crate::error::{SchemaError, SchemaResult};
use crate::field::{Field, FieldDef};
use crate::model::Model;
use crate::set::Set;
use crate::types::DataType;

/// The persisted shape of one model type.
///
/// The name sets (`all_field_names` and friends) hold qualified
/// `Schema.field` names so that sets from several schemas can be combined
/// when a query joins them.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    name: SmolStr,
    table: SmolStr,
    fields: Vec<Field>,
    by_name: IndexMap<SmolStr, usize>,
    by_db_name: IndexMap<SmolStr, usize>,
    primary_fields: Vec<usize>,
    all_field_names: Set,
    primary_field_names: Set,
    location_field_names: Set,
    region_field_names: Set,
}

impl Schema {
    /// Build the schema of a model type from its field descriptors.
    pub fn parse<M: Model>() -> SchemaResult<Self> {
        Self::from_defs(M::NAME, M::table_name(), M::fields())
    }

    /// Build a schema from explicit field descriptors.
    ///
    /// Column names default to the snake_case form of the field name. A
    /// column name used by two fields is rejected.
    pub fn from_defs(
        name: &str,
        table: impl Into<String>,
        defs: Vec<FieldDef>,
    ) -> SchemaResult<Self> {
        if defs.is_empty() {
            return Err(SchemaError::UnsupportedDataType {
                model: name.to_string(),
            });
        }

        let name = SmolStr::new(name);
        let table = SmolStr::new(table.into());
        let mut schema = Schema {
            name: name.clone(),
            table: table.clone(),
            fields: Vec::with_capacity(defs.len()),
            by_name: IndexMap::new(),
            by_db_name: IndexMap::new(),
            primary_fields: Vec::new(),
            all_field_names: Set::new(),
            primary_field_names: Set::new(),
            location_field_names: Set::new(),
            region_field_names: Set::new(),
        };

        for def in defs {
            let db_name = match def.column {
                Some(column) => SmolStr::new(column),
                None => SmolStr::new(def.name.to_case(Case::Snake)),
            };

            if schema.by_name.contains_key(def.name) {
                return Err(SchemaError::DuplicateField {
                    model: name.to_string(),
                    field: def.name.to_string(),
                });
            }
            if let Some(&existing) = schema.by_db_name.get(&db_name) {
                return Err(SchemaError::DuplicateColumn {
                    model: name.to_string(),
                    column: db_name.to_string(),
                    first: schema.fields[existing].name.to_string(),
                    second: def.name.to_string(),
                });
            }

            let field = Field {
                name: SmolStr::new(def.name),
                db_name,
                data_type: def.data_type,
                primary_key: def.primary_key,
                auto_increment: def.auto_increment,
                not_null: def.not_null,
                unique: def.unique,
                has_default: def.has_default,
                default_value: def.default_value,
                schema: name.clone(),
                table: table.clone(),
            };

            let index = schema.fields.len();
            let full_name = field.full_name();
            if field.primary_key {
                schema.primary_fields.push(index);
                schema.primary_field_names.add(full_name.clone());
            }
            match field.data_type {
                DataType::Location => {
                    schema.location_field_names.add(full_name.clone());
                }
                DataType::Region => {
                    schema.region_field_names.add(full_name.clone());
                }
                _ => {}
            }
            schema.all_field_names.add(full_name);
            schema.by_name.insert(field.name.clone(), index);
            schema.by_db_name.insert(field.db_name.clone(), index);
            schema.fields.push(field);
        }

        debug!(
            schema = %schema.name,
            table = %schema.table,
            fields = schema.fields.len(),
            "parsed schema"
        );
        Ok(schema)
    }

    /// A schema with no fields, standing in for a model that was never
    /// registered. Every field lookup on it fails.
    pub fn empty(name: &str) -> Self {
        Schema {
            name: SmolStr::new(name),
            table: SmolStr::new(name.to_case(Case::Snake)),
            fields: Vec::new(),
            by_name: IndexMap::new(),
            by_db_name: IndexMap::new(),
            primary_fields: Vec::new(),
            all_field_names: Set::new(),
            primary_field_names: Set::new(),
            location_field_names: Set::new(),
            region_field_names: Set::new(),
        }
    }

    /// Capture default values for every field declared with a bare
    /// `default` attribute from a sample record.
    pub fn set_default_values<M: Model>(&mut self, sample: &M) {
        for (name, value) in sample.values() {
            if let Some(&index) = self.by_name.get(name) {
                let field = &mut self.fields[index];
                if field.has_default && field.default_value.is_none() {
                    field.default_value = Some(value);
                }
            }
        }
    }

    /// Logical name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Physical table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Look up a field by logical name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.by_name.get(name).map(|&i| &self.fields[i])
    }

    /// Look up a field by physical column name.
    pub fn field_by_db_name(&self, db_name: &str) -> Option<&Field> {
        self.by_db_name.get(db_name).map(|&i| &self.fields[i])
    }

    /// Physical column names in declaration order.
    pub fn db_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.db_name.as_str()).collect()
    }

    /// Primary key fields in declaration order.
    pub fn primary_fields(&self) -> impl Iterator<Item = &Field> {
        self.primary_fields.iter().map(|&i| &self.fields[i])
    }

    /// Qualified names of all fields.
    pub fn all_field_names(&self) -> &Set {
        &self.all_field_names
    }

    /// Qualified names of the primary key fields.
    pub fn primary_field_names(&self) -> &Set {
        &self.primary_field_names
    }

    /// Qualified names of the location fields.
    pub fn location_field_names(&self) -> &Set {
        &self.location_field_names
    }

    /// Qualified names of the region fields.
    pub fn region_field_names(&self) -> &Set {
        &self.region_field_names
    }

    /// The qualified name of the single spatial field, if there is exactly one.
    pub fn single_spatial_field(&self) -> Option<&str> {
        let mut spatial = self
            .location_field_names
            .iter()
            .chain(self.region_field_names.iter());
        match (spatial.next(), spatial.next()) {
            (Some(name), None) => Some(name),
            _ => None,
        }
    }
}
