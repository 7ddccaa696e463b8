//! Read-only schema and dialect metadata for validation and rendering.

use atlas_schema::{DataType, Field, Schema};

use crate::adapter::AdapterInfo;

/// What clause, order and join nodes may ask about the query they belong to.
///
/// Field names are either bare (`field`, resolved against the main schema) or
/// qualified (`Schema.field`, resolved against the main or a joined schema).
pub trait QueryInfo {
    /// The schema the query is rooted at.
    fn main_schema(&self) -> &Schema;

    /// Joined schemas in join order.
    fn join_schemas(&self) -> Vec<&Schema>;

    /// Dialect characteristics of the connection.
    fn adapter_info(&self) -> &dyn AdapterInfo;

    /// Whether `schema` is the main schema or a joined one.
    fn has_schema(&self, schema: &str) -> bool {
        self.schema(schema).is_some()
    }

    /// Look up the main or a joined schema by logical name.
    fn schema(&self, name: &str) -> Option<&Schema> {
        let main = self.main_schema();
        if main.name() == name {
            return Some(main);
        }
        self.join_schemas().into_iter().find(|s| s.name() == name)
    }

    /// Resolve a bare or qualified field name.
    fn field(&self, name: &str) -> Option<&Field> {
        let (schema, field) = split_field_name(name)?;
        match schema {
            Some(schema) => self.schema(schema)?.field(field),
            None => self.main_schema().field(field),
        }
    }

    /// Whether the field resolves.
    fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Whether the field resolves and has the given type.
    fn has_field_of_type(&self, name: &str, data_type: &DataType) -> bool {
        self.field(name).is_some_and(|f| &f.data_type == data_type)
    }
}

/// Split `Schema.field` into its parts. A bare name has no schema part.
///
/// Returns `None` for names with more than one dot or empty parts.
pub fn split_field_name(name: &str) -> Option<(Option<&str>, &str)> {
    let mut parts = name.split('.');
    let result = match (parts.next(), parts.next(), parts.next()) {
        (Some(field), None, None) => (None, field),
        (Some(schema), Some(field), None) if !schema.is_empty() => (Some(schema), field),
        _ => return None,
    };
    if result.1.is_empty() {
        None
    } else {
        Some(result)
    }
}

/// A [`QueryInfo`] over explicit schemas, for statements built outside a query.
pub struct SchemaInfo<'a> {
    schema: &'a Schema,
    joins: Vec<&'a Schema>,
    adapter: &'a dyn AdapterInfo,
}

impl<'a> SchemaInfo<'a> {
    /// Metadata for a single schema.
    pub fn new(schema: &'a Schema, adapter: &'a dyn AdapterInfo) -> Self {
        Self {
            schema,
            joins: Vec::new(),
            adapter,
        }
    }

    /// Add a joined schema.
    pub fn with_join(mut self, schema: &'a Schema) -> Self {
        self.joins.push(schema);
        self
    }
}

impl QueryInfo for SchemaInfo<'_> {
    fn main_schema(&self) -> &Schema {
        self.schema
    }

    fn join_schemas(&self) -> Vec<&Schema> {
        self.joins.clone()
    }

    fn adapter_info(&self) -> &dyn AdapterInfo {
        self.adapter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{PostGis, car_schema, zone_schema};

    #[test]
    fn test_split_field_name() {
        assert_eq!(split_field_name("a"), Some((None, "a")));
        assert_eq!(split_field_name("Car.a"), Some((Some("Car"), "a")));
        assert_eq!(split_field_name("a.b.c"), None);
        assert_eq!(split_field_name("Car."), None);
        assert_eq!(split_field_name(".a"), None);
    }

    #[test]
    fn test_field_resolution_across_joins() {
        let car = car_schema();
        let zone = zone_schema();
        let info = SchemaInfo::new(&car, &PostGis).with_join(&zone);

        assert!(info.has_field("location"));
        assert!(info.has_field("CarTest.location"));
        assert!(info.has_field("ZoneTest.region"));
        assert!(!info.has_field("region"));
        assert!(!info.has_field("Other.region"));
        assert!(info.has_field_of_type("ZoneTest.region", &DataType::Region));
        assert!(!info.has_field_of_type("location", &DataType::Region));
        assert!(info.has_schema("ZoneTest"));
    }
}
