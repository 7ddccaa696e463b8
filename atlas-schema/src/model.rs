//! The model contract implemented by persisted record types.

use convert_case::{Case, Casing};
use indexmap::IndexMap;

use crate::error::{SchemaError, SchemaResult};
use crate::field::FieldDef;
use crate::row::FromRow;
use crate::schema::Schema;
use crate::value::Value;

/// A record type that can be registered with a database.
///
/// Usually implemented with `#[derive(Model)]`:
///
/// ```rust,ignore
/// #[derive(Model, Default)]
/// struct CarTest {
///     #[atlas(primary_key, auto_increment)]
///     car_id: i32,
///     location: Location,
///     designated_zone: String,
/// }
/// ```
pub trait Model: FromRow + 'static {
    /// Logical name, used as the registry key and in qualified names.
    const NAME: &'static str;

    /// Physical table name. Defaults to the snake_case form of [`Model::NAME`].
    fn table_name() -> String {
        Self::NAME.to_case(Case::Snake)
    }

    /// Static description of each persisted field, in declaration order.
    fn fields() -> Vec<FieldDef>;

    /// The persisted field values of this record, keyed by logical name.
    fn values(&self) -> Vec<(&'static str, Value)>;
}

/// Logical name of a model type, used for registry lookups.
pub fn parse_type<M: Model>() -> &'static str {
    M::NAME
}

/// Extract the persisted values of each record, restricted to the schema's
/// fields and in schema field order.
///
/// Fields the record does not report are bound as NULL.
pub fn parse_object<M: Model>(
    records: &[M],
    schema: &Schema,
) -> SchemaResult<Vec<IndexMap<String, Value>>> {
    if schema.name() != M::NAME {
        return Err(SchemaError::ModelMismatch {
            expected: schema.name().to_string(),
            found: M::NAME.to_string(),
        });
    }

    Ok(records
        .iter()
        .map(|record| {
            let mut values: IndexMap<&str, Value> = record.values().into_iter().collect();
            schema
                .fields()
                .iter()
                .map(|field| {
                    let value = values.swap_remove(field.name.as_str()).unwrap_or_default();
                    (field.name.to_string(), value)
                })
                .collect()
        })
        .collect())
}
