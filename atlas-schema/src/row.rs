//! Result rows and the row scanner contract.

use indexmap::IndexMap;

use crate::error::{SchemaError, SchemaResult};
use crate::value::{SqlType, Value};

/// One result row: column names mapped to values, in select order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: IndexMap<String, Value>,
}

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column value. A repeated column name keeps its first position.
    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        self.columns.insert(column.into(), value);
    }

    /// Builder-style [`Row::insert`].
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value.into());
        self
    }

    /// Whether the row carries this column.
    pub fn contains(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    /// The raw value of a column.
    pub fn value(&self, column: &str) -> Option<&Value> {
        self.columns.get(column)
    }

    /// The raw value at a position.
    pub fn value_at(&self, index: usize) -> Option<&Value> {
        self.columns.get_index(index).map(|(_, v)| v)
    }

    /// Read and convert a column.
    pub fn get<T: SqlType>(&self, column: &str) -> SchemaResult<T> {
        let value = self.columns.get(column).cloned().unwrap_or(Value::Null);
        T::from_value(value).map_err(|found| {
            SchemaError::type_mismatch(column, T::data_type(), found.type_name())
        })
    }

    /// Read and convert a column, falling back to `T::default()` when the
    /// column was not selected.
    pub fn get_or_default<T: SqlType + Default>(&self, column: &str) -> SchemaResult<T> {
        if self.contains(column) {
            self.get(column)
        } else {
            Ok(T::default())
        }
    }

    /// Column names in order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Iterate over `(column, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Materialize a value from a result row.
///
/// Columns are matched by physical column name. Implementations generated by
/// `#[derive(Model)]` leave fields whose column was not selected at their
/// `Default`.
pub trait FromRow: Sized {
    /// Build a value from one row.
    fn from_row(row: &Row) -> SchemaResult<Self>;
}
