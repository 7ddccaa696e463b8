//! Runtime values and the Rust type to column type mapping.

use chrono::{DateTime, NaiveDateTime, NaiveTime, Utc};

use crate::spatial::{Location, Region, SpatialObject};
use crate::types::DataType;

/// A single field value, as bound to a statement or read back from a row.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// SQL NULL.
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    Uint(u64),
    /// Floating point.
    Float(f64),
    /// Text.
    String(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// Time of day.
    Time(NaiveTime),
    /// Date and time without zone.
    Timestamp(NaiveDateTime),
    /// A point.
    Location(Location),
    /// A polygon.
    Region(Region),
}

impl Value {
    /// Short name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Uint(_) => "uint",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Time(_) => "time",
            Self::Timestamp(_) => "timestamp",
            Self::Location(_) => "location",
            Self::Region(_) => "region",
        }
    }

    /// Check if the value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether the value is a location or region.
    pub fn is_spatial(&self) -> bool {
        matches!(self, Self::Location(_) | Self::Region(_))
    }

    /// The logical type of the value, `None` for NULL.
    pub fn data_type(&self) -> Option<DataType> {
        Some(match self {
            Self::Null => return None,
            Self::Bool(_) => DataType::Bool,
            Self::Int(_) => DataType::Int,
            Self::Uint(_) => DataType::Uint,
            Self::Float(_) => DataType::Float,
            Self::String(_) => DataType::String,
            Self::Bytes(_) => DataType::Bytes,
            Self::Time(_) => DataType::Time,
            Self::Timestamp(_) => DataType::Timestamp,
            Self::Location(_) => DataType::Location,
            Self::Region(_) => DataType::Region,
        })
    }

    /// Render the value as an inline SQL literal.
    ///
    /// Spatial values render as their quoted GeoJSON text; wrapping that in a
    /// geometry constructor is left to the dialect.
    pub fn to_sql_literal(&self) -> String {
        match self {
            Self::Null => "NULL".to_string(),
            Self::Bool(true) => "TRUE".to_string(),
            Self::Bool(false) => "FALSE".to_string(),
            Self::Int(v) => v.to_string(),
            Self::Uint(v) => v.to_string(),
            Self::Float(v) if v.is_nan() => "'NaN'::float8".to_string(),
            Self::Float(v) if v.is_infinite() => {
                if v.is_sign_positive() {
                    "'Infinity'::float8".to_string()
                } else {
                    "'-Infinity'::float8".to_string()
                }
            }
            Self::Float(v) => v.to_string(),
            Self::String(s) => quote_literal(s),
            Self::Bytes(bytes) => {
                let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
                format!("'\\x{}'", hex)
            }
            Self::Time(t) => quote_literal(&t.format("%H:%M:%S%.f").to_string()),
            Self::Timestamp(ts) => quote_literal(&ts.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
            Self::Location(location) => location
                .to_geojson()
                .map(|json| quote_literal(&json))
                .unwrap_or_else(|_| "NULL".to_string()),
            Self::Region(region) => region
                .to_geojson()
                .map(|json| quote_literal(&json))
                .unwrap_or_else(|_| "NULL".to_string()),
        }
    }
}

fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Conversion between a Rust field type and a [`Value`].
///
/// Implementing this trait is what makes a type usable as a model field; the
/// reported [`DataType`] decides the column type and which predicates apply.
pub trait SqlType: Sized {
    /// The logical type of this Rust type.
    fn data_type() -> DataType;

    /// Convert into a bindable value.
    fn to_value(&self) -> Value;

    /// Convert back from a value read from the database.
    ///
    /// On mismatch the original value is handed back so the caller can report it.
    fn from_value(value: Value) -> Result<Self, Value>;
}

macro_rules! impl_sql_int {
    ($variant:ident, $data_type:ident, $wide:ty: $($ty:ty),+) => {
        $(
            impl SqlType for $ty {
                fn data_type() -> DataType {
                    DataType::$data_type
                }

                fn to_value(&self) -> Value {
                    Value::$variant(*self as $wide)
                }

                fn from_value(value: Value) -> Result<Self, Value> {
                    match value {
                        Value::Int(v) => <$ty>::try_from(v).map_err(|_| Value::Int(v)),
                        Value::Uint(v) => <$ty>::try_from(v).map_err(|_| Value::Uint(v)),
                        other => Err(other),
                    }
                }
            }

            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v as $wide)
                }
            }
        )+
    };
}

impl_sql_int!(Int, Int, i64: i8, i16, i32, i64, isize);
impl_sql_int!(Uint, Uint, u64: u16, u32, u64, usize);

impl SqlType for bool {
    fn data_type() -> DataType {
        DataType::Bool
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Bool(v) => Ok(v),
            other => Err(other),
        }
    }
}

impl SqlType for f64 {
    fn data_type() -> DataType {
        DataType::Float
    }

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Float(v) => Ok(v),
            Value::Int(v) => Ok(v as f64),
            Value::Uint(v) => Ok(v as f64),
            other => Err(other),
        }
    }
}

impl SqlType for f32 {
    fn data_type() -> DataType {
        DataType::Float
    }

    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        f64::from_value(value).map(|v| v as f32)
    }
}

impl SqlType for String {
    fn data_type() -> DataType {
        DataType::String
    }

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::String(v) => Ok(v),
            other => Err(other),
        }
    }
}

impl SqlType for Vec<u8> {
    fn data_type() -> DataType {
        DataType::Bytes
    }

    fn to_value(&self) -> Value {
        Value::Bytes(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Bytes(v) => Ok(v),
            other => Err(other),
        }
    }
}

impl SqlType for NaiveTime {
    fn data_type() -> DataType {
        DataType::Time
    }

    fn to_value(&self) -> Value {
        Value::Time(*self)
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Time(v) => Ok(v),
            other => Err(other),
        }
    }
}

impl SqlType for NaiveDateTime {
    fn data_type() -> DataType {
        DataType::Timestamp
    }

    fn to_value(&self) -> Value {
        Value::Timestamp(*self)
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Timestamp(v) => Ok(v),
            other => Err(other),
        }
    }
}

impl SqlType for DateTime<Utc> {
    fn data_type() -> DataType {
        DataType::Timestamp
    }

    fn to_value(&self) -> Value {
        Value::Timestamp(self.naive_utc())
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        NaiveDateTime::from_value(value).map(|ts| ts.and_utc())
    }
}

impl SqlType for Location {
    fn data_type() -> DataType {
        DataType::Location
    }

    fn to_value(&self) -> Value {
        Value::Location(*self)
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Location(v) => Ok(v),
            Value::String(text) => Location::from_geojson(&text).map_err(|_| Value::String(text)),
            other => Err(other),
        }
    }
}

impl SqlType for Region {
    fn data_type() -> DataType {
        DataType::Region
    }

    fn to_value(&self) -> Value {
        Value::Region(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Region(v) => Ok(v),
            Value::String(text) => Region::from_geojson(&text).map_err(|_| Value::String(text)),
            other => Err(other),
        }
    }
}

impl<T: SqlType> SqlType for Option<T> {
    fn data_type() -> DataType {
        T::data_type()
    }

    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<NaiveTime> for Value {
    fn from(v: NaiveTime) -> Self {
        Value::Time(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v.naive_utc())
    }
}

impl From<Location> for Value {
    fn from(v: Location) -> Self {
        Value::Location(v)
    }
}

impl From<Region> for Value {
    fn from(v: Region) -> Self {
        Value::Region(v)
    }
}

impl From<SpatialObject> for Value {
    fn from(v: SpatialObject) -> Self {
        match v {
            SpatialObject::Location(location) => Value::Location(location),
            SpatialObject::Region(region) => Value::Region(region),
        }
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
