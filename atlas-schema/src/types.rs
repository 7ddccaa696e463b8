//! Logical data types of persisted fields.

use std::fmt;

use smol_str::SmolStr;

/// The logical type of a field, independent of any SQL dialect.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Boolean.
    Bool,
    /// Signed integer.
    Int,
    /// Unsigned integer.
    Uint,
    /// Floating point number.
    Float,
    /// Text.
    String,
    /// Time of day.
    Time,
    /// Raw bytes.
    Bytes,
    /// A single point ([`crate::Location`]).
    Location,
    /// A polygon ([`crate::Region`]).
    Region,
    /// Date and time without zone.
    Timestamp,
    /// An explicit type override that is passed through to the database verbatim.
    Custom(SmolStr),
}

impl DataType {
    /// Resolve an explicit `type = "..."` override.
    ///
    /// Known names are matched case-insensitively; anything else is kept
    /// verbatim as a custom column type.
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "bool" => Self::Bool,
            "int" => Self::Int,
            "uint" => Self::Uint,
            "float" => Self::Float,
            "string" => Self::String,
            "time" => Self::Time,
            "bytes" => Self::Bytes,
            "location" => Self::Location,
            "region" => Self::Region,
            "timestamp" => Self::Timestamp,
            _ => Self::Custom(SmolStr::new(name)),
        }
    }

    /// The type name as used in diagnostics and overrides.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Uint => "uint",
            Self::Float => "float",
            Self::String => "string",
            Self::Time => "time",
            Self::Bytes => "bytes",
            Self::Location => "location",
            Self::Region => "region",
            Self::Timestamp => "timestamp",
            Self::Custom(name) => name.as_str(),
        }
    }

    /// Whether this is a location or region type.
    pub fn is_spatial(&self) -> bool {
        matches!(self, Self::Location | Self::Region)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
