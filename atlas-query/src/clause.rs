//! Predicate trees for WHERE and JOIN ... ON conditions.
//!
//! A [`Clause`] names its columns by logical field name (`field` on the main
//! schema, `Schema.field` for any schema in the query). Nodes are checked and
//! rendered against a [`QueryInfo`], which supplies the schemas and dialect.
//!
//! ```rust
//! use atlas_query::clause::Clause;
//! use atlas_schema::Region;
//!
//! let clause = Clause::and([
//!     Clause::equal("designated_zone", "north"),
//!     Clause::covered_by("location", Region::rect(-50.0, 50.0, -50.0, 50.0)),
//! ]);
//! assert_eq!(clause.condition(), "AND");
//! ```

use atlas_schema::{DataType, Location, Region, SpatialObject, Value};

use crate::adapter::SpatialExtension;
use crate::info::QueryInfo;
use crate::sql::SqlBuilder;

/// The right-hand side of a scalar comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// A literal, bound as a positional parameter.
    Value(Value),
    /// Another column, rendered inline.
    Column(String),
}

/// The right-hand side of a spatial predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum SpatialTarget {
    /// A literal geometry, bound as GeoJSON.
    Object(SpatialObject),
    /// Another location or region column.
    Column(String),
}

impl From<SpatialObject> for SpatialTarget {
    fn from(object: SpatialObject) -> Self {
        Self::Object(object)
    }
}

impl From<Location> for SpatialTarget {
    fn from(location: Location) -> Self {
        Self::Object(location.into())
    }
}

impl From<Region> for SpatialTarget {
    fn from(region: Region) -> Self {
        Self::Object(region.into())
    }
}

/// A predicate node.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// `column = target`.
    Equal(String, Target),
    /// `column <> target`.
    NotEqual(String, Target),
    /// `column > target`.
    GreaterThan(String, Target),
    /// `column < target`.
    LessThan(String, Target),
    /// `column >= target`.
    GreaterThanOrEqual(String, Target),
    /// `column <= target`.
    LessThanOrEqual(String, Target),
    /// `column LIKE target`.
    Like(String, Target),
    /// `column NOT LIKE target`.
    NotLike(String, Target),
    /// The column lies inside the target.
    CoveredBy(String, SpatialTarget),
    /// The column contains the target.
    Covers(String, SpatialTarget),
    /// The column is within `range` meters of any target.
    WithinRangeOf {
        /// Spatial column.
        column: String,
        /// Candidate geometries.
        targets: Vec<SpatialTarget>,
        /// Distance in meters.
        range: f64,
    },
    /// The column is within `range` meters of every target.
    HasWithinRange {
        /// Spatial column.
        column: String,
        /// Required geometries.
        targets: Vec<SpatialTarget>,
        /// Distance in meters.
        range: f64,
    },
    /// All children hold.
    And(Vec<Clause>),
    /// At least one child holds.
    Or(Vec<Clause>),
}

macro_rules! comparison_constructors {
    ($($variant:ident => $value_fn:ident, $column_fn:ident;)*) => {
        $(
            #[doc = concat!("`", stringify!($variant), "` against a literal.")]
            pub fn $value_fn(column: impl Into<String>, value: impl Into<Value>) -> Self {
                Self::$variant(column.into(), Target::Value(value.into()))
            }

            #[doc = concat!("`", stringify!($variant), "` against another column.")]
            pub fn $column_fn(column: impl Into<String>, other: impl Into<String>) -> Self {
                Self::$variant(column.into(), Target::Column(other.into()))
            }
        )*
    };
}

impl Clause {
    comparison_constructors! {
        Equal => equal, equal_column;
        NotEqual => not_equal, not_equal_column;
        GreaterThan => greater_than, greater_than_column;
        LessThan => less_than, less_than_column;
        GreaterThanOrEqual => greater_than_or_equal, greater_than_or_equal_column;
        LessThanOrEqual => less_than_or_equal, less_than_or_equal_column;
    }

    /// `column LIKE pattern`.
    pub fn like(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::Like(column.into(), Target::Value(Value::String(pattern.into())))
    }

    /// `column NOT LIKE pattern`.
    pub fn not_like(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::NotLike(column.into(), Target::Value(Value::String(pattern.into())))
    }

    /// The column is covered by a literal geometry.
    pub fn covered_by(column: impl Into<String>, object: impl Into<SpatialObject>) -> Self {
        Self::CoveredBy(column.into(), SpatialTarget::Object(object.into()))
    }

    /// The column is covered by another spatial column.
    pub fn covered_by_column(column: impl Into<String>, other: impl Into<String>) -> Self {
        Self::CoveredBy(column.into(), SpatialTarget::Column(other.into()))
    }

    /// The column covers a literal geometry.
    pub fn covers(column: impl Into<String>, object: impl Into<SpatialObject>) -> Self {
        Self::Covers(column.into(), SpatialTarget::Object(object.into()))
    }

    /// The column covers another spatial column.
    pub fn covers_column(column: impl Into<String>, other: impl Into<String>) -> Self {
        Self::Covers(column.into(), SpatialTarget::Column(other.into()))
    }

    /// The column is within `range` meters of any of the geometries.
    pub fn within_range_of<I, O>(column: impl Into<String>, objects: I, range: f64) -> Self
    where
        I: IntoIterator<Item = O>,
        O: Into<SpatialObject>,
    {
        Self::WithinRangeOf {
            column: column.into(),
            targets: objects
                .into_iter()
                .map(|o| SpatialTarget::Object(o.into()))
                .collect(),
            range,
        }
    }

    /// The column is within `range` meters of another spatial column.
    pub fn within_range_of_column(
        column: impl Into<String>,
        other: impl Into<String>,
        range: f64,
    ) -> Self {
        Self::WithinRangeOf {
            column: column.into(),
            targets: vec![SpatialTarget::Column(other.into())],
            range,
        }
    }

    /// The column is within `range` meters of every geometry.
    pub fn has_within_range<I, O>(column: impl Into<String>, objects: I, range: f64) -> Self
    where
        I: IntoIterator<Item = O>,
        O: Into<SpatialObject>,
    {
        Self::HasWithinRange {
            column: column.into(),
            targets: objects
                .into_iter()
                .map(|o| SpatialTarget::Object(o.into()))
                .collect(),
            range,
        }
    }

    /// The column is within `range` meters of every listed spatial column.
    pub fn has_within_range_columns<I, S>(column: impl Into<String>, others: I, range: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::HasWithinRange {
            column: column.into(),
            targets: others
                .into_iter()
                .map(|c| SpatialTarget::Column(c.into()))
                .collect(),
            range,
        }
    }

    /// Conjunction of clauses.
    pub fn and(clauses: impl IntoIterator<Item = Clause>) -> Self {
        Self::And(clauses.into_iter().collect())
    }

    /// Disjunction of clauses.
    pub fn or(clauses: impl IntoIterator<Item = Clause>) -> Self {
        Self::Or(clauses.into_iter().collect())
    }

    /// Combine with another clause using AND.
    pub fn and_then(self, other: Clause) -> Self {
        match self {
            Self::And(mut clauses) => {
                clauses.push(other);
                Self::And(clauses)
            }
            _ => Self::And(vec![self, other]),
        }
    }

    /// Combine with another clause using OR.
    pub fn or_else(self, other: Clause) -> Self {
        match self {
            Self::Or(mut clauses) => {
                clauses.push(other);
                Self::Or(clauses)
            }
            _ => Self::Or(vec![self, other]),
        }
    }

    /// Short label of the predicate, used in error messages.
    pub fn condition(&self) -> &'static str {
        match self {
            Self::Equal(..) => "=",
            Self::NotEqual(..) => "<>",
            Self::GreaterThan(..) => ">",
            Self::LessThan(..) => "<",
            Self::GreaterThanOrEqual(..) => ">=",
            Self::LessThanOrEqual(..) => "<=",
            Self::Like(..) => "LIKE",
            Self::NotLike(..) => "NOT LIKE",
            Self::CoveredBy(..) => "CoveredBy",
            Self::Covers(..) => "Covers",
            Self::WithinRangeOf { .. } => "WithinRangeOf",
            Self::HasWithinRange { .. } => "HasWithinRange",
            Self::And(_) => "AND",
            Self::Or(_) => "OR",
        }
    }

    /// Logical names of every column the clause references, in order.
    pub fn columns(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Equal(c, t)
            | Self::NotEqual(c, t)
            | Self::GreaterThan(c, t)
            | Self::LessThan(c, t)
            | Self::GreaterThanOrEqual(c, t)
            | Self::LessThanOrEqual(c, t)
            | Self::Like(c, t)
            | Self::NotLike(c, t) => {
                out.push(c);
                if let Target::Column(other) = t {
                    out.push(other);
                }
            }
            Self::CoveredBy(c, t) | Self::Covers(c, t) => {
                out.push(c);
                if let SpatialTarget::Column(other) = t {
                    out.push(other);
                }
            }
            Self::WithinRangeOf {
                column, targets, ..
            }
            | Self::HasWithinRange {
                column, targets, ..
            } => {
                out.push(column);
                for target in targets {
                    if let SpatialTarget::Column(other) = target {
                        out.push(other);
                    }
                }
            }
            Self::And(clauses) | Self::Or(clauses) => {
                for clause in clauses {
                    clause.collect_columns(out);
                }
            }
        }
    }

    /// Whether every referenced column exists and has a type the predicate accepts.
    pub fn is_valid(&self, info: &dyn QueryInfo) -> bool {
        match self {
            Self::Equal(column, target) | Self::NotEqual(column, target) => {
                equality_is_valid(info, column, target)
            }
            Self::GreaterThan(column, target)
            | Self::LessThan(column, target)
            | Self::GreaterThanOrEqual(column, target)
            | Self::LessThanOrEqual(column, target) => ordering_is_valid(info, column, target),
            Self::Like(column, target) | Self::NotLike(column, target) => {
                info.has_field_of_type(column, &DataType::String)
                    && match target {
                        Target::Value(value) => matches!(value, Value::String(_)),
                        Target::Column(other) => info.has_field_of_type(other, &DataType::String),
                    }
            }
            Self::CoveredBy(column, target) | Self::Covers(column, target) => {
                has_postgis(info) && is_spatial_field(info, column) && target_is_valid(info, target)
            }
            Self::WithinRangeOf {
                column,
                targets,
                range,
            }
            | Self::HasWithinRange {
                column,
                targets,
                range,
            } => {
                has_postgis(info)
                    && is_spatial_field(info, column)
                    && !targets.is_empty()
                    && targets.iter().all(|t| target_is_valid(info, t))
                    && range.is_finite()
                    && *range >= 0.0
            }
            Self::And(clauses) | Self::Or(clauses) => clauses.iter().all(|c| c.is_valid(info)),
        }
    }

    /// Render the predicate, returning the fragment and its positional values.
    pub fn sql(&self, info: &dyn QueryInfo) -> (String, Vec<Value>) {
        let mut builder = SqlBuilder::new();
        self.write_sql(info, &mut builder);
        builder.build()
    }

    fn write_sql(&self, info: &dyn QueryInfo, out: &mut SqlBuilder) {
        match self {
            Self::Equal(column, Target::Value(Value::Null)) => {
                out.push(column_sql(info, column)).push(" IS NULL");
            }
            Self::NotEqual(column, Target::Value(Value::Null)) => {
                out.push(column_sql(info, column)).push(" IS NOT NULL");
            }
            Self::Equal(column, target) | Self::NotEqual(column, target)
                if is_spatial_comparison(info, column, target) =>
            {
                if matches!(self, Self::NotEqual(..)) {
                    out.push("NOT ");
                }
                out.push("ST_Equals(")
                    .push(column_sql(info, column))
                    .push("::geometry, ");
                match target {
                    Target::Value(value) => {
                        out.push("ST_GeomFromGeoJSON(")
                            .push_param(value.clone())
                            .push(")");
                    }
                    Target::Column(other) => {
                        out.push(column_sql(info, other)).push("::geometry");
                    }
                }
                out.push(")");
            }
            Self::Equal(column, target)
            | Self::NotEqual(column, target)
            | Self::GreaterThan(column, target)
            | Self::LessThan(column, target)
            | Self::GreaterThanOrEqual(column, target)
            | Self::LessThanOrEqual(column, target)
            | Self::Like(column, target)
            | Self::NotLike(column, target) => {
                out.push(column_sql(info, column))
                    .push(" ")
                    .push(self.condition())
                    .push(" ");
                match target {
                    Target::Value(value) => {
                        out.push_param(value.clone());
                    }
                    Target::Column(other) => {
                        out.push(column_sql(info, other));
                    }
                }
            }
            Self::CoveredBy(column, target) => {
                out.push("ST_Covers(");
                write_spatial_target(info, target, out);
                out.push(", ").push(column_sql(info, column)).push(")");
            }
            Self::Covers(column, target) => {
                out.push("ST_Covers(").push(column_sql(info, column)).push(", ");
                write_spatial_target(info, target, out);
                out.push(")");
            }
            Self::WithinRangeOf {
                column,
                targets,
                range,
            } => write_ranges(info, column, targets, *range, " OR ", out),
            Self::HasWithinRange {
                column,
                targets,
                range,
            } => write_ranges(info, column, targets, *range, " AND ", out),
            Self::And(clauses) => write_group(info, clauses, " AND ", "TRUE", out),
            Self::Or(clauses) => write_group(info, clauses, " OR ", "FALSE", out),
        }
    }
}

/// Render a logical field name as its qualified physical column.
///
/// Unknown names are rendered as given; validation rejects them earlier.
pub(crate) fn column_sql(info: &dyn QueryInfo, name: &str) -> String {
    info.field(name)
        .map(|f| f.full_db_name())
        .unwrap_or_else(|| name.to_string())
}

pub(crate) fn has_postgis(info: &dyn QueryInfo) -> bool {
    info.adapter_info().spatial_type() == SpatialExtension::PostGis
}

pub(crate) fn is_spatial_field(info: &dyn QueryInfo, name: &str) -> bool {
    info.field(name).is_some_and(|f| f.is_spatial())
}

pub(crate) fn target_is_valid(info: &dyn QueryInfo, target: &SpatialTarget) -> bool {
    match target {
        SpatialTarget::Object(_) => true,
        SpatialTarget::Column(other) => is_spatial_field(info, other),
    }
}

fn is_spatial_comparison(info: &dyn QueryInfo, column: &str, target: &Target) -> bool {
    is_spatial_field(info, column)
        || match target {
            Target::Value(value) => value.is_spatial(),
            Target::Column(other) => is_spatial_field(info, other),
        }
}

fn equality_is_valid(info: &dyn QueryInfo, column: &str, target: &Target) -> bool {
    let Some(field) = info.field(column) else {
        return false;
    };
    match target {
        Target::Value(Value::Null) => true,
        Target::Value(value) if value.is_spatial() || field.is_spatial() => {
            has_postgis(info) && value.data_type().as_ref() == Some(&field.data_type)
        }
        Target::Value(_) => true,
        Target::Column(other) => match info.field(other) {
            Some(other) if field.is_spatial() || other.is_spatial() => {
                has_postgis(info) && field.is_spatial() && other.is_spatial()
            }
            Some(_) => true,
            None => false,
        },
    }
}

fn ordering_is_valid(info: &dyn QueryInfo, column: &str, target: &Target) -> bool {
    if !info.field(column).is_some_and(|f| !f.is_spatial()) {
        return false;
    }
    match target {
        Target::Value(value) => !value.is_null() && !value.is_spatial(),
        Target::Column(other) => info.field(other).is_some_and(|f| !f.is_spatial()),
    }
}

fn write_spatial_target(info: &dyn QueryInfo, target: &SpatialTarget, out: &mut SqlBuilder) {
    match target {
        SpatialTarget::Object(object) => {
            out.push("ST_GeomFromGeoJSON(")
                .push_param(object.clone())
                .push(")::geography");
        }
        SpatialTarget::Column(other) => {
            out.push(column_sql(info, other));
        }
    }
}

fn write_ranges(
    info: &dyn QueryInfo,
    column: &str,
    targets: &[SpatialTarget],
    range: f64,
    sep: &str,
    out: &mut SqlBuilder,
) {
    let column = column_sql(info, column);
    let grouped = targets.len() > 1;
    if grouped {
        out.push("(");
    }
    for (i, target) in targets.iter().enumerate() {
        if i > 0 {
            out.push(sep);
        }
        out.push("ST_DWithin(").push(&column).push(", ");
        write_spatial_target(info, target, out);
        out.push(", ").push_param(range).push(")");
    }
    if grouped {
        out.push(")");
    }
}

fn write_group(
    info: &dyn QueryInfo,
    clauses: &[Clause],
    sep: &str,
    empty: &str,
    out: &mut SqlBuilder,
) {
    match clauses {
        [] => {
            out.push(empty);
        }
        [only] => only.write_sql(info, out),
        _ => {
            out.push("(");
            for (i, clause) in clauses.iter().enumerate() {
                if i > 0 {
                    out.push(sep);
                }
                clause.write_sql(info, out);
            }
            out.push(")");
        }
    }
}
