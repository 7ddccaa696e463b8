//! ORDER BY nodes.

use atlas_schema::Value;

use crate::clause::{SpatialTarget, column_sql, has_postgis, is_spatial_field, target_is_valid};
use crate::info::QueryInfo;
use crate::sql::SqlBuilder;

/// A single ORDER BY term.
#[derive(Debug, Clone, PartialEq)]
pub enum Order {
    /// Order by a scalar column.
    Column {
        /// Logical field name.
        column: String,
        /// Sort descending.
        descending: bool,
    },
    /// Order by distance between a spatial column and a target (PostGIS `<->`).
    Distance {
        /// Logical field name of a location or region.
        column: String,
        /// What the distance is measured to.
        target: SpatialTarget,
        /// Farthest first.
        descending: bool,
    },
}

impl Order {
    /// Ascending order on a column.
    pub fn asc(column: impl Into<String>) -> Self {
        Self::Column {
            column: column.into(),
            descending: false,
        }
    }

    /// Descending order on a column.
    pub fn desc(column: impl Into<String>) -> Self {
        Self::Column {
            column: column.into(),
            descending: true,
        }
    }

    /// Order by distance to a target, nearest first unless `descending`.
    pub fn distance(
        column: impl Into<String>,
        target: impl Into<SpatialTarget>,
        descending: bool,
    ) -> Self {
        Self::Distance {
            column: column.into(),
            target: target.into(),
            descending,
        }
    }

    /// Order by distance to another spatial column.
    pub fn distance_to_column(
        column: impl Into<String>,
        other: impl Into<String>,
        descending: bool,
    ) -> Self {
        Self::Distance {
            column: column.into(),
            target: SpatialTarget::Column(other.into()),
            descending,
        }
    }

    /// Short label, used in error messages.
    pub fn condition(&self) -> &'static str {
        match self {
            Self::Column { .. } => "OrderByCol",
            Self::Distance { .. } => "OrderByDistance",
        }
    }

    /// The logical name of the ordered column.
    pub fn column(&self) -> &str {
        match self {
            Self::Column { column, .. } | Self::Distance { column, .. } => column,
        }
    }

    /// Whether the referenced columns exist with suitable types.
    pub fn is_valid(&self, info: &dyn QueryInfo) -> bool {
        match self {
            Self::Column { column, .. } => info.field(column).is_some_and(|f| !f.is_spatial()),
            Self::Distance { column, target, .. } => {
                has_postgis(info) && is_spatial_field(info, column) && target_is_valid(info, target)
            }
        }
    }

    /// Render the term and any positional values it needs.
    pub fn sql(&self, info: &dyn QueryInfo) -> (String, Vec<Value>) {
        let mut out = SqlBuilder::new();
        match self {
            Self::Column { column, descending } => {
                out.push(column_sql(info, column))
                    .push(direction(*descending));
            }
            Self::Distance {
                column,
                target,
                descending,
            } => {
                out.push(column_sql(info, column)).push("::geometry <-> ");
                match target {
                    SpatialTarget::Object(object) => {
                        out.push("ST_GeomFromGeoJSON(")
                            .push_param(object.clone())
                            .push(")::geometry");
                    }
                    SpatialTarget::Column(other) => {
                        out.push(column_sql(info, other)).push("::geometry");
                    }
                }
                out.push(direction(*descending));
            }
        }
        out.build()
    }
}

fn direction(descending: bool) -> &'static str {
    if descending { " DESC" } else { " ASC" }
}
