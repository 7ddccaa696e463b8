//! Spatial value types and their GeoJSON encoding.
//!
//! Spatial values travel to and from the database as GeoJSON text: the
//! compiler wraps placeholders in `ST_GeomFromGeoJSON(?)` and selects
//! spatial columns through `ST_AsGeoJSON(...)`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{SchemaError, SchemaResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
enum Geometry {
    Point([f64; 2]),
    Polygon(Vec<Vec<[f64; 2]>>),
}

/// A single point on the globe, stored as `geography(point)`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Location {
    /// Longitude in degrees.
    pub lon: f64,
    /// Latitude in degrees.
    pub lat: f64,
}

impl Location {
    /// Create a location from longitude and latitude.
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Encode as a GeoJSON `Point`.
    pub fn to_geojson(&self) -> SchemaResult<String> {
        Ok(serde_json::to_string(&Geometry::Point([self.lon, self.lat]))?)
    }

    /// Decode a GeoJSON `Point`.
    pub fn from_geojson(text: &str) -> SchemaResult<Self> {
        match serde_json::from_str::<Geometry>(text)? {
            Geometry::Point([lon, lat]) => Ok(Self { lon, lat }),
            Geometry::Polygon(_) => Err(SchemaError::geojson(
                "expected a Point geometry, found Polygon",
            )),
        }
    }

    /// Compare by encoded form.
    pub fn is_equal(&self, other: &Location) -> bool {
        matches!(
            (self.to_geojson(), other.to_geojson()),
            (Ok(a), Ok(b)) if a == b
        )
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lon, self.lat)
    }
}

/// A polygon, stored as `geography(polygon)`.
///
/// The first ring is the exterior boundary; any further rings are holes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Region {
    rings: Vec<Vec<Location>>,
}

impl Region {
    /// Create a region from a single exterior ring.
    ///
    /// The ring is closed automatically if its last point differs from the first.
    pub fn new(exterior: impl IntoIterator<Item = Location>) -> Self {
        let mut ring: Vec<Location> = exterior.into_iter().collect();
        if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) {
            if first != last {
                ring.push(first);
            }
        }
        Self { rings: vec![ring] }
    }

    /// Create an axis-aligned rectangle.
    pub fn rect(min_lon: f64, max_lon: f64, min_lat: f64, max_lat: f64) -> Self {
        Self::new([
            Location::new(min_lon, min_lat),
            Location::new(max_lon, min_lat),
            Location::new(max_lon, max_lat),
            Location::new(min_lon, max_lat),
        ])
    }

    /// Add an interior ring (hole).
    pub fn with_hole(mut self, hole: impl IntoIterator<Item = Location>) -> Self {
        let Region { rings } = Region::new(hole);
        self.rings.extend(rings);
        self
    }

    /// The exterior ring, empty for a default region.
    pub fn exterior(&self) -> &[Location] {
        self.rings.first().map(Vec::as_slice).unwrap_or(&[])
    }

    /// All rings, exterior first.
    pub fn rings(&self) -> &[Vec<Location>] {
        &self.rings
    }

    /// Encode as a GeoJSON `Polygon`.
    pub fn to_geojson(&self) -> SchemaResult<String> {
        let rings = self
            .rings
            .iter()
            .map(|ring| ring.iter().map(|p| [p.lon, p.lat]).collect())
            .collect();
        Ok(serde_json::to_string(&Geometry::Polygon(rings))?)
    }

    /// Decode a GeoJSON `Polygon`.
    pub fn from_geojson(text: &str) -> SchemaResult<Self> {
        match serde_json::from_str::<Geometry>(text)? {
            Geometry::Polygon(rings) => Ok(Self {
                rings: rings
                    .into_iter()
                    .map(|ring| ring.into_iter().map(|[lon, lat]| Location { lon, lat }).collect())
                    .collect(),
            }),
            Geometry::Point(_) => Err(SchemaError::geojson(
                "expected a Polygon geometry, found Point",
            )),
        }
    }

    /// Compare by encoded form.
    pub fn is_equal(&self, other: &Region) -> bool {
        matches!(
            (self.to_geojson(), other.to_geojson()),
            (Ok(a), Ok(b)) if a == b
        )
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let points: Vec<String> = self.exterior().iter().map(ToString::to_string).collect();
        write!(f, "({})", points.join(","))
    }
}

/// Either kind of spatial value, used as a predicate or ordering target.
#[derive(Debug, Clone, PartialEq)]
pub enum SpatialObject {
    /// A point.
    Location(Location),
    /// A polygon.
    Region(Region),
}

impl SpatialObject {
    /// Whether this is a point.
    pub fn is_location(&self) -> bool {
        matches!(self, Self::Location(_))
    }

    /// Whether this is a polygon.
    pub fn is_region(&self) -> bool {
        matches!(self, Self::Region(_))
    }

    /// Encode as GeoJSON.
    pub fn to_geojson(&self) -> SchemaResult<String> {
        match self {
            Self::Location(location) => location.to_geojson(),
            Self::Region(region) => region.to_geojson(),
        }
    }
}

impl From<Location> for SpatialObject {
    fn from(location: Location) -> Self {
        Self::Location(location)
    }
}

impl From<Region> for SpatialObject {
    fn from(region: Region) -> Self {
        Self::Region(region)
    }
}
