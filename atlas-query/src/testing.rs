//! Shared fixtures for unit tests.

use atlas_codegen::Model;
use atlas_schema::{Location, Region, Schema};

use crate::adapter::{AdapterInfo, DatabaseType, PlaceholderStyle, SpatialExtension};

/// PostgreSQL with PostGIS.
pub struct PostGis;

impl AdapterInfo for PostGis {
    fn placeholder(&self) -> PlaceholderStyle {
        PlaceholderStyle::Dollar
    }

    fn spatial_type(&self) -> SpatialExtension {
        SpatialExtension::PostGis
    }

    fn database_type(&self) -> DatabaseType {
        DatabaseType::PostgreSQL
    }
}

/// A dialect without spatial functions that keeps `?` placeholders.
pub struct Plain;

impl AdapterInfo for Plain {
    fn placeholder(&self) -> PlaceholderStyle {
        PlaceholderStyle::Question
    }

    fn spatial_type(&self) -> SpatialExtension {
        SpatialExtension::None
    }

    fn database_type(&self) -> DatabaseType {
        DatabaseType::PostgreSQL
    }
}

#[derive(Model, Debug, Clone, Default, PartialEq)]
#[atlas(crate = "atlas_schema")]
pub struct CarTest {
    #[atlas(primary_key, auto_increment)]
    pub car_id: i32,
    pub location: Location,
    pub designated_zone: String,
}

#[derive(Model, Debug, Clone, Default, PartialEq)]
#[atlas(crate = "atlas_schema")]
pub struct ZoneTest {
    #[atlas(primary_key, auto_increment)]
    pub zone_id: i32,
    #[atlas(default = "unnamed")]
    pub name: String,
    pub region: Region,
}

#[derive(Model, Debug, Clone, Default, PartialEq)]
#[atlas(crate = "atlas_schema")]
pub struct ModelTest {
    pub a: i64,
    pub b: i64,
}

#[derive(Model, Debug, Clone, Default, PartialEq)]
#[atlas(crate = "atlas_schema")]
pub struct Trip {
    #[atlas(primary_key)]
    pub id: i64,
    pub origin: Location,
    pub area: Region,
}

#[derive(Model, Debug, Clone, Default, PartialEq)]
#[atlas(crate = "atlas_schema")]
pub struct Tag {
    #[atlas(primary_key, auto_increment)]
    pub id: i32,
}

#[derive(Model, Debug, Clone, Default, PartialEq)]
#[atlas(crate = "atlas_schema")]
pub struct Membership {
    #[atlas(primary_key)]
    pub user_id: i64,
    #[atlas(primary_key)]
    pub group_id: i64,
}

pub fn car_schema() -> Schema {
    Schema::parse::<CarTest>().expect("CarTest schema")
}

pub fn zone_schema() -> Schema {
    Schema::parse::<ZoneTest>().expect("ZoneTest schema")
}

pub fn model_schema() -> Schema {
    Schema::parse::<ModelTest>().expect("ModelTest schema")
}

pub fn trip_schema() -> Schema {
    Schema::parse::<Trip>().expect("Trip schema")
}
