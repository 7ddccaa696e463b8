//! Conversion of [`Value`] parameters into PostgreSQL wire types.
//!
//! The server reports the type it expects for every placeholder once a
//! statement is prepared; values are converted to exactly that type so that,
//! for example, an `i64` bound to an `integer` column is narrowed instead of
//! being rejected by the driver.

use atlas_schema::Value;
use chrono::{TimeZone, Utc};
use tokio_postgres::types::{ToSql, Type};

use crate::error::{PgError, PgResult};

/// A boxed parameter ready to hand to tokio-postgres.
pub type SqlParam = Box<dyn ToSql + Sync + Send>;

/// Convert a value to a parameter of the given server type.
pub fn to_sql_param(value: &Value, ty: &Type) -> PgResult<SqlParam> {
    match value {
        Value::Null => null_of(ty),
        Value::Bool(b) => Ok(Box::new(*b)),
        Value::Int(i) => int_param(*i, ty),
        Value::Uint(u) => {
            let i = i64::try_from(*u).map_err(|_| {
                PgError::type_conversion(format!("{} does not fit in a signed column", u))
            })?;
            int_param(i, ty)
        }
        Value::Float(f) => match *ty {
            Type::FLOAT4 => Ok(Box::new(*f as f32)),
            Type::TEXT | Type::VARCHAR => Ok(Box::new(f.to_string())),
            _ => Ok(Box::new(*f)),
        },
        Value::String(s) => match *ty {
            Type::JSON | Type::JSONB => {
                let json: serde_json::Value = serde_json::from_str(s)
                    .map_err(|e| PgError::type_conversion(format!("invalid JSON: {}", e)))?;
                Ok(Box::new(json))
            }
            _ => Ok(Box::new(s.clone())),
        },
        Value::Bytes(b) => Ok(Box::new(b.clone())),
        Value::Time(t) => Ok(Box::new(*t)),
        Value::Timestamp(ts) => match *ty {
            Type::TIMESTAMPTZ => Ok(Box::new(Utc.from_utc_datetime(ts))),
            _ => Ok(Box::new(*ts)),
        },
        Value::Location(location) => geojson_param(location.to_geojson()),
        Value::Region(region) => geojson_param(region.to_geojson()),
    }
}

/// Convert every parameter of a prepared statement.
pub fn to_sql_params(values: &[Value], types: &[Type]) -> PgResult<Vec<SqlParam>> {
    if values.len() != types.len() {
        return Err(PgError::type_conversion(format!(
            "statement expects {} parameters, got {}",
            types.len(),
            values.len()
        )));
    }
    values
        .iter()
        .zip(types)
        .map(|(value, ty)| to_sql_param(value, ty))
        .collect()
}

fn int_param(i: i64, ty: &Type) -> PgResult<SqlParam> {
    let overflow = |_| PgError::type_conversion(format!("{} does not fit in {}", i, ty));
    match *ty {
        Type::INT2 => Ok(Box::new(i16::try_from(i).map_err(overflow)?)),
        Type::INT4 => Ok(Box::new(i32::try_from(i).map_err(overflow)?)),
        Type::FLOAT4 => Ok(Box::new(i as f32)),
        Type::FLOAT8 => Ok(Box::new(i as f64)),
        Type::TEXT | Type::VARCHAR => Ok(Box::new(i.to_string())),
        _ => Ok(Box::new(i)),
    }
}

fn geojson_param(geojson: atlas_schema::SchemaResult<String>) -> PgResult<SqlParam> {
    let text = geojson.map_err(|e| PgError::type_conversion(e.to_string()))?;
    Ok(Box::new(text))
}

fn null_of(ty: &Type) -> PgResult<SqlParam> {
    Ok(match *ty {
        Type::BOOL => Box::new(None::<bool>),
        Type::INT2 => Box::new(None::<i16>),
        Type::INT4 => Box::new(None::<i32>),
        Type::INT8 => Box::new(None::<i64>),
        Type::FLOAT4 => Box::new(None::<f32>),
        Type::FLOAT8 => Box::new(None::<f64>),
        Type::BYTEA => Box::new(None::<Vec<u8>>),
        Type::TIME => Box::new(None::<chrono::NaiveTime>),
        Type::TIMESTAMP => Box::new(None::<chrono::NaiveDateTime>),
        Type::TIMESTAMPTZ => Box::new(None::<chrono::DateTime<Utc>>),
        Type::JSON | Type::JSONB => Box::new(None::<serde_json::Value>),
        _ => Box::new(None::<String>),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_schema::{Location, Region};
    use pretty_assertions::assert_eq;

    fn debug(param: &SqlParam) -> String {
        format!("{:?}", param)
    }

    #[test]
    fn test_ints_follow_column_width() {
        let param = to_sql_param(&Value::Int(7), &Type::INT4).unwrap();
        assert_eq!(debug(&param), "7");

        let param = to_sql_param(&Value::Int(7), &Type::TEXT).unwrap();
        assert_eq!(debug(&param), "\"7\"");

        assert!(to_sql_param(&Value::Int(i64::MAX), &Type::INT4).is_err());
        assert!(to_sql_param(&Value::Int(70_000), &Type::INT2).is_err());
        assert!(to_sql_param(&Value::Uint(u64::MAX), &Type::INT8).is_err());
    }

    #[test]
    fn test_nulls_are_typed() {
        for ty in [Type::INT4, Type::TEXT, Type::BOOL, Type::TIMESTAMP, Type::BYTEA] {
            let param = to_sql_param(&Value::Null, &ty).unwrap();
            assert_eq!(debug(&param), "None");
        }
    }

    #[test]
    fn test_spatial_values_bind_as_geojson_text() {
        let location = Location::new(1.0, 2.0);
        let param = to_sql_param(&Value::Location(location), &Type::TEXT).unwrap();
        assert_eq!(
            debug(&param),
            format!("{:?}", location.to_geojson().unwrap())
        );

        let region = Region::rect(0.0, 1.0, 0.0, 1.0);
        let param = to_sql_param(&Value::Region(region.clone()), &Type::TEXT).unwrap();
        assert_eq!(debug(&param), format!("{:?}", region.to_geojson().unwrap()));
    }

    #[test]
    fn test_json_strings_are_parsed() {
        assert!(to_sql_param(&Value::String("{\"a\":1}".into()), &Type::JSONB).is_ok());
        assert!(to_sql_param(&Value::String("{".into()), &Type::JSON).is_err());
        assert!(to_sql_param(&Value::String("{".into()), &Type::TEXT).is_ok());
    }

    #[test]
    fn test_param_count_mismatch() {
        let err = to_sql_params(&[Value::Int(1)], &[]).unwrap_err();
        assert!(matches!(err, PgError::TypeConversion(_)));
    }
}
