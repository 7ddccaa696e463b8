//! Decoding of tokio-postgres rows into [`Row`].

use atlas_schema::{Row, Value};
use chrono::{DateTime, NaiveDateTime, NaiveTime, Utc};
use tokio_postgres::types::{FromSqlOwned, Type};

use crate::error::{PgError, PgResult};

/// Convert a driver row, keeping column order.
///
/// Geography columns arrive as GeoJSON text (`ST_AsGeoJSON`) and are kept as
/// strings; the spatial field types decode them on extraction.
pub fn from_pg_row(row: &tokio_postgres::Row) -> PgResult<Row> {
    let mut out = Row::new();
    for (index, column) in row.columns().iter().enumerate() {
        let value = column_value(row, index, column.type_())?;
        out.insert(column.name(), value);
    }
    Ok(out)
}

fn column_value(row: &tokio_postgres::Row, index: usize, ty: &Type) -> PgResult<Value> {
    let value = match *ty {
        Type::BOOL => get::<bool>(row, index)?.map(Value::Bool),
        Type::INT2 => get::<i16>(row, index)?.map(|v| Value::Int(v.into())),
        Type::INT4 => get::<i32>(row, index)?.map(|v| Value::Int(v.into())),
        Type::INT8 => get::<i64>(row, index)?.map(Value::Int),
        Type::OID => get::<u32>(row, index)?.map(|v| Value::Uint(v.into())),
        Type::FLOAT4 => get::<f32>(row, index)?.map(|v| Value::Float(v.into())),
        Type::FLOAT8 => get::<f64>(row, index)?.map(Value::Float),
        Type::BYTEA => get::<Vec<u8>>(row, index)?.map(Value::Bytes),
        Type::TIME => get::<NaiveTime>(row, index)?.map(Value::Time),
        Type::TIMESTAMP => get::<NaiveDateTime>(row, index)?.map(Value::Timestamp),
        Type::TIMESTAMPTZ => {
            get::<DateTime<Utc>>(row, index)?.map(|v| Value::Timestamp(v.naive_utc()))
        }
        Type::JSON | Type::JSONB => {
            get::<serde_json::Value>(row, index)?.map(|v| Value::String(v.to_string()))
        }
        _ => get::<String>(row, index)?.map(Value::String),
    };
    Ok(value.unwrap_or(Value::Null))
}

fn get<T: FromSqlOwned>(row: &tokio_postgres::Row, index: usize) -> PgResult<Option<T>> {
    row.try_get::<_, Option<T>>(index).map_err(|e| {
        let column = row
            .columns()
            .get(index)
            .map(|c| c.name().to_string())
            .unwrap_or_default();
        PgError::deserialization(format!("column '{}': {}", column, e))
    })
}
