//! Turns a [`Builder`] into SQL text and positional values.
//!
//! Compilation never fails: every node is validated when it is added to a
//! query, so by the time a builder reaches the compiler all references resolve.
//! Statements are assembled with `?` placeholders and rewritten into the
//! adapter's style in a single final pass.

use atlas_schema::{DataType, Field, Set, Value};
use indexmap::IndexMap;
use tracing::debug;

use crate::adapter::{DatabaseType, SpatialExtension};
use crate::builder::{Builder, QueryType};
use crate::clause::Clause;
use crate::info::QueryInfo;
use crate::sql::{SqlBuilder, replace_placeholders};

/// Compile a query into a statement and its positional values.
pub fn compile_sql(builder: &Builder, info: &dyn QueryInfo) -> (String, Vec<Value>) {
    let targets = target_fields(builder, info);
    let main = info.main_schema();
    let mut out = SqlBuilder::new();

    match builder.query_type {
        QueryType::Select => {
            out.push("SELECT ");
            if builder.is_count {
                if builder.is_distinct {
                    out.push("COUNT(DISTINCT (");
                    push_selection(&mut out, info, &targets, false);
                    out.push("))");
                } else {
                    out.push("COUNT(*)");
                }
            } else {
                if builder.is_distinct {
                    out.push("DISTINCT ");
                }
                push_selection(&mut out, info, &targets, true);
            }
            out.push(" FROM ").push(main.table());

            for join in &builder.joins {
                out.push(" ").push_fragment(join.sql(info));
            }
            if let Some(clause) = combined_clause(&builder.clauses) {
                out.push(" WHERE ").push_fragment(clause.sql(info));
            }
            if !builder.orders.is_empty() {
                out.push(" ORDER BY ")
                    .push_joined(builder.orders.iter().map(|o| o.sql(info)), ", ");
            }
            if builder.limit > 0 {
                out.push(format!(" LIMIT {}", builder.limit));
            }
            if builder.offset > 0 {
                out.push(format!(" OFFSET {}", builder.offset));
            }
        }
        QueryType::Insert if targets.is_empty() => {
            // One row per statement; callers repeat it per record.
            out.push("INSERT INTO ").push(main.table()).push(" DEFAULT VALUES");
        }
        QueryType::Insert => {
            out.push("INSERT INTO ").push(main.table()).push(" (");
            out.push(
                targets
                    .iter()
                    .map(|f| f.db_name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            );
            out.push(") VALUES ");
            for (i, record) in builder.write_values.iter().enumerate() {
                if i > 0 {
                    out.push(", ");
                }
                out.push("(");
                for (k, field) in targets.iter().enumerate() {
                    if k > 0 {
                        out.push(", ");
                    }
                    push_write_param(&mut out, info, field, record.get(field.name.as_str()));
                }
                out.push(")");
            }
        }
        QueryType::Update => {
            let empty = IndexMap::new();
            let record = builder.write_values.first().unwrap_or(&empty);
            out.push("UPDATE ").push(main.table()).push(" SET ");
            for (i, field) in targets.iter().enumerate() {
                if i > 0 {
                    out.push(", ");
                }
                out.push(field.db_name.as_str()).push(" = ");
                push_write_param(&mut out, info, field, record.get(field.name.as_str()));
            }
            out.push(" WHERE ");
            match combined_clause(&builder.clauses) {
                Some(clause) => {
                    out.push_fragment(clause.sql(info));
                }
                None => {
                    let implicit = Clause::and(main.primary_fields().map(|f| {
                        Clause::equal(
                            f.name.as_str(),
                            record.get(f.name.as_str()).cloned().unwrap_or_default(),
                        )
                    }));
                    out.push_fragment(implicit.sql(info));
                }
            }
        }
    }

    out.push(";");
    let (sql, params) = out.build();
    let sql = replace_placeholders(&sql, info.adapter_info().placeholder());
    debug!(sql = %sql, params = params.len(), "compiled statement");
    (sql, params)
}

/// Compile `CREATE TABLE` for the main schema.
pub fn compile_table_creation(info: &dyn QueryInfo, if_not_exists: bool) -> String {
    let schema = info.main_schema();
    let mut sql = String::from("CREATE TABLE ");
    if if_not_exists {
        sql.push_str("IF NOT EXISTS ");
    }
    sql.push_str(schema.table());
    sql.push_str(" (");

    let columns: Vec<String> = schema
        .fields()
        .iter()
        .map(|field| {
            format!(
                "{} {}{}",
                field.db_name,
                column_type(info, field),
                column_qualifiers(info, field)
            )
        })
        .collect();
    sql.push_str(&columns.join(", "));
    sql.push_str(");");
    sql
}

/// Compile one spatial index per location field, then per region field.
pub fn compile_index_creation(info: &dyn QueryInfo) -> Vec<String> {
    let schema = info.main_schema();
    schema
        .location_field_names()
        .iter()
        .chain(schema.region_field_names().iter())
        .filter_map(|name| info.field(name))
        .map(|field| {
            format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_{column} ON {table} USING GIST ({column});",
                table = schema.table(),
                column = field.db_name,
            )
        })
        .collect()
}

/// Resolve the fields a statement touches, in stable order.
pub(crate) fn target_fields<'a>(builder: &Builder, info: &'a dyn QueryInfo) -> Vec<&'a Field> {
    let main = info.main_schema();
    let base = if builder.selections.is_empty() {
        match builder.query_type {
            QueryType::Select => info
                .join_schemas()
                .into_iter()
                .fold(main.all_field_names().clone(), |acc, schema| {
                    acc.union(schema.all_field_names())
                }),
            QueryType::Insert | QueryType::Update => main.all_field_names().clone(),
        }
    } else {
        builder.selections.clone()
    };

    let mut targets: Set = base.difference(&builder.omissions);
    match builder.query_type {
        QueryType::Select => {}
        QueryType::Insert | QueryType::Update => {
            targets = targets
                .iter()
                .filter(|name| main.all_field_names().contains(name))
                .collect();
            if builder.query_type == QueryType::Update && !builder.has_filter() {
                targets = targets.difference(main.primary_field_names());
            }
        }
    }

    targets.iter().filter_map(|name| info.field(name)).collect()
}

fn combined_clause(clauses: &[Clause]) -> Option<Clause> {
    match clauses {
        [] => None,
        [only] => Some(only.clone()),
        _ => Some(Clause::And(clauses.to_vec())),
    }
}

fn push_selection(out: &mut SqlBuilder, info: &dyn QueryInfo, fields: &[&Field], alias: bool) {
    let postgis = info.adapter_info().spatial_type() == SpatialExtension::PostGis;
    let columns: Vec<String> = fields
        .iter()
        .map(|field| {
            let column = field.full_db_name();
            match (field.is_spatial() && postgis, alias) {
                (true, true) => format!("ST_AsGeoJSON({}) AS {}", column, field.db_name),
                (true, false) => format!("ST_AsGeoJSON({})", column),
                (false, _) => column,
            }
        })
        .collect();
    out.push(columns.join(", "));
}

fn push_write_param(
    out: &mut SqlBuilder,
    info: &dyn QueryInfo,
    field: &Field,
    value: Option<&Value>,
) {
    let value = value.cloned().unwrap_or_default();
    if field.is_spatial() && info.adapter_info().spatial_type() == SpatialExtension::PostGis {
        out.push("ST_GeomFromGeoJSON(")
            .push_param(value)
            .push(")::geography");
    } else {
        out.push_param(value);
    }
}

fn column_type(info: &dyn QueryInfo, field: &Field) -> String {
    match info.adapter_info().database_type() {
        DatabaseType::PostgreSQL => {
            if field.auto_increment {
                return "serial".to_string();
            }
            match &field.data_type {
                DataType::Bool => "boolean",
                DataType::Int | DataType::Uint => "bigint",
                DataType::Float => "double precision",
                DataType::String => "text",
                DataType::Time => "time",
                DataType::Bytes => "bytea",
                DataType::Location => "geography(point)",
                DataType::Region => "geography(polygon)",
                DataType::Timestamp => "timestamp",
                DataType::Custom(name) => return name.to_string(),
            }
            .to_string()
        }
    }
}

fn column_qualifiers(info: &dyn QueryInfo, field: &Field) -> String {
    let mut out = String::new();
    match info.adapter_info().database_type() {
        DatabaseType::PostgreSQL => {
            if field.primary_key {
                out.push_str(" PRIMARY KEY");
            } else {
                if field.not_null {
                    out.push_str(" NOT NULL");
                }
                if field.unique {
                    out.push_str(" UNIQUE");
                }
            }
            if !field.auto_increment && field.has_default {
                match &field.default_value {
                    Some(value)
                        if value.is_spatial()
                            && info.adapter_info().spatial_type() == SpatialExtension::PostGis =>
                    {
                        out.push_str(&format!(
                            " DEFAULT ST_GeomFromGeoJSON({})::geography",
                            value.to_sql_literal()
                        ));
                    }
                    Some(value) => {
                        out.push_str(&format!(" DEFAULT {}", value.to_sql_literal()));
                    }
                    None => out.push_str(" DEFAULT NULL"),
                }
            }
        }
    }
    out
}
