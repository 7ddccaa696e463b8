//! Benchmarks for clause rendering and statement compilation.

use atlas_orm::{
    AdapterInfo, Builder, Clause, DataType, DatabaseType, FieldDef, Join, JoinType, Location,
    Order, PlaceholderStyle, QueryType, Region, Schema, SchemaInfo, SpatialExtension, Value,
    compile_sql, compile_table_creation, replace_placeholders,
};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use indexmap::IndexMap;
use std::hint::black_box;

struct PostGis;

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

fn car_schema() -> Schema {
    Schema::from_defs(
        "CarTest",
        "car_test",
        vec![
            FieldDef::new("car_id", DataType::Int).primary_key().auto_increment(),
            FieldDef::new("location", DataType::Location),
            FieldDef::new("designated_zone", DataType::String),
        ],
    )
    .expect("valid schema")
}

fn zone_schema() -> Schema {
    Schema::from_defs(
        "ZoneTest",
        "zone_test",
        vec![
            FieldDef::new("zone_id", DataType::Int).primary_key().auto_increment(),
            FieldDef::new("name", DataType::String).default_value("unnamed"),
            FieldDef::new("region", DataType::Region),
        ],
    )
    .expect("valid schema")
}

/// Benchmark clause tree construction and rendering.
fn bench_clauses(c: &mut Criterion) {
    let mut group = c.benchmark_group("clauses");
    let cars = car_schema();
    let info = SchemaInfo::new(&cars, &PostGis);

    group.bench_function("equal", |b| {
        let clause = Clause::equal("designated_zone", "north");
        b.iter(|| black_box(clause.sql(&info)))
    });

    group.bench_function("nested_and_or", |b| {
        let clause = Clause::equal("designated_zone", "north")
            .and_then(Clause::greater_than("car_id", 10i64).or_else(Clause::equal("car_id", 1i64)))
            .and_then(Clause::covered_by("location", Region::rect(-50.0, 50.0, -50.0, 50.0)));
        b.iter(|| black_box(clause.sql(&info)))
    });

    for targets in [1usize, 10, 100] {
        let points: Vec<Location> = (0..targets)
            .map(|i| Location::new(i as f64 * 0.1, i as f64 * -0.1))
            .collect();
        let clause = Clause::within_range_of("location", points, 1_000.0);
        group.throughput(Throughput::Elements(targets as u64));
        group.bench_with_input(
            BenchmarkId::new("within_range_of", targets),
            &clause,
            |b, clause| b.iter(|| black_box(clause.sql(&info))),
        );
    }

    group.finish();
}

/// Benchmark full statement compilation.
fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");
    let cars = car_schema();
    let zones = zone_schema();
    let info = SchemaInfo::new(&cars, &PostGis).with_join(&zones);

    group.bench_function("select_all", |b| {
        let builder = Builder::new();
        b.iter(|| black_box(compile_sql(&builder, &info)))
    });

    group.bench_function("select_join_filter_order", |b| {
        let mut builder = Builder::new();
        builder
            .join(Join::new(
                "CarTest",
                "ZoneTest",
                JoinType::Inner,
                Clause::equal_column("designated_zone", "ZoneTest.name"),
            ))
            .clause(Clause::covered_by_column("location", "ZoneTest.region"))
            .order(Order::distance("location", Location::new(0.0, 0.0), false))
            .order(Order::desc("car_id"));
        builder.limit = 25;
        b.iter(|| black_box(compile_sql(&builder, &info)))
    });

    for rows in [1usize, 100, 1000] {
        let mut builder = Builder::new();
        builder.query_type = QueryType::Insert;
        builder.omit(["CarTest.car_id"]);
        builder.write_values = (0..rows)
            .map(|i| {
                let mut record = IndexMap::new();
                record.insert("car_id".to_string(), Value::Int(0));
                record.insert(
                    "location".to_string(),
                    Value::Location(Location::new(i as f64 * 0.01, 0.0)),
                );
                record.insert("designated_zone".to_string(), Value::from("north"));
                record
            })
            .collect();
        let single = SchemaInfo::new(&cars, &PostGis);
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::new("insert", rows), &builder, |b, builder| {
            b.iter(|| black_box(compile_sql(builder, &single)))
        });
    }

    group.bench_function("create_table", |b| {
        let single = SchemaInfo::new(&zones, &PostGis);
        b.iter(|| black_box(compile_table_creation(&single, true)))
    });

    group.finish();
}

/// Benchmark the placeholder rewrite pass.
fn bench_placeholders(c: &mut Criterion) {
    let mut group = c.benchmark_group("placeholders");

    for count in [10usize, 100, 1000] {
        let sql = format!(
            "INSERT INTO t (a) VALUES {};",
            vec!["(?)"; count].join(", ")
        );
        group.bench_with_input(BenchmarkId::new("dollar", count), &sql, |b, sql| {
            b.iter(|| black_box(replace_placeholders(sql, PlaceholderStyle::Dollar)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_clauses, bench_compile, bench_placeholders);
criterion_main!(benches);
