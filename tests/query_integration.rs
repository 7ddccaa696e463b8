//! Integration tests for the query façade.
//!
//! These run against the recording mock adapter, so they check the exact SQL
//! sent for each fluent chain without needing a database.

use atlas_orm::prelude::*;
use atlas_orm::{
    BuildError, Builder, ErrorCode, Join, PlaceholderStyle, SchemaInfo, SpatialExtension,
    compile_sql,
};
use atlas_query::mock::MockAdapter;
use pretty_assertions::assert_eq;

#[derive(Model, Default, Debug, Clone, PartialEq)]
struct ModelTest {
    a: i64,
    b: i64,
}

#[derive(Model, Default, Debug, Clone, PartialEq)]
struct CarTest {
    #[atlas(primary_key, auto_increment)]
    car_id: i32,
    location: Location,
    designated_zone: String,
}

#[derive(Model, Default, Debug, Clone, PartialEq)]
struct ZoneTest {
    #[atlas(primary_key, auto_increment)]
    zone_id: i32,
    #[atlas(default = "unnamed")]
    name: String,
    region: Region,
}

#[derive(Model, Default, Debug, Clone, PartialEq)]
#[atlas(table = "routes")]
struct Route {
    #[atlas(primary_key)]
    id: i64,
    start: Location,
    finish: Location,
}

fn database(mock: &MockAdapter) -> Database {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("ATLAS_LOG_LEVEL"))
        .with_test_writer()
        .try_init();

    let mut db = Database::new(mock.clone());
    db.register_model::<ModelTest>().unwrap();
    db.register_model::<CarTest>().unwrap();
    db.register_model::<ZoneTest>().unwrap();
    db.register_model::<Route>().unwrap();
    db
}

fn sent(mock: &MockAdapter) -> Vec<String> {
    mock.statements().into_iter().map(|s| s.sql).collect()
}

#[test]
fn test_where_equal_returns_matching_rows() {
    let mock = MockAdapter::new();
    let db = database(&mock);
    mock.push_rows(vec![
        Row::new().with("a", 1i64).with("b", 1i64),
        Row::new().with("a", 1i64).with("b", 2i64),
    ]);

    let records: Vec<ModelTest> = db
        .model("ModelTest")
        .r#where(Clause::equal("a", 1i64))
        .all()
        .unwrap();

    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.a == 1));
    assert_eq!(
        sent(&mock),
        vec!["SELECT model_test.a, model_test.b FROM model_test WHERE model_test.a = $1;"]
    );
}

#[test]
fn test_multiple_wheres_are_conjoined() {
    let mock = MockAdapter::new();
    let db = database(&mock);

    let (sql, params) = db
        .model("ModelTest")
        .r#where(Clause::equal("a", 1i64))
        .r#where(Clause::greater_than("b", 0i64).or_else(Clause::equal("b", -5i64)))
        .to_sql()
        .unwrap();

    assert_eq!(
        sql,
        "SELECT model_test.a, model_test.b FROM model_test \
         WHERE (model_test.a = $1 AND (model_test.b > $2 OR model_test.b = $3));"
    );
    assert_eq!(params, vec![Value::Int(1), Value::Int(0), Value::Int(-5)]);
}

#[test]
fn test_order_by_col_desc_with_limit() {
    let mock = MockAdapter::new();
    let db = database(&mock);
    mock.push_rows(vec![
        Row::new().with("a", 5i64).with("b", 50i64),
        Row::new().with("a", 4i64).with("b", 40i64),
        Row::new().with("a", 3i64).with("b", 30i64),
    ]);

    let records: Vec<ModelTest> = db
        .model("ModelTest")
        .order_by_col("b", true)
        .limit(3)
        .all()
        .unwrap();

    assert_eq!(records.iter().map(|r| r.b).collect::<Vec<_>>(), vec![50, 40, 30]);
    assert_eq!(
        sent(&mock),
        vec!["SELECT model_test.a, model_test.b FROM model_test ORDER BY model_test.b DESC LIMIT 3;"]
    );
}

#[test]
fn test_first_and_not_found() {
    let mock = MockAdapter::new();
    let db = database(&mock);
    mock.push_rows(vec![Row::new().with("a", 9i64).with("b", 1i64)]);

    let first: ModelTest = db.model("ModelTest").first().unwrap();
    assert_eq!(first, ModelTest { a: 9, b: 1 });
    assert!(sent(&mock)[0].ends_with("LIMIT 1;"));

    let err = db.model("ModelTest").first::<ModelTest>().unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_count_and_distinct_count() {
    let mock = MockAdapter::new();
    let db = database(&mock);
    mock.push_rows(vec![Row::new().with("count", 3i64)]);
    mock.push_rows(vec![Row::new().with("count", 2i64)]);

    assert_eq!(db.model("CarTest").count().unwrap(), 3);
    assert_eq!(
        db.model("CarTest")
            .select(["designated_zone"])
            .distinct()
            .count()
            .unwrap(),
        2
    );
    assert_eq!(
        sent(&mock),
        vec![
            "SELECT COUNT(*) FROM car_test;",
            "SELECT COUNT(DISTINCT (car_test.designated_zone)) FROM car_test;",
        ]
    );
}

#[test]
fn test_spatial_columns_are_aliased_and_decoded() {
    let mock = MockAdapter::new();
    let db = database(&mock);
    mock.push_rows(vec![
        Row::new()
            .with("car_id", 1i64)
            .with("location", r#"{"type":"Point","coordinates":[10.0,20.0]}"#)
            .with("designated_zone", "north"),
    ]);

    let cars: Vec<CarTest> = db.model("CarTest").all().unwrap();

    assert_eq!(
        cars,
        vec![CarTest {
            car_id: 1,
            location: Location::new(10.0, 20.0),
            designated_zone: "north".into(),
        }]
    );
    assert_eq!(
        sent(&mock),
        vec![
            "SELECT car_test.car_id, ST_AsGeoJSON(car_test.location) AS location, \
             car_test.designated_zone FROM car_test;"
        ]
    );
}

#[test]
fn test_covered_by_rectangle() {
    let mock = MockAdapter::new();
    let db = database(&mock);
    let rect = Region::rect(-50.0, 50.0, -50.0, 50.0);

    let (sql, params) = db.model("CarTest").covered_by(rect.clone()).to_sql().unwrap();

    assert!(sql.ends_with(
        "WHERE ST_Covers(ST_GeomFromGeoJSON($1)::geography, car_test.location);"
    ));
    assert_eq!(params, vec![Value::Region(rect)]);
}

#[test]
fn test_within_range_of_several_points() {
    let mock = MockAdapter::new();
    let db = database(&mock);
    let a = Location::new(0.0, 0.0);
    let b = Location::new(1.0, 1.0);

    let (sql, params) = db
        .model("CarTest")
        .within_range_of([a, b], 250.0)
        .to_sql()
        .unwrap();

    assert!(sql.ends_with(
        "WHERE (ST_DWithin(car_test.location, ST_GeomFromGeoJSON($1)::geography, $2) OR \
         ST_DWithin(car_test.location, ST_GeomFromGeoJSON($3)::geography, $4));"
    ));
    assert_eq!(
        params,
        vec![
            Value::Location(a),
            Value::Float(250.0),
            Value::Location(b),
            Value::Float(250.0),
        ]
    );
}

#[test]
fn test_join_and_spatial_join_shorthand() {
    let mock = MockAdapter::new();
    let db = database(&mock);

    let (sql, _) = db
        .model("CarTest")
        .join(
            "ZoneTest",
            Clause::equal_column("designated_zone", "ZoneTest.name"),
        )
        .select(["car_id", "ZoneTest.name"])
        .covered_by_model("ZoneTest")
        .to_sql()
        .unwrap();

    assert_eq!(
        sql,
        "SELECT car_test.car_id, zone_test.name FROM car_test \
         JOIN zone_test ON car_test.designated_zone = zone_test.name \
         WHERE ST_Covers(zone_test.region, car_test.location);"
    );
}

#[test]
fn test_shorthand_requires_joined_model() {
    let mock = MockAdapter::new();
    let db = database(&mock);

    let query = db.model("CarTest").covered_by_model("ZoneTest");
    assert_eq!(
        query.errors(),
        &[BuildError::TargetModelNotJoined("ZoneTest".into())]
    );
}

#[test]
fn test_ambiguous_spatial_shorthand_sends_nothing() {
    let mock = MockAdapter::new();
    let db = database(&mock);

    let err = db
        .model("Route")
        .covered_by(Region::rect(-50.0, 50.0, -50.0, 50.0))
        .all::<Route>()
        .unwrap_err();

    assert!(err.is_build_error());
    assert!(err.message.contains("Route"));
    assert!(mock.statements().is_empty());
}

#[test]
fn test_errors_are_reported_together() {
    let mock = MockAdapter::new();
    let db = database(&mock);

    let err = db
        .model("ModelTest")
        .select(["a", "zzz"])
        .join("Nowhere", Clause::equal_column("a", "Nowhere.a"))
        .limit(2)
        .count()
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::InvalidQuery);
    let messages: Vec<&str> = err.message.split(',').collect();
    assert_eq!(messages.len(), 2);
    assert!(mock.statements().is_empty());
}

#[test]
fn test_unregistered_model_fails_at_terminal() {
    let mock = MockAdapter::new();
    let db = database(&mock);

    let query = db.model("Ghost").limit(1);
    assert_eq!(
        query.errors(),
        &[BuildError::SchemaNotRegistered("Ghost".into())]
    );
    assert!(query.all::<ModelTest>().is_err());
    assert!(mock.statements().is_empty());
}

#[test]
fn test_create_many_and_update() {
    let mock = MockAdapter::new();
    let db = database(&mock);
    mock.set_affected(3);

    let records = vec![
        ModelTest { a: 1, b: 1 },
        ModelTest { a: 2, b: 2 },
        ModelTest { a: 1, b: 2 },
    ];
    assert_eq!(db.create_many(&records).unwrap(), 3);

    let statement = mock.last_statement().unwrap();
    assert_eq!(
        statement.sql,
        "INSERT INTO model_test (a, b) VALUES ($1, $2), ($3, $4), ($5, $6);"
    );
    assert_eq!(
        statement.params,
        vec![1i64, 1, 2, 2, 1, 2]
            .into_iter()
            .map(Value::Int)
            .collect::<Vec<_>>()
    );

    mock.set_affected(1);
    let car = CarTest {
        car_id: 7,
        location: Location::new(3.0, 4.0),
        designated_zone: "south".into(),
    };
    assert_eq!(db.update(&car).unwrap(), 1);
    let statement = mock.last_statement().unwrap();
    assert_eq!(
        statement.sql,
        "UPDATE car_test SET location = ST_GeomFromGeoJSON($1)::geography, \
         designated_zone = $2 WHERE car_test.car_id = $3;"
    );
    assert_eq!(statement.params[2], Value::Int(7));
}

#[test]
fn test_update_rejects_batches_and_keyless_models() {
    let mock = MockAdapter::new();
    let db = database(&mock);

    let two = [ModelTest::default(), ModelTest::default()];
    let err = db.model("ModelTest").update(&two).unwrap_err();
    assert_eq!(err.code, ErrorCode::MultipleRecordUpdate);

    let err = db.model("ModelTest").update(&two[..1]).unwrap_err();
    assert_eq!(err.code, ErrorCode::MissingPrimaryKey);

    db.model("ModelTest")
        .r#where(Clause::equal("a", 0i64))
        .update(&two[..1])
        .unwrap();
    assert_eq!(
        mock.last_statement().unwrap().sql,
        "UPDATE model_test SET a = $1, b = $2 WHERE model_test.a = $3;"
    );

    let err = db.model("ModelTest").create::<ModelTest>(&[]).unwrap_err();
    assert_eq!(err.code, ErrorCode::EmptyInput);
}

#[test]
fn test_create_table_with_indexes() {
    let mock = MockAdapter::new();
    let db = database(&mock);

    db.create_table("ZoneTest", true).unwrap();
    db.create_table("Route", false).unwrap();

    assert_eq!(
        sent(&mock),
        vec![
            "CREATE TABLE IF NOT EXISTS zone_test (zone_id serial PRIMARY KEY, \
             name text DEFAULT 'unnamed', region geography(polygon));",
            "CREATE INDEX IF NOT EXISTS idx_zone_test_region ON zone_test USING GIST (region);",
            "CREATE TABLE routes (id bigint PRIMARY KEY, start geography(point), \
             finish geography(point));",
            "CREATE INDEX IF NOT EXISTS idx_routes_start ON routes USING GIST (start);",
            "CREATE INDEX IF NOT EXISTS idx_routes_finish ON routes USING GIST (finish);",
        ]
    );
}

#[test]
fn test_question_placeholder_dialect_without_postgis() {
    let mock = MockAdapter::new()
        .with_placeholder(PlaceholderStyle::Question)
        .with_spatial_type(SpatialExtension::None);
    let db = database(&mock);

    let (sql, _) = db
        .model("ModelTest")
        .r#where(Clause::equal("a", 1i64).and_then(Clause::equal("b", 2i64)))
        .to_sql()
        .unwrap();
    assert_eq!(
        sql,
        "SELECT model_test.a, model_test.b FROM model_test \
         WHERE (model_test.a = ? AND model_test.b = ?);"
    );

    let query = db
        .model("CarTest")
        .r#where(Clause::equal("location", Location::new(0.0, 0.0)));
    assert_eq!(query.errors().len(), 1);
}

#[test]
fn test_dollar_placeholders_are_consecutive() {
    let mock = MockAdapter::new();
    let db = database(&mock);

    let (sql, params) = db
        .model("CarTest")
        .r#where(Clause::equal("designated_zone", "a"))
        .within_range_of([Location::new(0.0, 0.0)], 10.0)
        .order_by_nearest_to(Location::new(5.0, 5.0), true)
        .offset(4)
        .to_sql()
        .unwrap();

    for n in 1..=params.len() {
        assert!(sql.contains(&format!("${}", n)), "missing ${} in {}", n, sql);
    }
    assert!(!sql.contains(&format!("${}", params.len() + 1)));
    assert!(sql.ends_with("DESC OFFSET 4;"));
}

#[test]
fn test_execution_errors_propagate() {
    let mock = MockAdapter::new();
    let db = database(&mock);
    mock.push_failure(QueryError::database("relation \"model_test\" does not exist"));

    let err = db.model("ModelTest").all::<ModelTest>().unwrap_err();
    assert_eq!(err.code, ErrorCode::DatabaseError);
    assert_eq!(mock.statements().len(), 1);
}

#[test]
fn test_builder_can_be_compiled_directly() {
    let mock = MockAdapter::new();
    let db = database(&mock);
    let cars = db.schema("CarTest").unwrap();
    let zones = db.schema("ZoneTest").unwrap();

    let mut builder = Builder::new();
    builder
        .select(["CarTest.car_id", "ZoneTest.zone_id"])
        .join(Join::new(
            "CarTest",
            "ZoneTest",
            JoinType::Left,
            Clause::equal_column("designated_zone", "ZoneTest.name"),
        ));

    let info = SchemaInfo::new(cars, &db).with_join(zones);
    let (sql, params) = compile_sql(&builder, &info);
    assert_eq!(
        sql,
        "SELECT car_test.car_id, zone_test.zone_id FROM car_test \
         LEFT JOIN zone_test ON car_test.designated_zone = zone_test.name;"
    );
    assert!(params.is_empty());

    let (facade_sql, _) = db
        .model("CarTest")
        .left_join(
            "ZoneTest",
            Clause::equal_column("designated_zone", "ZoneTest.name"),
        )
        .select(["car_id", "ZoneTest.zone_id"])
        .to_sql()
        .unwrap();
    assert_eq!(facade_sql, sql);
}
