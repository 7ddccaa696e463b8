//! The fluent query façade.
//!
//! Every mutator validates its input against the schemas of the query and
//! records failures instead of returning them, so a chain never breaks in the
//! middle. The first terminal call reports every recorded failure at once and
//! sends nothing to the database.
//!
//! ```rust,ignore
//! let cars: Vec<Car> = db
//!     .model("Car")
//!     .select(["car_id", "location"])
//!     .covered_by(Region::rect(-50.0, 50.0, -50.0, 50.0))
//!     .order_by_col("car_id", true)
//!     .limit(10)
//!     .all()?;
//! ```

use std::sync::Arc;

use atlas_schema::{FromRow, Model, Schema, SpatialObject, Value, parse_object};
use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::adapter::AdapterInfo;
use crate::builder::{Builder, QueryType};
use crate::clause::Clause;
use crate::compiler::{compile_sql, target_fields};
use crate::database::Database;
use crate::error::{BuildError, QueryError, QueryResult};
use crate::info::QueryInfo;
use crate::join::{Join, JoinType};
use crate::order::Order;

/// A single-use query against one registered model, optionally joined to others.
pub struct Query<'db> {
    db: &'db Database,
    main: Arc<Schema>,
    joins: IndexMap<String, Arc<Schema>>,
    builder: Builder,
    errors: Vec<BuildError>,
    echo: bool,
}

impl<'db> Query<'db> {
    pub(crate) fn new(db: &'db Database, main: Arc<Schema>) -> Self {
        Self {
            db,
            main,
            joins: IndexMap::new(),
            builder: Builder::new(),
            errors: Vec::new(),
            echo: false,
        }
    }

    pub(crate) fn with_error(mut self, error: BuildError) -> Self {
        self.record(error);
        self
    }

    /// Errors recorded so far.
    pub fn errors(&self) -> &[BuildError] {
        &self.errors
    }

    /// The accumulated query shape.
    pub fn builder(&self) -> &Builder {
        &self.builder
    }

    fn record(&mut self, error: BuildError) {
        warn!(model = %self.main.name(), error = %error, "query build error");
        self.errors.push(error);
    }

    /// Resolve names to qualified field names, recording any that are unknown.
    fn resolve_columns<I, S>(&mut self, columns: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut resolved = Vec::new();
        let mut missing = Vec::new();
        for column in columns {
            let column = column.as_ref();
            match self.field(column) {
                Some(field) => resolved.push(field.full_name()),
                None => missing.push(column.to_string()),
            }
        }
        if !missing.is_empty() {
            self.record(BuildError::ColumnsNotFound(missing));
        }
        resolved
    }

    /// Restrict the selected columns. Names may be bare or `Schema.field`.
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let resolved = self.resolve_columns(columns);
        self.builder.select(resolved);
        self
    }

    /// Remove columns from the statement. Wins over [`select`](Self::select).
    pub fn omit<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let resolved = self.resolve_columns(columns);
        self.builder.omit(resolved);
        self
    }

    /// Add a WHERE clause. Several clauses are combined with AND.
    pub fn r#where(mut self, clause: Clause) -> Self {
        let missing: Vec<String> = clause
            .columns()
            .into_iter()
            .filter(|c| !self.has_field(c))
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            self.record(BuildError::ColumnsNotFound(missing));
        } else if !clause.is_valid(&self) {
            self.record(BuildError::InvalidClause(clause.condition().to_string()));
        } else {
            self.builder.clause(clause);
        }
        self
    }

    fn join_with(mut self, join_type: JoinType, other: &str, clause: Clause) -> Self {
        let Some(schema) = self.db.schema_arc(other) else {
            self.record(BuildError::JoinSchemaNotFound(other.to_string()));
            return self;
        };
        self.joins.entry(other.to_string()).or_insert(schema);

        let join = Join::new(self.main.name(), other, join_type, clause);
        if join.is_valid(&self) {
            self.builder.join(join);
        } else {
            self.record(BuildError::InvalidJoin(join_type.as_sql().to_string()));
        }
        self
    }

    /// `JOIN other ON clause`.
    pub fn join(self, other: &str, clause: Clause) -> Self {
        self.join_with(JoinType::Inner, other, clause)
    }

    /// `FULL OUTER JOIN other ON clause`.
    pub fn outer_join(self, other: &str, clause: Clause) -> Self {
        self.join_with(JoinType::Outer, other, clause)
    }

    /// `LEFT JOIN other ON clause`.
    pub fn left_join(self, other: &str, clause: Clause) -> Self {
        self.join_with(JoinType::Left, other, clause)
    }

    /// `RIGHT JOIN other ON clause`.
    pub fn right_join(self, other: &str, clause: Clause) -> Self {
        self.join_with(JoinType::Right, other, clause)
    }

    /// Add an ORDER BY term.
    pub fn order_by(mut self, order: Order) -> Self {
        if order.is_valid(&self) {
            self.builder.order(order);
        } else {
            self.record(BuildError::InvalidOrder(order.column().to_string()));
        }
        self
    }

    /// Order by a scalar column.
    pub fn order_by_col(self, column: &str, descending: bool) -> Self {
        let order = Order::Column {
            column: column.to_string(),
            descending,
        };
        self.order_by(order)
    }

    /// Order by the distance between a spatial column and a geometry.
    pub fn order_by_col_distance(
        self,
        column: &str,
        target: impl Into<SpatialObject>,
        descending: bool,
    ) -> Self {
        self.order_by(Order::distance(column, target.into(), descending))
    }

    /// Order by the distance between two spatial columns.
    pub fn order_by_col_distances(self, column: &str, other: &str, descending: bool) -> Self {
        self.order_by(Order::distance_to_column(column, other, descending))
    }

    /// Order by distance from the model's only spatial field to a geometry.
    pub fn order_by_nearest_to(mut self, target: impl Into<SpatialObject>, descending: bool) -> Self {
        match self.main_spatial_field() {
            Some(column) => self.order_by(Order::distance(column, target.into(), descending)),
            None => self,
        }
    }

    /// Order by distance between the only spatial fields of this and a joined model.
    pub fn order_by_nearest_to_model(mut self, model: &str, descending: bool) -> Self {
        match self.spatial_pair(model) {
            Some((column, other)) => {
                self.order_by(Order::distance_to_column(column, other, descending))
            }
            None => self,
        }
    }

    /// Keep rows whose only spatial field lies inside the geometry.
    pub fn covered_by(mut self, target: impl Into<SpatialObject>) -> Self {
        match self.main_spatial_field() {
            Some(column) => self.r#where(Clause::covered_by(column, target)),
            None => self,
        }
    }

    /// Keep rows whose only spatial field lies inside the joined model's.
    pub fn covered_by_model(mut self, model: &str) -> Self {
        match self.spatial_pair(model) {
            Some((column, other)) => self.r#where(Clause::covered_by_column(column, other)),
            None => self,
        }
    }

    /// Keep rows whose only spatial field contains the geometry.
    pub fn covers(mut self, target: impl Into<SpatialObject>) -> Self {
        match self.main_spatial_field() {
            Some(column) => self.r#where(Clause::covers(column, target)),
            None => self,
        }
    }

    /// Keep rows whose only spatial field contains the joined model's.
    pub fn covers_model(mut self, model: &str) -> Self {
        match self.spatial_pair(model) {
            Some((column, other)) => self.r#where(Clause::covers_column(column, other)),
            None => self,
        }
    }

    /// Keep rows within `range` meters of any of the geometries.
    pub fn within_range_of<I, O>(mut self, targets: I, range: f64) -> Self
    where
        I: IntoIterator<Item = O>,
        O: Into<SpatialObject>,
    {
        match self.main_spatial_field() {
            Some(column) => self.r#where(Clause::within_range_of(column, targets, range)),
            None => self,
        }
    }

    /// Keep rows within `range` meters of the joined model's spatial field.
    pub fn within_range_of_model(mut self, model: &str, range: f64) -> Self {
        match self.spatial_pair(model) {
            Some((column, other)) => {
                self.r#where(Clause::within_range_of_column(column, other, range))
            }
            None => self,
        }
    }

    /// Keep rows within `range` meters of every geometry.
    pub fn has_within_range<I, O>(mut self, targets: I, range: f64) -> Self
    where
        I: IntoIterator<Item = O>,
        O: Into<SpatialObject>,
    {
        match self.main_spatial_field() {
            Some(column) => self.r#where(Clause::has_within_range(column, targets, range)),
            None => self,
        }
    }

    /// Return at most `count` rows.
    pub fn limit(mut self, count: u64) -> Self {
        self.builder.limit = count;
        self
    }

    /// Skip the first `count` rows.
    pub fn offset(mut self, count: u64) -> Self {
        self.builder.offset = count;
        self
    }

    /// Return distinct rows only.
    pub fn distinct(mut self) -> Self {
        self.builder.is_distinct = true;
        self
    }

    /// Log the compiled statement at `info` level when the query runs.
    pub fn echo(mut self) -> Self {
        self.echo = true;
        self
    }

    fn main_spatial_field(&mut self) -> Option<String> {
        let field = self.main.single_spatial_field().map(str::to_string);
        if field.is_none() {
            let name = self.main.name().to_string();
            self.record(BuildError::AmbiguousSpatialColumn(name));
        }
        field
    }

    fn spatial_pair(&mut self, model: &str) -> Option<(String, String)> {
        let Some(other) = self.joins.get(model).cloned() else {
            self.record(BuildError::TargetModelNotJoined(model.to_string()));
            return None;
        };
        let column = self.main_spatial_field()?;
        match other.single_spatial_field() {
            Some(target) => Some((column, target.to_string())),
            None => {
                self.record(BuildError::AmbiguousSpatialColumn(other.name().to_string()));
                None
            }
        }
    }

    fn check(&self) -> QueryResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(QueryError::build(&self.errors).with_model(self.main.name()))
        }
    }

    fn compile(&mut self, query_type: QueryType) -> QueryResult<(String, Vec<Value>)> {
        self.check()?;
        self.builder.query_type = query_type;
        let (sql, params) = compile_sql(&self.builder, &*self);
        if self.echo {
            info!(model = %self.main.name(), sql = %sql, "echo");
        }
        Ok((sql, params))
    }

    /// Compile the SELECT statement without running it.
    pub fn to_sql(mut self) -> QueryResult<(String, Vec<Value>)> {
        self.compile(QueryType::Select)
    }

    /// Count matching rows.
    pub fn count(mut self) -> QueryResult<u64> {
        self.builder.is_count = true;
        let (sql, params) = self.compile(QueryType::Select)?;
        let rows = self.db.adapter().query(&sql, &params)?;
        match rows.first().and_then(|row| row.value_at(0)) {
            Some(Value::Int(n)) => u64::try_from(*n)
                .map_err(|_| QueryError::deserialization(format!("negative count {}", n))),
            Some(Value::Uint(n)) => Ok(*n),
            Some(other) => Err(QueryError::deserialization(format!(
                "expected an integer count, got {}",
                other.type_name()
            ))),
            None => Err(QueryError::deserialization("count returned no rows")),
        }
    }

    /// The first matching record.
    ///
    /// Fails with a not-found error when nothing matches.
    pub fn first<M: FromRow>(mut self) -> QueryResult<M> {
        self.builder.limit = 1;
        let (sql, params) = self.compile(QueryType::Select)?;
        let rows = self.db.adapter().query(&sql, &params)?;
        match rows.first() {
            Some(row) => Ok(M::from_row(row)?),
            None => Err(QueryError::not_found(self.main.name())),
        }
    }

    /// Every matching record.
    pub fn all<M: FromRow>(mut self) -> QueryResult<Vec<M>> {
        let (sql, params) = self.compile(QueryType::Select)?;
        let rows = self.db.adapter().query(&sql, &params)?;
        debug!(model = %self.main.name(), rows = rows.len(), "fetched rows");
        rows.iter()
            .map(|row| M::from_row(row).map_err(QueryError::from))
            .collect()
    }

    /// Insert the records in one statement. Returns the affected row count.
    ///
    /// When no column is left to write, each record becomes its own
    /// `DEFAULT VALUES` insert.
    pub fn create<M: Model>(mut self, records: &[M]) -> QueryResult<u64> {
        self.check()?;
        if records.is_empty() {
            return Err(QueryError::empty_input(self.main.name()));
        }
        self.builder.write_values = parse_object(records, &self.main)?;
        self.builder.query_type = QueryType::Insert;
        let repeat = if target_fields(&self.builder, &self).is_empty() {
            records.len()
        } else {
            1
        };
        let (sql, params) = self.compile(QueryType::Insert)?;
        let mut affected = 0;
        for _ in 0..repeat {
            affected += self.db.adapter().exec(&sql, &params)?;
        }
        Ok(affected)
    }

    /// Update one record.
    ///
    /// Without a WHERE clause the record's primary key selects the row, and
    /// the primary key columns are left out of the SET list.
    pub fn update<M: Model>(mut self, records: &[M]) -> QueryResult<u64> {
        self.check()?;
        match records.len() {
            0 => return Err(QueryError::empty_input(self.main.name())),
            1 => {}
            n => return Err(QueryError::multiple_record_update(self.main.name(), n)),
        }
        if !self.builder.has_filter() && self.main.primary_field_names().is_empty() {
            return Err(QueryError::missing_primary_key(self.main.name()));
        }
        self.builder.write_values = parse_object(records, &self.main)?;
        self.builder.query_type = QueryType::Update;
        if target_fields(&self.builder, &self).is_empty() {
            return Err(QueryError::nothing_to_update(self.main.name()));
        }
        let (sql, params) = self.compile(QueryType::Update)?;
        self.db.adapter().exec(&sql, &params)
    }
}

impl QueryInfo for Query<'_> {
    fn main_schema(&self) -> &Schema {
        &self.main
    }

    fn join_schemas(&self) -> Vec<&Schema> {
        self.joins.values().map(Arc::as_ref).collect()
    }

    fn adapter_info(&self) -> &dyn AdapterInfo {
        self.db
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockAdapter;
    use crate::testing::{CarTest, Membership, ModelTest, Tag, Trip, ZoneTest};
    use atlas_schema::{Location, Region, Row};
    use pretty_assertions::assert_eq;

    fn database(mock: &MockAdapter) -> Database {
        let mut db = Database::new(mock.clone());
        db.register_model::<CarTest>().unwrap();
        db.register_model::<ZoneTest>().unwrap();
        db.register_model::<ModelTest>().unwrap();
        db.register_model::<Trip>().unwrap();
        db.register_model::<Tag>().unwrap();
        db.register_model::<Membership>().unwrap();
        db
    }

    #[test]
    fn test_where_and_all() {
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

        assert_eq!(records, vec![ModelTest { a: 1, b: 1 }, ModelTest { a: 1, b: 2 }]);
        let statement = mock.last_statement().unwrap();
        assert_eq!(
            statement.sql,
            "SELECT model_test.a, model_test.b FROM model_test WHERE model_test.a = $1;"
        );
        assert_eq!(statement.params, vec![Value::Int(1)]);
    }

    #[test]
    fn test_select_and_omit_resolve_names() {
        let mock = MockAdapter::new();
        let db = database(&mock);
        let (sql, _) = db
            .model("CarTest")
            .select(["car_id", "CarTest.location", "designated_zone"])
            .omit(["location"])
            .to_sql()
            .unwrap();
        assert_eq!(
            sql,
            "SELECT car_test.car_id, car_test.designated_zone FROM car_test;"
        );
    }

    #[test]
    fn test_errors_accumulate_and_nothing_is_sent() {
        let mock = MockAdapter::new();
        let db = database(&mock);
        let err = db
            .model("CarTest")
            .select(["nope"])
            .r#where(Clause::like("car_id", "x%"))
            .order_by_col("location", false)
            .limit(3)
            .all::<CarTest>()
            .unwrap_err();

        assert!(err.is_build_error());
        assert_eq!(
            err.message,
            "missing cols: nope,invalid clause of type: LIKE,invalid order clause: location"
        );
        assert!(mock.statements().is_empty());
    }

    #[test]
    fn test_ambiguous_spatial_shorthand() {
        let mock = MockAdapter::new();
        let db = database(&mock);
        let query = db
            .model("Trip")
            .covered_by(Region::rect(-50.0, 50.0, -50.0, 50.0));
        assert_eq!(
            query.errors(),
            &[BuildError::AmbiguousSpatialColumn("Trip".into())]
        );
        assert!(query.count().is_err());
        assert!(mock.statements().is_empty());
    }

    #[test]
    fn test_spatial_shorthands_use_single_field() {
        let mock = MockAdapter::new();
        let db = database(&mock);
        let rect = Region::rect(-50.0, 50.0, -50.0, 50.0);
        let point = Location::new(0.0, 0.0);

        let (sql, params) = db
            .model("CarTest")
            .covered_by(rect.clone())
            .order_by_nearest_to(point, false)
            .to_sql()
            .unwrap();
        assert!(sql.contains("WHERE ST_Covers(ST_GeomFromGeoJSON($1)::geography, car_test.location)"));
        assert!(sql.ends_with(
            "ORDER BY car_test.location::geometry <-> ST_GeomFromGeoJSON($2)::geometry ASC;"
        ));
        assert_eq!(params, vec![Value::Region(rect), Value::Location(point)]);
    }

    #[test]
    fn test_join_and_model_shorthand() {
        let mock = MockAdapter::new();
        let db = database(&mock);
        let (sql, _) = db
            .model("CarTest")
            .join(
                "ZoneTest",
                Clause::equal_column("CarTest.designated_zone", "ZoneTest.name"),
            )
            .covered_by_model("ZoneTest")
            .select(["car_id", "ZoneTest.name"])
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
    fn test_model_shorthand_requires_join() {
        let mock = MockAdapter::new();
        let db = database(&mock);
        let query = db.model("CarTest").within_range_of_model("ZoneTest", 10.0);
        assert_eq!(
            query.errors(),
            &[BuildError::TargetModelNotJoined("ZoneTest".into())]
        );
    }

    #[test]
    fn test_join_unknown_schema() {
        let mock = MockAdapter::new();
        let db = database(&mock);
        let query = db
            .model("CarTest")
            .left_join("Garage", Clause::equal_column("car_id", "Garage.id"));
        assert_eq!(
            query.errors(),
            &[BuildError::JoinSchemaNotFound("Garage".into())]
        );
    }

    #[test]
    fn test_unregistered_model() {
        let mock = MockAdapter::new();
        let db = database(&mock);
        let err = db.model("Ghost").all::<ModelTest>().unwrap_err();
        assert!(err.message.contains("schema `Ghost` is not registered"));
        assert!(mock.statements().is_empty());
    }

    #[test]
    fn test_count_and_first() {
        let mock = MockAdapter::new();
        let db = database(&mock);

        mock.push_rows(vec![Row::new().with("count", 3i64)]);
        assert_eq!(db.model("ModelTest").count().unwrap(), 3);
        assert_eq!(
            mock.last_statement().unwrap().sql,
            "SELECT COUNT(*) FROM model_test;"
        );

        mock.push_rows(vec![Row::new().with("a", 2i64).with("b", 5i64)]);
        let first: ModelTest = db.model("ModelTest").order_by_col("b", true).first().unwrap();
        assert_eq!(first, ModelTest { a: 2, b: 5 });
        assert!(mock.last_statement().unwrap().sql.ends_with("LIMIT 1;"));

        let err = db.model("ModelTest").first::<ModelTest>().unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_create_and_update() {
        let mock = MockAdapter::new();
        let db = database(&mock);
        let car = CarTest {
            car_id: 4,
            location: Location::new(1.0, 2.0),
            designated_zone: "north".into(),
        };

        db.model("CarTest").omit(["car_id"]).create(&[car.clone()]).unwrap();
        assert_eq!(
            mock.last_statement().unwrap().sql,
            "INSERT INTO car_test (location, designated_zone) \
             VALUES (ST_GeomFromGeoJSON($1)::geography, $2);"
        );

        db.model("CarTest").update(&[car.clone()]).unwrap();
        let statement = mock.last_statement().unwrap();
        assert_eq!(
            statement.sql,
            "UPDATE car_test SET location = ST_GeomFromGeoJSON($1)::geography, \
             designated_zone = $2 WHERE car_test.car_id = $3;"
        );
        assert_eq!(statement.params[2], Value::Int(4));

        let err = db
            .model("CarTest")
            .update(&[car.clone(), car.clone()])
            .unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::MultipleRecordUpdate);

        let err = db.model("CarTest").create::<CarTest>(&[]).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::EmptyInput);
    }

    #[test]
    fn test_update_without_key_or_filter() {
        let mock = MockAdapter::new();
        let db = database(&mock);
        let err = db
            .model("ModelTest")
            .update(&[ModelTest { a: 1, b: 2 }])
            .unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::MissingPrimaryKey);

        db.model("ModelTest")
            .r#where(Clause::equal("a", 1i64))
            .update(&[ModelTest { a: 1, b: 2 }])
            .unwrap();
        assert_eq!(
            mock.last_statement().unwrap().sql,
            "UPDATE model_test SET a = $1, b = $2 WHERE model_test.a = $3;"
        );
    }

    #[test]
    fn test_create_without_columns_inserts_defaults_per_record() {
        let mock = MockAdapter::new();
        let db = database(&mock);

        let affected = db
            .model("Tag")
            .omit(["id"])
            .create(&[Tag::default(), Tag::default()])
            .unwrap();

        assert_eq!(affected, 2);
        let statements = mock.statements();
        assert_eq!(statements.len(), 2);
        for statement in statements {
            assert_eq!(statement.sql, "INSERT INTO tag DEFAULT VALUES;");
            assert!(statement.params.is_empty());
        }
    }

    #[test]
    fn test_update_of_key_only_model_is_rejected() {
        let mock = MockAdapter::new();
        let db = database(&mock);

        let err = db
            .model("Membership")
            .update(&[Membership { user_id: 1, group_id: 2 }])
            .unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::NothingToUpdate);

        let err = db
            .model("ModelTest")
            .r#where(Clause::equal("a", 1i64))
            .omit(["a", "b"])
            .update(&[ModelTest { a: 1, b: 2 }])
            .unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::NothingToUpdate);
        assert!(mock.statements().is_empty());
    }

    #[test]
    fn test_terminals_send_the_compiled_statement_unchanged() {
        let mock = MockAdapter::new();
        let db = database(&mock);
        let query = || {
            db.model("CarTest")
                .r#where(Clause::equal("designated_zone", "a?b"))
                .covered_by(Region::rect(0.0, 1.0, 0.0, 1.0))
        };

        let (sql, params) = query().to_sql().unwrap();
        query().all::<CarTest>().unwrap();

        let statement = mock.last_statement().unwrap();
        assert_eq!(statement.sql, sql);
        assert_eq!(statement.params, params);
    }

    #[test]
    fn test_create_rejects_other_model() {
        let mock = MockAdapter::new();
        let db = database(&mock);
        let err = db
            .model("CarTest")
            .create(&[ModelTest { a: 1, b: 1 }])
            .unwrap_err();
        assert!(err.message.contains("ModelTest"));
        assert!(mock.statements().is_empty());
    }
}
