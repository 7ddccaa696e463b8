//! A connection plus the registry of model schemas.

use std::sync::Arc;

use atlas_schema::{Model, Row, Schema, Value};
use indexmap::IndexMap;
use tracing::{debug, info};

use crate::adapter::{Adapter, AdapterInfo, DatabaseType, PlaceholderStyle, SpatialExtension};
use crate::compiler::{compile_index_creation, compile_table_creation};
use crate::error::{BuildError, QueryError, QueryResult};
use crate::info::SchemaInfo;
use crate::query::Query;
use crate::sql::replace_placeholders;

/// Owns one adapter and every registered schema.
///
/// Register models once at startup; queries borrow the database immutably.
pub struct Database {
    adapter: Box<dyn Adapter>,
    schemas: IndexMap<String, Arc<Schema>>,
}

impl Database {
    /// Wrap a connected adapter.
    pub fn new(adapter: impl Adapter + 'static) -> Self {
        Self::from_boxed(Box::new(adapter))
    }

    /// Wrap an already boxed adapter.
    pub fn from_boxed(adapter: Box<dyn Adapter>) -> Self {
        Self {
            adapter,
            schemas: IndexMap::new(),
        }
    }

    /// The underlying adapter.
    pub fn adapter(&self) -> &dyn Adapter {
        self.adapter.as_ref()
    }

    /// Parse and register the schema of `M`, replacing any previous one.
    pub fn register_model<M: Model>(&mut self) -> QueryResult<()> {
        let schema = Schema::parse::<M>()?;
        self.insert_schema(schema);
        Ok(())
    }

    /// Register `M`, capturing bare `default` values from a sample record.
    pub fn register_model_with_defaults<M: Model>(&mut self, sample: &M) -> QueryResult<()> {
        let mut schema = Schema::parse::<M>()?;
        schema.set_default_values(sample);
        self.insert_schema(schema);
        Ok(())
    }

    fn insert_schema(&mut self, schema: Schema) {
        info!(
            model = %schema.name(),
            table = %schema.table(),
            fields = schema.fields().len(),
            "registered model"
        );
        self.schemas
            .insert(schema.name().to_string(), Arc::new(schema));
    }

    /// A registered schema by logical name.
    pub fn schema(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name).map(Arc::as_ref)
    }

    pub(crate) fn schema_arc(&self, name: &str) -> Option<Arc<Schema>> {
        self.schemas.get(name).cloned()
    }

    /// Registered schemas in registration order.
    pub fn schemas(&self) -> impl Iterator<Item = &Schema> {
        self.schemas.values().map(Arc::as_ref)
    }

    /// Start a query on a registered model.
    ///
    /// An unknown name still yields a query; it fails at its terminal call.
    pub fn model(&self, name: &str) -> Query<'_> {
        match self.schema_arc(name) {
            Some(schema) => Query::new(self, schema),
            None => Query::new(self, Arc::new(Schema::empty(name)))
                .with_error(BuildError::SchemaNotRegistered(name.to_string())),
        }
    }

    /// Start a query on the model of type `M`.
    pub fn model_of<M: Model>(&self) -> Query<'_> {
        self.model(M::NAME)
    }

    fn registered<M: Model>(&self) -> QueryResult<Arc<Schema>> {
        self.schema_arc(M::NAME)
            .ok_or_else(|| QueryError::schema_not_registered(M::NAME))
    }

    /// Insert one record.
    ///
    /// Auto-increment columns are left to the database.
    pub fn create<M: Model>(&self, record: &M) -> QueryResult<u64> {
        self.create_many(std::slice::from_ref(record))
    }

    /// Insert several records in one statement.
    ///
    /// Auto-increment columns are left to the database.
    pub fn create_many<M: Model>(&self, records: &[M]) -> QueryResult<u64> {
        let schema = self.registered::<M>()?;
        let generated: Vec<&str> = schema
            .fields()
            .iter()
            .filter(|f| f.auto_increment)
            .map(|f| f.name.as_str())
            .collect();
        Query::new(self, schema.clone())
            .omit(generated)
            .create(records)
    }

    /// Update one record by primary key.
    pub fn update<M: Model>(&self, record: &M) -> QueryResult<u64> {
        let schema = self.registered::<M>()?;
        Query::new(self, schema).update(std::slice::from_ref(record))
    }

    /// Create the table of a registered model, then its spatial indexes.
    pub fn create_table(&self, name: &str, if_not_exists: bool) -> QueryResult<()> {
        let schema = self
            .schema(name)
            .ok_or_else(|| QueryError::schema_not_registered(name))?;
        let info = SchemaInfo::new(schema, self);

        let table = compile_table_creation(&info, if_not_exists);
        debug!(sql = %table, "creating table");
        self.adapter.exec(&table, &[])?;

        for index in compile_index_creation(&info) {
            debug!(sql = %index, "creating index");
            self.adapter.exec(&index, &[])?;
        }
        info!(model = %name, table = %schema.table(), "created table");
        Ok(())
    }

    /// Run a raw statement written with `?` placeholders.
    pub fn execute(&self, sql: &str, params: &[Value]) -> QueryResult<u64> {
        let sql = replace_placeholders(sql, self.adapter.placeholder());
        crate::atlas_trace!(sql = %sql, params = ?params, "execute");
        self.adapter.exec(&sql, params)
    }

    /// Run a raw query written with `?` placeholders.
    pub fn query(&self, sql: &str, params: &[Value]) -> QueryResult<Vec<Row>> {
        let sql = replace_placeholders(sql, self.adapter.placeholder());
        crate::atlas_trace!(sql = %sql, params = ?params, "query");
        self.adapter.query(&sql, params)
    }

    /// Close the connection.
    pub fn disconnect(self) -> QueryResult<()> {
        info!("disconnecting");
        self.adapter.close()
    }
}

impl AdapterInfo for Database {
    fn placeholder(&self) -> PlaceholderStyle {
        self.adapter.placeholder()
    }

    fn spatial_type(&self) -> SpatialExtension {
        self.adapter.spatial_type()
    }

    fn database_type(&self) -> DatabaseType {
        self.adapter.database_type()
    }
}
