//! Blocking PostgreSQL/PostGIS adapter.

use std::collections::HashMap;

use atlas_query::{
    Adapter, AdapterInfo, DatabaseType, PlaceholderStyle, QueryResult, SpatialExtension,
};
use atlas_schema::{Row, Value};
use parking_lot::Mutex;
use tokio::runtime::{Builder, Runtime};
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, NoTls, Statement};
use tracing::{debug, error, info};

use crate::config::PgConfig;
use crate::error::{PgError, PgResult};
use crate::row::from_pg_row;
use crate::types::to_sql_params;

/// Default number of prepared statements kept per connection.
pub const DEFAULT_STATEMENT_CACHE_SIZE: usize = 100;

/// A single PostgreSQL connection behind a blocking interface.
///
/// The adapter owns a current-thread Tokio runtime and blocks on every call.
/// Do not use it from inside another async runtime; `block_on` panics there.
pub struct PgAdapter {
    runtime: Runtime,
    client: Mutex<Option<Client>>,
    statements: StatementCache,
}

impl PgAdapter {
    /// Connect using a parsed configuration.
    pub fn connect(config: &PgConfig) -> PgResult<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        let pg_config = config.to_pg_config();

        let client = runtime.block_on(async {
            let (client, connection) = pg_config.connect(NoTls).await?;
            tokio::spawn(async move {
                if let Err(e) = connection.await {
                    error!(error = %e, "postgres connection error");
                }
            });
            Ok::<_, PgError>(client)
        })?;

        info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            "connected to postgres"
        );

        Ok(Self {
            runtime,
            client: Mutex::new(Some(client)),
            statements: StatementCache::new(DEFAULT_STATEMENT_CACHE_SIZE),
        })
    }

    /// Connect to a `postgres://` URL.
    pub fn connect_url(url: &str) -> PgResult<Self> {
        Self::connect(&PgConfig::from_url(url)?)
    }

    /// Whether [`Adapter::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.client.lock().is_none()
    }

    /// Number of prepared statements currently cached.
    pub fn cached_statements(&self) -> usize {
        self.statements.len()
    }

    fn execute(&self, sql: &str, params: &[Value]) -> PgResult<u64> {
        let guard = self.client.lock();
        let client = guard.as_ref().ok_or(PgError::Closed)?;
        debug!(sql = %sql, "executing statement");

        self.runtime.block_on(async {
            let statement = self.statements.prepare(client, sql).await?;
            let params = to_sql_params(params, statement.params())?;
            let count = client.execute(&statement, &param_refs(&params)).await?;
            Ok(count)
        })
    }

    fn fetch(&self, sql: &str, params: &[Value]) -> PgResult<Vec<Row>> {
        let guard = self.client.lock();
        let client = guard.as_ref().ok_or(PgError::Closed)?;
        debug!(sql = %sql, "executing query");

        let rows = self.runtime.block_on(async {
            let statement = self.statements.prepare(client, sql).await?;
            let params = to_sql_params(params, statement.params())?;
            let rows = client.query(&statement, &param_refs(&params)).await?;
            Ok::<_, PgError>(rows)
        })?;

        rows.iter().map(from_pg_row).collect()
    }
}

fn param_refs(params: &[Box<dyn ToSql + Sync + Send>]) -> Vec<&(dyn ToSql + Sync)> {
    params
        .iter()
        .map(|p| p.as_ref() as &(dyn ToSql + Sync))
        .collect()
}

impl AdapterInfo for PgAdapter {
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

impl Adapter for PgAdapter {
    fn exec(&self, sql: &str, params: &[Value]) -> QueryResult<u64> {
        self.execute(sql, params)
            .map_err(|e| atlas_query::QueryError::from(e).with_sql(sql))
    }

    fn query(&self, sql: &str, params: &[Value]) -> QueryResult<Vec<Row>> {
        self.fetch(sql, params)
            .map_err(|e| atlas_query::QueryError::from(e).with_sql(sql))
    }

    fn close(&self) -> QueryResult<()> {
        let client = self.client.lock().take();
        match client {
            Some(client) => {
                drop(client);
                self.statements.clear();
                info!("closed postgres connection");
                Ok(())
            }
            None => Err(PgError::Closed.into()),
        }
    }
}

/// Prepared statements keyed by SQL text.
///
/// Statements belong to the connection that prepared them, so the cache lives
/// and dies with the adapter.
struct StatementCache {
    max_size: usize,
    statements: Mutex<HashMap<String, Statement>>,
}

impl StatementCache {
    fn new(max_size: usize) -> Self {
        Self {
            max_size,
            statements: Mutex::new(HashMap::new()),
        }
    }

    async fn prepare(&self, client: &Client, sql: &str) -> PgResult<Statement> {
        if let Some(statement) = self.statements.lock().get(sql) {
            debug!(sql = %sql, "using cached prepared statement");
            return Ok(statement.clone());
        }

        let statement = client.prepare(sql).await?;
        let mut statements = self.statements.lock();
        if statements.len() >= self.max_size {
            statements.clear();
        }
        statements.insert(sql.to_string(), statement.clone());
        Ok(statement)
    }

    fn clear(&self) {
        self.statements.lock().clear();
    }

    fn len(&self) -> usize {
        self.statements.lock().len()
    }
}
