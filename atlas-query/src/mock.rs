//! An in-memory [`Adapter`] that records statements instead of executing them.
//!
//! Clones share state, so a test can keep a handle while a
//! [`Database`](crate::Database) owns another.

use std::collections::VecDeque;
use std::sync::Arc;

use atlas_schema::{Row, Value};
use parking_lot::Mutex;

use crate::adapter::{Adapter, AdapterInfo, DatabaseType, PlaceholderStyle, SpatialExtension};
use crate::error::{QueryError, QueryResult};

/// A statement as the adapter received it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedStatement {
    /// SQL text with dialect placeholders.
    pub sql: String,
    /// Bound values.
    pub params: Vec<Value>,
}

#[derive(Debug, Default)]
struct MockState {
    statements: Vec<RecordedStatement>,
    results: VecDeque<Vec<Row>>,
    failures: VecDeque<QueryError>,
    affected: u64,
    closed: bool,
}

/// Records every statement and answers queries from a queue of row sets.
#[derive(Debug, Clone)]
pub struct MockAdapter {
    placeholder: PlaceholderStyle,
    spatial: SpatialExtension,
    state: Arc<Mutex<MockState>>,
}

impl Default for MockAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAdapter {
    /// A PostgreSQL + PostGIS flavoured mock.
    pub fn new() -> Self {
        Self {
            placeholder: PlaceholderStyle::Dollar,
            spatial: SpatialExtension::PostGis,
            state: Arc::new(Mutex::new(MockState {
                affected: 1,
                ..Default::default()
            })),
        }
    }

    /// Use a different placeholder style.
    pub fn with_placeholder(mut self, placeholder: PlaceholderStyle) -> Self {
        self.placeholder = placeholder;
        self
    }

    /// Use a different spatial extension.
    pub fn with_spatial_type(mut self, spatial: SpatialExtension) -> Self {
        self.spatial = spatial;
        self
    }

    /// Queue the rows returned by the next `query` call.
    pub fn push_rows(&self, rows: Vec<Row>) {
        self.state.lock().results.push_back(rows);
    }

    /// Make the next `exec` or `query` call fail.
    pub fn push_failure(&self, error: QueryError) {
        self.state.lock().failures.push_back(error);
    }

    /// Row count reported by `exec`.
    pub fn set_affected(&self, affected: u64) {
        self.state.lock().affected = affected;
    }

    /// Every statement received so far.
    pub fn statements(&self) -> Vec<RecordedStatement> {
        self.state.lock().statements.clone()
    }

    /// The most recent statement.
    pub fn last_statement(&self) -> Option<RecordedStatement> {
        self.state.lock().statements.last().cloned()
    }

    /// Whether `close` was called.
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    fn record(&self, sql: &str, params: &[Value]) -> QueryResult<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(QueryError::connection("connection is closed"));
        }
        state.statements.push(RecordedStatement {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        match state.failures.pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl AdapterInfo for MockAdapter {
    fn placeholder(&self) -> PlaceholderStyle {
        self.placeholder
    }

    fn spatial_type(&self) -> SpatialExtension {
        self.spatial
    }

    fn database_type(&self) -> DatabaseType {
        DatabaseType::PostgreSQL
    }
}

impl Adapter for MockAdapter {
    fn exec(&self, sql: &str, params: &[Value]) -> QueryResult<u64> {
        self.record(sql, params)?;
        Ok(self.state.lock().affected)
    }

    fn query(&self, sql: &str, params: &[Value]) -> QueryResult<Vec<Row>> {
        self.record(sql, params)?;
        Ok(self.state.lock().results.pop_front().unwrap_or_default())
    }

    fn close(&self) -> QueryResult<()> {
        self.state.lock().closed = true;
        Ok(())
    }
}
