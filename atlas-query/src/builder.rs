//! The accumulated shape of one query.

use atlas_schema::{Set, Value};
use indexmap::IndexMap;

use crate::clause::Clause;
use crate::join::Join;
use crate::order::Order;

/// The statement a builder compiles to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryType {
    /// `SELECT`.
    #[default]
    Select,
    /// `INSERT`.
    Insert,
    /// `UPDATE`.
    Update,
}

/// Plain data describing a query. Holds no SQL knowledge.
///
/// Selections and omissions hold qualified logical names (`Schema.field`).
/// Omission always wins: it is applied as a set difference at compile time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Builder {
    /// Explicitly selected fields. Empty means every field.
    pub selections: Set,
    /// Fields removed from the target set.
    pub omissions: Set,
    /// WHERE clauses, combined with AND.
    pub clauses: Vec<Clause>,
    /// ORDER BY terms in call order.
    pub orders: Vec<Order>,
    /// Joins in registration order.
    pub joins: Vec<Join>,
    /// LIMIT, when positive.
    pub limit: u64,
    /// OFFSET, when positive.
    pub offset: u64,
    /// Statement kind.
    pub query_type: QueryType,
    /// Emit `COUNT(...)` instead of the column list.
    pub is_count: bool,
    /// Emit `DISTINCT`.
    pub is_distinct: bool,
    /// One `{logical field -> value}` map per record to write.
    pub write_values: Vec<IndexMap<String, Value>>,
}

impl Builder {
    /// An empty SELECT builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add selected fields.
    pub fn select<I, S>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selections.add_all(fields);
        self
    }

    /// Add omitted fields.
    pub fn omit<I, S>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.omissions.add_all(fields);
        self
    }

    /// Add a WHERE clause.
    pub fn clause(&mut self, clause: Clause) -> &mut Self {
        self.clauses.push(clause);
        self
    }

    /// Add an ORDER BY term.
    pub fn order(&mut self, order: Order) -> &mut Self {
        self.orders.push(order);
        self
    }

    /// Add a join.
    pub fn join(&mut self, join: Join) -> &mut Self {
        self.joins.push(join);
        self
    }

    /// Whether the query has an explicit filter.
    pub fn has_filter(&self) -> bool {
        !self.clauses.is_empty()
    }
}
