//! Joins between registered schemas.

use std::fmt;

use atlas_schema::Value;

use crate::clause::Clause;
use crate::info::QueryInfo;

/// Kind of join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinType {
    /// `JOIN`.
    #[default]
    Inner,
    /// `FULL OUTER JOIN`.
    Outer,
    /// `LEFT JOIN`.
    Left,
    /// `RIGHT JOIN`.
    Right,
}

impl JoinType {
    /// The SQL keyword.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Inner => "JOIN",
            Self::Outer => "FULL OUTER JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
        }
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A join from the query's main schema to another registered schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    /// Logical name of the main schema.
    pub schema: String,
    /// Logical name of the joined schema.
    pub other_schema: String,
    /// Join kind.
    pub join_type: JoinType,
    /// The `ON` condition.
    pub clause: Clause,
}

impl Join {
    /// Create a join.
    pub fn new(
        schema: impl Into<String>,
        other_schema: impl Into<String>,
        join_type: JoinType,
        clause: Clause,
    ) -> Self {
        Self {
            schema: schema.into(),
            other_schema: other_schema.into(),
            join_type,
            clause,
        }
    }

    /// Short label, used in error messages.
    pub fn condition(&self) -> &'static str {
        self.join_type.as_sql()
    }

    /// Whether both schemas belong to the query and the clause is valid.
    pub fn is_valid(&self, info: &dyn QueryInfo) -> bool {
        info.main_schema().name() == self.schema
            && info
                .join_schemas()
                .iter()
                .any(|s| s.name() == self.other_schema)
            && self.clause.is_valid(info)
    }

    /// Render `<KEYWORD> <table> ON <clause>`.
    pub fn sql(&self, info: &dyn QueryInfo) -> (String, Vec<Value>) {
        let table = info
            .schema(&self.other_schema)
            .map(|s| s.table().to_string())
            .unwrap_or_else(|| self.other_schema.clone());
        let (clause, params) = self.clause.sql(info);
        (
            format!("{} {} ON {}", self.join_type.as_sql(), table, clause),
            params,
        )
    }
}
