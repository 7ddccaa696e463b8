//! SQL generation utilities.

use atlas_schema::Value;

use crate::adapter::PlaceholderStyle;

/// Accumulates SQL text and its positional parameters.
///
/// Parameters are always written as `?`; [`replace_placeholders`] converts
/// them to the dialect's style once the statement is complete.
#[derive(Debug, Clone, Default)]
pub struct SqlBuilder {
    sql: String,
    params: Vec<Value>,
}

impl SqlBuilder {
    /// Create a new SQL builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a literal SQL string.
    pub fn push(&mut self, sql: impl AsRef<str>) -> &mut Self {
        self.sql.push_str(sql.as_ref());
        self
    }

    /// Push a `?` placeholder and record its value.
    pub fn push_param(&mut self, value: impl Into<Value>) -> &mut Self {
        self.sql.push('?');
        self.params.push(value.into());
        self
    }

    /// Push a rendered fragment together with its values.
    pub fn push_fragment(&mut self, (sql, params): (String, Vec<Value>)) -> &mut Self {
        self.sql.push_str(&sql);
        self.params.extend(params);
        self
    }

    /// Push rendered fragments separated by `sep`.
    pub fn push_joined<I>(&mut self, fragments: I, sep: &str) -> &mut Self
    where
        I: IntoIterator<Item = (String, Vec<Value>)>,
    {
        for (i, fragment) in fragments.into_iter().enumerate() {
            if i > 0 {
                self.sql.push_str(sep);
            }
            self.push_fragment(fragment);
        }
        self
    }

    /// Get the current SQL string.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Get the current parameters.
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Build the final SQL string and parameters.
    pub fn build(self) -> (String, Vec<Value>) {
        (self.sql, self.params)
    }
}

/// Rewrite `?` placeholders left to right into the given style.
///
/// Question marks inside quoted literals and quoted identifiers are kept.
pub fn replace_placeholders(sql: &str, style: PlaceholderStyle) -> String {
    if style == PlaceholderStyle::Question {
        return sql.to_string();
    }

    let mut out = String::with_capacity(sql.len() + 8);
    let mut index = 0;
    let mut in_literal = false;
    let mut in_identifier = false;

    for c in sql.chars() {
        match c {
            '\'' if !in_identifier => {
                in_literal = !in_literal;
                out.push(c);
            }
            '"' if !in_literal => {
                in_identifier = !in_identifier;
                out.push(c);
            }
            '?' if !in_literal && !in_identifier => {
                index += 1;
                out.push_str(&style.placeholder(index));
            }
            _ => out.push(c),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sql_builder_collects_params_in_order() {
        let mut builder = SqlBuilder::new();
        builder
            .push("a = ")
            .push_param(1i64)
            .push(" AND ")
            .push_fragment(("b = ?".to_string(), vec![Value::from("x")]));
        let (sql, params) = builder.build();
        assert_eq!(sql, "a = ? AND b = ?");
        assert_eq!(params, vec![Value::Int(1), Value::String("x".into())]);
    }

    #[test]
    fn test_push_joined() {
        let mut builder = SqlBuilder::new();
        builder.push_joined(
            vec![
                ("a".to_string(), vec![]),
                ("b = ?".to_string(), vec![Value::Bool(true)]),
            ],
            ", ",
        );
        assert_eq!(builder.sql(), "a, b = ?");
        assert_eq!(builder.params().len(), 1);
    }

    #[test]
    fn test_replace_placeholders_dollar() {
        assert_eq!(
            replace_placeholders("SELECT a FROM t WHERE a = ? AND b = ?;", PlaceholderStyle::Dollar),
            "SELECT a FROM t WHERE a = $1 AND b = $2;"
        );
    }

    #[test]
    fn test_replace_placeholders_skips_quoted_text() {
        assert_eq!(
            replace_placeholders("SELECT '?', \"a?\" FROM t WHERE x = ?", PlaceholderStyle::Dollar),
            "SELECT '?', \"a?\" FROM t WHERE x = $1"
        );
        assert_eq!(
            replace_placeholders("WHERE s = 'it''s?' AND y = ?", PlaceholderStyle::Dollar),
            "WHERE s = 'it''s?' AND y = $1"
        );
    }

    #[test]
    fn test_replace_placeholders_question_is_identity() {
        let sql = "SELECT ? FROM t;";
        assert_eq!(replace_placeholders(sql, PlaceholderStyle::Question), sql);
    }
}
