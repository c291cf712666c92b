//! Select query model with named parameters.
//!
//! Predicates reference parameters by name (`param_0`, `param_1_2`, ...).
//! Names are turned into the dialect's positional placeholders only when the
//! query is rendered, so the binding order always matches the SQL text.

use std::collections::HashMap;

use crate::config::Operator;
use crate::core::traits::{Dialect, SelectQueryOptions};
use crate::core::value::SqlValue;

/// Alias of the selected table.
pub const TABLE_ALIAS: &str = "t";

/// One predicate of the WHERE clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    /// Quoted column identifier.
    pub column: String,
    pub operator: Operator,
    /// Names of the bound parameters, in order.
    pub params: Vec<String>,
}

impl Predicate {
    fn render(&self, placeholder: &mut impl FnMut(&str) -> String) -> String {
        if !self.operator.takes_value() {
            format!("{} {}", self.column, self.operator.as_sql())
        } else if self.operator.is_list() {
            if self.params.is_empty() {
                // IN () is not valid SQL; an empty set matches nothing
                return match self.operator {
                    Operator::NotIn => "1 = 1".to_string(),
                    _ => "1 = 0".to_string(),
                };
            }
            let list = self
                .params
                .iter()
                .map(|name| placeholder(name))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{} {} ({})", self.column, self.operator.as_sql(), list)
        } else {
            let name = self.params.first().map(String::as_str).unwrap_or_default();
            format!(
                "{} {} {}",
                self.column,
                self.operator.as_sql(),
                placeholder(name)
            )
        }
    }
}

/// A SELECT * query under construction.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    table: String,
    predicates: Vec<Predicate>,
    params: Vec<(String, SqlValue<'static>)>,
    limit: Option<u64>,
    order_by: Option<String>,
}

/// SQL text with positional placeholders and the values to bind, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedQuery {
    pub sql: String,
    pub params: Vec<SqlValue<'static>>,
}

impl SelectQuery {
    /// Start a query selecting all columns of an already quoted table.
    pub fn new(quoted_table: impl Into<String>) -> Self {
        Self {
            table: quoted_table.into(),
            predicates: Vec::new(),
            params: Vec::new(),
            limit: None,
            order_by: None,
        }
    }

    /// AND-combine a predicate with the existing ones.
    pub fn and_where(&mut self, predicate: Predicate) -> &mut Self {
        self.predicates.push(predicate);
        self
    }

    /// Bind a named parameter.
    pub fn set_parameter(&mut self, name: impl Into<String>, value: SqlValue<'static>) -> &mut Self {
        self.params.push((name.into(), value));
        self
    }

    /// Limit the number of returned rows.
    pub fn set_max_results(&mut self, limit: u64) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    /// Set the raw ORDER BY fragment.
    pub fn set_order_by(&mut self, order_by: impl Into<String>) -> &mut Self {
        self.order_by = Some(order_by.into());
        self
    }

    /// Quoted table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Predicates in AND order.
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Bound parameters in binding order.
    pub fn parameters(&self) -> &[(String, SqlValue<'static>)] {
        &self.params
    }

    /// Look up a bound parameter by name.
    pub fn parameter(&self, name: &str) -> Option<&SqlValue<'static>> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    /// Row limit, if any.
    pub fn max_results(&self) -> Option<u64> {
        self.limit
    }

    /// ORDER BY fragment, if any.
    pub fn order_by(&self) -> Option<&str> {
        self.order_by.as_deref()
    }

    /// Render with `:name` placeholders, for logs and inspection.
    pub fn to_sql(&self, dialect: &dyn Dialect) -> String {
        self.render_with(dialect, |name| format!(":{}", name))
    }

    /// Render with the dialect's positional placeholders.
    ///
    /// Parameters are numbered in the order they appear in the SQL text.
    pub fn render(&self, dialect: &dyn Dialect) -> RenderedQuery {
        let by_name: HashMap<&str, &SqlValue<'static>> = self
            .params
            .iter()
            .map(|(name, value)| (name.as_str(), value))
            .collect();

        let mut params = Vec::with_capacity(self.params.len());
        let sql = self.render_with(dialect, |name| {
            // Every placeholder has a binding; builders always set both together
            if let Some(value) = by_name.get(name) {
                params.push((*value).clone());
            }
            dialect.param_placeholder(params.len())
        });

        RenderedQuery { sql, params }
    }

    fn render_with(&self, dialect: &dyn Dialect, mut placeholder: impl FnMut(&str) -> String) -> String {
        let conditions = self
            .predicates
            .iter()
            .map(|p| p.render(&mut placeholder))
            .collect();

        let opts = SelectQueryOptions {
            table: self.table.clone(),
            alias: Some(TABLE_ALIAS.to_string()),
            conditions,
            order_by: self.order_by.clone(),
            limit: self.limit,
        };
        dialect.build_select_query(&opts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::{MssqlDialect, PostgresDialect};

    fn sample() -> SelectQuery {
        let mut qb = SelectQuery::new("\"orders\"");
        qb.set_parameter("param_0_0", SqlValue::I32(1))
            .set_parameter("param_0_1", SqlValue::I32(2))
            .and_where(Predicate {
                column: "\"customer_id\"".into(),
                operator: Operator::In,
                params: vec!["param_0_0".into(), "param_0_1".into()],
            })
            .set_parameter("param_1", SqlValue::text_owned("open"))
            .and_where(Predicate {
                column: "\"status\"".into(),
                operator: Operator::Eq,
                params: vec!["param_1".into()],
            });
        qb
    }

    #[test]
    fn test_to_sql_named() {
        let sql = sample().to_sql(&PostgresDialect::new());
        assert_eq!(
            sql,
            "SELECT * FROM \"orders\" t WHERE \"customer_id\" IN (:param_0_0, :param_0_1) AND \"status\" = :param_1"
        );
    }

    #[test]
    fn test_render_positional_pg() {
        let rendered = sample().render(&PostgresDialect::new());
        assert_eq!(
            rendered.sql,
            "SELECT * FROM \"orders\" t WHERE \"customer_id\" IN ($1, $2) AND \"status\" = $3"
        );
        assert_eq!(
            rendered.params,
            vec![
                SqlValue::I32(1),
                SqlValue::I32(2),
                SqlValue::text_owned("open")
            ]
        );
    }

    #[test]
    fn test_render_positional_mssql_with_limit() {
        let mut qb = sample();
        qb.set_max_results(10).set_order_by("id");
        let rendered = qb.render(&MssqlDialect::new());
        assert!(rendered.sql.starts_with("SELECT TOP 10 * FROM"));
        assert!(rendered.sql.contains("IN (@P1, @P2)"));
        assert!(rendered.sql.ends_with("= @P3 ORDER BY id"));
    }

    #[test]
    fn test_empty_in_list() {
        let mut qb = SelectQuery::new("\"orders\"");
        qb.and_where(Predicate {
            column: "\"id\"".into(),
            operator: Operator::In,
            params: vec![],
        })
        .and_where(Predicate {
            column: "\"id\"".into(),
            operator: Operator::NotIn,
            params: vec![],
        });
        let rendered = qb.render(&PostgresDialect::new());
        assert_eq!(
            rendered.sql,
            "SELECT * FROM \"orders\" t WHERE 1 = 0 AND 1 = 1"
        );
        assert!(rendered.params.is_empty());
    }

    #[test]
    fn test_null_checks_have_no_placeholder() {
        let mut qb = SelectQuery::new("\"customers\"");
        qb.and_where(Predicate {
            column: "\"deleted_at\"".into(),
            operator: Operator::IsNull,
            params: vec![],
        })
        .set_parameter("param_1", SqlValue::I64(3))
        .and_where(Predicate {
            column: "\"visits\"".into(),
            operator: Operator::Gt,
            params: vec!["param_1".into()],
        })
        .and_where(Predicate {
            column: "\"email\"".into(),
            operator: Operator::IsNotNull,
            params: vec![],
        });

        let rendered = qb.render(&PostgresDialect::new());
        assert_eq!(
            rendered.sql,
            "SELECT * FROM \"customers\" t WHERE \"deleted_at\" IS NULL AND \"visits\" > $1 AND \"email\" IS NOT NULL"
        );
        assert_eq!(rendered.params, vec![SqlValue::I64(3)]);
    }

    #[test]
    fn test_parameter_lookup() {
        let qb = sample();
        assert_eq!(qb.parameter("param_1").unwrap().as_str(), Some("open"));
        assert!(qb.parameter("param_2").is_none());
    }
}
