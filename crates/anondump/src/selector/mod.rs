//! Data selection for one table under its extraction policy.
//!
//! The [`DataSelector`] turns a [`TableConfiguration`] into a parameterized
//! SELECT, resolving data dependent filters against the values collected from
//! tables dumped earlier, and executes it through a [`QueryExecutor`].
//!
//! # Parameter naming
//!
//! Each filter is numbered by its position in the policy. List operators bind
//! one parameter per element (`param_<filter>_<element>`), `isNull` and
//! `isNotNull` bind none, all others bind a single `param_<filter>`. Names
//! therefore never collide within a query.

pub mod collected;
pub mod filter;
pub mod query;

#[cfg(test)]
pub(crate) mod mock;

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::TableConfiguration;
use crate::core::result::ResultSet;
use crate::core::schema::Table;
use crate::core::traits::{Dialect, QueryExecutor};
use crate::error::{DumpError, Result};

pub use collected::CollectedValues;
pub use filter::{resolve_filter, BoundValue, ResolvedFilter};
pub use query::{Predicate, RenderedQuery, SelectQuery, TABLE_ALIAS};

/// Builds and executes the extraction query of a table.
#[derive(Clone)]
pub struct DataSelector {
    executor: Arc<dyn QueryExecutor>,
}

impl DataSelector {
    /// Create a selector running queries on the given executor.
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self { executor }
    }

    /// Dialect of the underlying executor.
    pub fn dialect(&self) -> &dyn Dialect {
        self.executor.dialect()
    }

    /// Fetch the rows of `table` under its policy.
    ///
    /// A raw query override is executed verbatim without parameters; the
    /// policy's filters, limit and ordering are ignored in that case.
    pub async fn execute_select_query(
        &self,
        table_config: Option<&TableConfiguration>,
        table: &Table,
        collected: &CollectedValues,
    ) -> Result<ResultSet> {
        if let Some(query) = table_config.and_then(|c| c.query.as_deref()) {
            if let Some(config) = table_config {
                if !config.filters.is_empty()
                    || config.limit.is_some()
                    || config.order_by.is_some()
                {
                    warn!(
                        "{}: raw query overrides configured filters, limit and order_by",
                        table.full_name()
                    );
                }
            }
            debug!("{}: executing raw query: {}", table.full_name(), query);
            return self.executor.query(query, &[]).await;
        }

        let qb = self.build_select_query(table_config, table, collected)?;
        let rendered = qb.render(self.dialect());
        debug!(
            "{}: {} ({} parameters)",
            table.full_name(),
            rendered.sql,
            rendered.params.len()
        );

        self.executor.query(&rendered.sql, &rendered.params).await
    }

    /// Build the SELECT for `table` without executing it.
    ///
    /// # Errors
    ///
    /// - [`DumpError::InvalidQueryBuilderUse`] if the policy has a raw query
    /// - [`DumpError::UnresolvedDependency`] if a dependent filter refers to a
    ///   table or column that has not been collected yet
    pub fn build_select_query(
        &self,
        table_config: Option<&TableConfiguration>,
        table: &Table,
        collected: &CollectedValues,
    ) -> Result<SelectQuery> {
        let dialect = self.dialect();
        let mut qb = SelectQuery::new(table.quoted_name(dialect)?);

        let Some(config) = table_config else {
            return Ok(qb);
        };

        if config.has_query() {
            return Err(DumpError::InvalidQueryBuilderUse {
                table: table.full_name(),
            });
        }

        self.add_filters_to_select_query(&mut qb, config, table, collected)?;

        if let Some(limit) = config.limit {
            qb.set_max_results(limit);
        }
        if let Some(order_by) = &config.order_by {
            qb.set_order_by(order_by.as_str());
        }

        Ok(qb)
    }

    /// Resolve, bind and AND-combine the policy's filters in order.
    pub fn add_filters_to_select_query(
        &self,
        qb: &mut SelectQuery,
        config: &TableConfiguration,
        table: &Table,
        collected: &CollectedValues,
    ) -> Result<()> {
        let dialect = self.dialect();

        for (index, filter) in config.filters.iter().enumerate() {
            let resolved = resolve_filter(filter, &table.name, collected)?;
            let column = dialect.quote_ident(resolved.column)?;

            let params = match resolved.value {
                BoundValue::None => Vec::new(),
                BoundValue::List(values) => values
                    .into_iter()
                    .enumerate()
                    .map(|(element, value)| {
                        let name = format!("param_{}_{}", index, element);
                        qb.set_parameter(name.as_str(), value);
                        name
                    })
                    .collect(),
                BoundValue::Single(value) => {
                    let name = format!("param_{}", index);
                    qb.set_parameter(name.as_str(), value);
                    vec![name]
                }
            };

            qb.and_where(Predicate {
                column,
                operator: resolved.operator,
                params,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockExecutor;
    use super::*;
    use crate::config::{Filter, Operator};
    use crate::core::value::SqlValue;
    use serde_json::json;

    fn selector() -> (Arc<MockExecutor>, DataSelector) {
        let executor = Arc::new(MockExecutor::new());
        let selector = DataSelector::new(executor.clone());
        (executor, selector)
    }

    // =========================================================================
    // build_select_query
    // =========================================================================

    #[test]
    fn test_no_policy_selects_everything() {
        let (_, selector) = selector();
        let qb = selector
            .build_select_query(None, &Table::new("customers"), &CollectedValues::new())
            .unwrap();

        assert!(qb.predicates().is_empty());
        assert!(qb.parameters().is_empty());
        assert_eq!(qb.max_results(), None);
        assert_eq!(qb.order_by(), None);
        assert_eq!(
            qb.to_sql(selector.dialect()),
            "SELECT * FROM \"customers\" t"
        );
    }

    #[test]
    fn test_raw_query_cannot_be_built() {
        let (_, selector) = selector();
        let config = TableConfiguration::new("audit_log").with_query("SELECT * FROM audit_log");
        let err = selector
            .build_select_query(Some(&config), &Table::new("audit_log"), &CollectedValues::new())
            .unwrap_err();
        assert!(matches!(err, DumpError::InvalidQueryBuilderUse { .. }));
    }

    #[test]
    fn test_in_filter_binds_one_parameter_per_element() {
        let (_, selector) = selector();
        let config = TableConfiguration::new("orders")
            .with_filter(Filter::new("id", Operator::In, json!([1, 2, 3])));
        let qb = selector
            .build_select_query(Some(&config), &Table::new("orders"), &CollectedValues::new())
            .unwrap();

        assert_eq!(qb.parameters().len(), 3);
        assert_eq!(qb.parameter("param_0_0"), Some(&SqlValue::I64(1)));
        assert_eq!(qb.parameter("param_0_1"), Some(&SqlValue::I64(2)));
        assert_eq!(qb.parameter("param_0_2"), Some(&SqlValue::I64(3)));
        assert_eq!(
            qb.predicates()[0].params,
            vec!["param_0_0", "param_0_1", "param_0_2"]
        );
        assert_eq!(
            qb.to_sql(selector.dialect()),
            "SELECT * FROM \"orders\" t WHERE \"id\" IN (:param_0_0, :param_0_1, :param_0_2)"
        );
    }

    #[test]
    fn test_filters_keep_declared_order() {
        let (_, selector) = selector();
        let config = TableConfiguration::new("orders")
            .with_filter(Filter::new("a", Operator::Eq, 1))
            .with_filter(Filter::new("b", Operator::Gt, 2))
            .with_filter(Filter::new("c", Operator::Like, "x%"));
        let qb = selector
            .build_select_query(Some(&config), &Table::new("orders"), &CollectedValues::new())
            .unwrap();

        let names: Vec<_> = qb.parameters().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["param_0", "param_1", "param_2"]);
        assert_eq!(
            qb.to_sql(selector.dialect()),
            "SELECT * FROM \"orders\" t WHERE \"a\" = :param_0 AND \"b\" > :param_1 AND \"c\" LIKE :param_2"
        );
    }

    #[test]
    fn test_limit_and_order_by() {
        let (_, selector) = selector();
        let config = TableConfiguration::new("customers")
            .with_limit(100)
            .with_order_by("created_at DESC");
        let qb = selector
            .build_select_query(
                Some(&config),
                &Table::new("customers").with_schema("public"),
                &CollectedValues::new(),
            )
            .unwrap();
        assert_eq!(
            qb.to_sql(selector.dialect()),
            "SELECT * FROM \"public\".\"customers\" t ORDER BY created_at DESC LIMIT 100"
        );
    }

    #[test]
    fn test_dependent_filter_without_collected_table() {
        let (_, selector) = selector();
        let config = TableConfiguration::new("orders")
            .with_filter(Filter::depends_on("customer_id", "customers", "id"));
        let err = selector
            .build_select_query(Some(&config), &Table::new("orders"), &CollectedValues::new())
            .unwrap_err();
        assert!(matches!(err, DumpError::UnresolvedDependency { .. }));
    }

    #[test]
    fn test_dependent_filter_becomes_in() {
        let (_, selector) = selector();
        let mut collected = CollectedValues::new();
        collected.extend("customers", "id", vec![SqlValue::I32(10), SqlValue::I32(11)]);
        let config = TableConfiguration::new("orders").with_filter(
            Filter::depends_on("customer_id", "customers", "id").with_operator(Operator::Neq),
        );

        let qb = selector
            .build_select_query(Some(&config), &Table::new("orders"), &collected)
            .unwrap();
        assert_eq!(qb.predicates()[0].operator, Operator::In);
        assert_eq!(qb.parameter("param_0_0"), Some(&SqlValue::I32(10)));
        assert_eq!(qb.parameter("param_0_1"), Some(&SqlValue::I32(11)));

        // Building twice yields the same query
        let again = selector
            .build_select_query(Some(&config), &Table::new("orders"), &collected)
            .unwrap();
        assert_eq!(qb, again);
    }

    #[test]
    fn test_null_checks_bind_no_parameter() {
        let (_, selector) = selector();
        let config = TableConfiguration::new("customers")
            .with_filter(Filter::new("deleted_at", Operator::IsNull, json!(null)))
            .with_filter(Filter::new("country", Operator::Eq, "NL"));
        let qb = selector
            .build_select_query(Some(&config), &Table::new("customers"), &CollectedValues::new())
            .unwrap();

        let names: Vec<_> = qb.parameters().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["param_1"]);
        assert_eq!(
            qb.render(selector.dialect()).sql,
            "SELECT * FROM \"customers\" t WHERE \"deleted_at\" IS NULL AND \"country\" = $1"
        );
    }

    #[test]
    fn test_invalid_column_identifier() {
        let (_, selector) = selector();
        let config = TableConfiguration::new("orders")
            .with_filter(Filter::new("id\0", Operator::Eq, 1));
        assert!(selector
            .build_select_query(Some(&config), &Table::new("orders"), &CollectedValues::new())
            .is_err());
    }

    // =========================================================================
    // execute_select_query
    // =========================================================================

    #[tokio::test]
    async fn test_execute_raw_query_verbatim() {
        let (executor, selector) = selector();
        let config = TableConfiguration {
            name: "audit_log".into(),
            query: Some("SELECT id FROM audit_log WHERE id < 5".into()),
            limit: Some(3),
            ..Default::default()
        };

        selector
            .execute_select_query(Some(&config), &Table::new("audit_log"), &CollectedValues::new())
            .await
            .unwrap();

        let calls = executor.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "SELECT id FROM audit_log WHERE id < 5");
        assert!(calls[0].1.is_empty());
    }

    #[tokio::test]
    async fn test_raw_query_ignores_filters_and_order() {
        let (executor, selector) = selector();
        // The dependent filter would fail to resolve if it were applied
        let config = TableConfiguration {
            name: "audit_log".into(),
            query: Some("SELECT * FROM audit_log".into()),
            filters: vec![
                Filter::depends_on("user_id", "users", "id"),
                Filter::new("level", Operator::Eq, "error"),
            ],
            order_by: Some("id".into()),
            ..Default::default()
        };

        selector
            .execute_select_query(Some(&config), &Table::new("audit_log"), &CollectedValues::new())
            .await
            .unwrap();

        let calls = executor.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "SELECT * FROM audit_log");
        assert!(calls[0].1.is_empty());
    }

    #[tokio::test]
    async fn test_execute_binds_positional_parameters() {
        let (executor, selector) = selector();
        let mut collected = CollectedValues::new();
        collected.extend("customers", "id", vec![SqlValue::I32(10), SqlValue::I32(11)]);
        let config = TableConfiguration::new("orders")
            .with_filter(Filter::depends_on("customer_id", "customers", "id"))
            .with_filter(Filter::new("status", Operator::Neq, "cancelled"))
            .with_limit(50);

        selector
            .execute_select_query(Some(&config), &Table::new("orders"), &collected)
            .await
            .unwrap();

        let calls = executor.calls();
        assert_eq!(
            calls[0].0,
            "SELECT * FROM \"orders\" t WHERE \"customer_id\" IN ($1, $2) AND \"status\" <> $3 LIMIT 50"
        );
        assert_eq!(
            calls[0].1,
            vec![
                SqlValue::I32(10),
                SqlValue::I32(11),
                SqlValue::text_owned("cancelled")
            ]
        );
    }

    #[tokio::test]
    async fn test_execute_propagates_dependency_error() {
        let (executor, selector) = selector();
        let config = TableConfiguration::new("orders")
            .with_filter(Filter::depends_on("customer_id", "customers", "id"));

        let result = selector
            .execute_select_query(Some(&config), &Table::new("orders"), &CollectedValues::new())
            .await;
        assert!(result.is_err());
        assert!(executor.calls().is_empty());
    }
}
