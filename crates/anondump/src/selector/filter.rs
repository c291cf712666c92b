//! Filter resolution.
//!
//! A configured [`Filter`] is never modified. Resolving it against the
//! collected values yields a fresh [`ResolvedFilter`] for one query build, so
//! the same policy can be built any number of times.

use crate::config::{Filter, FilterValue, Operator};
use crate::core::value::SqlValue;
use crate::error::{DumpError, Result};

use super::collected::CollectedValues;

/// Concrete value(s) a filter binds.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundValue {
    /// Nothing, for `isNull` and `isNotNull`.
    None,
    /// One parameter.
    Single(SqlValue<'static>),
    /// One parameter per element.
    List(Vec<SqlValue<'static>>),
}

/// A filter with its effective operator and concrete values.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFilter<'a> {
    pub column: &'a str,
    pub operator: Operator,
    pub value: BoundValue,
}

/// Resolve a filter of `table` into concrete values.
///
/// Data dependent filters take every value collected for the referenced
/// column and always behave like `in`, whatever operator was declared.
pub fn resolve_filter<'a>(
    filter: &'a Filter,
    table: &str,
    collected: &CollectedValues,
) -> Result<ResolvedFilter<'a>> {
    match &filter.value {
        FilterValue::Deferred(reference) => {
            let columns = collected.table(&reference.table).ok_or_else(|| {
                DumpError::UnresolvedDependency {
                    table: table.to_string(),
                    referenced_table: reference.table.clone(),
                    referenced_column: reference.column.clone(),
                    missing: format!("table {}", reference.table),
                }
            })?;
            let values = columns.get(&reference.column).ok_or_else(|| {
                DumpError::UnresolvedDependency {
                    table: table.to_string(),
                    referenced_table: reference.table.clone(),
                    referenced_column: reference.column.clone(),
                    missing: format!("column {} of table {}", reference.column, reference.table),
                }
            })?;

            Ok(ResolvedFilter {
                column: &filter.column,
                operator: Operator::In,
                value: BoundValue::List(values.clone()),
            })
        }
        FilterValue::Literal(literal) => {
            let value = if !filter.operator.takes_value() {
                BoundValue::None
            } else if filter.operator.is_list() {
                match literal {
                    serde_json::Value::Array(items) => {
                        BoundValue::List(items.iter().map(SqlValue::from_json).collect())
                    }
                    scalar => BoundValue::List(vec![SqlValue::from_json(scalar)]),
                }
            } else {
                if literal.is_array() {
                    return Err(DumpError::Config(format!(
                        "filter on {}.{}: operator '{}' expects a single value, got a list",
                        table,
                        filter.column,
                        filter.operator.as_sql()
                    )));
                }
                BoundValue::Single(SqlValue::from_json(literal))
            };

            Ok(ResolvedFilter {
                column: &filter.column,
                operator: filter.operator,
                value,
            })
        }
    }
}
