//! Core traits at the database boundary.
//!
//! - [`Dialect`]: SQL syntax strategy for different database engines
//! - [`QueryExecutor`]: Runs a rendered statement against one connection
//!
//! # Design Patterns
//!
//! - **Strategy**: Dialect provides interchangeable quoting and placeholder rules
//! - **Template Method**: `Dialect::build_select_query` has a default skeleton
//!   that engines without `LIMIT` override

use async_trait::async_trait;

use crate::error::Result;

use super::result::ResultSet;
use super::value::SqlValue;

/// Options for rendering a SELECT statement.
///
/// All identifiers are already quoted and all conditions already carry the
/// dialect's positional placeholders.
#[derive(Debug, Clone, Default)]
pub struct SelectQueryOptions {
    /// Quoted (optionally qualified) table name.
    pub table: String,
    /// Table alias.
    pub alias: Option<String>,
    /// Predicates, AND-combined in order.
    pub conditions: Vec<String>,
    /// Raw ORDER BY fragment.
    pub order_by: Option<String>,
    /// Row limit.
    pub limit: Option<u64>,
}

/// SQL syntax strategy for different database engines.
///
/// Provides database-specific SQL generation while keeping the
/// selector database-agnostic.
pub trait Dialect: Send + Sync {
    /// Get the dialect identifier (e.g., "mssql", "postgres").
    fn name(&self) -> &str;

    /// Validate and quote an identifier (table name, column name, etc.).
    ///
    /// - MSSQL: `[identifier]`
    /// - PostgreSQL: `"identifier"`
    /// - MySQL: `` `identifier` ``
    fn quote_ident(&self, name: &str) -> Result<String>;

    /// Get a parameter placeholder for the given 1-based index.
    ///
    /// - MSSQL: `@P1`, `@P2`, etc.
    /// - PostgreSQL: `$1`, `$2`, etc.
    fn param_placeholder(&self, index: usize) -> String;

    /// Build a SELECT * query.
    ///
    /// The default renders `SELECT * FROM t alias WHERE .. ORDER BY .. LIMIT n`.
    fn build_select_query(&self, opts: &SelectQueryOptions) -> String {
        let mut sql = format!("SELECT * FROM {}", opts.table);

        if let Some(alias) = &opts.alias {
            sql.push(' ');
            sql.push_str(alias);
        }

        if !opts.conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&opts.conditions.join(" AND "));
        }

        if let Some(order_by) = &opts.order_by {
            sql.push_str(&format!(" ORDER BY {}", order_by));
        }

        if let Some(limit) = opts.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        sql
    }
}

/// Executes statements against a single source connection.
///
/// Parameters are always bound positionally; the SQL text never contains
/// interpolated values. Implementations run one statement at a time.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// The dialect used to quote identifiers and render placeholders.
    fn dialect(&self) -> &dyn Dialect;

    /// Execute a statement and materialize its rows.
    async fn query(&self, sql: &str, params: &[SqlValue<'static>]) -> Result<ResultSet>;
}
