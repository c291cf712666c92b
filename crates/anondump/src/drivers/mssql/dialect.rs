//! MSSQL SQL dialect (Strategy pattern).
//!
//! Provides MSSQL-specific identifier quoting, parameter placeholders and
//! `TOP n` row limiting.

use crate::core::identifier::quote_mssql;
use crate::core::traits::{Dialect, SelectQueryOptions};
use crate::error::Result;

/// Microsoft SQL Server dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct MssqlDialect;

impl MssqlDialect {
    /// Create a new MSSQL dialect instance.
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for MssqlDialect {
    fn name(&self) -> &str {
        "mssql"
    }

    fn quote_ident(&self, name: &str) -> Result<String> {
        quote_mssql(name)
    }

    fn param_placeholder(&self, index: usize) -> String {
        // MSSQL uses @P1, @P2, etc. (1-based)
        format!("@P{}", index)
    }

    fn build_select_query(&self, opts: &SelectQueryOptions) -> String {
        // MSSQL has no LIMIT; TOP goes right after SELECT
        let mut sql = match opts.limit {
            Some(limit) => format!("SELECT TOP {} * FROM {}", limit, opts.table),
            None => format!("SELECT * FROM {}", opts.table),
        };

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

        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        let dialect = MssqlDialect::new();
        assert_eq!(dialect.quote_ident("name").unwrap(), "[name]");
        assert_eq!(dialect.quote_ident("table]name").unwrap(), "[table]]name]");
    }

    #[test]
    fn test_param_placeholder() {
        assert_eq!(MssqlDialect::new().param_placeholder(3), "@P3");
    }

    #[test]
    fn test_build_select_query_uses_top() {
        let dialect = MssqlDialect::new();
        let opts = SelectQueryOptions {
            table: "[dbo].[users]".to_string(),
            alias: Some("t".to_string()),
            conditions: vec!["[id] = @P1".to_string()],
            order_by: Some("id".to_string()),
            limit: Some(5),
        };

        let sql = dialect.build_select_query(&opts);
        assert_eq!(
            sql,
            "SELECT TOP 5 * FROM [dbo].[users] t WHERE [id] = @P1 ORDER BY id"
        );
        assert!(!sql.contains("LIMIT"));
    }
}
