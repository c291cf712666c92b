//! Database driver implementations.
//!
//! - [`postgres`]: PostgreSQL dialect and query executor
//! - [`mssql`]: Microsoft SQL Server dialect
//! - [`mysql`]: MySQL/MariaDB dialect
//!
//! # Adding New Databases
//!
//! 1. Create a new module under `drivers/`
//! 2. Implement the `Dialect` trait (and `QueryExecutor` if the crate should
//!    run queries itself)
//! 3. Add an enum variant to `DialectImpl` and an alias in `from_db_type`

pub mod mssql;
pub mod mysql;
pub mod postgres;

pub use mssql::MssqlDialect;
pub use mysql::MysqlDialect;
pub use postgres::PostgresDialect;
#[cfg(feature = "postgres")]
pub use postgres::PostgresExecutor;

use crate::core::traits::{Dialect, SelectQueryOptions};
use crate::error::{DumpError, Result};

/// Enum-based static dispatch for dialects.
///
/// The compiler generates a match statement instead of vtable dispatch.
#[derive(Debug, Clone)]
pub enum DialectImpl {
    Mssql(MssqlDialect),
    Mysql(MysqlDialect),
    Postgres(PostgresDialect),
}

impl Dialect for DialectImpl {
    fn name(&self) -> &str {
        match self {
            DialectImpl::Mssql(d) => d.name(),
            DialectImpl::Mysql(d) => d.name(),
            DialectImpl::Postgres(d) => d.name(),
        }
    }

    fn quote_ident(&self, name: &str) -> Result<String> {
        match self {
            DialectImpl::Mssql(d) => d.quote_ident(name),
            DialectImpl::Mysql(d) => d.quote_ident(name),
            DialectImpl::Postgres(d) => d.quote_ident(name),
        }
    }

    fn param_placeholder(&self, index: usize) -> String {
        match self {
            DialectImpl::Mssql(d) => d.param_placeholder(index),
            DialectImpl::Mysql(d) => d.param_placeholder(index),
            DialectImpl::Postgres(d) => d.param_placeholder(index),
        }
    }

    fn build_select_query(&self, opts: &SelectQueryOptions) -> String {
        match self {
            DialectImpl::Mssql(d) => d.build_select_query(opts),
            DialectImpl::Mysql(d) => d.build_select_query(opts),
            DialectImpl::Postgres(d) => d.build_select_query(opts),
        }
    }
}

impl DialectImpl {
    /// Create a dialect implementation from a database type string.
    ///
    /// # Errors
    ///
    /// Returns an error if the database type is not recognized.
    pub fn from_db_type(db_type: &str) -> Result<Self> {
        match db_type.to_lowercase().as_str() {
            "mssql" | "sqlserver" | "sql_server" => Ok(DialectImpl::Mssql(MssqlDialect::new())),
            "mysql" | "mariadb" => Ok(DialectImpl::Mysql(MysqlDialect::new())),
            "postgres" | "postgresql" | "pg" => Ok(DialectImpl::Postgres(PostgresDialect::new())),
            other => Err(DumpError::Config(format!(
                "Unknown database type: '{}'. Supported types: mssql, mysql, postgres",
                other
            ))),
        }
    }
}
