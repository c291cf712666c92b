//! MySQL/MariaDB dialect.
//!
//! Only the SQL syntax strategy lives here; executing against MySQL is left to
//! a caller-provided [`QueryExecutor`](crate::core::QueryExecutor).

mod dialect;

pub use dialect::MysqlDialect;
