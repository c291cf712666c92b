//! Microsoft SQL Server dialect.
//!
//! Only the SQL syntax strategy lives here; executing against SQL Server is
//! left to a caller-provided [`QueryExecutor`](crate::core::QueryExecutor).

mod dialect;

pub use dialect::MssqlDialect;
