//! PostgreSQL driver.
//!
//! - [`PostgresDialect`]: SQL syntax strategy for PostgreSQL
//! - [`PostgresExecutor`]: Query executor over a deadpool-postgres pool

mod dialect;
#[cfg(feature = "postgres")]
mod executor;
#[cfg(feature = "postgres")]
mod types;

pub use dialect::PostgresDialect;
#[cfg(feature = "postgres")]
pub use executor::PostgresExecutor;
